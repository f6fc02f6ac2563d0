//! Tests for sensor correlation and regression

use super::*;
use crate::analysis::{correlate_sensors, correlation_matrix};
use crate::error::TideError;

#[test]
fn test_identical_sensors_fit_perfectly() {
    let result = correlate_sensors(&create_identical_sensor_table()).unwrap();

    assert_close(result.r, 1.0);
    assert_close(result.r_squared, 1.0);
    assert_close(result.slope, 1.0);
    assert_close(result.intercept, 0.0);
    assert!(result.std_err.abs() < 1e-6);
}

#[test]
fn test_linear_offset_is_recovered() {
    let pairs: Vec<_> = (0..10)
        .map(|i| {
            let keller = 0.5 + i as f64 * 0.1;
            (Some(keller), Some(2.0 * keller - 0.3))
        })
        .collect();
    let result = correlate_sensors(&create_tide_table(&pairs)).unwrap();

    assert_eq!(result.paired_count, 10);
    assert_close(result.slope, 2.0);
    assert!((result.intercept + 0.3).abs() < 1e-9);
}

#[test]
fn test_noisy_fit_stays_in_bounds() {
    let pairs = [
        (Some(1.0), Some(1.2)),
        (Some(1.5), Some(1.3)),
        (Some(2.0), Some(2.4)),
        (Some(2.5), Some(2.1)),
        (Some(3.0), Some(3.3)),
        (None, Some(9.0)),
    ];
    let result = correlate_sensors(&create_tide_table(&pairs)).unwrap();

    assert_eq!(result.paired_count, 5);
    assert!((-1.0..=1.0).contains(&result.r));
    assert_close(result.r_squared, result.r * result.r);
    assert!(result.std_err > 0.0);
    assert!(result.intercept_std_err > 0.0);
}

#[test]
fn test_two_points_give_exact_fit() {
    let result = correlate_sensors(&create_tide_table(&[(Some(1.0), Some(2.0)), (Some(2.0), Some(3.5))])).unwrap();

    assert_close(result.slope, 1.5);
    assert_close(result.intercept, 0.5);
    assert_eq!(result.std_err, 0.0);
}

#[test]
fn test_fewer_than_two_pairs_is_insufficient() {
    let table = create_tide_table(&[(Some(1.0), Some(1.0)), (Some(1.1), None), (None, Some(1.2))]);

    match correlate_sensors(&table) {
        Err(TideError::InsufficientData { required, found, .. }) => {
            assert_eq!(required, 2);
            assert_eq!(found, 1);
        }
        other => panic!("Expected InsufficientData, got {:?}", other),
    }
}

#[test]
fn test_constant_sensor_is_degenerate() {
    let table = create_tide_table(&[(Some(1.0), Some(1.0)), (Some(1.0), Some(1.4)), (Some(1.0), Some(0.9))]);
    assert!(matches!(
        correlate_sensors(&table),
        Err(TideError::DegenerateSeries { .. })
    ));
}

#[test]
fn test_correlation_matrix_diagonal_and_symmetry() {
    let matrix = correlation_matrix(&create_identical_sensor_table());

    assert_close(matrix.get(Channel::Keller, Channel::Keller).unwrap(), 1.0);
    assert_close(matrix.get(Channel::Keller, Channel::Vega).unwrap(), 1.0);
    assert_eq!(
        matrix.get(Channel::AirTemp, Channel::Keller),
        matrix.get(Channel::Keller, Channel::AirTemp)
    );
    // constant channels have no defined correlation
    assert_eq!(matrix.get(Channel::Pressure, Channel::Keller), None);
}
