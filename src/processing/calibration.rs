//! Wavenumber calibration against a previously calibrated reference measurement.

use crate::error::{ProcessingError, Result};
use crate::math_tools::{cross_correlate_full, mean_spacing};
use ndarray::{Array1, ArrayView1};

/// Wavenumber axis of a measurement, calibrated by the comb line offset to a reference.
///
/// The peak mean amplitudes of the reference and the measurement are cross-correlated. The
/// position of the maximum gives the offset in comb lines, and the new axis starts at the
/// reference's first wavenumber shifted by that offset, with the reference's mean spacing.
///
/// # Arguments
/// - `calib_axis`: calibrated wavenumber axis of the reference.
/// - `calib_amp`: peak mean amplitude per comb line of the reference.
/// - `measured_amp`: peak mean amplitude per comb line of the measurement.
///
/// # Returns
/// The calibrated axis with one entry per entry of `measured_amp`, and the lag in lines.
pub fn calibrate_by_lag(
    calib_axis: ArrayView1<f64>,
    calib_amp: ArrayView1<f64>,
    measured_amp: ArrayView1<f64>,
) -> Result<(Array1<f64>, isize)> {
    if calib_axis.len() != calib_amp.len() {
        return Err(ProcessingError::Shape(format!(
            "reference axis has {} entries but {} amplitudes",
            calib_axis.len(),
            calib_amp.len()
        )));
    }
    if measured_amp.is_empty() {
        return Err(ProcessingError::InvalidParameter(
            "no peak amplitudes to calibrate".to_string(),
        ));
    }
    let spacing = mean_spacing(calib_axis)?;
    let first = calib_axis[0];

    let correlation = cross_correlate_full(calib_amp, measured_amp);
    let argmax = correlation
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let lag = argmax as isize - (measured_amp.len() as isize - 1);

    log::info!("calibration lag of {} lines", lag);
    let axis = Array1::from_shape_fn(measured_amp.len(), |k| {
        first + (k as isize + lag) as f64 * spacing
    });
    Ok((axis, lag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array};

    #[test]
    fn test_identical_amplitudes_keep_the_axis() {
        let axis = Array::linspace(1000.0, 1004.0, 5);
        let amp = array![1.0, 3.0, 9.0, 2.0, 1.0];
        let (calibrated, lag) = calibrate_by_lag(axis.view(), amp.view(), amp.view()).unwrap();
        assert_eq!(lag, 0);
        for (c, a) in calibrated.iter().zip(axis.iter()) {
            assert_relative_eq!(*c, *a, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_shifted_measurement() {
        let axis = Array::linspace(1000.0, 1003.5, 8);
        let calib = array![0.0, 0.0, 0.0, 1.0, 5.0, 1.0, 0.0, 0.0];
        // the peak sits two lines earlier in the measurement
        let measured = array![0.0, 1.0, 5.0, 1.0, 0.0, 0.0, 0.0, 0.0];
        let (calibrated, lag) =
            calibrate_by_lag(axis.view(), calib.view(), measured.view()).unwrap();
        assert_eq!(lag, 2);
        assert_relative_eq!(calibrated[0], 1001.0, epsilon = 1e-9);
        // measured line 2 lands on the reference's peak wavenumber
        assert_relative_eq!(calibrated[2], axis[4], epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_inconsistent_reference() {
        let axis = array![1000.0, 1000.5];
        assert!(calibrate_by_lag(axis.view(), array![1.0].view(), array![1.0].view()).is_err());
        let empty = Array1::<f64>::zeros(0);
        assert!(calibrate_by_lag(axis.view(), array![1.0, 2.0].view(), empty.view()).is_err());
    }
}
