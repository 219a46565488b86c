//! Analysis of averaged transients: transients integrated over a wavenumber range, rebinned on
//! linear or logarithmic time grids, and spectra integrated over a time window.

use crate::config::DetectionMode;
use crate::error::{ProcessingError, Result};
use crate::math_tools::{complex_to_real, gradient, nearest_index};
use crate::processing::smoothing::inverse_variance_weights;
use ndarray::{s, Array1, ArrayView1, ArrayView2, Axis};
use num_complex::Complex64;
use std::ops::Range;

/// A transient together with everything needed to slice and realize it.
///
/// # Fields
/// - `transient`: averaged or smoothed transmission, `[time, wavenumber]`.
/// - `time_axis`: time of each row in s.
/// - `wn_axis`: wavenumber of each column in cm^-1.
/// - `std_axis`: relative std per wavenumber.
/// - `detection`, `phase_drift_correction`: realization of complex values.
#[derive(Debug, Clone, Copy)]
pub struct TransientAnalysis<'a> {
    transient: ArrayView2<'a, Complex64>,
    time_axis: ArrayView1<'a, f64>,
    wn_axis: ArrayView1<'a, f64>,
    std_axis: ArrayView1<'a, f64>,
    detection: DetectionMode,
    phase_drift_correction: bool,
}

/// A transient resampled on a new time grid.
#[derive(Clone, Debug, PartialEq)]
pub struct BinnedTransient {
    pub transmission: Array1<f64>,
    pub time: Array1<f64>,
}

/// Mean of `values[range]`, NaN for an empty range.
fn range_mean(values: ArrayView1<f64>, range: Range<usize>) -> f64 {
    values.slice(s![range]).mean().unwrap_or(f64::NAN)
}

/// Indices of the axis values closest to `a` and `b`, ascending, upper bound exclusive.
fn nearest_range(axis: ArrayView1<f64>, a: f64, b: f64) -> Result<Range<usize>> {
    let empty = || ProcessingError::InvalidParameter("empty axis".to_string());
    let first = nearest_index(axis, a).ok_or_else(empty)?;
    let second = nearest_index(axis, b).ok_or_else(empty)?;
    let (start, stop) = if first > second {
        (second, first)
    } else {
        (first, second)
    };
    Ok(start..stop + 1)
}

impl<'a> TransientAnalysis<'a> {
    pub fn new(
        transient: ArrayView2<'a, Complex64>,
        time_axis: ArrayView1<'a, f64>,
        wn_axis: ArrayView1<'a, f64>,
        std_axis: ArrayView1<'a, f64>,
        detection: DetectionMode,
        phase_drift_correction: bool,
    ) -> Result<Self> {
        let (rows, columns) = transient.dim();
        if time_axis.len() != rows || wn_axis.len() != columns || std_axis.len() != columns {
            return Err(ProcessingError::Shape(format!(
                "transient {:?} with time axis {}, wavenumber axis {} and std axis {}",
                transient.dim(),
                time_axis.len(),
                wn_axis.len(),
                std_axis.len()
            )));
        }
        Ok(TransientAnalysis {
            transient,
            time_axis,
            wn_axis,
            std_axis,
            detection,
            phase_drift_correction,
        })
    }

    /// Rows closest to `start_time` and `stop_time`, in either order, both included.
    pub fn time_range_indices(&self, start_time: f64, stop_time: f64) -> Result<Range<usize>> {
        nearest_range(self.time_axis, start_time, stop_time)
    }

    /// Inverse-variance weighted transient over the wavenumbers closest to `min_wn..=max_wn`.
    pub fn transient_in_wn_range(&self, min_wn: f64, max_wn: f64) -> Result<Array1<f64>> {
        let range = nearest_range(self.wn_axis, min_wn, max_wn)?;
        let (weights, _) = inverse_variance_weights(
            self.std_axis.slice(s![range.clone()]),
            range.len() / 2,
            None,
            1.0,
        );
        let combined: Array1<Complex64> = self
            .transient
            .slice(s![.., range])
            .outer_iter()
            .map(|row| row.iter().zip(weights.iter()).map(|(c, w)| c * w).sum())
            .collect();
        Ok(complex_to_real(
            combined.view(),
            self.detection,
            self.phase_drift_correction,
        ))
    }

    /// Rebins the transient over `min_wn..=max_wn` on a linear time grid.
    ///
    /// Each point averages `averaging` consecutive rows; `interleave > 1` widens every bin so
    /// that neighbouring bins overlap.
    pub fn transient_with_lin_time(
        &self,
        min_wn: f64,
        max_wn: f64,
        averaging: usize,
        interleave: usize,
    ) -> Result<BinnedTransient> {
        if averaging == 0 || interleave == 0 {
            return Err(ProcessingError::InvalidParameter(format!(
                "averaging ({}) and interleave ({}) must be at least 1",
                averaging, interleave
            )));
        }
        let transient = self.transient_in_wn_range(min_wn, max_wn)?;
        let time = self.time_axis;
        let n = time.len();
        let start_time = time.iter().copied().fold(f64::INFINITY, f64::min);
        let delta = gradient(time).mean().unwrap_or(0.0).abs() * averaging as f64;
        let overlap = (interleave - 1) as f64;
        let steps = n / averaging;

        let mut lin_time = Array1::zeros(steps);
        let mut lin_transmission = Array1::zeros(steps);
        for i in 0..steps {
            let target = start_time + i as f64 * delta - delta * overlap;
            let start = nearest_index(time, target).unwrap_or(0);
            let last = (start + averaging - 1).min(n - 1);
            let stop = nearest_index(time, time[last] + 2.0 * delta * overlap).unwrap_or(last);
            lin_time[i] = range_mean(time, start..stop + 1);
            lin_transmission[i] = range_mean(transient.view(), start..stop + 1);
        }
        Ok(BinnedTransient {
            transmission: lin_transmission,
            time: lin_time,
        })
    }

    /// Rebins the post-trigger part (t > 0) of the transient over `min_wn..=max_wn` on a
    /// logarithmic time grid of `steps` points.
    ///
    /// Each bin reaches up to `interleave` times its nominal time and is reported at the
    /// geometric mean of its first and last time. Bins that catch no sample are NaN.
    pub fn transient_with_log_time(
        &self,
        min_wn: f64,
        max_wn: f64,
        steps: usize,
        interleave: usize,
    ) -> Result<BinnedTransient> {
        if steps == 0 || interleave == 0 {
            return Err(ProcessingError::InvalidParameter(format!(
                "steps ({}) and interleave ({}) must be at least 1",
                steps, interleave
            )));
        }
        let transient = self.transient_in_wn_range(min_wn, max_wn)?;

        let mut samples: Vec<(f64, f64)> = self
            .time_axis
            .iter()
            .copied()
            .zip(transient.iter().copied())
            .filter(|(t, _)| *t > 0.0)
            .collect();
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (time, transient): (Vec<f64>, Vec<f64>) = samples.into_iter().unzip();
        let (Some(&first), Some(&last)) = (time.first(), time.last()) else {
            return Err(ProcessingError::InvalidParameter(
                "the transient has no samples after the trigger".to_string(),
            ));
        };
        let (time, transient) = (Array1::from_vec(time), Array1::from_vec(transient));

        let mut log_time = Array1::logspace(10.0, first.log10(), last.log10(), steps);
        let mut log_transmission = Array1::zeros(steps);
        let mut start = 0;
        for i in 0..steps {
            let stop = nearest_index(time.view(), log_time[i] * interleave as f64).unwrap_or(0);
            log_transmission[i] = range_mean(transient.view(), start..(stop + 1).max(start));
            log_time[i] = (time[start] * time[stop]).sqrt();
            start = nearest_index(time.view(), log_time[i]).unwrap_or(0);
        }
        Ok(BinnedTransient {
            transmission: log_transmission,
            time: log_time,
        })
    }

    /// Complex mean spectrum over the rows closest to `start_time..=stop_time`.
    pub fn complex_spectrum(&self, start_time: f64, stop_time: f64) -> Result<Array1<Complex64>> {
        let range = self.time_range_indices(start_time, stop_time)?;
        let n = range.len() as f64;
        Ok(self
            .transient
            .slice(s![range, ..])
            .sum_axis(Axis(0))
            .mapv_into(|c| c / n))
    }

    /// Standard error of the realized spectrum over the rows closest to `start_time..=stop_time`.
    pub fn spectrum_std(&self, start_time: f64, stop_time: f64) -> Result<Array1<f64>> {
        let range = self.time_range_indices(start_time, stop_time)?;
        let n = range.len() as f64;
        let realized = complex_to_real(
            self.transient.slice(s![range, ..]),
            self.detection,
            self.phase_drift_correction,
        );
        Ok(realized.std_axis(Axis(0), 0.0) / n.sqrt())
    }

    /// Realized mean spectrum with NaN wherever the noise exceeds `threshold`.
    pub fn spectrum_with_noise_threshold(
        &self,
        start_time: f64,
        stop_time: f64,
        threshold: f64,
    ) -> Result<Array1<f64>> {
        let spectrum = self.complex_spectrum(start_time, stop_time)?;
        let mut realized =
            complex_to_real(spectrum.view(), self.detection, self.phase_drift_correction);
        for (value, std) in realized.iter_mut().zip(self.std_axis.iter()) {
            if *std > threshold {
                *value = f64::NAN;
            }
        }
        Ok(realized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array, Array2};

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    struct Fixture {
        transient: Array2<Complex64>,
        time: Array1<f64>,
        wn: Array1<f64>,
        std: Array1<f64>,
    }

    impl Fixture {
        /// Transmission `1 - 0.1 * t * (1 + k)` for time `t` and wavenumber index `k`.
        fn new(time: Array1<f64>) -> Fixture {
            let wn = array![1000.0, 1000.5, 1001.0];
            let transient = Array2::from_shape_fn((time.len(), wn.len()), |(t, k)| {
                c(1.0 - 0.1 * time[t] * (1.0 + k as f64))
            });
            Fixture {
                transient,
                time,
                wn,
                std: array![0.1, 0.1, 0.1],
            }
        }

        fn analysis(&self) -> TransientAnalysis<'_> {
            TransientAnalysis::new(
                self.transient.view(),
                self.time.view(),
                self.wn.view(),
                self.std.view(),
                DetectionMode::Asc,
                false,
            )
            .unwrap()
        }
    }

    #[test]
    fn test_new_validates_shapes() {
        let fixture = Fixture::new(Array::linspace(0.0, 1.0, 5));
        assert!(TransientAnalysis::new(
            fixture.transient.view(),
            fixture.time.slice(s![..4]),
            fixture.wn.view(),
            fixture.std.view(),
            DetectionMode::Asc,
            false,
        )
        .is_err());
    }

    #[test]
    fn test_time_range_indices_are_ordered_and_inclusive() {
        let fixture = Fixture::new(Array::linspace(0.0, 4.0, 5));
        let analysis = fixture.analysis();
        assert_eq!(analysis.time_range_indices(1.1, 2.9).unwrap(), 1..4);
        assert_eq!(analysis.time_range_indices(2.9, 1.1).unwrap(), 1..4);
        assert_eq!(analysis.time_range_indices(2.0, 2.0).unwrap(), 2..3);
    }

    #[test]
    fn test_transient_in_wn_range() {
        let fixture = Fixture::new(Array::linspace(0.0, 4.0, 5));
        let analysis = fixture.analysis();
        let single = analysis.transient_in_wn_range(1000.0, 1000.1).unwrap();
        assert_relative_eq!(single[2], 0.8, epsilon = 1e-12);

        // equal noise: plain mean over the two first wavenumbers, order does not matter
        let pair = analysis.transient_in_wn_range(1000.5, 1000.0).unwrap();
        assert_relative_eq!(pair[2], 1.0 - 0.1 * 2.0 * 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_transient_in_wn_range_prefers_quiet_wavenumbers() {
        let mut fixture = Fixture::new(Array::linspace(0.0, 4.0, 5));
        fixture.std = array![0.1, f64::NAN, 0.1];
        let analysis = fixture.analysis();
        let transient = analysis.transient_in_wn_range(1000.0, 1001.0).unwrap();
        // the NaN column is ignored: mean of factors 1 and 3
        assert_relative_eq!(transient[1], 1.0 - 0.1 * 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_transient_with_lin_time() {
        let fixture = Fixture::new(Array::linspace(0.0, 9.0, 10));
        let analysis = fixture.analysis();
        let binned = analysis.transient_with_lin_time(1000.0, 1000.0, 2, 1).unwrap();
        assert_eq!(binned.time.len(), 5);
        assert_relative_eq!(binned.time[0], 0.5, epsilon = 1e-12);
        assert_relative_eq!(binned.time[4], 8.5, epsilon = 1e-12);
        assert_relative_eq!(binned.transmission[1], 1.0 - 0.1 * 2.5, epsilon = 1e-12);

        assert!(analysis.transient_with_lin_time(1000.0, 1000.0, 0, 1).is_err());
    }

    #[test]
    fn test_transient_with_log_time_uses_post_trigger_samples() {
        let time = array![-2.0, -1.0, 0.0, 1.0, 2.0, 4.0, 8.0, 16.0];
        let fixture = Fixture::new(time);
        let analysis = fixture.analysis();
        let binned = analysis.transient_with_log_time(1000.0, 1000.0, 5, 1).unwrap();
        assert_eq!(binned.time.len(), 5);
        assert_relative_eq!(binned.time[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(binned.transmission[0], 0.9, epsilon = 1e-12);
        // the last bin spans 4..16
        assert_relative_eq!(binned.time[4], 8.0, epsilon = 1e-12);
        assert!(binned.time.iter().all(|t| *t > 0.0));

        let fixture = Fixture::new(array![-2.0, -1.0]);
        assert!(fixture.analysis().transient_with_log_time(1000.0, 1000.0, 3, 1).is_err());
    }

    #[test]
    fn test_complex_spectrum_and_std() {
        let fixture = Fixture::new(Array::linspace(0.0, 4.0, 5));
        let analysis = fixture.analysis();
        let spectrum = analysis.complex_spectrum(1.0, 3.0).unwrap();
        assert_relative_eq!(spectrum[0].re, 0.8, epsilon = 1e-12);
        assert_relative_eq!(spectrum[2].re, 1.0 - 0.1 * 2.0 * 3.0, epsilon = 1e-12);

        let std = analysis.spectrum_std(1.0, 3.0).unwrap();
        // population std of 0.1 * [1, 2, 3] over sqrt(3)
        assert_relative_eq!(std[0], 0.1 * (2.0f64 / 3.0).sqrt() / 3f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_spectrum_with_noise_threshold() {
        let mut fixture = Fixture::new(Array::linspace(0.0, 4.0, 5));
        fixture.std = array![0.01, 0.5, 0.02];
        let analysis = fixture.analysis();
        let spectrum = analysis.spectrum_with_noise_threshold(0.0, 0.0, 0.1).unwrap();
        assert_relative_eq!(spectrum[0], 1.0);
        assert!(spectrum[1].is_nan());
        assert_relative_eq!(spectrum[2], 1.0);
    }
}
