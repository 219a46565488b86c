//! Selection of the per-wavenumber noise axis that drives the smoothing weights.

use crate::config::{AcquisitionMode, MeasurementMode};
use crate::data_container::{RawDataSource, SpectralData};
use crate::error::{ProcessingError, Result};
use crate::processing::averaging::AcquisitionAverage;
use ndarray::{s, Array1, ArrayView1, ArrayView2, Axis};
use num_complex::Complex64;
use std::fmt::{Display, Formatter};
use std::ops::Range;

/// Where a noise axis came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseSource {
    /// Per-acquisition std propagated over the averaged range.
    Propagated,
    /// Aggregate std written by older processors.
    Legacy,
    /// Spread of the leading background slices of the averaged transient.
    Background { slices: usize },
}

impl Display for NoiseSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NoiseSource::Propagated => write!(f, "propagated per-acquisition std"),
            NoiseSource::Legacy => write!(f, "legacy aggregate std"),
            NoiseSource::Background { slices } => {
                write!(f, "std of {} background slices", slices)
            }
        }
    }
}

/// Relative standard deviation per wavenumber of an averaged measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct NoiseModel {
    pub source: NoiseSource,
    pub axis: Array1<f64>,
}

impl NoiseModel {
    /// Picks the best available noise source for `average`.
    ///
    /// In order of preference: the propagated std of the average, the legacy aggregate std for
    /// time-integrated data, and the background spread for time-resolved data. A transient with
    /// fewer than two background slices falls back to the legacy std with a warning.
    pub fn select<S: RawDataSource + ?Sized>(
        source: &S,
        mode: AcquisitionMode,
        average: &AcquisitionAverage,
        background_slices: usize,
    ) -> Result<NoiseModel> {
        if source.std_peak_acqs().is_some() {
            let axis = average.std.clone().ok_or(ProcessingError::MissingStd)?;
            return Ok(NoiseModel {
                source: NoiseSource::Propagated,
                axis,
            });
        }

        let legacy = || {
            source
                .std_peak()
                .cloned()
                .map(|axis| NoiseModel {
                    source: NoiseSource::Legacy,
                    axis,
                })
                .ok_or(ProcessingError::MissingStd)
        };

        match (mode.measurement(), &average.transmission) {
            (MeasurementMode::TimeIntegrated, _) => legacy(),
            (MeasurementMode::TimeResolved, SpectralData::Transient(transient))
                if background_slices >= 2 =>
            {
                let slices = background_slices.min(transient.len_of(Axis(0)));
                Ok(NoiseModel {
                    source: NoiseSource::Background { slices },
                    axis: background_std(transient.view(), slices),
                })
            }
            (MeasurementMode::TimeResolved, _) => {
                log::warn!(
                    "only {} background slices, falling back to the legacy std",
                    background_slices
                );
                legacy()
            }
        }
    }

    /// Noise of the wavenumbers in `range`.
    pub fn slice(&self, range: Range<usize>) -> Result<ArrayView1<'_, f64>> {
        if range.start >= range.end || range.end > self.axis.len() {
            return Err(ProcessingError::Range {
                start: range.start,
                stop: range.end,
                available: self.axis.len(),
            });
        }
        Ok(self.axis.slice(s![range]))
    }
}

/// Population std along time of the real part of the first `slices` rows of a transient.
pub fn background_std(transient: ArrayView2<Complex64>, slices: usize) -> Array1<f64> {
    let rows = slices.min(transient.len_of(Axis(0)));
    transient
        .slice(s![..rows, ..])
        .mapv(|c| c.re)
        .std_axis(Axis(0), 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_container::{RawData, Transmission};
    use approx::assert_relative_eq;
    use ndarray::{array, Array2, Array3};

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    fn average_of(transmission: SpectralData, std: Option<Array1<f64>>) -> AcquisitionAverage {
        AcquisitionAverage {
            range: 0..2,
            transmission,
            std,
        }
    }

    #[test]
    fn test_background_std() {
        let transient = array![[c(1.0), c(2.0)], [c(3.0), c(2.0)], [c(100.0), c(-50.0)]];
        let std = background_std(transient.view(), 2);
        assert_relative_eq!(std[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(std[1], 0.0, epsilon = 1e-12);
        // more slices than rows uses the whole transient
        assert_eq!(background_std(transient.view(), 10).len(), 2);
    }

    #[test]
    fn test_propagated_std_is_preferred() {
        let raw = RawData::new(
            Transmission::TimeIntegrated(Array2::from_elem((2, 2), c(1.0))),
            array![1.0, 2.0],
        )
        .unwrap()
        .with_std_peak_acqs(Array2::from_elem((2, 2), 0.1))
        .unwrap()
        .with_std_peak(array![0.9, 0.9])
        .unwrap();
        let average = average_of(
            SpectralData::Spectrum(array![c(1.0), c(1.0)]),
            Some(array![0.07, 0.07]),
        );
        let noise =
            NoiseModel::select(&raw, AcquisitionMode::AscTimeIntegrated, &average, 0).unwrap();
        assert_eq!(noise.source, NoiseSource::Propagated);
        assert_eq!(noise.axis, array![0.07, 0.07]);
    }

    #[test]
    fn test_time_integrated_uses_legacy_std() {
        let transmission = Transmission::TimeIntegrated(Array2::from_elem((2, 2), c(1.0)));
        let raw = RawData::new(transmission.clone(), array![1.0, 2.0])
            .unwrap()
            .with_std_peak(array![0.2, 0.3])
            .unwrap();
        let average = average_of(SpectralData::Spectrum(array![c(1.0), c(1.0)]), None);
        let noise =
            NoiseModel::select(&raw, AcquisitionMode::PscTimeIntegrated, &average, 5).unwrap();
        assert_eq!(noise.source, NoiseSource::Legacy);
        assert_eq!(noise.slice(1..2).unwrap(), array![0.3]);
        assert!(noise.slice(1..3).is_err());

        let bare = RawData::new(transmission, array![1.0, 2.0]).unwrap();
        assert!(matches!(
            NoiseModel::select(&bare, AcquisitionMode::PscTimeIntegrated, &average, 5),
            Err(ProcessingError::MissingStd)
        ));
    }

    #[test]
    fn test_time_resolved_uses_background_slices() {
        let raw = RawData::new(
            Transmission::TimeResolved(Array3::from_elem((4, 2, 2), c(1.0))),
            array![1.0, 2.0],
        )
        .unwrap()
        .with_std_peak(array![0.5, 0.5])
        .unwrap();
        let transient = array![
            [c(1.0), c(1.0)],
            [c(1.2), c(1.0)],
            [c(0.8), c(1.0)],
            [c(5.0), c(5.0)]
        ];
        let average = average_of(SpectralData::Transient(transient), None);

        let noise =
            NoiseModel::select(&raw, AcquisitionMode::AscTimeResolved, &average, 3).unwrap();
        assert_eq!(noise.source, NoiseSource::Background { slices: 3 });
        assert_relative_eq!(noise.axis[0], (0.08f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(noise.axis[1], 0.0, epsilon = 1e-12);

        // a single background slice carries no spread
        let noise =
            NoiseModel::select(&raw, AcquisitionMode::AscTimeResolved, &average, 1).unwrap();
        assert_eq!(noise.source, NoiseSource::Legacy);
        assert_eq!(noise.axis, array![0.5, 0.5]);
    }
}
