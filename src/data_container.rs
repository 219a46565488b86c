//! This module defines the data structures for raw and derived measurement data: the
//! per-acquisition transmission cube, its noise arrays and axes, and the averaged spectra or
//! transients derived from them.

use crate::config::MeasurementMode;
use crate::error::{ProcessingError, Result};
use ndarray::{Array1, Array2, Array3, ArrayView2, Axis};
use num_complex::Complex64;

/// Raw complex transmission, one entry per acquisition along the last axis.
#[derive(Clone, Debug, PartialEq)]
pub enum Transmission {
    /// Shape `[wavenumber, acquisition]`.
    TimeIntegrated(Array2<Complex64>),
    /// Shape `[time, wavenumber, acquisition]`.
    TimeResolved(Array3<Complex64>),
}

impl Transmission {
    pub fn mode(&self) -> MeasurementMode {
        match self {
            Transmission::TimeIntegrated(_) => MeasurementMode::TimeIntegrated,
            Transmission::TimeResolved(_) => MeasurementMode::TimeResolved,
        }
    }

    pub fn num_acquisitions(&self) -> usize {
        match self {
            Transmission::TimeIntegrated(data) => data.len_of(Axis(1)),
            Transmission::TimeResolved(data) => data.len_of(Axis(2)),
        }
    }

    pub fn num_wavenumbers(&self) -> usize {
        match self {
            Transmission::TimeIntegrated(data) => data.len_of(Axis(0)),
            Transmission::TimeResolved(data) => data.len_of(Axis(1)),
        }
    }

    /// Number of time slices, `None` for time-integrated data.
    pub fn num_time_slices(&self) -> Option<usize> {
        match self {
            Transmission::TimeIntegrated(_) => None,
            Transmission::TimeResolved(data) => Some(data.len_of(Axis(0))),
        }
    }
}

/// One averaged spectrum or transient.
#[derive(Clone, Debug, PartialEq)]
pub enum SpectralData {
    /// Shape `[wavenumber]`.
    Spectrum(Array1<Complex64>),
    /// Shape `[time, wavenumber]`.
    Transient(Array2<Complex64>),
}

impl SpectralData {
    pub fn num_wavenumbers(&self) -> usize {
        match self {
            SpectralData::Spectrum(data) => data.len(),
            SpectralData::Transient(data) => data.len_of(Axis(1)),
        }
    }

    /// View with shape `[rows, wavenumber]`; a spectrum is a single row.
    pub fn rows(&self) -> ArrayView2<'_, Complex64> {
        match self {
            SpectralData::Spectrum(data) => data.view().insert_axis(Axis(0)),
            SpectralData::Transient(data) => data.view(),
        }
    }

    /// Rebuilds the same variant as `self` from `[rows, wavenumber]` data.
    pub fn with_rows(&self, rows: Array2<Complex64>) -> SpectralData {
        match self {
            SpectralData::Spectrum(_) => SpectralData::Spectrum(rows.index_axis_move(Axis(0), 0)),
            SpectralData::Transient(_) => SpectralData::Transient(rows),
        }
    }

    pub fn as_transient(&self) -> Option<&Array2<Complex64>> {
        match self {
            SpectralData::Transient(data) => Some(data),
            SpectralData::Spectrum(_) => None,
        }
    }
}

/// Raw data collaborator consumed by the processor.
pub trait RawDataSource {
    fn transmission(&self) -> &Transmission;

    /// Relative standard deviation per wavenumber and acquisition, `[wavenumber, acquisition]`.
    fn std_peak_acqs(&self) -> Option<&Array2<f64>>;

    /// Aggregate standard deviation per wavenumber written by older processors.
    fn std_peak(&self) -> Option<&Array1<f64>>;

    fn wn_axis(&self) -> &Array1<f64>;

    fn time_axis(&self) -> Option<&Array1<f64>>;

    /// Background normalization per wavenumber and acquisition, `[wavenumber, acquisition]`.
    fn normalization_vector(&self) -> Option<&Array2<Complex64>>;

    fn peak_mean_amp(&self) -> Option<&Array1<f64>>;
}

/// In-memory measurement data, loaded once and immutable afterwards.
///
/// # Fields
/// - `transmission`: complex transmission cube.
/// - `std_peak_acqs`: per-acquisition relative standard deviation (newer files only).
/// - `std_peak`: aggregate standard deviation (older files).
/// - `wn_axis`: wavenumber axis in cm^-1.
/// - `time_axis`: time axis in s for time-resolved data, acquisition time axis for
///   time-integrated data.
/// - `normalization_vector`: background the transmission was normalized to.
/// - `peak_mean_amp`: mean peak amplitude per comb line, used for calibration.
#[derive(Clone, Debug)]
pub struct RawData {
    transmission: Transmission,
    std_peak_acqs: Option<Array2<f64>>,
    std_peak: Option<Array1<f64>>,
    wn_axis: Array1<f64>,
    time_axis: Option<Array1<f64>>,
    normalization_vector: Option<Array2<Complex64>>,
    peak_mean_amp: Option<Array1<f64>>,
}

impl RawData {
    pub fn new(transmission: Transmission, wn_axis: Array1<f64>) -> Result<RawData> {
        if wn_axis.len() != transmission.num_wavenumbers() {
            return Err(ProcessingError::Shape(format!(
                "wavenumber axis has {} entries but the transmission has {} wavenumbers",
                wn_axis.len(),
                transmission.num_wavenumbers()
            )));
        }
        Ok(RawData {
            transmission,
            std_peak_acqs: None,
            std_peak: None,
            wn_axis,
            time_axis: None,
            normalization_vector: None,
            peak_mean_amp: None,
        })
    }

    fn per_line_shape(&self) -> (usize, usize) {
        (
            self.transmission.num_wavenumbers(),
            self.transmission.num_acquisitions(),
        )
    }

    pub fn with_std_peak_acqs(mut self, std_peak_acqs: Array2<f64>) -> Result<RawData> {
        if std_peak_acqs.dim() != self.per_line_shape() {
            return Err(ProcessingError::Shape(format!(
                "per-acquisition std has shape {:?}, expected {:?}",
                std_peak_acqs.dim(),
                self.per_line_shape()
            )));
        }
        self.std_peak_acqs = Some(std_peak_acqs);
        Ok(self)
    }

    pub fn with_std_peak(mut self, std_peak: Array1<f64>) -> Result<RawData> {
        if std_peak.len() != self.transmission.num_wavenumbers() {
            return Err(ProcessingError::Shape(format!(
                "aggregate std has {} entries, expected {}",
                std_peak.len(),
                self.transmission.num_wavenumbers()
            )));
        }
        self.std_peak = Some(std_peak);
        Ok(self)
    }

    pub fn with_time_axis(mut self, time_axis: Array1<f64>) -> Result<RawData> {
        let expected = match &self.transmission {
            Transmission::TimeResolved(data) => data.len_of(Axis(0)),
            Transmission::TimeIntegrated(data) => data.len_of(Axis(1)),
        };
        if time_axis.len() != expected {
            return Err(ProcessingError::Shape(format!(
                "time axis has {} entries, expected {}",
                time_axis.len(),
                expected
            )));
        }
        self.time_axis = Some(time_axis);
        Ok(self)
    }

    pub fn with_normalization_vector(
        mut self,
        normalization: Array2<Complex64>,
    ) -> Result<RawData> {
        if normalization.dim() != self.per_line_shape() {
            return Err(ProcessingError::Shape(format!(
                "normalization vector has shape {:?}, expected {:?}",
                normalization.dim(),
                self.per_line_shape()
            )));
        }
        self.normalization_vector = Some(normalization);
        Ok(self)
    }

    pub fn with_peak_mean_amp(mut self, peak_mean_amp: Array1<f64>) -> Result<RawData> {
        if peak_mean_amp.len() != self.transmission.num_wavenumbers() {
            return Err(ProcessingError::Shape(format!(
                "peak mean amplitude has {} entries, expected {}",
                peak_mean_amp.len(),
                self.transmission.num_wavenumbers()
            )));
        }
        self.peak_mean_amp = Some(peak_mean_amp);
        Ok(self)
    }
}

impl RawDataSource for RawData {
    fn transmission(&self) -> &Transmission {
        &self.transmission
    }

    fn std_peak_acqs(&self) -> Option<&Array2<f64>> {
        self.std_peak_acqs.as_ref()
    }

    fn std_peak(&self) -> Option<&Array1<f64>> {
        self.std_peak.as_ref()
    }

    fn wn_axis(&self) -> &Array1<f64> {
        &self.wn_axis
    }

    fn time_axis(&self) -> Option<&Array1<f64>> {
        self.time_axis.as_ref()
    }

    fn normalization_vector(&self) -> Option<&Array2<Complex64>> {
        self.normalization_vector.as_ref()
    }

    fn peak_mean_amp(&self) -> Option<&Array1<f64>> {
        self.peak_mean_amp.as_ref()
    }
}

/// Builds the time axis of a time-integrated measurement from acquisition timestamps.
///
/// Timestamps are given in microseconds. The result is in seconds, relative to the first
/// acquisition and shifted so that the first acquisition after the trigger is at t = 0.
pub fn acquisition_time_axis(timestamps_us: &[f64], pretrigger_acquisitions: usize) -> Array1<f64> {
    let Some(&first) = timestamps_us.first() else {
        return Array1::zeros(0);
    };
    let relative: Array1<f64> = timestamps_us.iter().map(|t| (t - first) / 1e6).collect();
    let offset = match relative.get(pretrigger_acquisitions) {
        Some(offset) => *offset,
        None => {
            log::warn!(
                "no acquisition at pretrigger index {}, the time axis may not start at the trigger",
                pretrigger_acquisitions
            );
            0.0
        }
    };
    relative.mapv(|t| t - offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array};

    #[test]
    fn test_transmission_dimensions() {
        let ti = Transmission::TimeIntegrated(Array2::zeros((5, 3)));
        assert_eq!(ti.num_wavenumbers(), 5);
        assert_eq!(ti.num_acquisitions(), 3);
        assert_eq!(ti.num_time_slices(), None);
        assert_eq!(ti.mode(), MeasurementMode::TimeIntegrated);

        let tr = Transmission::TimeResolved(Array3::zeros((7, 5, 3)));
        assert_eq!(tr.num_wavenumbers(), 5);
        assert_eq!(tr.num_acquisitions(), 3);
        assert_eq!(tr.num_time_slices(), Some(7));
    }

    #[test]
    fn test_spectral_data_rows() {
        let spectrum =
            SpectralData::Spectrum(array![Complex64::new(1.0, 0.0), Complex64::new(2.0, 0.0)]);
        assert_eq!(spectrum.rows().dim(), (1, 2));
        let rebuilt = spectrum.with_rows(spectrum.rows().mapv(|c| c * 2.0));
        assert_eq!(
            rebuilt,
            SpectralData::Spectrum(array![Complex64::new(2.0, 0.0), Complex64::new(4.0, 0.0)])
        );

        let transient = SpectralData::Transient(Array2::zeros((4, 2)));
        assert_eq!(transient.rows().dim(), (4, 2));
        assert_eq!(transient.num_wavenumbers(), 2);
        assert!(transient.as_transient().is_some());
    }

    #[test]
    fn test_raw_data_validates_shapes() {
        let transmission = Transmission::TimeIntegrated(Array2::zeros((4, 2)));
        assert!(RawData::new(transmission.clone(), Array::linspace(0.0, 1.0, 3)).is_err());

        let raw = RawData::new(transmission, Array::linspace(0.0, 1.0, 4)).unwrap();
        assert!(raw.clone().with_std_peak_acqs(Array2::ones((2, 4))).is_err());
        assert!(raw.clone().with_std_peak(Array1::ones(3)).is_err());
        assert!(raw.clone().with_time_axis(Array1::zeros(2)).is_ok());

        let raw = raw.with_std_peak_acqs(Array2::ones((4, 2))).unwrap();
        assert!(raw.std_peak_acqs().is_some());
        assert!(raw.std_peak().is_none());
    }

    #[test]
    fn test_acquisition_time_axis() {
        let axis = acquisition_time_axis(&[5e6, 6e6, 8e6, 11e6], 1);
        assert_relative_eq!(axis[0], -1.0);
        assert_relative_eq!(axis[1], 0.0);
        assert_relative_eq!(axis[3], 5.0);

        // out-of-range pretrigger index keeps the first acquisition at zero
        let axis = acquisition_time_axis(&[5e6, 6e6], 10);
        assert_relative_eq!(axis[0], 0.0);
        assert_relative_eq!(axis[1], 1.0);
        assert_eq!(acquisition_time_axis(&[], 0).len(), 0);
    }
}
