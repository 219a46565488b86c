//! The processor ties a configuration and a raw data source to the processing stages and keeps
//! the derived arrays in a typed cache.

use crate::config::{AcquisitionMode, ConfigurationModel, MeasurementMode};
use crate::data_container::{RawDataSource, SpectralData, Transmission};
use crate::error::{ProcessingError, Result};
use crate::math_tools::{complex_to_real, convert_output, OutputType};
use crate::processing::averaging::{acquisition_average, resolve_range, AcquisitionAverage};
use crate::processing::calibration::calibrate_by_lag;
use crate::processing::noise::{NoiseModel, NoiseSource};
use crate::processing::normalization::unnormalize;
use crate::processing::smoothing::{
    smooth, IndividualInput, SmoothedTransmission, SmoothingParameters,
};
use crate::processing::time_resolved::TransientAnalysis;
use ndarray::{Array, Array1, Array2, ArrayView, ArrayView1, Dimension};
use num_complex::Complex64;
use std::ops::Range;
use std::time::Instant;

/// Named outputs of the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessedKey {
    AvgOfFiles,
    SpectralAvgOfFiles,
    /// Time-integrated measurements only.
    SpectralAvgOfIndividualFiles,
    StdAvgOfFiles,
}

impl ProcessedKey {
    pub fn suffix(&self) -> &'static str {
        match self {
            ProcessedKey::AvgOfFiles => "AvgOfFiles",
            ProcessedKey::SpectralAvgOfFiles => "SpectralAvgOfFiles",
            ProcessedKey::SpectralAvgOfIndividualFiles => "SpectralAvgOfIndividualFiles",
            ProcessedKey::StdAvgOfFiles => "AvgOfFiles",
        }
    }

    /// Output name, e.g. `transmissionAvgOfFiles` or `stdAvgOfFiles`.
    pub fn name(&self, measurement: MeasurementMode) -> String {
        match self {
            ProcessedKey::StdAvgOfFiles => format!("std{}", self.suffix()),
            _ => format!("{}{}", measurement.data_name(), self.suffix()),
        }
    }
}

/// Array stored under a [`ProcessedKey`].
#[derive(Clone, Debug, PartialEq)]
pub enum ProcessedArray {
    Complex1(Array1<Complex64>),
    Complex2(Array2<Complex64>),
    Real1(Array1<f64>),
    Real2(Array2<f64>),
}

impl From<SpectralData> for ProcessedArray {
    fn from(data: SpectralData) -> Self {
        match data {
            SpectralData::Spectrum(data) => ProcessedArray::Complex1(data),
            SpectralData::Transient(data) => ProcessedArray::Complex2(data),
        }
    }
}

/// A smoothing result with the parameters that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedSmoothing {
    /// Acquisition range of the smoothed average.
    pub range: Range<usize>,
    pub parameters: SmoothingParameters,
    pub noise_source: NoiseSource,
    pub result: SmoothedTransmission,
}

/// Derived arrays, one entry per operation.
///
/// Storing a new average drops everything derived from the previous one.
#[derive(Clone, Debug, Default)]
pub struct ProcessedCache {
    average: Option<AcquisitionAverage>,
    noise: Option<NoiseModel>,
    smoothed: Option<CachedSmoothing>,
}

impl ProcessedCache {
    pub fn average(&self) -> Option<&AcquisitionAverage> {
        self.average.as_ref()
    }

    pub fn noise(&self) -> Option<&NoiseModel> {
        self.noise.as_ref()
    }

    pub fn smoothed(&self) -> Option<&CachedSmoothing> {
        self.smoothed.as_ref()
    }

    fn store_average(&mut self, average: AcquisitionAverage) -> &AcquisitionAverage {
        self.noise = None;
        if self.smoothed.take().is_some() {
            log::debug!("dropped smoothed data of the previous average");
        }
        self.average.insert(average)
    }

    fn store_smoothed(&mut self, smoothed: CachedSmoothing) -> &CachedSmoothing {
        self.smoothed.insert(smoothed)
    }

    fn invalidate_smoothed(&mut self) {
        if self.smoothed.take().is_some() {
            log::debug!("dropped smoothed data");
        }
    }

    pub fn clear(&mut self) {
        *self = ProcessedCache::default();
    }
}

/// Post-processing of one measurement.
///
/// # Fields
/// - `config`: configuration collaborator.
/// - `source`: raw data collaborator.
/// - `mode`: acquisition mode, resolved once from `config`.
/// - `phase_drift_correction`: realize ASC data by magnitude instead of real part.
/// - `wn_axis`: wavenumber axis, replaced by calibration.
/// - `cache`: derived arrays.
pub struct SpectrumProcessor<C: ConfigurationModel, S: RawDataSource> {
    config: C,
    source: S,
    mode: AcquisitionMode,
    phase_drift_correction: bool,
    wn_axis: Array1<f64>,
    cache: ProcessedCache,
}

impl<C: ConfigurationModel, S: RawDataSource> SpectrumProcessor<C, S> {
    pub fn new(config: C, source: S) -> Result<Self> {
        let mode = config.acquisition_mode()?;
        let data_mode = source.transmission().mode();
        if data_mode != mode.measurement() {
            return Err(ProcessingError::Shape(format!(
                "{} configuration but {} transmission data",
                mode.measurement(),
                data_mode
            )));
        }
        log::info!(
            "{} measurement with {} wavenumbers and {} acquisitions",
            mode,
            source.transmission().num_wavenumbers(),
            source.transmission().num_acquisitions()
        );
        let wn_axis = source.wn_axis().clone();
        Ok(SpectrumProcessor {
            config,
            source,
            mode,
            phase_drift_correction: false,
            wn_axis,
            cache: ProcessedCache::default(),
        })
    }

    /// Realize ASC data by its magnitude, which survives a phase drift between background and
    /// sample. Clears the cache.
    pub fn with_phase_drift_correction(mut self, enabled: bool) -> Self {
        self.phase_drift_correction = enabled;
        self.cache.clear();
        self
    }

    pub fn mode(&self) -> AcquisitionMode {
        self.mode
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &ProcessedCache {
        &self.cache
    }

    pub fn wn_axis(&self) -> &Array1<f64> {
        &self.wn_axis
    }

    /// Averages the acquisitions `[start, stop)`, by default all of them.
    pub fn average(
        &mut self,
        start: Option<usize>,
        stop: Option<usize>,
    ) -> Result<&AcquisitionAverage> {
        let range = resolve_range(start, stop, self.source.transmission().num_acquisitions())?;
        let timer = Instant::now();
        let average = acquisition_average(
            &self.source,
            self.mode,
            self.phase_drift_correction,
            range,
        )?;
        log::info!(
            "averaged acquisitions {}..{} in {:?}",
            average.range.start,
            average.range.end,
            timer.elapsed()
        );
        Ok(self.cache.store_average(average))
    }

    fn ensure_average(&mut self) -> Result<()> {
        if self.cache.average.is_none() {
            log::debug!("no average yet, averaging all acquisitions");
            self.average(None, None)?;
        }
        Ok(())
    }

    fn ensure_noise(&mut self) -> Result<&NoiseModel> {
        if self.cache.noise.is_none() {
            let average = self.cache.average.as_ref().ok_or(ProcessingError::NotAveraged)?;
            let noise = NoiseModel::select(
                &self.source,
                self.mode,
                average,
                self.config.background_slices(),
            )?;
            log::debug!("noise axis from {}", noise.source);
            self.cache.noise = Some(noise);
        }
        self.cache.noise.as_ref().ok_or(ProcessingError::NotAveraged)
    }

    /// Relative std per wavenumber, restricted to the wavenumber indices in `wn_range`.
    ///
    /// Averages all acquisitions first if nothing was averaged yet.
    pub fn std_axis(&mut self, wn_range: Option<Range<usize>>) -> Result<Array1<f64>> {
        self.ensure_average()?;
        let noise = self.ensure_noise()?;
        match wn_range {
            Some(range) => Ok(noise.slice(range)?.to_owned()),
            None => Ok(noise.axis.clone()),
        }
    }

    /// Smooths the current average across wavenumbers.
    ///
    /// Averages all acquisitions first if nothing was averaged yet. Time-integrated measurements
    /// additionally get every acquisition smoothed on its own, regardless of the averaged range,
    /// so the individual output stays aligned with the acquisition time axis.
    pub fn smooth(&mut self, parameters: SmoothingParameters) -> Result<&CachedSmoothing> {
        self.ensure_average()?;
        self.ensure_noise()?;
        let timer = Instant::now();
        let (Some(average), Some(noise)) = (self.cache.average.as_ref(), self.cache.noise.as_ref())
        else {
            return Err(ProcessingError::NotAveraged);
        };

        let range = average.range.clone();
        let individual = match self.source.transmission() {
            Transmission::TimeIntegrated(data) => Some(IndividualInput {
                transmission: data.view(),
                std_acqs: self.source.std_peak_acqs().map(|std| std.view()),
            }),
            Transmission::TimeResolved(_) => None,
        };
        let result = smooth(
            &average.transmission,
            noise.axis.view(),
            self.wn_axis.view(),
            &parameters,
            self.mode.averaging_rule(),
            individual,
        )?;
        log::info!(
            "smoothed {} wavenumbers with a {} kernel in {:?}",
            result.data.num_wavenumbers(),
            parameters.kernel,
            timer.elapsed()
        );

        let entry = CachedSmoothing {
            range,
            parameters,
            noise_source: noise.source,
            result,
        };
        Ok(self.cache.store_smoothed(entry))
    }

    /// Transmission with the background normalization undone.
    pub fn unnormalized(&self) -> Result<Transmission> {
        let normalization = self.source.normalization_vector().ok_or_else(|| {
            ProcessingError::InvalidParameter(
                "the measurement has no normalization vector".to_string(),
            )
        })?;
        unnormalize(self.source.transmission(), normalization.view())
    }

    /// Calibrates the wavenumber axis against a calibrated reference measurement.
    ///
    /// The smoothed data depends on the axis spacing and is dropped.
    pub fn calibrate(
        &mut self,
        calib_axis: ArrayView1<f64>,
        calib_amp: ArrayView1<f64>,
    ) -> Result<&Array1<f64>> {
        let measured = self.source.peak_mean_amp().ok_or_else(|| {
            ProcessingError::InvalidParameter(
                "the measurement has no peak mean amplitude".to_string(),
            )
        })?;
        let (axis, _) = calibrate_by_lag(calib_axis, calib_amp, measured.view())?;
        if axis.len() != self.wn_axis.len() {
            return Err(ProcessingError::Shape(format!(
                "calibrated axis has {} entries, expected {}",
                axis.len(),
                self.wn_axis.len()
            )));
        }
        self.wn_axis = axis;
        self.cache.invalidate_smoothed();
        Ok(&self.wn_axis)
    }

    /// Analysis of the most recent transient, smoothed if available.
    pub fn transient_analysis(&mut self) -> Result<TransientAnalysis<'_>> {
        if self.mode.measurement() != MeasurementMode::TimeResolved {
            return Err(ProcessingError::ModeMismatch("time-resolved analysis"));
        }
        if self.cache.average.is_none() {
            return Err(ProcessingError::NotAveraged);
        }
        self.ensure_noise()?;

        let time_axis = self.source.time_axis().ok_or_else(|| {
            ProcessingError::InvalidParameter("the measurement has no time axis".to_string())
        })?;
        let latest = match (&self.cache.smoothed, &self.cache.average) {
            (Some(smoothed), _) => &smoothed.result.data,
            (None, Some(average)) => &average.transmission,
            (None, None) => return Err(ProcessingError::NotAveraged),
        };
        let transient = latest
            .as_transient()
            .ok_or(ProcessingError::ModeMismatch("time-resolved analysis"))?;
        let noise = self.cache.noise.as_ref().ok_or(ProcessingError::NotAveraged)?;
        TransientAnalysis::new(
            transient.view(),
            time_axis.view(),
            self.wn_axis.view(),
            noise.axis.view(),
            self.mode.detection(),
            self.phase_drift_correction,
        )
    }

    /// Array stored under `key`, if it was computed.
    pub fn get(&self, key: ProcessedKey) -> Option<ProcessedArray> {
        match key {
            ProcessedKey::AvgOfFiles => self
                .cache
                .average
                .as_ref()
                .map(|average| average.transmission.clone().into()),
            ProcessedKey::StdAvgOfFiles => self
                .cache
                .average
                .as_ref()
                .and_then(|average| average.std.clone())
                .map(ProcessedArray::Real1),
            ProcessedKey::SpectralAvgOfFiles => self
                .cache
                .smoothed
                .as_ref()
                .map(|smoothed| smoothed.result.data.clone().into()),
            ProcessedKey::SpectralAvgOfIndividualFiles => self
                .cache
                .smoothed
                .as_ref()
                .and_then(|smoothed| smoothed.result.individual.clone())
                .map(ProcessedArray::Complex2),
        }
    }

    /// Realizes complex transmission and expresses it as `output`.
    pub fn realize<D: Dimension>(
        &self,
        data: ArrayView<Complex64, D>,
        output: OutputType,
    ) -> Array<f64, D> {
        let transmission =
            complex_to_real(data, self.mode.detection(), self.phase_drift_correction);
        convert_output(transmission.view(), OutputType::Transmission, output)
    }

    /// Complex array stored under `key`, realized and expressed as `output`.
    pub fn realized(&self, key: ProcessedKey, output: OutputType) -> Option<ProcessedArray> {
        match self.get(key)? {
            ProcessedArray::Complex1(data) => {
                Some(ProcessedArray::Real1(self.realize(data.view(), output)))
            }
            ProcessedArray::Complex2(data) => {
                Some(ProcessedArray::Real2(self.realize(data.view(), output)))
            }
            ProcessedArray::Real1(_) | ProcessedArray::Real2(_) => None,
        }
    }

    /// All computed arrays with their output names.
    pub fn outputs(&self) -> Vec<(String, ProcessedArray)> {
        let measurement = self.mode.measurement();
        [
            ProcessedKey::AvgOfFiles,
            ProcessedKey::StdAvgOfFiles,
            ProcessedKey::SpectralAvgOfFiles,
            ProcessedKey::SpectralAvgOfIndividualFiles,
        ]
        .into_iter()
        .filter_map(|key| self.get(key).map(|array| (key.name(measurement), array)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Configuration;
    use crate::data_container::RawData;
    use crate::processing::smoothing::SmoothingKernel;
    use approx::assert_relative_eq;
    use ndarray::{array, Array, Array3};

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn time_integrated(module_id: &str) -> SpectrumProcessor<Configuration, RawData> {
        let config = Configuration {
            module_id: module_id.to_string(),
            processor: "LongTerm".to_string(),
            ..Configuration::default()
        };
        let data =
            Array2::from_shape_fn((6, 4), |(k, a)| c(0.9 + 0.01 * k as f64, 0.02 * a as f64));
        let wn_axis = Array::linspace(1000.0, 1002.5, 6);
        let raw = RawData::new(Transmission::TimeIntegrated(data), wn_axis)
            .unwrap()
            .with_std_peak_acqs(Array2::from_elem((6, 4), 0.02))
            .unwrap()
            .with_peak_mean_amp(array![0.0, 1.0, 5.0, 1.0, 0.0, 0.0])
            .unwrap();
        SpectrumProcessor::new(config, raw).unwrap()
    }

    fn time_resolved() -> SpectrumProcessor<Configuration, RawData> {
        let config = Configuration {
            module_id: "IRis-F1-ASC".to_string(),
            processor: "TimeResolved".to_string(),
            sample_rate: 2e9,
            // 2.5 interleave steps of 4.096 us
            pre_trigger_samples: 2e9 * 4.096e-6 * 2.5,
            ..Configuration::default()
        };
        let mut data = Array3::from_elem((5, 3, 2), c(1.0, 0.0));
        data[[0, 0, 0]] = c(1.1, 0.0);
        data[[1, 0, 0]] = c(0.9, 0.0);
        let raw = RawData::new(Transmission::TimeResolved(data), array![1000.0, 1000.5, 1001.0])
            .unwrap()
            .with_time_axis(array![-2e-6, -1e-6, 0.0, 1e-6, 2e-6])
            .unwrap()
            .with_normalization_vector(Array2::from_elem((3, 2), c(2.0, 0.0)))
            .unwrap();
        SpectrumProcessor::new(config, raw).unwrap()
    }

    #[test]
    fn test_output_names() {
        assert_eq!(
            ProcessedKey::AvgOfFiles.name(MeasurementMode::TimeIntegrated),
            "transmissionAvgOfFiles"
        );
        assert_eq!(
            ProcessedKey::SpectralAvgOfFiles.name(MeasurementMode::TimeResolved),
            "transientTransSpectralAvgOfFiles"
        );
        assert_eq!(
            ProcessedKey::StdAvgOfFiles.name(MeasurementMode::TimeResolved),
            "stdAvgOfFiles"
        );
    }

    #[test]
    fn test_new_rejects_inconsistent_inputs() {
        let raw = RawData::new(
            Transmission::TimeIntegrated(Array2::zeros((2, 2))),
            array![1.0, 2.0],
        )
        .unwrap();
        let config = Configuration {
            module_id: "unknown".to_string(),
            ..Configuration::default()
        };
        assert!(matches!(
            SpectrumProcessor::new(config, raw.clone()),
            Err(ProcessingError::Configuration(_))
        ));
        let config = Configuration {
            processor: "TimeResolved".to_string(),
            ..Configuration::default()
        };
        assert!(matches!(
            SpectrumProcessor::new(config, raw),
            Err(ProcessingError::Shape(_))
        ));
    }

    #[test]
    fn test_time_integrated_pipeline_outputs() {
        let mut processor = time_integrated("ASC");
        processor.average(Some(1), Some(3)).unwrap();
        processor
            .smooth(SmoothingParameters {
                kernel: SmoothingKernel::Box { half_width: 1 },
                threshold: 1.0,
            })
            .unwrap();

        let names: Vec<String> = processor.outputs().into_iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![
                "transmissionAvgOfFiles",
                "stdAvgOfFiles",
                "transmissionSpectralAvgOfFiles",
                "transmissionSpectralAvgOfIndividualFiles"
            ]
        );
        let Some(ProcessedArray::Complex2(individual)) =
            processor.get(ProcessedKey::SpectralAvgOfIndividualFiles)
        else {
            panic!("expected individually smoothed acquisitions");
        };
        // all acquisitions, not only the averaged ones
        assert_eq!(individual.dim(), (4, 6));
        assert_relative_eq!(individual[[0, 0]].im, 0.0, epsilon = 1e-12);
        assert_relative_eq!(individual[[3, 0]].im, 0.06, epsilon = 1e-12);

        let Some(ProcessedArray::Complex1(average)) = processor.get(ProcessedKey::AvgOfFiles) else {
            panic!("expected an averaged spectrum");
        };
        assert_relative_eq!(average[0].im, 0.03, epsilon = 1e-12);
        assert_eq!(processor.cache().smoothed().unwrap().range, 1..3);
    }

    #[test]
    fn test_smoothing_without_average_uses_all_acquisitions() {
        let mut processor = time_integrated("PSC");
        let smoothed = processor.smooth(SmoothingParameters::default()).unwrap();
        assert_eq!(smoothed.range, 0..4);
        assert_eq!(smoothed.noise_source, NoiseSource::Propagated);
        assert_eq!(processor.cache().average().unwrap().range, 0..4);
    }

    #[test]
    fn test_default_smoothing_of_a_single_line() {
        let raw = RawData::new(
            Transmission::TimeIntegrated(array![[
                c(1.0, 0.0),
                c(2.0, 0.0),
                c(3.0, 0.0),
                c(4.0, 0.0)
            ]]),
            array![1000.0],
        )
        .unwrap()
        .with_std_peak(array![0.01])
        .unwrap();
        let mut processor = SpectrumProcessor::new(Configuration::default(), raw).unwrap();
        let smoothed = processor.smooth(SmoothingParameters::default()).unwrap();
        assert_eq!(
            smoothed.result.data,
            SpectralData::Spectrum(array![c(2.5, 0.0)])
        );
    }

    #[test]
    fn test_reaveraging_drops_smoothed_data() {
        let mut processor = time_integrated("ASC");
        processor.smooth(SmoothingParameters::default()).unwrap();
        assert!(processor.get(ProcessedKey::SpectralAvgOfFiles).is_some());

        processor.average(None, Some(2)).unwrap();
        assert!(processor.cache().smoothed().is_none());
        assert!(processor.get(ProcessedKey::SpectralAvgOfFiles).is_none());
        assert_eq!(processor.outputs().len(), 2);

        assert!(matches!(
            processor.average(Some(3), Some(9)),
            Err(ProcessingError::Range { .. })
        ));
    }

    #[test]
    fn test_std_axis_slices_wavenumbers() {
        let mut processor = time_integrated("ASC");
        let full = processor.std_axis(None).unwrap();
        assert_eq!(full.len(), 6);
        let part = processor.std_axis(Some(2..4)).unwrap();
        assert_eq!(part.len(), 2);
        assert_relative_eq!(part[0], full[2]);
        assert!(processor.std_axis(Some(4..7)).is_err());
    }

    #[test]
    fn test_calibration_replaces_axis_and_drops_smoothed_data() {
        let mut processor = time_integrated("ASC");
        processor.smooth(SmoothingParameters::default()).unwrap();
        let calib_axis = Array::linspace(999.0, 1001.5, 6);
        let calib_amp = array![0.0, 0.0, 0.0, 1.0, 5.0, 1.0];
        let axis = processor.calibrate(calib_axis.view(), calib_amp.view()).unwrap();
        assert_relative_eq!(axis[2], 1001.0, epsilon = 1e-9);
        assert!(processor.cache().smoothed().is_none());
        assert!(processor.cache().average().is_some());
    }

    #[test]
    fn test_time_resolved_pipeline() {
        let mut processor = time_resolved();
        assert!(matches!(
            processor.transient_analysis(),
            Err(ProcessingError::NotAveraged)
        ));

        processor.average(None, None).unwrap();
        let std = processor.std_axis(None).unwrap();
        assert_eq!(
            processor.cache().noise().unwrap().source,
            NoiseSource::Background { slices: 2 }
        );
        // averaged first column is 1.05, 0.95 in the background slices
        assert_relative_eq!(std[0], 0.05, epsilon = 1e-12);
        assert_relative_eq!(std[1], 0.0, epsilon = 1e-12);

        let smoothed = processor
            .smooth(SmoothingParameters {
                kernel: SmoothingKernel::Box { half_width: 1 },
                threshold: 1.0,
            })
            .unwrap();
        assert!(smoothed.result.individual.is_none());

        let names: Vec<String> = processor.outputs().into_iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec!["transientTransAvgOfFiles", "transientTransSpectralAvgOfFiles"]
        );

        let analysis = processor.transient_analysis().unwrap();
        assert_eq!(analysis.time_range_indices(0.0, 2e-6).unwrap(), 2..5);
        let spectrum = analysis.complex_spectrum(0.0, 2e-6).unwrap();
        assert_relative_eq!(spectrum[1].re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_realized_outputs() {
        let mut processor = time_integrated("PSC");
        processor.average(None, None).unwrap();
        let Some(ProcessedArray::Real1(absorption)) =
            processor.realized(ProcessedKey::AvgOfFiles, OutputType::Absorption)
        else {
            panic!("expected a realized spectrum");
        };
        let Some(ProcessedArray::Complex1(average)) = processor.get(ProcessedKey::AvgOfFiles) else {
            panic!("expected an averaged spectrum");
        };
        assert_relative_eq!(absorption[3], 1.0 - average[3].norm_sqr(), epsilon = 1e-12);
        assert!(processor
            .realized(ProcessedKey::StdAvgOfFiles, OutputType::Absorption)
            .is_none());
        assert!(processor
            .realized(ProcessedKey::SpectralAvgOfFiles, OutputType::Transmission)
            .is_none());
    }

    #[test]
    fn test_time_integrated_has_no_transient_analysis() {
        let mut processor = time_integrated("ASC");
        processor.average(None, None).unwrap();
        assert!(matches!(
            processor.transient_analysis(),
            Err(ProcessingError::ModeMismatch(_))
        ));
    }

    #[test]
    fn test_unnormalized() {
        let processor = time_resolved();
        let Transmission::TimeResolved(data) = processor.unnormalized().unwrap() else {
            panic!("expected time-resolved data");
        };
        assert_eq!(data[[4, 2, 1]], c(2.0, 0.0));
        assert!(time_integrated("ASC").unnormalized().is_err());
    }
}
