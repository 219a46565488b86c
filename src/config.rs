//! Instrument configuration and the measurement modes derived from it.
//!
//! The detection mode (ASC/PSC) and measurement mode (time-resolved or
//! time-integrated) are resolved once into an [`AcquisitionMode`] and carried
//! as an immutable value through every processing stage.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Detection configuration of the instrument module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMode {
    /// Amplitude-sensitive configuration.
    Asc,
    /// Phase-sensitive configuration.
    Psc,
}

impl DetectionMode {
    /// Reads the detection mode from the module identifier, e.g. `"IRis-F1-ASC"`.
    pub fn from_module_id(module_id: &str) -> Result<Self, ConfigurationError> {
        if module_id.contains("ASC") {
            Ok(DetectionMode::Asc)
        } else if module_id.contains("PSC") {
            Ok(DetectionMode::Psc)
        } else {
            Err(ConfigurationError::UnknownDetectionMode(
                module_id.to_string(),
            ))
        }
    }
}

impl Display for DetectionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectionMode::Asc => write!(f, "ASC"),
            DetectionMode::Psc => write!(f, "PSC"),
        }
    }
}

/// Whether a measurement keeps a fast time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementMode {
    TimeResolved,
    TimeIntegrated,
}

impl MeasurementMode {
    /// Maps the processor name stored in the measurement file to a mode.
    pub fn from_processor(processor: &str) -> Result<Self, ConfigurationError> {
        match processor {
            "TimeResolved" | "OptimizedTimeResolved" => Ok(MeasurementMode::TimeResolved),
            "TimeIntegrated" | "LongTerm" | "StepSweep" | "OptimizedLongTerm"
            | "OptimizedStepSweep" => Ok(MeasurementMode::TimeIntegrated),
            other => Err(ConfigurationError::UnknownProcessor(other.to_string())),
        }
    }

    /// Conventional name of the raw transmission array for this mode.
    pub fn data_name(&self) -> &'static str {
        match self {
            MeasurementMode::TimeResolved => "transientTrans",
            MeasurementMode::TimeIntegrated => "transmission",
        }
    }
}

impl Display for MeasurementMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MeasurementMode::TimeResolved => write!(f, "time-resolved"),
            MeasurementMode::TimeIntegrated => write!(f, "time-integrated"),
        }
    }
}

/// How complex samples are combined when averaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AveragingRule {
    /// Plain (weighted) complex mean.
    Coherent,
    /// Magnitude and phase averaged separately: `mean(|x|) * exp(i * arg(mean(x)))`.
    MagnitudePhase,
}

/// Every combination of detection and measurement mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionMode {
    AscTimeResolved,
    AscTimeIntegrated,
    PscTimeResolved,
    PscTimeIntegrated,
}

impl AcquisitionMode {
    pub fn new(detection: DetectionMode, measurement: MeasurementMode) -> Self {
        match (detection, measurement) {
            (DetectionMode::Asc, MeasurementMode::TimeResolved) => AcquisitionMode::AscTimeResolved,
            (DetectionMode::Asc, MeasurementMode::TimeIntegrated) => {
                AcquisitionMode::AscTimeIntegrated
            }
            (DetectionMode::Psc, MeasurementMode::TimeResolved) => AcquisitionMode::PscTimeResolved,
            (DetectionMode::Psc, MeasurementMode::TimeIntegrated) => {
                AcquisitionMode::PscTimeIntegrated
            }
        }
    }

    pub fn detection(&self) -> DetectionMode {
        match self {
            AcquisitionMode::AscTimeResolved | AcquisitionMode::AscTimeIntegrated => {
                DetectionMode::Asc
            }
            AcquisitionMode::PscTimeResolved | AcquisitionMode::PscTimeIntegrated => {
                DetectionMode::Psc
            }
        }
    }

    pub fn measurement(&self) -> MeasurementMode {
        match self {
            AcquisitionMode::AscTimeResolved | AcquisitionMode::PscTimeResolved => {
                MeasurementMode::TimeResolved
            }
            AcquisitionMode::AscTimeIntegrated | AcquisitionMode::PscTimeIntegrated => {
                MeasurementMode::TimeIntegrated
            }
        }
    }

    /// Averaging rule used both across acquisitions and across wavenumbers.
    ///
    /// Time-resolved PSC data is normalized to a constant background of 1, so the
    /// coherent mean stays valid there; only time-integrated PSC data needs the
    /// magnitude/phase split.
    pub fn averaging_rule(&self) -> AveragingRule {
        match self {
            AcquisitionMode::AscTimeResolved
            | AcquisitionMode::AscTimeIntegrated
            | AcquisitionMode::PscTimeResolved => AveragingRule::Coherent,
            AcquisitionMode::PscTimeIntegrated => AveragingRule::MagnitudePhase,
        }
    }
}

impl Display for AcquisitionMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.detection(), self.measurement())
    }
}

/// Configuration collaborator consumed by the processor.
pub trait ConfigurationModel {
    fn detection_mode(&self) -> Result<DetectionMode, ConfigurationError>;

    fn measurement_mode(&self) -> Result<MeasurementMode, ConfigurationError>;

    /// Number of leading time slices of a transient that only contain background.
    fn background_slices(&self) -> usize;

    fn is_time_resolved(&self) -> bool {
        matches!(self.measurement_mode(), Ok(MeasurementMode::TimeResolved))
    }

    fn is_time_integrated(&self) -> bool {
        matches!(self.measurement_mode(), Ok(MeasurementMode::TimeIntegrated))
    }

    fn acquisition_mode(&self) -> Result<AcquisitionMode, ConfigurationError> {
        Ok(AcquisitionMode::new(
            self.detection_mode()?,
            self.measurement_mode()?,
        ))
    }
}

/// Measurement metadata as stored alongside the processed data.
///
/// # Fields
/// - `module_id`: instrument module identifier, contains either `ASC` or `PSC`.
/// - `processor`: name of the processor that produced the file.
/// - `sample_rate`: digitizer sample rate in samples/s.
/// - `pre_trigger_samples`: number of samples recorded before the trigger.
/// - `background_integration_time`: background integration time in s.
/// - `use_background_integration_time`: estimate noise from the background integration window
///   instead of the pre-trigger window.
/// - `pow2_fft_length`, `pow2_interleave`, `pow2_padding`: log2 of FFT length, interleave factor
///   and zero padding factor.
/// - `num_lines`: number of comb lines (wavenumber bins).
/// - `pretrigger_acquisitions`: number of acquisitions recorded before the trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub module_id: String,
    pub processor: String,
    pub sample_rate: f64,
    #[serde(default)]
    pub pre_trigger_samples: f64,
    #[serde(default)]
    pub background_integration_time: f64,
    #[serde(default)]
    pub use_background_integration_time: bool,
    #[serde(default = "default_pow2_fft_length")]
    pub pow2_fft_length: u32,
    #[serde(default = "default_pow2_interleave")]
    pub pow2_interleave: u32,
    #[serde(default = "default_pow2_padding")]
    pub pow2_padding: u32,
    #[serde(default)]
    pub num_lines: usize,
    #[serde(default)]
    pub pretrigger_acquisitions: usize,
}

fn default_pow2_fft_length() -> u32 {
    15
}

fn default_pow2_interleave() -> u32 {
    2
}

fn default_pow2_padding() -> u32 {
    1
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            module_id: "ASC".to_string(),
            processor: "TimeIntegrated".to_string(),
            sample_rate: 2e9,
            pre_trigger_samples: 0.0,
            background_integration_time: 0.0,
            use_background_integration_time: false,
            pow2_fft_length: default_pow2_fft_length(),
            pow2_interleave: default_pow2_interleave(),
            pow2_padding: default_pow2_padding(),
            num_lines: 0,
            pretrigger_acquisitions: 0,
        }
    }
}

impl Configuration {
    /// Checks the parameter combinations the derived quantities rely on.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.sample_rate <= 0.0 || !self.sample_rate.is_finite() {
            return Err(ConfigurationError::InvalidSampleRate(self.sample_rate));
        }
        if self.pow2_fft_length < self.pow2_interleave {
            return Err(ConfigurationError::InvalidFftParameters {
                fft: self.pow2_fft_length,
                interleave: self.pow2_interleave,
            });
        }
        Ok(())
    }

    /// Time step between two interleaved FFT slices in s.
    pub fn interleave_time_step(&self) -> f64 {
        2f64.powi(self.pow2_fft_length as i32)
            / self.sample_rate
            / 2f64.powi(self.pow2_interleave as i32)
    }

    /// Frequency resolution of the zero-padded FFT in Hz.
    pub fn df(&self) -> f64 {
        self.sample_rate / 2f64.powi((self.pow2_fft_length + self.pow2_padding) as i32)
    }

    pub fn background_integration_samples(&self) -> f64 {
        self.sample_rate * self.background_integration_time
    }
}

impl ConfigurationModel for Configuration {
    fn detection_mode(&self) -> Result<DetectionMode, ConfigurationError> {
        DetectionMode::from_module_id(&self.module_id)
    }

    fn measurement_mode(&self) -> Result<MeasurementMode, ConfigurationError> {
        MeasurementMode::from_processor(&self.processor)
    }

    fn background_slices(&self) -> usize {
        let samples = if self.use_background_integration_time {
            self.background_integration_samples()
        } else {
            self.pre_trigger_samples
        };
        let slices = (samples / self.sample_rate / self.interleave_time_step()).floor();
        if slices.is_finite() && slices > 0.0 {
            slices as usize
        } else {
            0
        }
    }
}
