//! Error types shared by the processing pipeline.
//!
//! Fatal conditions propagate as [`ProcessingError`]. Recoverable conditions
//! (a smoothing window without usable weight, a missing noise source) are
//! logged where they happen and never surface here.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while interpreting the instrument configuration.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("It is not possible to read configuration (ASC/PSC) from module id '{0}'")]
    UnknownDetectionMode(String),

    #[error("Processor '{0}' is neither time-resolved nor time-integrated")]
    UnknownProcessor(String),

    #[error("FFT length 2^{fft} must not be shorter than the interleave factor 2^{interleave}")]
    InvalidFftParameters { fft: u32, interleave: u32 },

    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(f64),
}

/// Errors that can occur while averaging, smoothing or analysing a measurement.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("Invalid acquisition range [{start}, {stop}) for {available} acquisitions")]
    Range {
        start: usize,
        stop: usize,
        available: usize,
    },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Shape mismatch: {0}")]
    Shape(String),

    #[error(transparent)]
    NdShape(#[from] ndarray::ShapeError),

    #[error("{0} is not available for this measurement mode")]
    ModeMismatch(&'static str),

    #[error("No standard deviation source available for this measurement")]
    MissingStd,

    #[error("No averaged transmission available, run the acquisition average first")]
    NotAveraged,

    #[error("Missing array '{name}' in {path:?}")]
    MissingArray { name: String, path: PathBuf },

    #[error("Failed to read npz archive: {0}")]
    ReadNpz(#[from] ndarray_npy::ReadNpzError),

    #[error("Failed to write npz archive: {0}")]
    WriteNpz(#[from] ndarray_npy::WriteNpzError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;
