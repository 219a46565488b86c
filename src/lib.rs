//! Post-processing of heterodyne spectrometer measurements.
//!
//! Raw complex transmission is averaged across acquisitions and smoothed across wavenumbers
//! with noise-dependent weights. The numerical rules depend on the detection mode (ASC or PSC)
//! and on whether the measurement is time-resolved, which is resolved once into an
//! [`AcquisitionMode`](config::AcquisitionMode).

pub mod config;
pub mod data_container;
pub mod error;
pub mod io;
pub mod math_tools;
pub mod processing;
pub mod processor;

pub use config::{AcquisitionMode, Configuration, ConfigurationModel};
pub use data_container::{RawData, RawDataSource, SpectralData, Transmission};
pub use error::{ConfigurationError, ProcessingError};
pub use processor::{ProcessedKey, SpectrumProcessor};
