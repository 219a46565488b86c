//! Numerical processing of heterodyne spectrometer measurements.
//!
//! The stages operate on explicit arrays and hold no state between calls. The
//! [`SpectrumProcessor`](crate::processor::SpectrumProcessor) chains them and caches the results.
//!
//! # Stages
//!
//! * **Averaging**: combines acquisitions into one spectrum or transient and
//!   propagates their noise.
//!
//! * **Noise**: selects the noise axis used to weight the smoothing.
//!
//! * **Smoothing**: noise-weighted moving average across wavenumbers.
//!
//! * **Analysis**: time-resolved slicing and rebinning, calibration and unnormalization.

/// Averaging across acquisitions and noise propagation.
pub mod averaging;

/// Wavenumber calibration by cross-correlation with a reference.
pub mod calibration;

/// Noise axis selection.
pub mod noise;

/// Background unnormalization of raw transmission.
pub mod normalization;

/// Spectral smoothing with box and Gaussian kernels.
pub mod smoothing;

/// Transients over wavenumber ranges and spectra over time windows.
pub mod time_resolved;
