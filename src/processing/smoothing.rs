//! Noise-weighted moving average across the wavenumber axis.
//!
//! Every output bin is the weighted combination of the bins in a window around it. Weights are
//! inverse variances taken from the noise axis, optionally shaped by a Gaussian kernel, and
//! normalized to sum to one. Bins are independent, so they are computed in parallel and
//! assembled into a fresh buffer afterwards.

use crate::config::AveragingRule;
use crate::data_container::SpectralData;
use crate::error::{ProcessingError, Result};
use crate::math_tools::gaussian;
use crate::processing::averaging::weighted_combine;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use num_complex::Complex64;
use rayon::prelude::*;
use std::fmt::{Display, Formatter};
use std::ops::Range;

/// Shape of the smoothing window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SmoothingKernel {
    /// Uniform window of `2 * half_width + 1` bins.
    Box { half_width: usize },
    /// Gaussian kernel with standard deviation `sigma_wn` in cm^-1, truncated at 3 sigma.
    Gaussian { sigma_wn: f64 },
}

impl Display for SmoothingKernel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SmoothingKernel::Box { half_width } => {
                write!(f, "box (half width {} bins)", half_width)
            }
            SmoothingKernel::Gaussian { sigma_wn } => {
                write!(f, "gaussian (sigma {} cm^-1)", sigma_wn)
            }
        }
    }
}

/// Parameters of one smoothing run.
///
/// # Fields
/// - `kernel`: window shape.
/// - `threshold`: bins with a relative std above this value are excluded, only applied when
///   `0 < threshold < 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothingParameters {
    pub kernel: SmoothingKernel,
    pub threshold: f64,
}

impl Default for SmoothingParameters {
    fn default() -> Self {
        SmoothingParameters {
            kernel: SmoothingKernel::Gaussian { sigma_wn: 0.6 },
            threshold: 1.0,
        }
    }
}

/// Kernel expressed in bins of a concrete wavenumber axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinKernel {
    pub half_width: usize,
    /// `None` for the box kernel.
    pub sigma_bins: Option<f64>,
}

impl SmoothingKernel {
    /// Converts the kernel to bins of `wn_axis`.
    ///
    /// An axis with a single wavenumber has nothing to smooth across, every kernel reduces to
    /// the identity there.
    pub fn in_bins(&self, wn_axis: ArrayView1<f64>) -> Result<BinKernel> {
        if wn_axis.len() < 2 {
            return Ok(BinKernel {
                half_width: 0,
                sigma_bins: None,
            });
        }
        match *self {
            SmoothingKernel::Box { half_width } => Ok(BinKernel {
                half_width,
                sigma_bins: None,
            }),
            SmoothingKernel::Gaussian { sigma_wn } => {
                if sigma_wn.is_nan() || sigma_wn <= 0.0 {
                    return Err(ProcessingError::InvalidParameter(format!(
                        "gaussian sigma must be positive, got {}",
                        sigma_wn
                    )));
                }
                let sigma_bins = (sigma_wn / (wn_axis[1] - wn_axis[0])).abs();
                if !sigma_bins.is_finite() {
                    return Err(ProcessingError::InvalidParameter(
                        "wavenumber axis has zero spacing".to_string(),
                    ));
                }
                Ok(BinKernel {
                    half_width: (3.0 * sigma_bins).ceil() as usize,
                    sigma_bins: Some(sigma_bins),
                })
            }
        }
    }
}

/// Window `[start, stop)` around bin `i`, truncated at both ends of an axis of length `n`.
pub fn window(i: usize, half_width: usize, n: usize) -> Range<usize> {
    let start = i.saturating_sub(half_width);
    let stop = i.saturating_add(half_width).saturating_add(1).min(n);
    start..stop
}

/// Normalized weights for one window.
///
/// Weights are `1 / std^2`. NaN std values and, when `0 < threshold < 1`, values above the
/// threshold get zero weight. A zero std means infinite weight, then only the zero-std bins are
/// used. If no bin is left the bin at `center` gets the full weight, which is reported by the
/// returned flag.
///
/// # Arguments
/// - `std`: relative std of the bins in the window.
/// - `center`: position of the target bin inside the window.
/// - `sigma_bins`: multiply with a Gaussian centered on `center` when given.
/// - `threshold`: exclusion threshold.
pub fn inverse_variance_weights(
    std: ArrayView1<f64>,
    center: usize,
    sigma_bins: Option<f64>,
    threshold: f64,
) -> (Array1<f64>, bool) {
    let apply_threshold = threshold > 0.0 && threshold < 1.0;
    let mut weights = std.mapv(|s| {
        let w = 1.0 / (s * s);
        if w.is_nan() || (apply_threshold && s > threshold) {
            0.0
        } else {
            w
        }
    });
    if weights.iter().any(|w| w.is_infinite()) {
        weights.mapv_inplace(|w| if w.is_infinite() { 1.0 } else { 0.0 });
    }

    let degenerate = weights.iter().all(|w| *w == 0.0);
    if degenerate {
        weights[center] = 1.0;
    }

    if let Some(sigma) = sigma_bins {
        for (k, w) in weights.iter_mut().enumerate() {
            *w *= gaussian(k as f64, center as f64, sigma);
        }
    }

    let total = weights.sum();
    if total > 0.0 && total.is_finite() {
        weights /= total;
    } else {
        // the kernel underflowed on every remaining bin
        weights.fill(0.0);
        weights[center] = 1.0;
    }
    (weights, degenerate)
}

/// Raw per-acquisition data for the individually smoothed output of time-integrated data.
///
/// # Fields
/// - `transmission`: `[wavenumber, acquisition]`, every acquisition of the measurement.
/// - `std_acqs`: matching per-acquisition std, the shared noise axis is used when `None`.
#[derive(Debug, Clone, Copy)]
pub struct IndividualInput<'a> {
    pub transmission: ArrayView2<'a, Complex64>,
    pub std_acqs: Option<ArrayView2<'a, f64>>,
}

/// Output of [`smooth`].
#[derive(Clone, Debug, PartialEq)]
pub struct SmoothedTransmission {
    /// Same variant and shape as the smoothed input.
    pub data: SpectralData,
    /// Individually smoothed acquisitions, `[acquisition, wavenumber]`.
    pub individual: Option<Array2<Complex64>>,
    /// Number of windows that had no usable weight.
    pub degenerate_windows: usize,
}

struct SmoothedBin {
    values: Array1<Complex64>,
    individual: Option<Array1<Complex64>>,
    degenerate: bool,
}

/// Smooths averaged data along the wavenumber axis.
///
/// A spectrum is treated as a transient with a single row; every row of a transient uses the
/// same weights. The weighted combination follows `rule`, so magnitude and phase stay separated
/// for time-integrated PSC data.
///
/// # Arguments
/// - `average`: averaged spectrum or transient.
/// - `std_axis`: relative std per wavenumber.
/// - `wn_axis`: wavenumber axis in cm^-1, used to convert a Gaussian sigma to bins.
/// - `parameters`: kernel and threshold.
/// - `rule`: combination rule of the acquisition mode.
/// - `individual`: per-acquisition data to smooth as well.
pub fn smooth(
    average: &SpectralData,
    std_axis: ArrayView1<f64>,
    wn_axis: ArrayView1<f64>,
    parameters: &SmoothingParameters,
    rule: AveragingRule,
    individual: Option<IndividualInput>,
) -> Result<SmoothedTransmission> {
    let rows = average.rows();
    let n = rows.len_of(Axis(1));
    if std_axis.len() != n || wn_axis.len() != n {
        return Err(ProcessingError::Shape(format!(
            "smoothing {} wavenumbers with a std axis of {} and a wavenumber axis of {} entries",
            n,
            std_axis.len(),
            wn_axis.len()
        )));
    }
    if let Some(input) = &individual {
        if input.transmission.len_of(Axis(0)) != n {
            return Err(ProcessingError::Shape(format!(
                "individual transmission has {} wavenumbers, expected {}",
                input.transmission.len_of(Axis(0)),
                n
            )));
        }
        if let Some(std_acqs) = input.std_acqs {
            if std_acqs.dim() != input.transmission.dim() {
                return Err(ProcessingError::Shape(format!(
                    "individual std has shape {:?}, expected {:?}",
                    std_acqs.dim(),
                    input.transmission.dim()
                )));
            }
        }
    }
    let kernel = parameters.kernel.in_bins(wn_axis)?;
    let threshold = parameters.threshold;

    let bins: Vec<SmoothedBin> = (0..n)
        .into_par_iter()
        .map(|i| {
            let range = window(i, kernel.half_width, n);
            let center = i - range.start;
            let (weights, degenerate) = inverse_variance_weights(
                std_axis.slice(s![range.clone()]),
                center,
                kernel.sigma_bins,
                threshold,
            );
            let values = rows
                .outer_iter()
                .map(|row| weighted_combine(row.slice(s![range.clone()]), weights.view(), rule))
                .collect();
            let individual = individual.map(|input| {
                (0..input.transmission.len_of(Axis(1)))
                    .map(|a| {
                        let samples = input.transmission.slice(s![range.clone(), a]);
                        match input.std_acqs {
                            Some(std_acqs) => {
                                let (own, _) = inverse_variance_weights(
                                    std_acqs.slice(s![range.clone(), a]),
                                    center,
                                    kernel.sigma_bins,
                                    threshold,
                                );
                                weighted_combine(samples, own.view(), rule)
                            }
                            None => weighted_combine(samples, weights.view(), rule),
                        }
                    })
                    .collect()
            });
            SmoothedBin {
                values,
                individual,
                degenerate,
            }
        })
        .collect();

    let mut smoothed = Array2::<Complex64>::zeros(rows.dim());
    let mut individual_out = individual
        .map(|input| Array2::<Complex64>::zeros((input.transmission.len_of(Axis(1)), n)));
    let mut degenerate_windows = 0;
    for (i, bin) in bins.into_iter().enumerate() {
        smoothed.column_mut(i).assign(&bin.values);
        if let (Some(out), Some(values)) = (individual_out.as_mut(), bin.individual) {
            out.column_mut(i).assign(&values);
        }
        if bin.degenerate {
            degenerate_windows += 1;
        }
    }

    if degenerate_windows > 0 {
        log::warn!(
            "{} of {} smoothing windows had no usable weight, using the center bin only",
            degenerate_windows,
            n
        );
    }

    Ok(SmoothedTransmission {
        data: average.with_rows(smoothed),
        individual: individual_out,
        degenerate_windows,
    })
}
