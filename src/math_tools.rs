//! This module provides the numeric building blocks of the pipeline: realization of complex
//! transmission into physical units, conversion between transmission, absorption and absorbance,
//! the Gaussian kernel, a numpy-compatible gradient and a full cross-correlation.

use crate::config::DetectionMode;
use crate::error::{ProcessingError, Result};
use ndarray::{Array, Array1, ArrayView, ArrayView1, Dimension};
use num_complex::Complex64;
use std::f64::consts::PI;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Converts complex transmission to real transmission, depending on the detection mode.
///
/// - ASC: the real part. Averages to zero for fully absorbed lines, but is wrong when the
///   phase drifted between background and sample measurement. With `phase_drift_correction`
///   the magnitude is taken instead (both combs are attenuated, so no square).
/// - PSC: the magnitude squared, only the interrogating comb is attenuated by the sample and
///   transmission measures power.
///
/// # Arguments
/// - `transmission`: complex transmission of any shape.
/// - `detection`: detection mode of the instrument.
/// - `phase_drift_correction`: take the magnitude of ASC data instead of the real part.
///
/// # Returns
/// The real transmission with the same shape as the input.
pub fn complex_to_real<D: Dimension>(
    transmission: ArrayView<Complex64, D>,
    detection: DetectionMode,
    phase_drift_correction: bool,
) -> Array<f64, D> {
    match (detection, phase_drift_correction) {
        (DetectionMode::Asc, false) => transmission.mapv(|c| c.re),
        (DetectionMode::Asc, true) => transmission.mapv(|c| c.norm()),
        (DetectionMode::Psc, _) => transmission.mapv(|c| c.norm_sqr()),
    }
}

/// Physical quantity a real spectrum is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputType {
    Transmission,
    /// `1 - T`
    Absorption,
    /// `-log10(|T|)`
    Absorbance,
}

impl Display for OutputType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputType::Transmission => {
                write!(f, "Transmission")
            }
            OutputType::Absorption => {
                write!(f, "Absorption")
            }
            OutputType::Absorbance => {
                write!(f, "Absorbance")
            }
        }
    }
}

impl FromStr for OutputType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "transmission" => Ok(OutputType::Transmission),
            "absorption" => Ok(OutputType::Absorption),
            "absorbance" => Ok(OutputType::Absorbance),
            other => Err(format!("unknown output type '{}'", other)),
        }
    }
}

/// Converts real data from one output type to another, going through transmission.
pub fn convert_output<D: Dimension>(
    data: ArrayView<f64, D>,
    from: OutputType,
    to: OutputType,
) -> Array<f64, D> {
    let transmission = match from {
        OutputType::Transmission => data.to_owned(),
        OutputType::Absorption => data.mapv(|a| 1.0 - a),
        OutputType::Absorbance => data.mapv(|a| 10f64.powf(-a)),
    };
    match to {
        OutputType::Transmission => transmission,
        OutputType::Absorption => transmission.mapv_into(|t| 1.0 - t),
        OutputType::Absorbance => transmission.mapv_into(|t| -t.abs().log10()),
    }
}

/// Normal distribution density at `x` with mean `mu` and standard deviation `sigma`.
pub fn gaussian(x: f64, mu: f64, sigma: f64) -> f64 {
    (-((x - mu) / sigma).powi(2) / 2.0).exp() / ((2.0 * PI).sqrt() * sigma)
}

/// Gradient with central differences in the interior and one-sided differences at the
/// boundaries, as computed by numpy.
pub fn gradient(x: ArrayView1<f64>) -> Array1<f64> {
    let n = x.len();
    if n < 2 {
        return Array1::zeros(n);
    }
    Array1::from_shape_fn(n, |i| {
        if i == 0 {
            x[1] - x[0]
        } else if i == n - 1 {
            x[n - 1] - x[n - 2]
        } else {
            (x[i + 1] - x[i - 1]) / 2.0
        }
    })
}

/// Mean spacing of an axis, i.e. the mean of its gradient.
pub fn mean_spacing(axis: ArrayView1<f64>) -> Result<f64> {
    if axis.len() < 2 {
        return Err(ProcessingError::InvalidParameter(
            "an axis needs at least two points to define a spacing".to_string(),
        ));
    }
    Ok(gradient(axis).mean().unwrap_or(0.0))
}

/// Index of the axis value closest to `value` (first one on ties).
pub fn nearest_index(axis: ArrayView1<f64>, value: f64) -> Option<usize> {
    axis.iter()
        .enumerate()
        .min_by(|a, b| (a.1 - value).abs().total_cmp(&(b.1 - value).abs()))
        .map(|(i, _)| i)
}

/// Full discrete cross-correlation of `a` with `v`.
///
/// Entry `k` holds `sum_n a[n + k - (len(v) - 1)] * v[n]`, so the index of the maximum minus
/// `len(v) - 1` is the lag by which `a` trails `v`.
pub fn cross_correlate_full(a: ArrayView1<f64>, v: ArrayView1<f64>) -> Array1<f64> {
    let (la, lv) = (a.len(), v.len());
    if la == 0 || lv == 0 {
        return Array1::zeros(0);
    }
    Array1::from_shape_fn(la + lv - 1, |k| {
        let lag = k as isize - (lv as isize - 1);
        v.iter()
            .enumerate()
            .filter_map(|(n, vn)| {
                let j = n as isize + lag;
                (j >= 0 && (j as usize) < la).then(|| a[j as usize] * vn)
            })
            .sum()
    })
}
