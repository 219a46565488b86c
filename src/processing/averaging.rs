//! Averaging of complex transmission across acquisitions.
//!
//! The combination rule depends on the [`AcquisitionMode`]: a plain complex mean for ASC data
//! and time-resolved PSC data, and separate magnitude/phase averages for time-integrated PSC data,
//! where the coherent mean would bias the magnitude downwards whenever the phase fluctuates.

use crate::config::{AcquisitionMode, AveragingRule};
use crate::data_container::{RawDataSource, SpectralData, Transmission};
use crate::error::{ProcessingError, Result};
use crate::math_tools::complex_to_real;
use ndarray::{s, Array, Array1, ArrayView, ArrayView1, ArrayView2, Axis, RemoveAxis, Zip};
use num_complex::Complex64;
use std::ops::Range;

/// Result of averaging a contiguous range of acquisitions.
///
/// # Fields
/// - `range`: acquisitions that were averaged, `stop` exclusive.
/// - `transmission`: averaged spectrum or transient.
/// - `std`: standard deviation per wavenumber of the average (relative for time-integrated
///   data), `None` if the measurement carries no noise information.
#[derive(Clone, Debug, PartialEq)]
pub struct AcquisitionAverage {
    pub range: Range<usize>,
    pub transmission: SpectralData,
    pub std: Option<Array1<f64>>,
}

/// Standard deviation combined over a range of acquisitions.
#[derive(Clone, Debug, PartialEq)]
pub struct PropagatedStd {
    pub values: Array1<f64>,
    /// `true` when the values are in transmission units rather than relative to the signal.
    pub is_absolute: bool,
}

/// Substitutes the defaults for an unset range and checks it against the acquisition count.
///
/// `start` defaults to 0 and `stop` (exclusive) to the number of acquisitions.
pub fn resolve_range(
    start: Option<usize>,
    stop: Option<usize>,
    num_acquisitions: usize,
) -> Result<Range<usize>> {
    let start = start.unwrap_or(0);
    let stop = stop.unwrap_or(num_acquisitions);
    if start >= stop || stop > num_acquisitions {
        return Err(ProcessingError::Range {
            start,
            stop,
            available: num_acquisitions,
        });
    }
    Ok(start..stop)
}

/// Averages `x` along `axis` with the given rule.
///
/// Callers guarantee that `axis` is not empty.
pub fn combine_along<D>(
    x: ArrayView<Complex64, D>,
    axis: Axis,
    rule: AveragingRule,
) -> Array<Complex64, D::Smaller>
where
    D: RemoveAxis,
{
    let n = x.len_of(axis) as f64;
    let mean = x.sum_axis(axis).mapv_into(|c| c / n);
    match rule {
        AveragingRule::Coherent => mean,
        AveragingRule::MagnitudePhase => {
            let magnitude = x.mapv(|c| c.norm()).sum_axis(axis).mapv_into(|m| m / n);
            Zip::from(&magnitude)
                .and(&mean)
                .map_collect(|m, c| Complex64::from_polar(*m, c.arg()))
        }
    }
}

/// Weighted sum of `x` with the given rule, the weighted counterpart of [`combine_along`].
///
/// With weights normalized to one this is the weighted mean; for the magnitude/phase rule the
/// magnitudes and the complex values are weighted separately.
pub fn weighted_combine(
    x: ArrayView1<Complex64>,
    weights: ArrayView1<f64>,
    rule: AveragingRule,
) -> Complex64 {
    let coherent: Complex64 = x.iter().zip(weights.iter()).map(|(c, w)| c * w).sum();
    match rule {
        AveragingRule::Coherent => coherent,
        AveragingRule::MagnitudePhase => {
            let magnitude: f64 = x.iter().zip(weights.iter()).map(|(c, w)| c.norm() * w).sum();
            Complex64::from_polar(magnitude, coherent.arg())
        }
    }
}

/// Averages the acquisitions in `range` of the transmission cube.
pub fn average_transmission(
    transmission: &Transmission,
    range: Range<usize>,
    rule: AveragingRule,
) -> Result<SpectralData> {
    let range = resolve_range(
        Some(range.start),
        Some(range.end),
        transmission.num_acquisitions(),
    )?;
    Ok(match transmission {
        Transmission::TimeIntegrated(data) => SpectralData::Spectrum(combine_along(
            data.slice(s![.., range]),
            Axis(1),
            rule,
        )),
        Transmission::TimeResolved(data) => SpectralData::Transient(combine_along(
            data.slice(s![.., .., range]),
            Axis(2),
            rule,
        )),
    })
}

/// Combines per-acquisition standard deviations in quadrature: `sqrt(sum(std_i^2)) / N`.
///
/// The per-acquisition values are relative to the signal. If the realized per-acquisition
/// transmission is given (time-integrated data), each value is scaled by it first and the result
/// is absolute. Time-resolved data is normalized to a background of 1 and needs no scaling.
///
/// # Arguments
/// - `std_acqs`: relative standard deviation, `[wavenumber, acquisition]`, restricted to the range.
/// - `realized`: real transmission of the same acquisitions, `[wavenumber, acquisition]`.
pub fn propagate_std(
    std_acqs: ArrayView2<f64>,
    realized: Option<ArrayView2<f64>>,
) -> PropagatedStd {
    let n = std_acqs.len_of(Axis(1)) as f64;
    let (squares, is_absolute) = match realized {
        Some(realized) => (
            Zip::from(&std_acqs)
                .and(&realized)
                .map_collect(|s, r| (s * r).powi(2)),
            true,
        ),
        None => (std_acqs.mapv(|s| s * s), false),
    };
    PropagatedStd {
        values: squares.sum_axis(Axis(1)).mapv_into(|s| s.sqrt() / n),
        is_absolute,
    }
}

/// Averages the acquisitions in `range` and propagates their noise.
///
/// Uses the per-acquisition standard deviation when the source has one and the legacy aggregate
/// standard deviation otherwise. An absolute propagated std is divided by the realized average,
/// so the returned std is always relative.
pub fn acquisition_average<S: RawDataSource + ?Sized>(
    source: &S,
    mode: AcquisitionMode,
    phase_drift_correction: bool,
    range: Range<usize>,
) -> Result<AcquisitionAverage> {
    let transmission = source.transmission();
    if transmission.mode() != mode.measurement() {
        return Err(ProcessingError::Shape(format!(
            "{} configuration but {} transmission data",
            mode.measurement(),
            transmission.mode()
        )));
    }
    let averaged = average_transmission(transmission, range.clone(), mode.averaging_rule())?;

    let std = match source.std_peak_acqs() {
        Some(std_acqs) => {
            let std_acqs = std_acqs.slice(s![.., range.clone()]);
            let propagated = match (transmission, &averaged) {
                (Transmission::TimeIntegrated(data), SpectralData::Spectrum(avg)) => {
                    let realized = complex_to_real(
                        data.slice(s![.., range.clone()]),
                        mode.detection(),
                        phase_drift_correction,
                    );
                    let propagated = propagate_std(std_acqs, Some(realized.view()));
                    let realized_avg =
                        complex_to_real(avg.view(), mode.detection(), phase_drift_correction);
                    PropagatedStd {
                        values: propagated.values / realized_avg,
                        is_absolute: false,
                    }
                }
                _ => propagate_std(std_acqs, None),
            };
            Some(propagated.values)
        }
        None => source.std_peak().cloned(),
    };

    log::debug!(
        "averaged acquisitions {}..{} ({}, std available: {})",
        range.start,
        range.end,
        mode,
        std.is_some()
    );

    Ok(AcquisitionAverage {
        range,
        transmission: averaged,
        std,
    })
}
