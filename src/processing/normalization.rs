//! Undoing the background normalization of raw transmission.

use crate::data_container::Transmission;
use crate::error::{ProcessingError, Result};
use ndarray::{ArrayView2, Axis};
use num_complex::Complex64;

/// Multiplies every acquisition by the background it was normalized to.
///
/// `normalization` has shape `[wavenumber, acquisition]`; for time-resolved data it applies to
/// every time slice.
pub fn unnormalize(
    transmission: &Transmission,
    normalization: ArrayView2<Complex64>,
) -> Result<Transmission> {
    let expected = (
        transmission.num_wavenumbers(),
        transmission.num_acquisitions(),
    );
    if normalization.dim() != expected {
        return Err(ProcessingError::Shape(format!(
            "normalization vector has shape {:?}, expected {:?}",
            normalization.dim(),
            expected
        )));
    }
    Ok(match transmission {
        Transmission::TimeIntegrated(data) => Transmission::TimeIntegrated(data * &normalization),
        Transmission::TimeResolved(data) => {
            let mut out = data.clone();
            for mut slice in out.axis_iter_mut(Axis(0)) {
                slice *= &normalization;
            }
            Transmission::TimeResolved(out)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2, Array3};

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    #[test]
    fn test_unnormalize_time_integrated() {
        let data = array![[c(0.5, 0.0), c(1.0, 1.0)]];
        let normalization = array![[c(2.0, 0.0), c(0.0, 1.0)]];
        let out = unnormalize(&Transmission::TimeIntegrated(data), normalization.view()).unwrap();
        assert_eq!(
            out,
            Transmission::TimeIntegrated(array![[c(1.0, 0.0), c(-1.0, 1.0)]])
        );
    }

    #[test]
    fn test_unnormalize_time_resolved_broadcasts_over_time() {
        let data = Array3::from_elem((3, 2, 2), c(1.0, 0.0));
        let normalization = array![[c(1.0, 0.0), c(2.0, 0.0)], [c(3.0, 0.0), c(4.0, 0.0)]];
        let out = unnormalize(&Transmission::TimeResolved(data), normalization.view()).unwrap();
        let Transmission::TimeResolved(out) = out else {
            panic!("expected time-resolved data");
        };
        for t in 0..3 {
            assert_eq!(out.index_axis(Axis(0), t), normalization);
        }
    }

    #[test]
    fn test_unnormalize_rejects_wrong_shape() {
        let data = Transmission::TimeIntegrated(Array2::zeros((2, 3)));
        assert!(unnormalize(&data, Array2::zeros((3, 2)).view()).is_err());
    }
}
