//! Cholesky factorisation and correlated sampling

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::error::NumericalError;

/// Diagonal regularisation added when the first factorisation fails
pub const CHOLESKY_JITTER: f64 = 1e-6;

/// Lower-triangular Cholesky factor of `matrix`.
///
/// On failure the diagonal is lifted by [`CHOLESKY_JITTER`] and the
/// factorisation retried once.
pub fn cholesky_with_jitter(matrix: &DMatrix<f64>) -> Result<DMatrix<f64>, NumericalError> {
    let n = matrix.nrows();
    if matrix.ncols() != n {
        return Err(NumericalError::DimensionMismatch {
            expected: n,
            actual: matrix.ncols(),
        });
    }
    if let Some(chol) = matrix.clone().cholesky() {
        return Ok(chol.l());
    }

    tracing::warn!(dimension = n, "covariance not positive definite, retrying with jitter");
    let lifted = matrix + DMatrix::identity(n, n) * CHOLESKY_JITTER;
    lifted
        .cholesky()
        .map(|c| c.l())
        .ok_or(NumericalError::NotPositiveDefinite {
            dimension: n,
            jitter: CHOLESKY_JITTER,
        })
}

/// Draw `N(0, Σ)` given the Cholesky factor `L` of `Σ`.
pub fn correlated_normal<R: Rng + ?Sized>(factor: &DMatrix<f64>, rng: &mut R) -> DVector<f64> {
    let z = DVector::from_fn(factor.nrows(), |_, _| StandardNormal.sample(rng));
    factor * z
}

/// `w' Σ w`
pub fn quadratic_form(weights: &[f64], matrix: &DMatrix<f64>) -> f64 {
    let w = DVector::from_column_slice(weights);
    w.dot(&(matrix * &w))
}

/// Portfolio volatility `sqrt(w' Σ w)`, clamped at zero for rounding noise.
pub fn volatility(weights: &[f64], covariance: &DMatrix<f64>) -> f64 {
    quadratic_form(weights, covariance).max(0.0).sqrt()
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn test_cholesky_reconstructs() {
        let m = DMatrix::from_row_slice(2, 2, &[4.0, 2.0, 2.0, 3.0]);
        let l = cholesky_with_jitter(&m).unwrap();
        let back = &l * l.transpose();
        assert!((back - m).abs().max() < 1e-12);
    }

    #[test]
    fn test_zero_matrix_recovered_by_jitter() {
        let m = DMatrix::zeros(3, 3);
        let l = cholesky_with_jitter(&m).unwrap();
        assert!((l[(0, 0)] - CHOLESKY_JITTER.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_indefinite_matrix_fails() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        let err = cholesky_with_jitter(&m).unwrap_err();
        assert!(matches!(err, NumericalError::NotPositiveDefinite { dimension: 2, .. }));
    }

    #[test]
    fn test_correlated_draws_covariance() {
        let cov = DMatrix::from_row_slice(2, 2, &[1.0, 0.8, 0.8, 1.0]);
        let l = cholesky_with_jitter(&cov).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        let n = 50_000;
        let mut sum_xy = 0.0;
        for _ in 0..n {
            let d = correlated_normal(&l, &mut rng);
            sum_xy += d[0] * d[1];
        }
        let est = sum_xy / n as f64;
        assert!((est - 0.8).abs() < 0.03, "estimated covariance {est}");
    }

    #[test]
    fn test_volatility() {
        let cov = DMatrix::from_row_slice(2, 2, &[0.04, 0.0, 0.0, 0.09]);
        let vol = volatility(&[0.5, 0.5], &cov);
        assert!((vol - (0.25f64 * 0.04 + 0.25 * 0.09).sqrt()).abs() < 1e-12);
    }
}
