use log::error;
use nalgebra::SMatrix;

use crate::prelude::Error;

/// Inverts a symmetric positive definite matrix.
///
/// The matrix is first scaled to a unit diagonal, inverted through its
/// Cholesky factorization and the inverse is unscaled.
/// Any non positive diagonal term, before or during the factorization,
/// is reported as [Error::MatrixInversion] with the faulty pivot index.
pub(crate) fn cholesky_inverse<const N: usize>(
    m: &SMatrix<f64, N, N>,
) -> Result<SMatrix<f64, N, N>, Error> {
    let mut scale = [0.0; N];
    for (i, scale) in scale.iter_mut().enumerate() {
        let diag = m[(i, i)];
        if !(diag > 0.0) {
            error!("normal matrix: non positive diagonal term #{} ({:.3E})", i, diag);
            return Err(Error::MatrixInversion { pivot: i });
        }
        *scale = 1.0 / diag.sqrt();
    }

    let scaled = SMatrix::<f64, N, N>::from_fn(|i, j| m[(i, j)] * scale[i] * scale[j]);

    let inv = match scaled.cholesky() {
        Some(cholesky) => cholesky.inverse(),
        None => {
            let pivot = failing_pivot(&scaled);
            error!("normal matrix: non positive pivot #{}", pivot);
            return Err(Error::MatrixInversion { pivot });
        },
    };

    Ok(SMatrix::<f64, N, N>::from_fn(|i, j| {
        inv[(i, j)] * scale[i] * scale[j]
    }))
}

/// Index of the first pivot that prevents the factorization:
/// the smallest leading block that is not positive definite.
fn failing_pivot<const N: usize>(m: &SMatrix<f64, N, N>) -> usize {
    (1..=N)
        .find(|k| m.view((0, 0), (*k, *k)).clone_owned().cholesky().is_none())
        .map(|k| k - 1)
        .unwrap_or(N.saturating_sub(1))
}

#[cfg(test)]
mod test {
    use super::cholesky_inverse;
    use crate::prelude::Error;
    use nalgebra::{Matrix3, SMatrix};

    #[test]
    fn spd_inversion() {
        let m = Matrix3::new(4.0, 2.0, 0.6, 2.0, 5.0, 1.0, 0.6, 1.0, 3.0);
        let inv = cholesky_inverse(&m).unwrap();
        let identity = m * inv;
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((identity[(i, j)] - expected).abs() < 1.0E-12);
            }
        }
    }

    #[test]
    fn badly_scaled_inversion() {
        // diagonal terms spanning many orders of magnitude
        let s = |i: usize| 10.0_f64.powi(3 * i as i32);
        let m = SMatrix::<f64, 4, 4>::from_fn(|i, j| {
            let c = if i == j { 1.0 } else { 0.1 };
            c * s(i) * s(j)
        });
        let inv = cholesky_inverse(&m).unwrap();
        let identity = m * inv;
        for i in 0..4 {
            for j in 0..4 {
                let expected = if i == j { 1.0 } else { 0.0 };
                let value = identity[(i, j)] * s(j) / s(i);
                assert!(
                    (value - expected).abs() < 1.0E-9,
                    "({}, {}) = {}",
                    i,
                    j,
                    value
                );
            }
        }
    }

    #[test]
    fn non_positive_pivots() {
        let m = Matrix3::new(4.0, 2.0, 0.0, 2.0, 0.0, 1.0, 0.0, 1.0, 3.0);
        assert_eq!(cholesky_inverse(&m), Err(Error::MatrixInversion { pivot: 1 }));

        // positive diagonal, but singular
        let m = Matrix3::new(1.0, 1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        assert_eq!(cholesky_inverse(&m), Err(Error::MatrixInversion { pivot: 1 }));

        // indefinite
        let m = Matrix3::new(1.0, 2.0, 0.0, 2.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        assert_eq!(cholesky_inverse(&m), Err(Error::MatrixInversion { pivot: 1 }));
    }

    #[test]
    fn general_inverse_agreement() {
        let a = SMatrix::<f64, 8, 6>::from_fn(|i, j| {
            ((i * 7 + j * 3) % 5) as f64 - 2.0 + 0.1 * j as f64
        });
        let m = a.transpose() * a + SMatrix::<f64, 6, 6>::identity();
        let inv = cholesky_inverse(&m).unwrap();
        let expected = m.try_inverse().unwrap();
        for i in 0..6 {
            for j in 0..6 {
                assert!((inv[(i, j)] - expected[(i, j)]).abs() < 1.0E-10);
                assert!((inv[(i, j)] - inv[(j, i)]).abs() < 1.0E-10);
            }
        }
    }
}
