//! Linear algebra utilities.
//!
//! Dense LU factorisation with partial pivoting for the small balance
//! systems of the level-population solvers.

use ndarray::{Array1, Array2};
use photo_types::error::{PhotoError, PhotoResult};

/// LU factors of a square matrix, P·A = L·U, packed in one array.
///
/// L has a unit diagonal and lives strictly below the diagonal; U lives on
/// and above it. `pivots[k]` is the row swapped into position k.
#[derive(Debug, Clone)]
pub struct LuDecomposition {
    lu: Array2<f64>,
    pivots: Vec<usize>,
}

impl LuDecomposition {
    /// Factor `a` in place of a copy. Fails on a non-square, non-finite or
    /// exactly singular matrix.
    pub fn factor(a: &Array2<f64>) -> PhotoResult<Self> {
        let (n, m) = a.dim();
        if n != m {
            return Err(PhotoError::LinAlg(format!(
                "LU factorisation needs a square matrix, got {n}x{m}"
            )));
        }
        if n == 0 {
            return Err(PhotoError::LinAlg("LU factorisation of an empty matrix".to_string()));
        }
        if a.iter().any(|v| !v.is_finite()) {
            return Err(PhotoError::LinAlg("matrix contains non-finite entries".to_string()));
        }

        let mut lu = a.clone();
        let mut pivots = vec![0; n];

        for k in 0..n {
            // Partial pivoting: largest magnitude in column k at or below row k
            let mut p = k;
            let mut best = lu[[k, k]].abs();
            for i in (k + 1)..n {
                let v = lu[[i, k]].abs();
                if v > best {
                    best = v;
                    p = i;
                }
            }
            pivots[k] = p;
            if best == 0.0 {
                return Err(PhotoError::LinAlg(format!(
                    "matrix is singular: zero pivot in column {k}"
                )));
            }
            if p != k {
                for j in 0..n {
                    lu.swap([k, j], [p, j]);
                }
            }

            let pivot = lu[[k, k]];
            for i in (k + 1)..n {
                let factor = lu[[i, k]] / pivot;
                lu[[i, k]] = factor;
                if factor != 0.0 {
                    for j in (k + 1)..n {
                        lu[[i, j]] -= factor * lu[[k, j]];
                    }
                }
            }
        }

        Ok(LuDecomposition { lu, pivots })
    }

    pub fn dim(&self) -> usize {
        self.pivots.len()
    }

    /// Solve A·x = b using the stored factors.
    pub fn solve(&self, b: &Array1<f64>) -> PhotoResult<Array1<f64>> {
        let n = self.dim();
        if b.len() != n {
            return Err(PhotoError::LinAlg(format!(
                "right-hand side has length {}, matrix is {n}x{n}",
                b.len()
            )));
        }

        let mut x = b.clone();
        for k in 0..n {
            let p = self.pivots[k];
            if p != k {
                x.swap(k, p);
            }
        }

        // Forward substitution (unit lower)
        for i in 1..n {
            let mut s = x[i];
            for j in 0..i {
                s -= self.lu[[i, j]] * x[j];
            }
            x[i] = s;
        }

        // Back substitution
        for i in (0..n).rev() {
            let mut s = x[i];
            for j in (i + 1)..n {
                s -= self.lu[[i, j]] * x[j];
            }
            x[i] = s / self.lu[[i, i]];
        }

        if x.iter().any(|v| !v.is_finite()) {
            return Err(PhotoError::LinAlg(
                "solution of the linear system is not finite".to_string(),
            ));
        }
        Ok(x)
    }

    /// Determinant of the factored matrix.
    pub fn determinant(&self) -> f64 {
        let n = self.dim();
        let mut det = 1.0;
        for k in 0..n {
            det *= self.lu[[k, k]];
            if self.pivots[k] != k {
                det = -det;
            }
        }
        det
    }
}

/// Solve A·x = b by LU factorisation with partial pivoting.
pub fn lu_solve(a: &Array2<f64>, b: &Array1<f64>) -> PhotoResult<Array1<f64>> {
    LuDecomposition::factor(a)?.solve(b)
}

/// Residual r = A·x - b.
pub fn residual(a: &Array2<f64>, x: &Array1<f64>, b: &Array1<f64>) -> Array1<f64> {
    a.dot(x) - b
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_solve_identity() {
        let a = Array2::eye(4);
        let b = array![1.0, -2.0, 3.0, 0.5];
        let x = lu_solve(&a, &b).unwrap();
        for i in 0..4 {
            assert!((x[i] - b[i]).abs() < 1e-15);
        }
    }

    #[test]
    fn test_solve_needs_pivoting() {
        // Zero leading entry forces a row swap
        let a = array![[0.0, 2.0, 1.0], [1.0, 1.0, 0.0], [3.0, 0.0, 1.0]];
        let b = array![5.0, 3.0, 6.0];
        let x = lu_solve(&a, &b).unwrap();
        let r = residual(&a, &x, &b);
        for i in 0..3 {
            assert!(r[i].abs() < 1e-12, "residual[{i}] = {}", r[i]);
        }
    }

    #[test]
    fn test_determinant_with_swap() {
        let a = array![[0.0, 1.0], [1.0, 0.0]];
        let lu = LuDecomposition::factor(&a).unwrap();
        assert!((lu.determinant() + 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_singular_matrix_is_error() {
        let a = array![[1.0, 2.0], [2.0, 4.0]];
        let err = LuDecomposition::factor(&a).unwrap_err();
        assert!(matches!(err, PhotoError::LinAlg(_)));
    }

    #[test]
    fn test_non_square_is_error() {
        let a = Array2::<f64>::zeros((2, 3));
        assert!(LuDecomposition::factor(&a).is_err());
    }

    #[test]
    fn test_rhs_length_mismatch() {
        let lu = LuDecomposition::factor(&Array2::eye(3)).unwrap();
        assert!(lu.solve(&array![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_factor_reused_for_several_rhs() {
        let a = array![[4.0, 1.0, 0.0], [1.0, 4.0, 1.0], [0.0, 1.0, 4.0]];
        let lu = LuDecomposition::factor(&a).unwrap();
        for k in 0..3 {
            let mut b = Array1::zeros(3);
            b[k] = 1.0;
            let x = lu.solve(&b).unwrap();
            let r = residual(&a, &x, &b);
            assert!(r.iter().all(|v| v.abs() < 1e-14));
        }
    }
}
