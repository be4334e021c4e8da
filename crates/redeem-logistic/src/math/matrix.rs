use std::error::Error;
use std::fmt;

use ndarray::{Array1, Array2};

/// Raised when a Cholesky factorization meets a non-positive pivot.
#[derive(Debug, Clone, PartialEq)]
pub struct NotPositiveDefinite {
    pub pivot: usize,
    pub value: f64,
}

impl fmt::Display for NotPositiveDefinite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "matrix is not positive definite (pivot {} = {})",
            self.pivot, self.value
        )
    }
}

impl Error for NotPositiveDefinite {}

/// Lower-triangular Cholesky factor `L` with `a = L Lᵀ`.
pub fn cholesky(a: &Array2<f64>) -> Result<Array2<f64>, NotPositiveDefinite> {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "cholesky requires a square matrix");
    let mut l = Array2::<f64>::zeros((n, n));
    for j in 0..n {
        let mut diag = a[(j, j)];
        for k in 0..j {
            diag -= l[(j, k)] * l[(j, k)];
        }
        if !(diag > 0.0) || !diag.is_finite() {
            return Err(NotPositiveDefinite { pivot: j, value: diag });
        }
        let ljj = diag.sqrt();
        l[(j, j)] = ljj;
        for i in (j + 1)..n {
            let mut s = a[(i, j)];
            for k in 0..j {
                s -= l[(i, k)] * l[(j, k)];
            }
            l[(i, j)] = s / ljj;
        }
    }
    Ok(l)
}

/// Solve `a x = b` for symmetric positive definite `a`.
pub fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>, NotPositiveDefinite> {
    assert_eq!(a.nrows(), b.len(), "cholesky_solve dimension mismatch");
    let l = cholesky(a)?;
    let n = b.len();

    // forward: L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut s = b[i];
        for k in 0..i {
            s -= l[(i, k)] * y[k];
        }
        y[i] = s / l[(i, i)];
    }

    // backward: Lᵀ x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut s = y[i];
        for k in (i + 1)..n {
            s -= l[(k, i)] * x[k];
        }
        x[i] = s / l[(i, i)];
    }
    Ok(x)
}
