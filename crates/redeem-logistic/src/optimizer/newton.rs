use ndarray::Array1;

use crate::math::cholesky_solve;
use crate::objective::{VEval, VectorFn};
use crate::optimizer::{evaluate_start, OptimizerError, VectorOptimizer};

/// Damped Newton's method for concave objectives.
///
/// Each iteration solves `(−H) s = g` by Cholesky and backtracks along `s`
/// until the value increases. Stops when half the Newton decrement falls
/// below `tolerance · (1 + |f|)` or no step improves the value.
#[derive(Debug, Clone)]
pub struct NewtonOptimizer {
    pub tolerance: f64,
    pub max_halvings: usize,
}

impl Default for NewtonOptimizer {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-10,
            max_halvings: 30,
        }
    }
}

impl NewtonOptimizer {
    fn line_search(&self, f: &dyn VectorFn, current: &VEval, step: &Array1<f64>) -> Result<Option<Array1<f64>>, OptimizerError> {
        let mut t = 1.0;
        for _ in 0..=self.max_halvings {
            let candidate = &current.x + &(step * t);
            let trial = f.eval(&candidate, false, false)?;
            if trial.fx.is_finite() && trial.fx > current.fx {
                return Ok(Some(candidate));
            }
            t *= 0.5;
        }
        Ok(None)
    }
}

impl VectorOptimizer for NewtonOptimizer {
    fn maximize(&self, f: &dyn VectorFn, x0: Array1<f64>, max_iterations: usize) -> Result<VEval, OptimizerError> {
        let mut current = evaluate_start(f, &x0, true)?;
        for iteration in 0..max_iterations {
            let hessian = current.hx.as_ref().ok_or(OptimizerError::MissingHessian)?;
            let step = cholesky_solve(&-hessian, &current.gx)?;
            let decrement = step.dot(&current.gx);
            if !decrement.is_finite() {
                return Err(OptimizerError::NonFinite { iteration });
            }
            log::debug!(
                "Newton iteration {}: f = {:.6}, decrement = {:.3e}",
                iteration,
                current.fx,
                decrement
            );
            if 0.5 * decrement <= self.tolerance * (1.0 + current.fx.abs()) {
                // take the final step unless it lowers the value
                let last = f.eval(&(&current.x + &step), true, true)?;
                if last.fx.is_finite() && last.fx >= current.fx {
                    current = last;
                }
                break;
            }
            match self.line_search(f, &current, &step)? {
                Some(x) => current = f.eval(&x, true, true)?,
                None => {
                    log::debug!("Newton line search found no improvement at iteration {}", iteration);
                    break;
                }
            }
        }
        Ok(current)
    }

    fn name(&self) -> &str {
        "newton"
    }
}
