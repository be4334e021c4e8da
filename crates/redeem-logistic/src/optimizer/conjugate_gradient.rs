use ndarray::Array1;

use crate::objective::{VEval, VectorFn};
use crate::optimizer::{evaluate_start, OptimizerError, VectorOptimizer};

const ARMIJO: f64 = 1.0e-4;

/// Nonlinear conjugate gradient (Polak–Ribière+) with Armijo backtracking.
///
/// Only uses values and gradients, so it stays cheap in the full coefficient
/// space. Steps that do not increase the value are never taken.
#[derive(Debug, Clone)]
pub struct ConjugateGradient {
    pub tolerance: f64,
    pub max_halvings: usize,
}

impl Default for ConjugateGradient {
    fn default() -> Self {
        Self {
            tolerance: 1.0e-10,
            max_halvings: 40,
        }
    }
}

impl VectorOptimizer for ConjugateGradient {
    fn maximize(&self, f: &dyn VectorFn, x0: Array1<f64>, max_iterations: usize) -> Result<VEval, OptimizerError> {
        let mut current = evaluate_start(f, &x0, false)?;
        let mut direction = current.gx.clone();
        let mut step = 1.0;

        for iteration in 0..max_iterations {
            let gnorm2 = current.gx.dot(&current.gx);
            if gnorm2.sqrt() <= self.tolerance * (1.0 + current.fx.abs()) {
                break;
            }
            let mut slope = current.gx.dot(&direction);
            if !(slope > 0.0) {
                direction = current.gx.clone();
                slope = gnorm2;
            }

            let mut t = step;
            let mut accepted = None;
            for _ in 0..=self.max_halvings {
                let candidate = &current.x + &(&direction * t);
                let trial = f.eval(&candidate, false, false)?;
                if trial.fx.is_finite() && trial.fx > current.fx && trial.fx >= current.fx + ARMIJO * t * slope {
                    accepted = Some(candidate);
                    break;
                }
                t *= 0.5;
            }
            let Some(x) = accepted else {
                log::debug!("Conjugate gradient found no improving step at iteration {}", iteration);
                break;
            };

            let next = f.eval(&x, true, false)?;
            let change = &next.gx - &current.gx;
            let beta = (next.gx.dot(&change) / gnorm2).max(0.0);
            direction = &next.gx + &(&direction * beta);
            log::debug!(
                "Conjugate gradient iteration {}: f = {:.6}, step = {:.3e}",
                iteration,
                next.fx,
                t
            );
            step = (t * 2.0).min(1.0);
            current = next;
        }
        Ok(current)
    }

    fn name(&self) -> &str {
        "conjugate-gradient"
    }
}
