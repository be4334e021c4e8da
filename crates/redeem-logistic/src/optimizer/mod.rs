//! Maximisers for the training objective.
//!
//! The trainer only depends on [`VectorOptimizer`]; which concrete strategy
//! runs a phase is a trait object chosen at construction time.
pub mod conjugate_gradient;
pub mod newton;

pub use conjugate_gradient::ConjugateGradient;
pub use newton::NewtonOptimizer;

use std::error::Error;
use std::fmt;

use ndarray::Array1;

use crate::math::NotPositiveDefinite;
use crate::objective::{VEval, VectorFn};

#[derive(Debug, Clone, PartialEq)]
pub enum OptimizerError {
    /// The objective produced a NaN or infinite value.
    NonFinite { iteration: usize },
    /// The negated Hessian could not be factorised.
    NotPositiveDefinite(NotPositiveDefinite),
    /// A starting point or evaluation did not match the objective's dimension.
    DimensionMismatch { expected: usize, found: usize },
    /// A second-order method was given an objective that returned no Hessian.
    MissingHessian,
}

impl fmt::Display for OptimizerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OptimizerError::NonFinite { iteration } => {
                write!(f, "objective is not finite at iteration {}", iteration)
            }
            OptimizerError::NotPositiveDefinite(e) => write!(f, "singular Hessian: {}", e),
            OptimizerError::DimensionMismatch { expected, found } => {
                write!(f, "expected a vector of length {}, got {}", expected, found)
            }
            OptimizerError::MissingHessian => write!(f, "objective returned no Hessian"),
        }
    }
}

impl Error for OptimizerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OptimizerError::NotPositiveDefinite(e) => Some(e),
            _ => None,
        }
    }
}

impl From<NotPositiveDefinite> for OptimizerError {
    fn from(e: NotPositiveDefinite) -> Self {
        OptimizerError::NotPositiveDefinite(e)
    }
}

/// A strategy that maximises a [`VectorFn`] from a starting point.
pub trait VectorOptimizer {
    /// Run at most `max_iterations` iterations from `x0` and return the
    /// final evaluation. The returned point never has a lower value than
    /// `x0`.
    fn maximize(&self, f: &dyn VectorFn, x0: Array1<f64>, max_iterations: usize) -> Result<VEval, OptimizerError>;

    /// Optional human readable name for the optimizer
    fn name(&self) -> &str {
        "optimizer"
    }
}

/// Evaluate `f` at `x0` after checking its dimension and finiteness.
pub(crate) fn evaluate_start(
    f: &dyn VectorFn,
    x0: &Array1<f64>,
    want_hessian: bool,
) -> Result<VEval, OptimizerError> {
    if x0.len() != f.dim() {
        return Err(OptimizerError::DimensionMismatch {
            expected: f.dim(),
            found: x0.len(),
        });
    }
    let start = f.eval(x0, true, want_hessian)?;
    if !start.fx.is_finite() {
        return Err(OptimizerError::NonFinite { iteration: 0 });
    }
    Ok(start)
}
