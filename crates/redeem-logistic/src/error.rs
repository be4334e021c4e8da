use std::error::Error;
use std::fmt;

use crate::optimizer::OptimizerError;

/// Errors surfaced by a training run.
#[derive(Debug)]
pub enum TrainError {
    /// The training rows could not be scanned into variable definitions.
    SchemaBuild(String),
    /// An adaptive encoding could not be constructed.
    Encoding(String),
    /// Numerical breakdown inside an optimizer. `pass` is the adaptive pass
    /// index, or `None` when the failure happened during gradient polish.
    Optimization {
        pass: Option<usize>,
        source: OptimizerError,
    },
}

impl fmt::Display for TrainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TrainError::SchemaBuild(msg) => write!(f, "Failed to build variable definitions: {}", msg),
            TrainError::Encoding(msg) => write!(f, "Failed to build adaptive encoding: {}", msg),
            TrainError::Optimization { pass: Some(pass), source } => {
                write!(f, "Newton optimization failed on pass {}: {}", pass, source)
            }
            TrainError::Optimization { pass: None, source } => {
                write!(f, "Gradient polish failed: {}", source)
            }
        }
    }
}

impl Error for TrainError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrainError::Optimization { source, .. } => Some(source),
            _ => None,
        }
    }
}
