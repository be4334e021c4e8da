use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Seed used for the generator threaded through encoding construction.
pub const DEFAULT_SEED: u64 = 23_626_236;

/// Central configuration for a training run.
///
/// Every field has a default so partial JSON config files deserialize.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrainConfig {
    /// Categorical variables with more observed levels than this are
    /// re-encoded with level statistics instead of a one-hot block.
    pub max_explicit_levels: usize,
    /// L2 penalty weight used during the adaptive Newton passes.
    pub newton_regularization: f64,
    /// L2 penalty weight used during gradient polish.
    pub polish_regularization: f64,
    /// Run a short conjugate-gradient polish in the full coefficient space.
    pub gradient_polish: bool,
    /// Include an intercept column in the standard encoding.
    pub use_intercept: bool,
    /// Seed for the pseudorandom generator used by encoding construction.
    pub seed: u64,
    /// Above this many rows, level statistics are computed on a random
    /// subsample of roughly this size.
    pub stat_sample_rows: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_explicit_levels: 100,
            newton_regularization: 1.0e-3,
            polish_regularization: 1.0e-5,
            gradient_polish: false,
            use_intercept: true,
            seed: DEFAULT_SEED,
            stat_sample_rows: 250_000,
        }
    }
}

impl TrainConfig {
    pub fn new(max_explicit_levels: usize, gradient_polish: bool) -> Self {
        Self {
            max_explicit_levels,
            gradient_polish,
            ..Self::default()
        }
    }
}

/// Load a JSON training configuration; omitted fields keep their defaults.
pub fn load_train_config<P: AsRef<Path>>(path: P) -> Result<TrainConfig> {
    let file = File::open(&path)
        .with_context(|| format!("Failed to open config file: {}", path.as_ref().display()))?;
    let config = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
    Ok(config)
}
