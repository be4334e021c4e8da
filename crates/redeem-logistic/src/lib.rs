//! redeem-logistic: multinomial logistic regression for tabular data with
//! high-cardinality categorical variables.
//!
//! Training runs a fixed-cost Newton optimizer in a reduced space where
//! every categorical variable with too many levels is replaced by a few
//! level-statistic columns. The statistics are refined over a small number
//! of passes and the best solution is translated exactly back into the full
//! one-hot coefficient space, optionally followed by a short gradient polish.
//!
//! The design favors small, testable modules; the optimizers sit behind a
//! trait so the trainer never depends on a concrete strategy.
pub mod config;
pub mod data_handling;
pub mod diagnostics;
pub mod encoding;
pub mod error;
pub mod formula;
pub mod io;
pub mod math;
pub mod model;
pub mod objective;
pub mod optimizer;
pub mod schema;
pub mod trainer;

pub use config::TrainConfig;
pub use data_handling::{Row, RowSource, Value};
pub use error::TrainError;
pub use formula::Formula;
pub use model::Model;
pub use trainer::{LogisticTrainer, TrainingReport};
