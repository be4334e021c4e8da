//! Encodings project raw rows into coefficient spaces.
//!
//! `StandardEncoding` is the fixed full-width layout (one-hot per level,
//! continuous pass-through, optional intercept). `AdaptiveEncoding`
//! replaces the one-hot blocks of high-cardinality variables with a few
//! level-statistic columns and can translate its coefficients back into the
//! standard layout. Both implement [`Encoding`], which is all the objective
//! and the projector need.
pub mod adaptive;
pub mod projector;
pub mod standard;

pub use adaptive::{AdaptiveEncoding, StatSettings};
pub use projector::{ExampleProjector, ExampleRow};
pub use standard::StandardEncoding;

use ndarray::Array1;

use crate::data_handling::Row;
use crate::math::reference_softmax;

/// Sparse feature vector: `(column, value)` pairs with increasing columns.
pub type SparseVec = Vec<(usize, f64)>;

pub trait Encoding {
    /// Number of feature columns.
    fn dim(&self) -> usize;

    /// Number of outcome classes.
    fn noutcomes(&self) -> usize;

    /// Feature vector of a row.
    fn features(&self, row: &Row) -> SparseVec;

    /// Outcome class of a row, `None` when the outcome is missing or unknown.
    fn outcome_index(&self, row: &Row) -> Option<usize>;

    /// Row weight, `None` when the weight field is malformed.
    fn weight(&self, row: &Row) -> Option<f64>;

    /// Length of a coefficient vector in this space: one block of `dim()`
    /// per non-reference class.
    fn coefficient_len(&self) -> usize {
        self.dim() * (self.noutcomes() - 1)
    }

    /// Project a training row; rows without a usable outcome are dropped.
    fn project(&self, row: &Row) -> Option<ExampleRow> {
        let category = self.outcome_index(row)?;
        let weight = self.weight(row)?;
        Some(ExampleRow {
            values: self.features(row),
            weight,
            category,
        })
    }

    /// Class probabilities of a row under `coefficients`.
    fn predict_proba(&self, row: &Row, coefficients: &Array1<f64>) -> Vec<f64> {
        let features = self.features(row);
        let scores = linear_scores(&features, coefficients, self.dim(), self.noutcomes());
        reference_softmax(&scores)
    }
}

/// Scores of the non-reference classes for one feature vector.
pub fn linear_scores(
    features: &[(usize, f64)],
    coefficients: &Array1<f64>,
    dim: usize,
    noutcomes: usize,
) -> Vec<f64> {
    (0..noutcomes - 1)
        .map(|c| {
            let base = c * dim;
            features
                .iter()
                .map(|&(j, v)| coefficients[base + j] * v)
                .sum()
        })
        .collect()
}
