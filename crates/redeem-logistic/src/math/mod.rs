//! Small dense numeric helpers shared by the optimizers and encodings.
//!
//! Provides a Cholesky solver for symmetric positive definite systems and
//! the reference-class softmax used by the multinomial loss. Built directly
//! on `ndarray` so no native linear algebra backend is required.
pub mod matrix;
pub mod vector;

pub use matrix::{cholesky_solve, NotPositiveDefinite};
pub use vector::{max_abs, reference_softmax};
