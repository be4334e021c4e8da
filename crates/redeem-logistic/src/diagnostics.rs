//! Post-training diagnostics. Nothing here can change a trained model.
use ndarray::Array1;
use rayon::prelude::*;

use crate::data_handling::RowSource;
use crate::encoding::{linear_scores, Encoding, ExampleProjector};

/// Fraction of usable rows whose most probable class is the observed one.
pub fn accuracy<E, S>(encoding: &E, source: &S, coefficients: &Array1<f64>) -> Result<f64, String>
where
    E: Encoding + ?Sized,
    S: RowSource + ?Sized,
{
    if coefficients.len() != encoding.coefficient_len() {
        return Err(format!(
            "expected {} coefficients, got {}",
            encoding.coefficient_len(),
            coefficients.len()
        ));
    }
    let examples: Vec<_> = ExampleProjector::new(encoding, source).iter().collect();
    if examples.is_empty() {
        return Err("no usable rows to score".to_string());
    }
    let (dim, k) = (encoding.dim(), encoding.noutcomes());

    let correct: usize = examples
        .par_iter()
        .filter(|example| {
            let scores = linear_scores(&example.values, coefficients, dim, k);
            // reference class scores zero; ties go to the lower class
            let mut best = (0, 0.0);
            for (c, &s) in scores.iter().enumerate() {
                if s > best.1 {
                    best = (c + 1, s);
                }
            }
            best.0 == example.category
        })
        .count();

    Ok(correct as f64 / examples.len() as f64)
}

/// Training accuracy, logged. Failures are reported as warnings only.
pub fn report_accuracy<E, S>(encoding: &E, source: &S, coefficients: &Array1<f64>) -> Option<f64>
where
    E: Encoding + ?Sized,
    S: RowSource + ?Sized,
{
    match accuracy(encoding, source, coefficients) {
        Ok(acc) => {
            log::info!("Training accuracy: {:.4}", acc);
            Some(acc)
        }
        Err(e) => {
            log::warn!("Could not compute training accuracy: {}", e);
            None
        }
    }
}
