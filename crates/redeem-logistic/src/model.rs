use std::fmt;

use ndarray::Array1;
use rayon::prelude::*;

use crate::data_handling::Row;
use crate::encoding::{Encoding, StandardEncoding};
use crate::formula::Formula;

/// A trained multinomial logistic regression model.
///
/// Coefficients live in the space of the standard encoding, so the model
/// scores new rows without any of the training machinery.
#[derive(Debug, Clone)]
pub struct Model {
    encoding: StandardEncoding,
    formula: Formula,
    coefficients: Array1<f64>,
}

impl Model {
    pub fn new(encoding: StandardEncoding, formula: Formula, coefficients: Array1<f64>) -> Self {
        Model {
            encoding,
            formula,
            coefficients,
        }
    }

    pub fn encoding(&self) -> &StandardEncoding {
        &self.encoding
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    /// Outcome levels in the order of [`Model::predict_proba`].
    pub fn classes(&self) -> &[String] {
        self.encoding.outcome_levels()
    }

    /// Coefficient of one column for one outcome class, `None` for the
    /// reference class or an unknown column.
    pub fn coefficient(&self, class: &str, variable: &str, level: Option<&str>) -> Option<f64> {
        let k = self.classes().iter().position(|c| c == class)?;
        if k == 0 {
            return None;
        }
        let column = self.encoding.column_of(variable, level)?;
        Some(self.coefficients[(k - 1) * self.encoding.dim() + column])
    }

    /// Class probabilities of a row.
    pub fn predict_proba(&self, row: &Row) -> Vec<f64> {
        self.encoding.predict_proba(row, &self.coefficients)
    }

    /// Most probable outcome level of a row.
    pub fn predict(&self, row: &Row) -> &str {
        let probs = self.predict_proba(row);
        let best = probs
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |acc, (i, &p)| if p > acc.1 { (i, p) } else { acc })
            .0;
        &self.classes()[best]
    }

    pub fn predict_proba_batch(&self, rows: &[Row]) -> Vec<Vec<f64>> {
        rows.par_iter().map(|row| self.predict_proba(row)).collect()
    }

    pub fn predict_batch(&self, rows: &[Row]) -> Vec<&str> {
        rows.par_iter().map(|row| self.predict(row)).collect()
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.formula)?;
        write!(f, "{}", self.encoding.format_solution(&self.coefficients))
    }
}
