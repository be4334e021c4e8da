use std::collections::BTreeMap;
use std::fmt::Write as _;

use ndarray::Array1;

use crate::data_handling::Row;
use crate::encoding::{Encoding, SparseVec};
use crate::schema::{row_weight, Schema, VariableKind};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BlockKind {
    Continuous,
    /// Level → position inside the block.
    Categorical(BTreeMap<String, usize>),
}

/// The columns one predictor occupies.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Block {
    pub(crate) name: String,
    pub(crate) offset: usize,
    pub(crate) kind: BlockKind,
}

impl Block {
    pub(crate) fn width(&self) -> usize {
        match &self.kind {
            BlockKind::Continuous => 1,
            BlockKind::Categorical(levels) => levels.len(),
        }
    }

    /// The single active entry of this block for `row`, as
    /// `(position inside the block, value)`.
    pub(crate) fn entry(&self, row: &Row) -> Option<(usize, f64)> {
        let value = row.get(&self.name)?;
        match &self.kind {
            BlockKind::Continuous => value.as_f64().filter(|v| v.is_finite()).map(|v| (0, v)),
            BlockKind::Categorical(levels) => levels.get(&*value.as_level()).map(|&i| (i, 1.0)),
        }
    }
}

/// Full-width deterministic encoding of rows.
///
/// Layout: intercept at column 0 when enabled, then one block per predictor
/// in formula order. Continuous predictors take one column (value passed
/// through, missing → 0); categorical predictors take one column per
/// observed level in sorted order (missing or unseen level → all zero).
#[derive(Debug, Clone, PartialEq)]
pub struct StandardEncoding {
    outcome: String,
    weight_key: Option<String>,
    outcome_levels: Vec<String>,
    use_intercept: bool,
    blocks: Vec<Block>,
    dim: usize,
}

impl StandardEncoding {
    pub fn new(schema: &Schema, use_intercept: bool) -> Self {
        let mut offset = usize::from(use_intercept);
        let mut blocks = Vec::with_capacity(schema.variables.len());
        for (name, kind) in &schema.variables {
            let kind = match kind {
                VariableKind::Continuous(_) => BlockKind::Continuous,
                VariableKind::Categorical(levels) => BlockKind::Categorical(
                    levels.keys().enumerate().map(|(i, l)| (l.clone(), i)).collect(),
                ),
            };
            let block = Block {
                name: name.clone(),
                offset,
                kind,
            };
            offset += block.width();
            blocks.push(block);
        }
        StandardEncoding {
            outcome: schema.outcome.clone(),
            weight_key: schema.weight_key.clone(),
            outcome_levels: schema.outcome_levels.keys().cloned().collect(),
            use_intercept,
            blocks,
            dim: offset,
        }
    }

    pub(crate) fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn use_intercept(&self) -> bool {
        self.use_intercept
    }

    /// Outcome levels in class-index order; index 0 is the reference class.
    pub fn outcome_levels(&self) -> &[String] {
        &self.outcome_levels
    }

    /// Column of a continuous variable, or of one level of a categorical one.
    pub fn column_of(&self, variable: &str, level: Option<&str>) -> Option<usize> {
        let block = self.blocks.iter().find(|b| b.name == variable)?;
        match (&block.kind, level) {
            (BlockKind::Continuous, None) => Some(block.offset),
            (BlockKind::Categorical(levels), Some(level)) => levels.get(level).map(|i| block.offset + i),
            _ => None,
        }
    }

    /// Name of every column, e.g. `(intercept)`, `size`, `color=red`.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.dim);
        if self.use_intercept {
            names.push("(intercept)".to_string());
        }
        for block in &self.blocks {
            match &block.kind {
                BlockKind::Continuous => names.push(block.name.clone()),
                BlockKind::Categorical(levels) => {
                    names.extend(levels.keys().map(|l| format!("{}={}", block.name, l)))
                }
            }
        }
        names
    }

    /// Tabulate a coefficient vector: one line per class and column.
    pub fn format_solution(&self, coefficients: &Array1<f64>) -> String {
        let names = self.column_names();
        let mut out = String::new();
        for (c, level) in self.outcome_levels.iter().enumerate().skip(1) {
            let base = (c - 1) * self.dim;
            for (j, name) in names.iter().enumerate() {
                let _ = writeln!(out, "{}\t{}\t{:.6}", level, name, coefficients[base + j]);
            }
        }
        out
    }
}

impl Encoding for StandardEncoding {
    fn dim(&self) -> usize {
        self.dim
    }

    fn noutcomes(&self) -> usize {
        self.outcome_levels.len()
    }

    fn features(&self, row: &Row) -> SparseVec {
        let mut features = Vec::with_capacity(self.blocks.len() + 1);
        if self.use_intercept {
            features.push((0, 1.0));
        }
        for block in &self.blocks {
            if let Some((i, v)) = block.entry(row) {
                if v != 0.0 {
                    features.push((block.offset + i, v));
                }
            }
        }
        features
    }

    fn outcome_index(&self, row: &Row) -> Option<usize> {
        let level = row.get(&self.outcome)?.as_level();
        self.outcome_levels
            .binary_search_by(|l| l.as_str().cmp(&*level))
            .ok()
    }

    fn weight(&self, row: &Row) -> Option<f64> {
        row_weight(row, self.weight_key.as_deref()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_handling::{row, Value};
    use crate::formula::Formula;

    fn encoding(use_intercept: bool) -> StandardEncoding {
        let rows = vec![
            row([("y", Value::from("no")), ("color", "red".into()), ("size", Value::Num(1.0))]),
            row([("y", Value::from("yes")), ("color", "blue".into()), ("size", Value::Num(2.0))]),
            row([("y", Value::from("yes")), ("color", "green".into()), ("size", Value::Num(0.5))]),
        ];
        let formula: Formula = "y ~ color + size".parse().unwrap();
        let schema = Schema::build(&formula, &rows, None).unwrap();
        StandardEncoding::new(&schema, use_intercept)
    }

    #[test]
    fn test_layout() {
        let enc = encoding(true);
        assert_eq!(enc.dim(), 5);
        assert_eq!(enc.noutcomes(), 2);
        assert_eq!(
            enc.column_names(),
            vec!["(intercept)", "color=blue", "color=green", "color=red", "size"]
        );
        assert_eq!(enc.column_of("color", Some("red")), Some(3));
        assert_eq!(enc.column_of("size", None), Some(4));
        assert_eq!(enc.column_of("color", Some("purple")), None);
        assert_eq!(encoding(false).dim(), 4);
    }

    #[test]
    fn test_features_and_outcome() {
        let enc = encoding(true);
        let r = row([("y", Value::from("yes")), ("color", "green".into()), ("size", Value::Num(3.0))]);
        assert_eq!(enc.features(&r), vec![(0, 1.0), (2, 1.0), (4, 3.0)]);
        assert_eq!(enc.outcome_index(&r), Some(1));

        let sparse = row([("color", "purple")]);
        assert_eq!(enc.features(&sparse), vec![(0, 1.0)]);
        assert_eq!(enc.outcome_index(&sparse), None);
        assert!(enc.project(&sparse).is_none());
    }

    #[test]
    fn test_format_solution() {
        let enc = encoding(true);
        let coefs = Array1::from_vec(vec![0.5, 0.0, 0.0, -1.0, 2.0]);
        let text = enc.format_solution(&coefs);
        assert_eq!(text.lines().count(), 5);
        assert!(text.contains("yes\tcolor=red\t-1.000000"));
    }
}
