//! Variable definitions discovered by a single scan of the training rows.
//!
//! For each predictor the scan records either the observed categorical
//! levels (with weighted counts) or a summary of its continuous values. A
//! predictor is categorical as soon as any row carries a text value for it.
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::data_handling::{Row, RowSource, Value};
use crate::error::TrainError;
use crate::formula::Formula;

#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for NumericSummary {
    fn default() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl NumericSummary {
    fn observe(&mut self, v: f64) {
        self.count += 1;
        self.mean += (v - self.mean) / self.count as f64;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VariableKind {
    /// Observed level → weighted count.
    Categorical(BTreeMap<String, f64>),
    Continuous(NumericSummary),
}

/// Immutable variable definitions for one training run.
#[derive(Debug, Clone)]
pub struct Schema {
    pub outcome: String,
    pub weight_key: Option<String>,
    /// Predictors in formula order.
    pub variables: Vec<(String, VariableKind)>,
    /// Outcome level → weighted count, sorted by level name.
    pub outcome_levels: BTreeMap<String, f64>,
    /// Rows carrying an outcome value.
    pub row_count: usize,
    pub total_weight: f64,
}

/// Distinct numeric values a purely numeric field may record as level
/// strings before its level table is dropped.
pub(crate) const MAX_NUMERIC_LEVELS: usize = 10_000;

#[derive(Default)]
struct FieldScan {
    levels: BTreeMap<String, f64>,
    numeric: NumericSummary,
    saw_text: bool,
    /// Numeric level table dropped; the field can only be continuous.
    levels_dropped: bool,
}

impl FieldScan {
    fn record_level(&mut self, level: String, weight: f64) {
        if self.levels_dropped {
            return;
        }
        *self.levels.entry(level).or_insert(0.0) += weight;
        if !self.saw_text && self.levels.len() > MAX_NUMERIC_LEVELS {
            self.levels = BTreeMap::new();
            self.levels_dropped = true;
        }
    }
}

/// Weight of a row. Missing → 1.0; present values must be finite and
/// non-negative.
pub(crate) fn row_weight(row: &Row, weight_key: Option<&str>) -> Result<f64, String> {
    let Some(key) = weight_key else {
        return Ok(1.0);
    };
    match row.get(key) {
        None => Ok(1.0),
        Some(value) => match value.as_f64() {
            Some(w) if w.is_finite() && w >= 0.0 => Ok(w),
            _ => Err(format!("invalid weight '{}' in field '{}'", value, key)),
        },
    }
}

impl Schema {
    /// Scan `source` once and build the variable definitions for `formula`.
    pub fn build<S: RowSource + ?Sized>(
        formula: &Formula,
        source: &S,
        weight_key: Option<&str>,
    ) -> Result<Self, TrainError> {
        let mut fields: Vec<FieldScan> = formula.predictors.iter().map(|_| FieldScan::default()).collect();
        let mut outcome_levels: BTreeMap<String, f64> = BTreeMap::new();
        let mut row_count = 0usize;
        let mut total_weight = 0.0;
        let mut seen_rows = 0usize;

        for (row_idx, row) in source.rows().enumerate() {
            seen_rows += 1;
            let Some(outcome) = row.get(&formula.outcome) else {
                continue;
            };
            let weight = row_weight(&row, weight_key)
                .map_err(|e| TrainError::SchemaBuild(format!("row {}: {}", row_idx + 1, e)))?;
            *outcome_levels.entry(outcome.as_level().into_owned()).or_insert(0.0) += weight;
            row_count += 1;
            total_weight += weight;

            for (name, scan) in formula.predictors.iter().zip(fields.iter_mut()) {
                let Some(value) = row.get(name) else {
                    continue;
                };
                if value.is_categorical() {
                    if scan.levels_dropped {
                        return Err(TrainError::SchemaBuild(format!(
                            "row {}: text value in field '{}' after more than {} distinct numeric values",
                            row_idx + 1,
                            name,
                            MAX_NUMERIC_LEVELS
                        )));
                    }
                    scan.saw_text = true;
                } else if let Value::Num(v) = value {
                    if !v.is_finite() {
                        return Err(TrainError::SchemaBuild(format!(
                            "row {}: non-finite value in field '{}'",
                            row_idx + 1,
                            name
                        )));
                    }
                    scan.numeric.observe(*v);
                }
                scan.record_level(value.as_level().into_owned(), weight);
            }
        }

        if seen_rows == 0 {
            return Err(TrainError::SchemaBuild("training source is empty".to_string()));
        }
        if row_count == 0 {
            return Err(TrainError::SchemaBuild(format!(
                "no row carries the outcome field '{}'",
                formula.outcome
            )));
        }
        if outcome_levels.len() < 2 {
            return Err(TrainError::SchemaBuild(format!(
                "outcome '{}' needs at least two levels, found {}",
                formula.outcome,
                outcome_levels.len()
            )));
        }

        let variables = formula
            .predictors
            .iter()
            .zip(fields)
            .map(|(name, scan)| {
                let kind = if scan.saw_text {
                    VariableKind::Categorical(scan.levels)
                } else {
                    if scan.numeric.count == 0 {
                        log::warn!("Predictor '{}' never observed; its column stays at zero", name);
                    }
                    VariableKind::Continuous(scan.numeric)
                };
                (name.clone(), kind)
            })
            .collect();

        Ok(Schema {
            outcome: formula.outcome.clone(),
            weight_key: weight_key.map(str::to_string),
            variables,
            outcome_levels,
            row_count,
            total_weight,
        })
    }

    /// Categorical predictors and their level tables.
    pub fn categorical(&self) -> impl Iterator<Item = (&str, &BTreeMap<String, f64>)> {
        self.variables.iter().filter_map(|(name, kind)| match kind {
            VariableKind::Categorical(levels) => Some((name.as_str(), levels)),
            VariableKind::Continuous(_) => None,
        })
    }

    pub fn levels(&self, variable: &str) -> Option<&BTreeMap<String, f64>> {
        self.categorical()
            .find(|(name, _)| *name == variable)
            .map(|(_, levels)| levels)
    }

    pub fn noutcomes(&self) -> usize {
        self.outcome_levels.len()
    }

    /// Human readable summary of the discovered variables.
    pub fn format_state(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "outcome '{}': {} levels over {} rows (total weight {})",
            self.outcome,
            self.outcome_levels.len(),
            self.row_count,
            self.total_weight
        );
        for (level, count) in &self.outcome_levels {
            let _ = writeln!(out, "\t{}\t{}", level, count);
        }
        for (name, kind) in &self.variables {
            match kind {
                VariableKind::Categorical(levels) => {
                    let _ = writeln!(out, "categorical '{}': {} levels", name, levels.len());
                }
                VariableKind::Continuous(s) => {
                    let _ = writeln!(
                        out,
                        "continuous '{}': n={} mean={:.6} min={} max={}",
                        name, s.count, s.mean, s.min, s.max
                    );
                }
            }
        }
        out
    }
}
