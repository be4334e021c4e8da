use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Names the outcome field and the ordered predictor fields of a model.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    pub outcome: String,
    pub predictors: Vec<String>,
}

impl Formula {
    pub fn new<S: Into<String>>(outcome: S, predictors: Vec<String>) -> Self {
        Self {
            outcome: outcome.into(),
            predictors,
        }
    }
}

impl FromStr for Formula {
    type Err = String;

    /// Parse `"outcome ~ a + b + c"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lhs, rhs) = s
            .split_once('~')
            .ok_or_else(|| format!("Formula must have the form 'outcome ~ a + b': {}", s))?;
        let outcome = lhs.trim();
        if outcome.is_empty() {
            return Err(format!("Formula has no outcome: {}", s));
        }
        let mut predictors: Vec<String> = Vec::new();
        for term in rhs.split('+').map(str::trim).filter(|t| !t.is_empty()) {
            if term == outcome {
                return Err(format!("Outcome '{}' cannot also be a predictor", outcome));
            }
            if !predictors.iter().any(|p| p == term) {
                predictors.push(term.to_string());
            }
        }
        if predictors.is_empty() {
            return Err(format!("Formula has no predictors: {}", s));
        }
        Ok(Formula::new(outcome, predictors))
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ~ {}", self.outcome, self.predictors.join(" + "))
    }
}
