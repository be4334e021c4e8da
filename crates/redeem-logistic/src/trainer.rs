//! The adaptive training loop.
//!
//! Training scans the rows once into a [`Schema`], flags categorical
//! variables with too many levels, then runs up to [`MAX_PASSES`] Newton
//! passes. Each pass optimises in a reduced [`AdaptiveEncoding`] whose level
//! statistics are refined from the previous pass's solution. The best
//! accepted pass is translated back into the standard encoding and can
//! optionally be polished there with a gradient method.
use std::collections::BTreeSet;
use std::time::Instant;

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::TrainConfig;
use crate::data_handling::RowSource;
use crate::diagnostics;
use crate::encoding::{AdaptiveEncoding, Encoding, StandardEncoding, StatSettings};
use crate::error::TrainError;
use crate::formula::Formula;
use crate::model::Model;
use crate::objective::{penalized_objective, VEval};
use crate::optimizer::{ConjugateGradient, NewtonOptimizer, VectorOptimizer};
use crate::schema::Schema;

/// Upper bound on adaptive Newton passes.
pub const MAX_PASSES: usize = 5;
/// A pass is accepted only if it beats the previous one by more than this.
pub const IMPROVEMENT_TOLERANCE: f64 = 1.0e-3;
/// Iterations of the full-space gradient polish.
pub const POLISH_ITERATIONS: usize = 5;

/// Categorical variables with more than `max_explicit_levels` observed
/// levels. A variable with no more levels than the `K - 1` statistic
/// columns that would replace it stays explicit.
pub fn triage(schema: &Schema, max_explicit_levels: usize) -> BTreeSet<String> {
    let statistic_columns = schema.noutcomes().saturating_sub(1);
    schema
        .categorical()
        .filter(|(name, levels)| {
            if levels.len() <= max_explicit_levels {
                return false;
            }
            if levels.len() <= statistic_columns {
                log::debug!(
                    "'{}' has {} levels, not more than {} statistic columns; keeping it explicit",
                    name,
                    levels.len(),
                    statistic_columns
                );
                return false;
            }
            true
        })
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Outcome of one adaptive pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PassSummary {
    pub pass: usize,
    /// Feature dimension of the pass's encoding.
    pub dim: usize,
    /// Penalised log-likelihood reached.
    pub fx: f64,
    pub accepted: bool,
}

/// What happened during a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// [`Schema::format_state`] of the training data.
    pub schema_summary: String,
    pub flagged: Vec<String>,
    pub passes: Vec<PassSummary>,
    pub standard_dim: usize,
    pub train_accuracy: Option<f64>,
    pub polished: bool,
}

impl TrainingReport {
    pub fn accepted_passes(&self) -> usize {
        self.passes.iter().filter(|p| p.accepted).count()
    }
}

/// Best accepted pass so far.
struct PassOptimum<'a> {
    encoding: AdaptiveEncoding<'a>,
    coefficients: Array1<f64>,
    fx: f64,
    pass: usize,
}

pub struct LogisticTrainer {
    config: TrainConfig,
    newton: Box<dyn VectorOptimizer>,
    polisher: Box<dyn VectorOptimizer>,
}

impl LogisticTrainer {
    /// Create a trainer using Newton's method for the adaptive passes and
    /// conjugate gradient for the optional polish.
    pub fn new(config: TrainConfig) -> Self {
        Self {
            config,
            newton: Box::new(NewtonOptimizer::default()),
            polisher: Box::new(ConjugateGradient::default()),
        }
    }

    /// Replace the optimizer used by the adaptive passes.
    pub fn with_optimizer(mut self, optimizer: Box<dyn VectorOptimizer>) -> Self {
        self.newton = optimizer;
        self
    }

    /// Replace the optimizer used by the polish phase.
    pub fn with_polisher(mut self, polisher: Box<dyn VectorOptimizer>) -> Self {
        self.polisher = polisher;
        self
    }

    pub fn train<S: RowSource + ?Sized>(
        &self,
        source: &S,
        formula: &Formula,
        weight_key: Option<&str>,
    ) -> Result<Model, TrainError> {
        self.train_with_report(source, formula, weight_key)
            .map(|(model, _)| model)
    }

    /// Train a model and report the passes that produced it.
    pub fn train_with_report<S: RowSource + ?Sized>(
        &self,
        source: &S,
        formula: &Formula,
        weight_key: Option<&str>,
    ) -> Result<(Model, TrainingReport), TrainError> {
        let start_time = Instant::now();
        log::info!("Training {}", formula);

        let schema = Schema::build(formula, source, weight_key)?;
        let schema_summary = schema.format_state();
        log::debug!("{}", schema_summary);
        let standard = StandardEncoding::new(&schema, self.config.use_intercept);

        let flagged = triage(&schema, self.config.max_explicit_levels);
        if flagged.is_empty() {
            log::info!("No variable exceeds {} levels", self.config.max_explicit_levels);
        } else {
            log::info!(
                "Variables with more than {} levels use adaptive encoding: {:?}",
                self.config.max_explicit_levels,
                flagged
            );
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let settings = StatSettings::new(
            self.config.newton_regularization,
            self.config.stat_sample_rows,
            schema.row_count,
        );
        let (best, passes) = self.adaptive_passes(&standard, &flagged, source, &settings, &mut rng)?;
        log::info!("Using pass {} with f = {:.6}", best.pass, best.fx);
        let translated = best.encoding.translate_to(&standard, &best.coefficients)?;
        log::info!("done Newton training\t{}", chrono::Local::now());

        let coefficients = if self.config.gradient_polish {
            self.polish(&standard, source, translated)?
        } else {
            translated
        };

        let train_accuracy = diagnostics::report_accuracy(&standard, source, &coefficients);
        let report = TrainingReport {
            schema_summary,
            flagged: flagged.into_iter().collect(),
            passes,
            standard_dim: standard.dim(),
            train_accuracy,
            polished: self.config.gradient_polish,
        };
        log::info!("Training completed in {:?}", start_time.elapsed());
        Ok((Model::new(standard, formula.clone(), coefficients), report))
    }

    fn adaptive_passes<'a, S, R>(
        &self,
        standard: &'a StandardEncoding,
        flagged: &BTreeSet<String>,
        source: &S,
        settings: &StatSettings,
        rng: &mut R,
    ) -> Result<(PassOptimum<'a>, Vec<PassSummary>), TrainError>
    where
        S: RowSource + ?Sized,
        R: Rng,
    {
        let encoding = AdaptiveEncoding::build(standard, flagged, source, None, settings, rng)?;
        let solution = self.optimize_pass(&encoding, source, 1)?;
        let mut passes = vec![PassSummary {
            pass: 1,
            dim: encoding.dim(),
            fx: solution.fx,
            accepted: true,
        }];
        let mut best = PassOptimum {
            encoding,
            coefficients: solution.x,
            fx: solution.fx,
            pass: 1,
        };

        while best.pass < MAX_PASSES && best.encoding.has_encoded_variables() {
            let pass = best.pass + 1;
            let encoding = AdaptiveEncoding::build(
                standard,
                flagged,
                source,
                Some((&best.encoding, &best.coefficients)),
                settings,
                rng,
            )?;
            let solution = self.optimize_pass(&encoding, source, pass)?;
            let accepted = best.fx + IMPROVEMENT_TOLERANCE < solution.fx;
            passes.push(PassSummary {
                pass,
                dim: encoding.dim(),
                fx: solution.fx,
                accepted,
            });
            if !accepted {
                log::info!(
                    "Pass {} (f = {:.6}) does not improve on pass {} (f = {:.6}); stopping",
                    pass,
                    solution.fx,
                    best.pass,
                    best.fx
                );
                break;
            }
            best = PassOptimum {
                encoding,
                coefficients: solution.x,
                fx: solution.fx,
                pass,
            };
        }
        Ok((best, passes))
    }

    fn optimize_pass<S: RowSource + ?Sized>(
        &self,
        encoding: &AdaptiveEncoding<'_>,
        source: &S,
        pass: usize,
    ) -> Result<VEval, TrainError> {
        log::debug!(
            "Pass {}: {} in {} dimensions",
            pass,
            self.newton.name(),
            encoding.dim()
        );
        let objective = penalized_objective(encoding, source, self.config.newton_regularization);
        let solution = self
            .newton
            .maximize(&objective, encoding.warm_start().clone(), usize::MAX)
            .map_err(|source| TrainError::Optimization {
                pass: Some(pass),
                source,
            })?;
        log::info!("Pass {}: f = {:.6}", pass, solution.fx);
        Ok(solution)
    }

    fn polish<S: RowSource + ?Sized>(
        &self,
        standard: &StandardEncoding,
        source: &S,
        start: Array1<f64>,
    ) -> Result<Array1<f64>, TrainError> {
        log::info!(
            "Polishing with {} for {} iterations",
            self.polisher.name(),
            POLISH_ITERATIONS
        );
        let objective = penalized_objective(standard, source, self.config.polish_regularization);
        let solution = self
            .polisher
            .maximize(&objective, start, POLISH_ITERATIONS)
            .map_err(|source| TrainError::Optimization { pass: None, source })?;
        log::info!("done gradient polish\t{}", chrono::Local::now());
        Ok(solution.x)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::data_handling::{row, Row, Value};
    use crate::objective::VectorFn;
    use crate::optimizer::OptimizerError;

    /// Returns a fixed sequence of values; the intercept of the returned
    /// point records which call produced it.
    struct Scripted {
        values: Vec<f64>,
        calls: Cell<usize>,
    }

    impl Scripted {
        fn new(values: Vec<f64>) -> Self {
            Self {
                values,
                calls: Cell::new(0),
            }
        }
    }

    impl VectorOptimizer for Scripted {
        fn maximize(&self, f: &dyn VectorFn, _x0: Array1<f64>, _max_iterations: usize) -> Result<VEval, OptimizerError> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            let mut x = Array1::zeros(f.dim());
            x[0] = (call + 1) as f64;
            let fx = self.values.get(call).copied().unwrap_or(f64::NAN);
            Ok(VEval {
                x,
                fx,
                gx: Array1::zeros(0),
                hx: None,
            })
        }
    }

    struct Failing;

    impl VectorOptimizer for Failing {
        fn maximize(&self, _f: &dyn VectorFn, _x0: Array1<f64>, _max_iterations: usize) -> Result<VEval, OptimizerError> {
            Err(OptimizerError::NonFinite { iteration: 3 })
        }
    }

    fn rows() -> Vec<Row> {
        (0..30)
            .map(|i| {
                row([
                    ("y", Value::from(if i % 3 == 0 { "b" } else { "a" })),
                    ("g", Value::from(["p", "q", "r"][i % 3])),
                    ("x", Value::Num((i % 5) as f64)),
                ])
            })
            .collect()
    }

    fn formula() -> Formula {
        "y ~ g + x".parse().unwrap()
    }

    #[test]
    fn test_triage() {
        let rows = rows();
        let schema = Schema::build(&formula(), &rows, None).unwrap();
        assert!(triage(&schema, 3).is_empty());
        assert_eq!(triage(&schema, 2).into_iter().collect::<Vec<_>>(), vec!["g"]);
    }

    #[test]
    fn test_triage_keeps_variables_no_wider_than_their_statistics() {
        // four outcome classes: a re-encoded block would take three columns
        let rows: Vec<Row> = (0..40)
            .map(|i| {
                row([
                    ("y", Value::from(["a", "b", "c", "d"][i % 4])),
                    ("g", Value::from(["p", "q"][i % 2])),
                    ("h", Value::from(["r", "s", "t", "u", "v"][i % 5])),
                    ("x", Value::Num((i % 7) as f64)),
                ])
            })
            .collect();
        let formula: Formula = "y ~ g + h + x".parse().unwrap();
        let schema = Schema::build(&formula, &rows, None).unwrap();
        assert_eq!(triage(&schema, 1).into_iter().collect::<Vec<_>>(), vec!["h"]);

        let trainer = LogisticTrainer::new(TrainConfig::new(1, false))
            .with_optimizer(Box::new(Scripted::new(vec![-10.0, -20.0])));
        let (_, report) = trainer.train_with_report(&rows, &formula, None).unwrap();
        assert_eq!(report.flagged, vec!["h".to_string()]);
        // intercept + g (2) + h (5) + x
        assert_eq!(report.standard_dim, 9);
        // intercept + g (2) + h statistics (3) + x
        assert!(report.passes.iter().all(|p| p.dim == 7 && p.dim < report.standard_dim));
        assert!(report.schema_summary.contains("categorical 'h': 5 levels"));
    }

    #[test]
    fn test_pass_cap() {
        let rows = rows();
        let trainer = LogisticTrainer::new(TrainConfig::new(1, false))
            .with_optimizer(Box::new(Scripted::new(vec![-50.0, -40.0, -30.0, -20.0, -10.0, -5.0])));
        let (model, report) = trainer.train_with_report(&rows, &formula(), None).unwrap();
        assert_eq!(report.passes.len(), MAX_PASSES);
        assert_eq!(report.accepted_passes(), MAX_PASSES);
        assert_eq!(report.flagged, vec!["g".to_string()]);
        // reduced space: intercept, one statistic column, x
        assert!(report.passes.iter().all(|p| p.dim == 3));
        assert_eq!(report.standard_dim, 5);
        assert_eq!(model.coefficients()[0], 5.0);
    }

    #[test]
    fn test_non_improving_pass_is_discarded() {
        let rows = rows();
        let trainer = LogisticTrainer::new(TrainConfig::new(1, false))
            .with_optimizer(Box::new(Scripted::new(vec![-10.0, -5.0, -5.0005])));
        let (model, report) = trainer.train_with_report(&rows, &formula(), None).unwrap();
        assert_eq!(report.passes.len(), 3);
        assert_eq!(report.accepted_passes(), 2);
        assert!(!report.passes[2].accepted);
        assert_eq!(model.coefficients()[0], 2.0);
    }

    #[test]
    fn test_no_flagged_variables_runs_one_pass() {
        let rows = rows();
        let trainer = LogisticTrainer::new(TrainConfig::default())
            .with_optimizer(Box::new(Scripted::new(vec![-10.0, -5.0])));
        let (model, report) = trainer.train_with_report(&rows, &formula(), None).unwrap();
        assert_eq!(report.passes.len(), 1);
        assert!(report.flagged.is_empty());
        assert_eq!(model.coefficients().len(), 5);
    }

    #[test]
    fn test_optimizer_failures_carry_the_phase() {
        let rows = rows();
        let trainer = LogisticTrainer::new(TrainConfig::default()).with_optimizer(Box::new(Failing));
        match trainer.train(&rows, &formula(), None) {
            Err(TrainError::Optimization { pass: Some(1), .. }) => {}
            other => panic!("unexpected {:?}", other.map(|m| m.to_string())),
        }

        let trainer = LogisticTrainer::new(TrainConfig::new(100, true)).with_polisher(Box::new(Failing));
        match trainer.train(&rows, &formula(), None) {
            Err(TrainError::Optimization { pass: None, .. }) => {}
            other => panic!("unexpected {:?}", other.map(|m| m.to_string())),
        }
    }

    #[test]
    fn test_schema_errors_propagate() {
        let rows: Vec<Row> = vec![row([("y", "a")]), row([("y", "a")])];
        assert!(matches!(
            LogisticTrainer::new(TrainConfig::default()).train(&rows, &formula(), None),
            Err(TrainError::SchemaBuild(_))
        ));
    }
}
