//! Statistic-based reduced encoding for high-cardinality categorical variables.
//!
//! Each re-encoded variable is replaced by `K - 1` columns (one per
//! non-reference outcome class). A row's values in those columns are the
//! statistics of its level, so a coefficient block `w` over them gives the
//! level `L` an effective class-`k` coefficient of `Σ_j w[k, j] · stat[L][j]`.
//! That identity is what makes [`AdaptiveEncoding::translate_to`] exact.
//!
//! Statistics come from one of two constructions:
//!
//! * fresh: smoothed empirical log-odds of each class against the reference
//!   class within the level, centred on the overall log-odds;
//! * refined: starting from a previous model, a few ridge-damped Newton
//!   steps on each level's own effects with every other contribution held
//!   fixed. The refitted effects become the new statistics and the warm
//!   start reproduces the refitted model.
use std::collections::BTreeSet;

use ndarray::{Array1, Array2};
use rand::Rng;

use crate::data_handling::{Row, RowSource};
use crate::encoding::standard::{Block, BlockKind};
use crate::encoding::{linear_scores, Encoding, SparseVec, StandardEncoding};
use crate::error::TrainError;
use crate::math::{cholesky_solve, max_abs, reference_softmax};

/// Pseudo-count weight of the overall class rates in fresh level statistics.
pub const LEVEL_PRIOR_WEIGHT: f64 = 1.0;

const MAX_REFIT_STEPS: usize = 4;
const REFIT_TOLERANCE: f64 = 1.0e-6;
const MAX_REFIT_STEP: f64 = 5.0;

/// Settings for the level-statistics scans.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatSettings {
    /// L2 weight on the per-level effects during refits.
    pub regularization: f64,
    /// Fraction of rows used for statistics; 1.0 uses every row.
    pub sample_rate: f64,
}

impl StatSettings {
    pub fn new(regularization: f64, stat_sample_rows: usize, row_count: usize) -> Self {
        let sample_rate = if row_count > stat_sample_rows && row_count > 0 {
            stat_sample_rows as f64 / row_count as f64
        } else {
            1.0
        };
        Self {
            regularization,
            sample_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum AdaptiveBlock {
    /// Same columns as the standard block.
    Explicit { offset: usize },
    /// `K - 1` statistic columns; `stats[i]` belongs to the standard
    /// block's level at position `i`.
    Encoded { offset: usize, stats: Vec<Vec<f64>> },
}

/// A reduced encoding snapshot for one adaptive pass.
#[derive(Debug, Clone)]
pub struct AdaptiveEncoding<'a> {
    standard: &'a StandardEncoding,
    blocks: Vec<AdaptiveBlock>,
    dim: usize,
    warm_start: Array1<f64>,
}

impl<'a> AdaptiveEncoding<'a> {
    /// Build the encoding for the `flagged` variables.
    ///
    /// Without `prior` the statistics are computed from the data alone and
    /// the warm start is zero. With `prior = (encoding, coefficients)` the
    /// statistics are refitted from that model and the warm start reproduces
    /// it in the new space. `rng` decides the statistics subsample.
    pub fn build<S, R>(
        standard: &'a StandardEncoding,
        flagged: &BTreeSet<String>,
        source: &S,
        prior: Option<(&AdaptiveEncoding<'_>, &Array1<f64>)>,
        settings: &StatSettings,
        rng: &mut R,
    ) -> Result<Self, TrainError>
    where
        S: RowSource + ?Sized,
        R: Rng,
    {
        if standard.noutcomes() < 2 {
            return Err(TrainError::Encoding("outcome needs at least two levels".to_string()));
        }
        for name in flagged {
            match standard.blocks().iter().find(|b| &b.name == name) {
                Some(Block {
                    kind: BlockKind::Categorical(levels),
                    ..
                }) if !levels.is_empty() => {}
                Some(Block {
                    kind: BlockKind::Categorical(_),
                    ..
                }) => {
                    return Err(TrainError::Encoding(format!(
                        "variable '{}' has no observed levels",
                        name
                    )))
                }
                _ => {
                    return Err(TrainError::Encoding(format!(
                        "variable '{}' is not a categorical predictor",
                        name
                    )))
                }
            }
        }

        let km1 = standard.noutcomes() - 1;
        let mut offset = usize::from(standard.use_intercept());
        let mut blocks = Vec::with_capacity(standard.blocks().len());
        let mut encoded = Vec::new();
        for (idx, block) in standard.blocks().iter().enumerate() {
            // statistics replace a block only when they are narrower than it
            if flagged.contains(&block.name) && block.width() > km1 {
                encoded.push(idx);
                blocks.push(AdaptiveBlock::Encoded {
                    offset,
                    stats: Vec::new(),
                });
                offset += km1;
            } else {
                blocks.push(AdaptiveBlock::Explicit { offset });
                offset += block.width();
            }
        }
        let dim = offset;

        let mask = sample_mask(source, settings.sample_rate, rng);
        let (stats, warm_start) = match prior {
            None => {
                let stats = fresh_statistics(standard, &encoded, source, mask.as_deref());
                (stats, Array1::zeros(dim * km1))
            }
            Some((prior, coefficients)) => {
                if prior.blocks.len() != blocks.len()
                    || prior.dim != dim
                    || prior.encoded_indices() != encoded
                {
                    return Err(TrainError::Encoding(
                        "prior encoding re-encodes a different set of variables".to_string(),
                    ));
                }
                let full = prior.translate_to(standard, coefficients)?;
                let stats = refit_statistics(
                    standard,
                    &encoded,
                    &full,
                    source,
                    mask.as_deref(),
                    settings.regularization,
                )?;
                let mut warm_start = coefficients.clone();
                for block in &blocks {
                    if let AdaptiveBlock::Encoded { offset, .. } = block {
                        for c in 0..km1 {
                            for j in 0..km1 {
                                warm_start[c * dim + offset + j] = if c == j { 1.0 } else { 0.0 };
                            }
                        }
                    }
                }
                (stats, warm_start)
            }
        };

        for (idx, table) in encoded.iter().zip(stats) {
            if let AdaptiveBlock::Encoded { stats, .. } = &mut blocks[*idx] {
                *stats = table;
            }
        }

        Ok(AdaptiveEncoding {
            standard,
            blocks,
            dim,
            warm_start,
        })
    }

    /// Starting point for the optimizer in this encoding's space.
    pub fn warm_start(&self) -> &Array1<f64> {
        &self.warm_start
    }

    fn encoded_indices(&self) -> Vec<usize> {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| matches!(b, AdaptiveBlock::Encoded { .. }))
            .map(|(i, _)| i)
            .collect()
    }

    /// Names of the variables replaced by level statistics.
    pub fn encoded_variables(&self) -> Vec<&str> {
        self.encoded_indices()
            .into_iter()
            .map(|i| self.standard.blocks()[i].name.as_str())
            .collect()
    }

    pub fn has_encoded_variables(&self) -> bool {
        self.blocks
            .iter()
            .any(|b| matches!(b, AdaptiveBlock::Encoded { .. }))
    }

    /// Statistics of one level of a re-encoded variable.
    pub fn level_statistics(&self, variable: &str, level: &str) -> Option<&[f64]> {
        let (std_block, block) = self
            .standard
            .blocks()
            .iter()
            .zip(&self.blocks)
            .find(|(b, _)| b.name == variable)?;
        match (&std_block.kind, block) {
            (BlockKind::Categorical(levels), AdaptiveBlock::Encoded { stats, .. }) => {
                levels.get(level).and_then(|&i| stats.get(i)).map(|s| s.as_slice())
            }
            _ => None,
        }
    }

    /// Express `coefficients` (in this encoding's space) in the space of
    /// `standard`, producing identical class probabilities for every row.
    pub fn translate_to(
        &self,
        standard: &StandardEncoding,
        coefficients: &Array1<f64>,
    ) -> Result<Array1<f64>, TrainError> {
        if !std::ptr::eq(standard, self.standard) && standard != self.standard {
            return Err(TrainError::Encoding(
                "cannot translate into a different standard encoding".to_string(),
            ));
        }
        if coefficients.len() != self.coefficient_len() {
            return Err(TrainError::Encoding(format!(
                "expected {} coefficients, got {}",
                self.coefficient_len(),
                coefficients.len()
            )));
        }

        let km1 = self.noutcomes() - 1;
        let d = standard.dim();
        let mut out = Array1::<f64>::zeros(d * km1);
        for c in 0..km1 {
            let a = c * self.dim;
            let s = c * d;
            if standard.use_intercept() {
                out[s] = coefficients[a];
            }
            for (std_block, block) in standard.blocks().iter().zip(&self.blocks) {
                match block {
                    AdaptiveBlock::Explicit { offset } => {
                        for i in 0..std_block.width() {
                            out[s + std_block.offset + i] = coefficients[a + offset + i];
                        }
                    }
                    AdaptiveBlock::Encoded { offset, stats } => {
                        for (i, level_stats) in stats.iter().enumerate() {
                            out[s + std_block.offset + i] = level_stats
                                .iter()
                                .enumerate()
                                .map(|(j, v)| coefficients[a + offset + j] * v)
                                .sum();
                        }
                    }
                }
            }
        }
        Ok(out)
    }
}

impl Encoding for AdaptiveEncoding<'_> {
    fn dim(&self) -> usize {
        self.dim
    }

    fn noutcomes(&self) -> usize {
        self.standard.noutcomes()
    }

    fn features(&self, row: &Row) -> SparseVec {
        let mut features = Vec::with_capacity(self.blocks.len() + 1);
        if self.standard.use_intercept() {
            features.push((0, 1.0));
        }
        for (std_block, block) in self.standard.blocks().iter().zip(&self.blocks) {
            let Some((i, v)) = std_block.entry(row) else {
                continue;
            };
            match block {
                AdaptiveBlock::Explicit { offset } => {
                    if v != 0.0 {
                        features.push((offset + i, v));
                    }
                }
                AdaptiveBlock::Encoded { offset, stats } => {
                    if let Some(level_stats) = stats.get(i) {
                        for (j, &s) in level_stats.iter().enumerate() {
                            if s != 0.0 {
                                features.push((offset + j, s));
                            }
                        }
                    }
                }
            }
        }
        features
    }

    fn outcome_index(&self, row: &Row) -> Option<usize> {
        self.standard.outcome_index(row)
    }

    fn weight(&self, row: &Row) -> Option<f64> {
        self.standard.weight(row)
    }
}

fn sample_mask<S, R>(source: &S, rate: f64, rng: &mut R) -> Option<Vec<bool>>
where
    S: RowSource + ?Sized,
    R: Rng,
{
    if rate >= 1.0 {
        return None;
    }
    let n = source.count_rows();
    let mask: Vec<bool> = (0..n).map(|_| rng.gen::<f64>() < rate).collect();
    log::debug!(
        "Level statistics use {} of {} rows",
        mask.iter().filter(|&&m| m).count(),
        n
    );
    Some(mask)
}

fn in_sample(mask: Option<&[bool]>, idx: usize) -> bool {
    mask.map_or(true, |m| m.get(idx).copied().unwrap_or(false))
}

fn level_count(block: &Block) -> usize {
    match &block.kind {
        BlockKind::Categorical(levels) => levels.len(),
        BlockKind::Continuous => 0,
    }
}

/// Smoothed per-level log-odds against the reference class, centred on the
/// overall log-odds.
fn fresh_statistics<S: RowSource + ?Sized>(
    standard: &StandardEncoding,
    encoded: &[usize],
    source: &S,
    mask: Option<&[bool]>,
) -> Vec<Vec<Vec<f64>>> {
    let k = standard.noutcomes();
    let blocks = standard.blocks();
    let mut counts: Vec<Vec<Vec<f64>>> = encoded
        .iter()
        .map(|&b| vec![vec![0.0; k]; level_count(&blocks[b])])
        .collect();
    let mut totals = vec![0.0; k];

    for (idx, row) in source.rows().enumerate() {
        if !in_sample(mask, idx) {
            continue;
        }
        let (Some(y), Some(w)) = (standard.outcome_index(&row), standard.weight(&row)) else {
            continue;
        };
        totals[y] += w;
        for (table, &b) in counts.iter_mut().zip(encoded) {
            if let Some((i, _)) = blocks[b].entry(&row) {
                table[i][y] += w;
            }
        }
    }

    let total: f64 = totals.iter().sum();
    let rates: Vec<f64> = totals
        .iter()
        .map(|t| (t + 1.0) / (total + k as f64))
        .collect();

    counts
        .into_iter()
        .map(|table| {
            table
                .into_iter()
                .map(|n| {
                    (1..k)
                        .map(|c| {
                            let level = ((n[c] + LEVEL_PRIOR_WEIGHT * rates[c])
                                / (n[0] + LEVEL_PRIOR_WEIGHT * rates[0]))
                                .ln();
                            level - (rates[c] / rates[0]).ln()
                        })
                        .collect()
                })
                .collect()
        })
        .collect()
}

/// Refit every level's effects of the encoded variables, holding the rest
/// of the full-space model `full` fixed.
fn refit_statistics<S: RowSource + ?Sized>(
    standard: &StandardEncoding,
    encoded: &[usize],
    full: &Array1<f64>,
    source: &S,
    mask: Option<&[bool]>,
    regularization: f64,
) -> Result<Vec<Vec<Vec<f64>>>, TrainError> {
    let k = standard.noutcomes();
    let km1 = k - 1;
    let d = standard.dim();
    let blocks = standard.blocks();

    let mut theta: Vec<Vec<Vec<f64>>> = encoded
        .iter()
        .map(|&b| {
            let block = &blocks[b];
            (0..level_count(block))
                .map(|i| (0..km1).map(|c| full[c * d + block.offset + i]).collect())
                .collect()
        })
        .collect();

    let mut base = full.clone();
    for &b in encoded {
        let block = &blocks[b];
        for c in 0..km1 {
            for i in 0..block.width() {
                base[c * d + block.offset + i] = 0.0;
            }
        }
    }

    for step in 0..MAX_REFIT_STEPS {
        let mut gradients: Vec<Vec<Array1<f64>>> = theta
            .iter()
            .map(|levels| levels.iter().map(|_| Array1::zeros(km1)).collect())
            .collect();
        let mut hessians: Vec<Vec<Array2<f64>>> = theta
            .iter()
            .map(|levels| levels.iter().map(|_| Array2::zeros((km1, km1))).collect())
            .collect();
        let mut support: Vec<Vec<f64>> = theta.iter().map(|levels| vec![0.0; levels.len()]).collect();

        for (idx, row) in source.rows().enumerate() {
            if !in_sample(mask, idx) {
                continue;
            }
            let (Some(y), Some(w)) = (standard.outcome_index(&row), standard.weight(&row)) else {
                continue;
            };
            if w == 0.0 {
                continue;
            }
            let active: Vec<Option<usize>> = encoded
                .iter()
                .map(|&b| blocks[b].entry(&row).map(|(i, _)| i))
                .collect();
            if active.iter().all(Option::is_none) {
                continue;
            }
            let mut scores = linear_scores(&standard.features(&row), &base, d, k);
            for (levels, level) in theta.iter().zip(&active) {
                if let Some(i) = level {
                    for (s, t) in scores.iter_mut().zip(&levels[*i]) {
                        *s += t;
                    }
                }
            }
            let probs = reference_softmax(&scores);

            for (v, level) in active.iter().enumerate() {
                let Some(i) = *level else {
                    continue;
                };
                support[v][i] += w;
                let g = &mut gradients[v][i];
                let h = &mut hessians[v][i];
                for c in 0..km1 {
                    let indicator = if y == c + 1 { 1.0 } else { 0.0 };
                    g[c] += w * (indicator - probs[c + 1]);
                    for e in 0..km1 {
                        let delta = if c == e { 1.0 } else { 0.0 };
                        h[(c, e)] += w * probs[c + 1] * (delta - probs[e + 1]);
                    }
                }
            }
        }

        let mut largest = 0.0f64;
        for (v, levels) in theta.iter_mut().enumerate() {
            for (i, effects) in levels.iter_mut().enumerate() {
                if support[v][i] == 0.0 {
                    continue;
                }
                let mut g = gradients[v][i].clone();
                let mut h = hessians[v][i].clone();
                for c in 0..km1 {
                    g[c] -= regularization * effects[c];
                    h[(c, c)] += regularization;
                }
                let mut delta = cholesky_solve(&h, &g).map_err(|e| {
                    TrainError::Encoding(format!(
                        "level refit for '{}' failed: {}",
                        blocks[encoded[v]].name, e
                    ))
                })?;
                let size = max_abs(delta.as_slice().unwrap_or(&[]));
                if size > MAX_REFIT_STEP {
                    delta *= MAX_REFIT_STEP / size;
                }
                for (t, dt) in effects.iter_mut().zip(delta.iter()) {
                    *t += dt;
                }
                largest = largest.max(size.min(MAX_REFIT_STEP));
            }
        }
        log::trace!("Level refit step {}: largest change {:.3e}", step, largest);
        if largest < REFIT_TOLERANCE {
            break;
        }
    }

    Ok(theta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_handling::{row, Value};
    use crate::formula::Formula;
    use crate::schema::Schema;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rows() -> Vec<Row> {
        let mut rows = Vec::new();
        let levels = ["a", "b", "c", "d"];
        for i in 0..80 {
            let level = levels[i % 4];
            let x = (i % 7) as f64 / 3.0 - 1.0;
            let outcome = match (i % 4, i % 3) {
                (0, _) => "yes",
                (1, 0) => "yes",
                (3, 1) => "maybe",
                (2, 2) => "maybe",
                _ => "no",
            };
            rows.push(row([
                ("y", Value::from(outcome)),
                ("g", Value::from(level)),
                ("x", Value::Num(x)),
            ]));
        }
        rows
    }

    fn setup(rows: &[Row]) -> StandardEncoding {
        let formula: Formula = "y ~ g + x".parse().unwrap();
        let schema = Schema::build(&formula, rows, None).unwrap();
        StandardEncoding::new(&schema, true)
    }

    fn flagged() -> BTreeSet<String> {
        ["g".to_string()].into_iter().collect()
    }

    fn settings() -> StatSettings {
        StatSettings::new(1.0e-3, 250_000, 80)
    }

    fn assert_same_predictions(
        adaptive: &AdaptiveEncoding<'_>,
        standard: &StandardEncoding,
        coefs: &Array1<f64>,
        rows: &[Row],
    ) {
        let translated = adaptive.translate_to(standard, coefs).unwrap();
        assert_eq!(translated.len(), standard.coefficient_len());
        for r in rows {
            let p = adaptive.predict_proba(r, coefs);
            let q = standard.predict_proba(r, &translated);
            for (a, b) in p.iter().zip(&q) {
                assert!((a - b).abs() < 1e-9, "{:?} vs {:?}", p, q);
            }
        }
    }

    #[test]
    fn test_reduced_layout() {
        let rows = rows();
        let standard = setup(&rows);
        let mut rng = StdRng::seed_from_u64(7);
        let enc = AdaptiveEncoding::build(&standard, &flagged(), &rows, None, &settings(), &mut rng).unwrap();
        // intercept + 4 levels + x vs intercept + 2 statistics + x
        assert_eq!(standard.dim(), 6);
        assert_eq!(enc.dim(), 4);
        assert_eq!(enc.warm_start().len(), 8);
        assert!(enc.warm_start().iter().all(|&v| v == 0.0));
        assert_eq!(enc.encoded_variables(), vec!["g"]);

        // level "a" is always "yes" (class 2) so its yes-statistic is positive
        let stats = enc.level_statistics("g", "a").unwrap();
        assert_eq!(stats.len(), 2);
        assert!(stats[1] > 0.0);
        assert!(enc.level_statistics("x", "a").is_none());
    }

    #[test]
    fn test_translation_preserves_predictions() {
        let rows = rows();
        let standard = setup(&rows);
        let mut rng = StdRng::seed_from_u64(7);
        let enc = AdaptiveEncoding::build(&standard, &flagged(), &rows, None, &settings(), &mut rng).unwrap();
        let coefs = Array1::from_vec(vec![0.3, -0.7, 1.1, 0.25, -0.4, 0.9, -1.3, 0.6]);
        assert_same_predictions(&enc, &standard, &coefs, &rows);

        let refined = AdaptiveEncoding::build(
            &standard,
            &flagged(),
            &rows,
            Some((&enc, &coefs)),
            &settings(),
            &mut rng,
        )
        .unwrap();
        assert_same_predictions(&refined, &standard, &coefs, &rows);
    }

    #[test]
    fn test_refined_warm_start_keeps_shared_columns() {
        let rows = rows();
        let standard = setup(&rows);
        let mut rng = StdRng::seed_from_u64(7);
        let enc = AdaptiveEncoding::build(&standard, &flagged(), &rows, None, &settings(), &mut rng).unwrap();
        let coefs = Array1::from_vec(vec![0.3, -0.7, 1.1, 0.25, -0.4, 0.9, -1.3, 0.6]);
        let refined = AdaptiveEncoding::build(
            &standard,
            &flagged(),
            &rows,
            Some((&enc, &coefs)),
            &settings(),
            &mut rng,
        )
        .unwrap();
        let warm = refined.warm_start();
        // intercept and x carried over, identity block on the statistics
        assert_eq!(warm[0], 0.3);
        assert_eq!(warm[3], 0.25);
        assert_eq!(warm[4], -0.4);
        assert_eq!(warm[7], 0.6);
        assert_eq!((warm[1], warm[2]), (1.0, 0.0));
        assert_eq!((warm[5], warm[6]), (0.0, 1.0));
    }

    #[test]
    fn test_no_flagged_variables_is_standard() {
        let rows = rows();
        let standard = setup(&rows);
        let mut rng = StdRng::seed_from_u64(7);
        let enc =
            AdaptiveEncoding::build(&standard, &BTreeSet::new(), &rows, None, &settings(), &mut rng).unwrap();
        assert_eq!(enc.dim(), standard.dim());
        assert!(!enc.has_encoded_variables());
        for r in &rows {
            assert_eq!(enc.features(r), standard.features(r));
        }
        let coefs = Array1::from_vec((0..12).map(|i| i as f64 * 0.1).collect());
        assert_eq!(enc.translate_to(&standard, &coefs).unwrap(), coefs);
    }

    #[test]
    fn test_narrow_flagged_variable_stays_explicit() {
        let rows: Vec<Row> = rows()
            .into_iter()
            .enumerate()
            .map(|(i, mut r)| {
                r.insert("h".to_string(), Value::from(["u", "v"][i % 2]));
                r
            })
            .collect();
        let formula: Formula = "y ~ g + h + x".parse().unwrap();
        let schema = Schema::build(&formula, &rows, None).unwrap();
        let standard = StandardEncoding::new(&schema, true);
        let both: BTreeSet<String> = ["g".to_string(), "h".to_string()].into_iter().collect();
        let mut rng = StdRng::seed_from_u64(7);
        let enc = AdaptiveEncoding::build(&standard, &both, &rows, None, &settings(), &mut rng).unwrap();
        // h has two levels against two statistic columns, so only g shrinks
        assert_eq!(enc.encoded_variables(), vec!["g"]);
        assert_eq!(standard.dim(), 8);
        assert_eq!(enc.dim(), 6);
        assert!(enc.level_statistics("h", "u").is_none());

        let coefs = Array1::from_vec((0..12).map(|i| (i as f64 - 5.5) * 0.15).collect());
        assert_same_predictions(&enc, &standard, &coefs, &rows);
    }

    #[test]
    fn test_invalid_requests() {
        let rows = rows();
        let standard = setup(&rows);
        let mut rng = StdRng::seed_from_u64(7);
        let continuous: BTreeSet<String> = ["x".to_string()].into_iter().collect();
        assert!(matches!(
            AdaptiveEncoding::build(&standard, &continuous, &rows, None, &settings(), &mut rng),
            Err(TrainError::Encoding(_))
        ));

        let enc = AdaptiveEncoding::build(&standard, &flagged(), &rows, None, &settings(), &mut rng).unwrap();
        assert!(matches!(
            enc.translate_to(&standard, &Array1::zeros(3)),
            Err(TrainError::Encoding(_))
        ));
    }

    #[test]
    fn test_subsampled_statistics_are_seeded() {
        let rows = rows();
        let standard = setup(&rows);
        let sampled = StatSettings::new(1.0e-3, 40, 80);
        assert_eq!(sampled.sample_rate, 0.5);

        let build = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            AdaptiveEncoding::build(&standard, &flagged(), &rows, None, &sampled, &mut rng)
                .unwrap()
                .level_statistics("g", "b")
                .unwrap()
                .to_vec()
        };
        assert_eq!(build(11), build(11));
    }
}
