/// Class probabilities from the scores of the non-reference classes.
///
/// `scores[k]` is the linear score of class `k + 1`; class 0 is the
/// reference with a fixed score of zero. Returns `scores.len() + 1`
/// probabilities.
pub fn reference_softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(0.0f64, f64::max);
    let mut probs = Vec::with_capacity(scores.len() + 1);
    probs.push((-max).exp());
    probs.extend(scores.iter().map(|s| (s - max).exp()));
    let total: f64 = probs.iter().sum();
    for p in probs.iter_mut() {
        *p /= total;
    }
    probs
}

/// Largest absolute entry, 0 for an empty slice.
pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
}
