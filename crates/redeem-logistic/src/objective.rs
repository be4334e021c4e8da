//! Penalised multinomial log-likelihood over projected training rows.
//!
//! The objective is maximised: `f(x) = Σ w · ln p(y | row, x) − (λ/2)|x|²`.
//! Coefficients follow the class-major layout of the encoding, with class 0
//! as the reference class whose scores are fixed at zero.
use ndarray::{Array1, Array2};

use crate::data_handling::RowSource;
use crate::encoding::{linear_scores, Encoding, ExampleProjector, ExampleRow};
use crate::optimizer::OptimizerError;

/// One evaluation of a vector function.
///
/// `gx` is empty when the gradient was not requested, `hx` is `None` when
/// the Hessian was not requested.
#[derive(Debug, Clone, PartialEq)]
pub struct VEval {
    pub x: Array1<f64>,
    pub fx: f64,
    pub gx: Array1<f64>,
    pub hx: Option<Array2<f64>>,
}

/// A function of a coefficient vector that can report its value, gradient
/// and Hessian.
pub trait VectorFn {
    fn dim(&self) -> usize;

    fn eval(&self, x: &Array1<f64>, want_gradient: bool, want_hessian: bool) -> Result<VEval, OptimizerError>;
}

/// Per-example multinomial log-likelihood in a `dim × (noutcomes - 1)`
/// coefficient space.
#[derive(Debug, Clone, Copy)]
pub struct MultinomialLoss {
    dim: usize,
    noutcomes: usize,
}

impl MultinomialLoss {
    pub fn new(dim: usize, noutcomes: usize) -> Self {
        Self { dim, noutcomes }
    }

    pub fn coefficient_len(&self) -> usize {
        self.dim * (self.noutcomes - 1)
    }

    /// Add one example's contribution to `fx` and, when present, to the
    /// gradient and Hessian accumulators.
    fn accumulate(
        &self,
        example: &ExampleRow,
        x: &Array1<f64>,
        fx: &mut f64,
        gx: Option<&mut Array1<f64>>,
        hx: Option<&mut Array2<f64>>,
    ) {
        let w = example.weight;
        if w == 0.0 {
            return;
        }
        let scores = linear_scores(&example.values, x, self.dim, self.noutcomes);
        let max = scores.iter().copied().fold(0.0f64, f64::max);
        let log_norm = max + ((-max).exp() + scores.iter().map(|s| (s - max).exp()).sum::<f64>()).ln();
        let observed = if example.category == 0 {
            0.0
        } else {
            scores[example.category - 1]
        };
        *fx += w * (observed - log_norm);

        if gx.is_none() && hx.is_none() {
            return;
        }
        let probs: Vec<f64> = scores.iter().map(|s| (s - log_norm).exp()).collect();

        if let Some(g) = gx {
            for (c, p) in probs.iter().enumerate() {
                let indicator = if example.category == c + 1 { 1.0 } else { 0.0 };
                let residual = w * (indicator - p);
                let base = c * self.dim;
                for &(j, v) in &example.values {
                    g[base + j] += residual * v;
                }
            }
        }

        if let Some(h) = hx {
            for (c, pc) in probs.iter().enumerate() {
                for (e, pe) in probs.iter().enumerate() {
                    let delta = if c == e { 1.0 } else { 0.0 };
                    let curvature = w * pc * (delta - pe);
                    if curvature == 0.0 {
                        continue;
                    }
                    let (rc, re) = (c * self.dim, e * self.dim);
                    for &(j, vj) in &example.values {
                        for &(l, vl) in &example.values {
                            h[(rc + j, re + l)] -= curvature * vj * vl;
                        }
                    }
                }
            }
        }
    }
}

/// Data term: the multinomial log-likelihood summed over every projected row.
pub struct DataFn<'a, E: Encoding + ?Sized, S: RowSource + ?Sized> {
    projector: ExampleProjector<'a, E, S>,
    loss: MultinomialLoss,
}

impl<'a, E: Encoding + ?Sized, S: RowSource + ?Sized> DataFn<'a, E, S> {
    pub fn new(projector: ExampleProjector<'a, E, S>) -> Self {
        let encoding = projector.encoding();
        let loss = MultinomialLoss::new(encoding.dim(), encoding.noutcomes());
        Self { projector, loss }
    }
}

impl<E: Encoding + ?Sized, S: RowSource + ?Sized> VectorFn for DataFn<'_, E, S> {
    fn dim(&self) -> usize {
        self.loss.coefficient_len()
    }

    fn eval(&self, x: &Array1<f64>, want_gradient: bool, want_hessian: bool) -> Result<VEval, OptimizerError> {
        let n = self.dim();
        if x.len() != n {
            return Err(OptimizerError::DimensionMismatch {
                expected: n,
                found: x.len(),
            });
        }
        let mut fx = 0.0;
        let mut gx = if want_gradient { Array1::zeros(n) } else { Array1::zeros(0) };
        let mut hx = if want_hessian { Some(Array2::zeros((n, n))) } else { None };
        for example in self.projector.iter() {
            self.loss.accumulate(
                &example,
                x,
                &mut fx,
                if want_gradient { Some(&mut gx) } else { None },
                hx.as_mut(),
            );
        }
        Ok(VEval {
            x: x.clone(),
            fx,
            gx,
            hx,
        })
    }
}

/// Wraps a function with an L2 penalty `(λ/2)|x|²` subtracted from its value.
pub struct Penalized<F: VectorFn> {
    inner: F,
    lambda: f64,
}

impl<F: VectorFn> Penalized<F> {
    pub fn new(inner: F, lambda: f64) -> Self {
        Self { inner, lambda }
    }
}

impl<F: VectorFn> VectorFn for Penalized<F> {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn eval(&self, x: &Array1<f64>, want_gradient: bool, want_hessian: bool) -> Result<VEval, OptimizerError> {
        let mut eval = self.inner.eval(x, want_gradient, want_hessian)?;
        if self.lambda == 0.0 {
            return Ok(eval);
        }
        eval.fx -= 0.5 * self.lambda * x.dot(x);
        if want_gradient {
            eval.gx.scaled_add(-self.lambda, x);
        }
        if let Some(h) = eval.hx.as_mut() {
            for i in 0..h.nrows() {
                h[(i, i)] -= self.lambda;
            }
        }
        Ok(eval)
    }
}

/// The training objective: penalised log-likelihood of `source` projected
/// through `encoding`.
pub fn penalized_objective<'a, E, S>(encoding: &'a E, source: &'a S, lambda: f64) -> Penalized<DataFn<'a, E, S>>
where
    E: Encoding + ?Sized,
    S: RowSource + ?Sized,
{
    Penalized::new(DataFn::new(ExampleProjector::new(encoding, source)), lambda)
}
