//! Multi-start maximization of an acquisition function within a bounded,
//! optionally constrained domain.
//!
//! The search is hybrid: a large uniform random batch scored through the
//! criterion seeds a best-so-far, then independent local refinement runs
//! polish randomly drawn start points through a constrained local optimizer.
//! The returned point is the best candidate re-scored through the criterion
//! itself.

use crate::criteria::AcquisitionFunction;
use crate::errors::{AcqError, Result};
use crate::optimizers::{Algorithm, Optimizer};
use crate::sampling::sample_uniform;
use crate::surrogate::SurrogateModel;
use crate::types::{CstrFn, ObjFn};
use env_logger::{Builder, Env};
use finitediff::FiniteDiff;
use log::{debug, info};
use ndarray::{stack, Array1, Array2, ArrayBase, Axis, Data, Ix2, Zip};
use ndarray_rand::rand::{Rng, SeedableRng};
use ndarray_stats::QuantileExt;
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;

/// Environment variable controlling the log filter
pub const ACQMAX_LOG: &str = "ACQMAX_LOG";

/// Default number of warmup candidates drawn per input dimension
pub const N_WARMUP_DEFAULT: usize = 10_000;

/// Default number of local refinement runs
pub const N_ITER_DEFAULT: usize = 10;

const LOCAL_MAX_EVAL: usize = 200;
const LOCAL_FTOL: f64 = 1e-6;
/// Accepted constraint violation on locally refined points, the local
/// optimizer handles inequalities as soft conditions.
const CSTR_TOL: f64 = 1e-6;

/// Maximizer of an acquisition function over a bounded domain.
///
/// Built per maximization call: it borrows the criterion, the fitted
/// surrogate and the constraint predicates, none of which are retained
/// beyond the call. The random source is cloned at each [`maximize`] so a
/// configured maximizer can be reused and stays reproducible.
///
/// [`maximize`]: AcqMaximizer::maximize
pub struct AcqMaximizer<'a, R: Rng + Clone + Sync + Send> {
    acq: &'a AcquisitionFunction,
    model: &'a dyn SurrogateModel,
    /// Search space as a (nx, 2) matrix of [lower bound, upper bound] rows
    xlimits: Array2<f64>,
    cstrs: Vec<&'a dyn CstrFn>,
    n_warmup: usize,
    n_iter: usize,
    algo: Algorithm,
    rng: R,
}

impl<'a> AcqMaximizer<'a, Xoshiro256Plus> {
    /// Build a maximizer seeded from system entropy.
    ///
    /// Use [`AcqMaximizer::with_rng`] or [`crate::ensure_rng`] to install a
    /// seeded generator when reproducibility matters.
    pub fn new(
        acq: &'a AcquisitionFunction,
        model: &'a dyn SurrogateModel,
        xlimits: &ArrayBase<impl Data<Elem = f64>, Ix2>,
    ) -> Self {
        Self::new_with_rng(acq, model, xlimits, Xoshiro256Plus::from_entropy())
    }
}

impl<'a, R: Rng + Clone + Sync + Send> AcqMaximizer<'a, R> {
    /// Build a maximizer with the given random source.
    pub fn new_with_rng(
        acq: &'a AcquisitionFunction,
        model: &'a dyn SurrogateModel,
        xlimits: &ArrayBase<impl Data<Elem = f64>, Ix2>,
        rng: R,
    ) -> Self {
        let env = Env::new().filter_or(ACQMAX_LOG, "info");
        let mut builder = Builder::from_env(env);
        let builder = builder.target(env_logger::Target::Stdout);
        builder.try_init().ok();
        AcqMaximizer {
            acq,
            model,
            xlimits: xlimits.to_owned(),
            cstrs: vec![],
            n_warmup: N_WARMUP_DEFAULT,
            n_iter: N_ITER_DEFAULT,
            algo: Algorithm::Cobyla,
            rng,
        }
    }

    /// Set the random source
    pub fn with_rng<R2: Rng + Clone + Sync + Send>(self, rng: R2) -> AcqMaximizer<'a, R2> {
        AcqMaximizer {
            acq: self.acq,
            model: self.model,
            xlimits: self.xlimits,
            cstrs: self.cstrs,
            n_warmup: self.n_warmup,
            n_iter: self.n_iter,
            algo: self.algo,
            rng,
        }
    }

    /// Number of warmup candidates drawn per input dimension
    pub fn n_warmup(mut self, n_warmup: usize) -> Self {
        self.n_warmup = n_warmup;
        self
    }

    /// Number of local refinement runs
    pub fn n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    /// Local optimization algorithm, COBYLA by default
    pub fn algorithm(mut self, algo: Algorithm) -> Self {
        self.algo = algo;
        self
    }

    /// Add inequality constraints, satisfied when the predicate is `>= 0`
    pub fn subject_to(mut self, cstrs: &'a [&'a dyn CstrFn]) -> Self {
        self.cstrs = cstrs.to_vec();
        self
    }

    /// Find the in-bounds feasible point maximizing the acquisition value,
    /// `y_max` being the best objective value observed so far.
    ///
    /// The warmup batch is drawn and scored first, then all local start
    /// points are drawn, so the random source is consumed in a fixed order
    /// and a fixed seed gives a reproducible result. The local runs
    /// themselves execute in parallel.
    pub fn maximize(&self, y_max: f64) -> Result<Array1<f64>> {
        self.check_xlimits()?;
        let nx = self.xlimits.nrows();

        // Zero-width domain: a single point, nothing to search
        if self.xlimits.rows().into_iter().all(|row| row[0] >= row[1]) {
            return Ok(self.xlimits.column(0).to_owned());
        }

        let mut rng = self.rng.clone();
        info!(
            "Maximize {} criterion: {} warmup points, {} local runs",
            self.acq.kind().name(),
            self.n_warmup * nx,
            self.n_iter
        );

        // Global phase: one batched scoring of uniform candidates,
        // constraint violations are pushed to the bottom of the ranking
        let x_tries = sample_uniform(&self.xlimits.view(), self.n_warmup * nx, &mut rng);
        let mut y_tries = self.acq.utility(&x_tries.view(), self.model, y_max)?;
        Zip::from(&mut y_tries)
            .and(x_tries.rows())
            .for_each(|y, x| {
                if y.is_nan() || !self.is_feasible(&x.to_vec(), 0.) {
                    *y = f64::NEG_INFINITY;
                }
            });
        let best_warmup = match y_tries.argmax() {
            Ok(imax) if y_tries[imax].is_finite() => Some(x_tries.row(imax).to_owned()),
            _ => None,
        };
        debug!("Warmup winner: {best_warmup:?}");

        // All start points are drawn before dispatching the local runs:
        // parallel workers never touch the random source.
        let x_starts = sample_uniform(&self.xlimits.view(), self.n_iter, &mut rng);

        let obj = |x: &[f64], gradient: Option<&mut [f64]>, _u: &mut ()| -> f64 {
            if x.iter().any(|v| v.is_nan()) {
                return f64::INFINITY;
            }
            if let Some(grad) = gradient {
                let f = |x: &Vec<f64>| -> f64 { -self.acq.value(x, self.model, y_max) };
                grad[..].copy_from_slice(&x.to_vec().central_diff(&f));
            }
            -self.acq.value(x, self.model, y_max)
        };

        let cstr_funcs: Vec<_> = self
            .cstrs
            .iter()
            .map(|&cstr| {
                let cstr_fn = move |x: &[f64], gradient: Option<&mut [f64]>, _u: &mut ()| -> f64 {
                    if let Some(grad) = gradient {
                        let f = |x: &Vec<f64>| -> f64 { cstr(x) };
                        grad[..].copy_from_slice(&x.to_vec().central_diff(&f));
                    }
                    cstr(x)
                };
                Box::new(cstr_fn) as Box<dyn ObjFn<()> + Sync>
            })
            .collect();
        let cstr_refs: Vec<_> = cstr_funcs.iter().map(|c| c.as_ref()).collect();

        let x_locals: Vec<_> = (0..x_starts.nrows())
            .into_par_iter()
            .map(|i| {
                Optimizer::new(self.algo, &obj, &cstr_refs, &self.xlimits)
                    .xinit(&x_starts.row(i))
                    .max_eval(LOCAL_MAX_EVAL)
                    .ftol_rel(LOCAL_FTOL)
                    .ftol_abs(LOCAL_FTOL)
                    .minimize()
            })
            .collect();

        // Warmup winner first: it is the fallback when every local run
        // fails and it wins exact ties in the final ranking.
        let mut candidates: Vec<Array1<f64>> = Vec::new();
        candidates.extend(best_warmup);
        for (y_opt, x_opt) in x_locals {
            if !y_opt.is_finite() {
                // failed run, a "no improvement found" outcome
                continue;
            }
            let x_opt = self.clip(&x_opt);
            if self.is_feasible(&x_opt.to_vec(), CSTR_TOL) {
                candidates.push(x_opt);
            }
        }
        if candidates.is_empty() {
            return Err(AcqError::InfeasibleError(
                "no candidate within bounds satisfies the constraints".to_string(),
            ));
        }

        // Re-score every candidate through the criterion itself, the local
        // optimizer's internal cost bookkeeping may differ numerically
        let views: Vec<_> = candidates.iter().map(|c| c.view()).collect();
        let x_cands = stack(Axis(0), &views)?;
        let y_cands = self
            .acq
            .utility(&x_cands.view(), self.model, y_max)?
            .mapv(|v| if v.is_nan() { f64::NEG_INFINITY } else { v });
        let best = y_cands
            .argmax()
            .map_err(|err| AcqError::InvalidValue(format!("candidate selection: {err}")))?;
        debug!("Selected candidate {} scored {}", best, y_cands[best]);
        Ok(candidates.swap_remove(best))
    }

    fn check_xlimits(&self) -> Result<()> {
        if self.xlimits.nrows() == 0 || self.xlimits.ncols() != 2 {
            return Err(AcqError::InvalidConfigError(format!(
                "bounds should be a (nx, 2) matrix, got {:?}",
                self.xlimits.dim()
            )));
        }
        for (i, row) in self.xlimits.rows().into_iter().enumerate() {
            if !(row[0] <= row[1]) {
                return Err(AcqError::InvalidConfigError(format!(
                    "lower bound exceeds upper bound on dimension {}: [{}, {}]",
                    i, row[0], row[1]
                )));
            }
        }
        Ok(())
    }

    fn is_feasible(&self, x: &[f64], tol: f64) -> bool {
        self.cstrs.iter().all(|&cstr| cstr(x) >= -tol)
    }

    fn clip(&self, x: &Array1<f64>) -> Array1<f64> {
        Zip::from(x)
            .and(self.xlimits.rows())
            .map_collect(|&v, bound| v.max(bound[0]).min(bound[1]))
    }
}
