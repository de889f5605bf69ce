use crate::types::ObjFn;
use cobyla::RhoBeg;
use ndarray::{arr1, Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

/// Local optimization algorithm used for refinement runs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Algorithm {
    /// COBYLA, derivative-free with native inequality constraint handling
    Cobyla,
    /// SLSQP, gradient-based; gradients are filled by the objective function
    Slsqp,
}

pub(crate) const MAX_EVAL_DEFAULT: usize = 2000;

/// Facade for the local constrained minimizers.
///
/// The objective and the constraints share the `ObjFn` shape. Constraints
/// follow the crate convention: satisfied when the value is non-negative.
/// A run which fails or does not converge reports an infinite cost.
pub(crate) struct Optimizer<'a> {
    algo: Algorithm,
    fun: &'a (dyn ObjFn<()> + Sync),
    cons: Vec<&'a (dyn ObjFn<()> + Sync)>,
    bounds: Array2<f64>,
    max_eval: usize,
    xinit: Option<Array1<f64>>,
    ftol_abs: Option<f64>,
    ftol_rel: Option<f64>,
}

impl<'a> Optimizer<'a> {
    pub fn new(
        algo: Algorithm,
        fun: &'a (dyn ObjFn<()> + Sync),
        cons: &[&'a (dyn ObjFn<()> + Sync)],
        bounds: &Array2<f64>,
    ) -> Self {
        Optimizer {
            algo,
            fun,
            cons: cons.to_vec(),
            bounds: bounds.clone(),
            max_eval: MAX_EVAL_DEFAULT,
            xinit: None,
            ftol_abs: None,
            ftol_rel: None,
        }
    }

    pub fn ftol_abs(&mut self, ftol_abs: f64) -> &mut Self {
        self.ftol_abs = Some(ftol_abs);
        self
    }

    pub fn ftol_rel(&mut self, ftol_rel: f64) -> &mut Self {
        self.ftol_rel = Some(ftol_rel);
        self
    }

    pub fn max_eval(&mut self, max_eval: usize) -> &mut Self {
        self.max_eval = max_eval;
        self
    }

    pub fn xinit(&mut self, xinit: &ArrayView1<f64>) -> &mut Self {
        self.xinit = Some(xinit.to_owned());
        self
    }

    /// Run the minimization and return `(f_opt, x_opt)`.
    pub fn minimize(&self) -> (f64, Array1<f64>) {
        let xinit = match &self.xinit {
            Some(x) => x.to_vec(),
            None => self
                .bounds
                .map_axis(Axis(1), |row| 0.5 * (row[0] + row[1]))
                .to_vec(),
        };
        let bounds: Vec<_> = self
            .bounds
            .outer_iter()
            .map(|row| (row[0], row[1]))
            .collect();

        let res = match self.algo {
            Algorithm::Cobyla => {
                let cstrs: Vec<_> = self
                    .cons
                    .iter()
                    .map(|f| move |x: &[f64], u: &mut ()| (*f)(x, None, u))
                    .collect();
                let res = cobyla::minimize(
                    |x: &[f64], u: &mut ()| (self.fun)(x, None, u),
                    &xinit,
                    &bounds,
                    &cstrs,
                    (),
                    self.max_eval,
                    RhoBeg::All(0.5),
                    Some(cobyla::StopTols {
                        ftol_rel: self.ftol_rel.unwrap_or(0.0),
                        ftol_abs: self.ftol_abs.unwrap_or(0.0),
                        ..cobyla::StopTols::default()
                    }),
                );
                match res {
                    Ok((_, x_opt, y_opt)) => (y_opt, arr1(&x_opt)),
                    Err((_, x_opt, _)) => (f64::INFINITY, arr1(&x_opt)),
                }
            }
            Algorithm::Slsqp => {
                // SLSQP expects constraints non-positive when satisfied:
                // flip value and gradient of the >= 0 predicates.
                let cstrs: Vec<_> = self
                    .cons
                    .iter()
                    .map(|f| {
                        move |x: &[f64], gradient: Option<&mut [f64]>, u: &mut ()| -> f64 {
                            if let Some(grad) = gradient {
                                let v = (*f)(x, Some(&mut *grad), u);
                                grad.iter_mut().for_each(|g| *g = -*g);
                                -v
                            } else {
                                -(*f)(x, None, u)
                            }
                        }
                    })
                    .collect();
                let res = slsqp::minimize(
                    self.fun,
                    &xinit,
                    &bounds,
                    &cstrs,
                    (),
                    self.max_eval,
                    Some(slsqp::StopTols {
                        ftol_rel: self.ftol_rel.unwrap_or(0.0),
                        ftol_abs: self.ftol_abs.unwrap_or(0.0),
                        ..slsqp::StopTols::default()
                    }),
                );
                match res {
                    Ok((_, x_opt, y_opt)) => (y_opt, arr1(&x_opt)),
                    Err((_, x_opt, _)) => (f64::INFINITY, arr1(&x_opt)),
                }
            }
        };
        log::debug!("... end local optimization");
        res
    }
}
