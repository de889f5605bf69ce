//! This library implements the point-selection core of Bayesian optimization:
//! given a fitted surrogate model of an expensive objective function, it picks
//! the next point to evaluate by maximizing an acquisition criterion trading
//! off predicted value against predictive uncertainty.
//!
//! Two pieces compose the core:
//! * [`AcquisitionFunction`], a parameterized criterion (UCB, EI or POI)
//!   scoring batches of candidate points against any [`SurrogateModel`],
//! * [`AcqMaximizer`], a hybrid global/local search locating the best
//!   feasible point of the criterion within box bounds, optionally subject
//!   to inequality constraints.
//!
//! Surrogate fitting is deliberately out of scope: the model is an external
//! collaborator reached through the [`SurrogateModel`] capability trait, so
//! any regression backend with mean/deviation predictions can be plugged in.
//!
//! # Example
//!
//! ```
//! use acqmax::{ensure_rng, AcqKind, AcqMaximizer, AcquisitionFunction, Result, SurrogateModel};
//! use ndarray::{array, Array1, ArrayView2, Axis};
//!
//! // A fitted surrogate is any type able to predict a mean and a standard
//! // deviation per point; here a toy model peaking at x = 0.3.
//! struct Quadratic;
//!
//! impl SurrogateModel for Quadratic {
//!     fn predict(&self, x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
//!         let mean = x.map_axis(Axis(1), |p| 2. - (p[0] - 0.3) * (p[0] - 0.3));
//!         let std = Array1::from_elem(x.nrows(), 0.1);
//!         Ok((mean, std))
//!     }
//! }
//!
//! let acq = AcquisitionFunction::new(AcqKind::Ucb, 1.96, 1e-3).expect("valid parameters");
//! let best = AcqMaximizer::new(&acq, &Quadratic, &array![[0., 1.]])
//!     .with_rng(ensure_rng(Some(42)))
//!     .n_iter(5)
//!     .maximize(2.0)
//!     .expect("acquisition maximized");
//! assert!((best[0] - 0.3).abs() < 1e-2);
//! ```
//!
//! For a fixed seed, a fixed iteration budget and fixed inputs the returned
//! point is reproducible: the warmup batch and every local start point are
//! drawn from the random source in a fixed order before the parallel
//! refinement runs are dispatched.
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

mod criteria;
mod errors;
mod maximizer;
mod optimizers;
mod sampling;
mod surrogate;
mod types;
mod utils;

pub use crate::criteria::*;
pub use crate::errors::*;
pub use crate::maximizer::*;
pub use crate::optimizers::Algorithm;
pub use crate::sampling::*;
pub use crate::surrogate::*;
pub use crate::types::*;
