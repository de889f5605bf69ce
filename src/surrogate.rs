use crate::errors::Result;
use ndarray::{Array1, ArrayView2};

/// A capability trait for a fitted surrogate model of the objective function.
///
/// The maximizer only reads from the model: no refitting, no mutation. Any
/// regression backend able to produce a predictive mean and standard
/// deviation per point can be plugged in behind this trait.
///
/// Implementations must be safe to share across the parallel local
/// refinement runs, hence the `Sync + Send` bound.
pub trait SurrogateModel: Sync + Send {
    /// Predict mean and standard deviation of the modeled objective at the
    /// `n` points given as a (n, nx) matrix.
    ///
    /// Both returned arrays have length `n`, in the same order as the input
    /// rows. The standard deviation is conventionally non-negative; tiny
    /// negative values from numerical noise are tolerated and clamped by the
    /// caller.
    fn predict(&self, x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array1<f64>)>;
}
