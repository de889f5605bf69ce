/// A trait for functions used by the internal local optimizers.
/// Functions are expected to be defined as `f(x, g, u)` where
/// * `x` is the input information,
/// * `g` an optional gradient information to be updated if present,
/// * `u` information provided by the user
pub trait ObjFn<U>: Fn(&[f64], Option<&mut [f64]>, &mut U) -> f64 {}
impl<T, U> ObjFn<U> for T where T: Fn(&[f64], Option<&mut [f64]>, &mut U) -> f64 {}

/// A constraint predicate over a candidate point.
///
/// A constraint is satisfied when the returned value is non-negative.
/// An empty constraint list means the search is only bounded by the domain.
pub trait CstrFn: Fn(&[f64]) -> f64 + Sync {}
impl<T> CstrFn for T where T: Fn(&[f64]) -> f64 + Sync {}
