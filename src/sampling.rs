use ndarray::{Array, Array2, ArrayView2};
use ndarray_rand::{rand::Rng, rand::SeedableRng, rand_distr::Uniform, RandomExt};
use rand_xoshiro::Xoshiro256Plus;

/// Build a random generator from an optional seed.
///
/// Given `Some(seed)` the generator is deterministic; given `None` it is
/// seeded from system entropy. Reusing the returned generator across
/// maximization calls keeps the whole sequence reproducible.
pub fn ensure_rng(seed: Option<u64>) -> Xoshiro256Plus {
    match seed {
        Some(seed) => Xoshiro256Plus::seed_from_u64(seed),
        None => Xoshiro256Plus::from_entropy(),
    }
}

/// Draw `ns` points uniformly at random within the sample space `xlimits`,
/// a (nx, 2) matrix of [lower bound, upper bound] rows.
///
/// Samples are drawn in the unit hypercube then scaled, so zero-width
/// dimensions degenerate to their bound value.
pub fn sample_uniform<R: Rng>(xlimits: &ArrayView2<f64>, ns: usize, rng: &mut R) -> Array2<f64> {
    let lower = xlimits.column(0);
    let scaler = &xlimits.column(1) - &lower;
    Array::random_using((ns, xlimits.nrows()), Uniform::new(0., 1.), rng) * scaler + lower
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn test_sample_uniform_within_limits() {
        let xlimits = arr2(&[[5., 10.], [0., 1.]]);
        let mut rng = ensure_rng(Some(42));
        let samples = sample_uniform(&xlimits.view(), 100, &mut rng);
        assert_eq!((100, 2), samples.dim());
        for row in samples.rows() {
            assert!(row[0] >= 5. && row[0] < 10.);
            assert!(row[1] >= 0. && row[1] < 1.);
        }
    }

    #[test]
    fn test_sample_uniform_reproducible() {
        let xlimits = arr2(&[[-1., 1.]]);
        let s1 = sample_uniform(&xlimits.view(), 10, &mut ensure_rng(Some(0)));
        let s2 = sample_uniform(&xlimits.view(), 10, &mut ensure_rng(Some(0)));
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_sample_uniform_degenerate_dim() {
        let xlimits = arr2(&[[0.5, 0.5], [0., 1.]]);
        let samples = sample_uniform(&xlimits.view(), 5, &mut ensure_rng(Some(7)));
        for row in samples.rows() {
            assert_eq!(row[0], 0.5);
        }
    }
}
