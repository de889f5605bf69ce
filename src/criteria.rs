//! Acquisition functions scoring candidate points against a fitted surrogate.
//!
//! The three classic criteria are implemented: Upper Confidence Bound,
//! Expected Improvement and Probability of Improvement. The utility value is
//! a relative ranking signal, higher is better; absolute scales are not
//! comparable across kinds.

use crate::errors::{AcqError, Result};
use crate::surrogate::SurrogateModel;
use crate::utils::{norm_cdf, norm_pdf};
use ndarray::{Array1, ArrayView, ArrayView2, Zip};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Predicted deviations below this threshold are treated as exactly zero.
const SIGMA_EPS: f64 = f64::EPSILON;

/// Kind of acquisition criterion used to score candidate points
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AcqKind {
    /// Upper Confidence Bound, `mean + kappa * std`
    Ucb,
    /// Expected Improvement over the current best observation
    Ei,
    /// Probability of Improvement over the current best observation
    Poi,
}

impl AcqKind {
    /// Name of the acquisition kind
    pub fn name(&self) -> &'static str {
        match self {
            AcqKind::Ucb => "UCB",
            AcqKind::Ei => "EI",
            AcqKind::Poi => "POI",
        }
    }
}

impl FromStr for AcqKind {
    type Err = AcqError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ucb" => Ok(AcqKind::Ucb),
            "ei" => Ok(AcqKind::Ei),
            "poi" => Ok(AcqKind::Poi),
            _ => Err(AcqError::InvalidConfigError(format!(
                "unknown acquisition kind '{s}', expected one of ucb, ei, poi"
            ))),
        }
    }
}

/// A parameterized acquisition function.
///
/// Stateless once built: scoring reads the surrogate model and the current
/// best observation `y_max` supplied at each call. One instance is typically
/// constructed per optimization campaign and reused across maximizations.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcquisitionFunction {
    kind: AcqKind,
    kappa: f64,
    xi: f64,
}

impl AcquisitionFunction {
    /// Build an acquisition function of the given kind.
    ///
    /// `kappa` weights the exploration term of UCB, `xi` is the improvement
    /// margin of EI and POI. Both must be finite and non-negative.
    pub fn new(kind: AcqKind, kappa: f64, xi: f64) -> Result<Self> {
        if !kappa.is_finite() || kappa < 0. {
            return Err(AcqError::InvalidConfigError(format!(
                "kappa should be finite and non-negative, got {kappa}"
            )));
        }
        if !xi.is_finite() || xi < 0. {
            return Err(AcqError::InvalidConfigError(format!(
                "xi should be finite and non-negative, got {xi}"
            )));
        }
        Ok(AcquisitionFunction { kind, kappa, xi })
    }

    /// Kind of the criterion
    pub fn kind(&self) -> AcqKind {
        self.kind
    }

    /// Compute the utility of a batch of points given as a (n, nx) matrix,
    /// using a single batched model prediction.
    ///
    /// Output order matches input order. Deviations below machine epsilon
    /// (numerical negatives included) are clamped to zero before applying
    /// the degenerate limits: EI and POI collapse to 0, UCB to the mean.
    pub fn utility(
        &self,
        x: &ArrayView2<f64>,
        model: &dyn SurrogateModel,
        y_max: f64,
    ) -> Result<Array1<f64>> {
        if x.nrows() == 0 {
            return Err(AcqError::InvalidValue(
                "empty candidate batch".to_string(),
            ));
        }
        let (mu, sigma) = model.predict(x)?;
        if mu.len() != x.nrows() || sigma.len() != x.nrows() {
            return Err(AcqError::InvalidValue(format!(
                "surrogate returned ({}, {}) predictions for {} points",
                mu.len(),
                sigma.len(),
                x.nrows()
            )));
        }
        Ok(Zip::from(&mu)
            .and(&sigma)
            .map_collect(|&m, &s| self.score(m, s, y_max)))
    }

    /// Criterion value at a single point, used on the local optimization
    /// hot path.
    ///
    /// A failed or ill-shaped prediction ranks the point last by scoring
    /// negative infinity rather than propagating an error.
    pub fn value(&self, x: &[f64], model: &dyn SurrogateModel, y_max: f64) -> f64 {
        let pt = ArrayView::from_shape((1, x.len()), x).unwrap();
        match model.predict(&pt) {
            Ok((mu, sigma)) if mu.len() == 1 && sigma.len() == 1 => {
                self.score(mu[0], sigma[0], y_max)
            }
            _ => f64::NEG_INFINITY,
        }
    }

    fn score(&self, mu: f64, sigma: f64, y_max: f64) -> f64 {
        let sigma = if sigma < SIGMA_EPS { 0. } else { sigma };
        match self.kind {
            AcqKind::Ucb => mu + self.kappa * sigma,
            AcqKind::Ei => {
                if sigma == 0. {
                    0.
                } else {
                    let imp = mu - y_max - self.xi;
                    let z = imp / sigma;
                    imp * norm_cdf(z) + sigma * norm_pdf(z)
                }
            }
            AcqKind::Poi => {
                if sigma == 0. {
                    // no predictive spread, no improvement probability
                    0.
                } else {
                    norm_cdf((mu - y_max - self.xi) / sigma)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    /// Echoes each point back as its prediction: mean = x0, std = x1.
    struct EchoModel;

    impl SurrogateModel for EchoModel {
        fn predict(&self, x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
            let mu = x.column(0).to_owned();
            let sigma = x.column(1).to_owned();
            Ok((mu, sigma))
        }
    }

    struct BadLengthModel;

    impl SurrogateModel for BadLengthModel {
        fn predict(&self, _x: &ArrayView2<f64>) -> Result<(Array1<f64>, Array1<f64>)> {
            Ok((array![0.], array![1.]))
        }
    }

    #[test]
    fn test_utility_batch_order() {
        let x = array![[1., 0.5], [0.2, 0.1], [3., 2.]];
        for kind in [AcqKind::Ucb, AcqKind::Ei, AcqKind::Poi] {
            let acq = AcquisitionFunction::new(kind, 2., 0.01).unwrap();
            let values = acq.utility(&x.view(), &EchoModel, 0.5).unwrap();
            assert_eq!(values.len(), x.nrows());
            for (i, row) in x.rows().into_iter().enumerate() {
                let single = acq.value(row.as_slice().unwrap(), &EchoModel, 0.5);
                assert_abs_diff_eq!(values[i], single, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_ucb_formula() {
        let acq = AcquisitionFunction::new(AcqKind::Ucb, 1.5, 0.).unwrap();
        let values = acq
            .utility(&array![[1., 0.4], [-2., 0.]].view(), &EchoModel, 0.)
            .unwrap();
        assert_abs_diff_eq!(values[0], 1. + 1.5 * 0.4, epsilon = 1e-12);
        // zero deviation: UCB degenerates to the mean
        assert_abs_diff_eq!(values[1], -2., epsilon = 1e-12);
    }

    #[test]
    fn test_ei_formula() {
        let (mu, sigma, y_max, xi) = (1.2, 0.7, 1.0, 0.05);
        let acq = AcquisitionFunction::new(AcqKind::Ei, 0., xi).unwrap();
        let value = acq.value(&[mu, sigma], &EchoModel, y_max);
        let z = (mu - y_max - xi) / sigma;
        let expected = (mu - y_max - xi) * norm_cdf(z) + sigma * norm_pdf(z);
        assert_abs_diff_eq!(value, expected, epsilon = 1e-12);
        assert!(value > 0.);
    }

    #[test]
    fn test_poi_formula() {
        let (mu, sigma, y_max, xi) = (0.8, 0.3, 1.0, 0.);
        let acq = AcquisitionFunction::new(AcqKind::Poi, 0., xi).unwrap();
        let value = acq.value(&[mu, sigma], &EchoModel, y_max);
        assert_abs_diff_eq!(value, norm_cdf((mu - y_max) / sigma), epsilon = 1e-12);
        assert!(value > 0. && value < 0.5);
    }

    #[test]
    fn test_zero_variance_limits() {
        // exact zero and numerical negative both collapse
        for sigma in [0., -1e-18] {
            let ei = AcquisitionFunction::new(AcqKind::Ei, 0., 1e-6).unwrap();
            assert_eq!(ei.value(&[3., sigma], &EchoModel, 0.), 0.);
            let poi = AcquisitionFunction::new(AcqKind::Poi, 0., 1e-6).unwrap();
            assert_eq!(poi.value(&[3., sigma], &EchoModel, 0.), 0.);
        }
    }

    #[test]
    fn test_ei_increases_with_mean() {
        let acq = AcquisitionFunction::new(AcqKind::Ei, 0., 1e-6).unwrap();
        let values = acq
            .utility(
                &array![[0.5, 0.2], [1.0, 0.2], [1.5, 0.2]].view(),
                &EchoModel,
                1.0,
            )
            .unwrap();
        assert!(values[0] < values[1] && values[1] < values[2]);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("UCB".parse::<AcqKind>().unwrap(), AcqKind::Ucb);
        assert_eq!("ei".parse::<AcqKind>().unwrap(), AcqKind::Ei);
        assert_eq!("poi".parse::<AcqKind>().unwrap(), AcqKind::Poi);
        assert!("expected_improvement".parse::<AcqKind>().is_err());
    }

    #[test]
    fn test_invalid_hyperparameters() {
        assert!(AcquisitionFunction::new(AcqKind::Ucb, -1., 0.).is_err());
        assert!(AcquisitionFunction::new(AcqKind::Ei, 0., -1e-3).is_err());
        assert!(AcquisitionFunction::new(AcqKind::Ucb, f64::NAN, 0.).is_err());
    }

    #[test]
    fn test_bad_model_output_length() {
        let acq = AcquisitionFunction::new(AcqKind::Ucb, 1., 0.).unwrap();
        let res = acq.utility(&array![[0., 0.], [1., 1.]].view(), &BadLengthModel, 0.);
        assert!(matches!(res, Err(AcqError::InvalidValue(_))));
    }

    #[test]
    fn test_empty_batch() {
        let acq = AcquisitionFunction::new(AcqKind::Ucb, 1., 0.).unwrap();
        let x = ndarray::Array2::<f64>::zeros((0, 2));
        assert!(acq.utility(&x.view(), &EchoModel, 0.).is_err());
    }
}
