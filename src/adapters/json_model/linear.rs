//! Linear classifier artifacts: logistic regression (float and fixed-point)
//! and a plain linear scorer.

use serde::{Deserialize, Serialize};

use crate::domain::{ArtifactError, InferenceError};
use crate::ports::{LabelClassifier, ProbabilisticClassifier};

use super::{check_finite, check_row};

/// Standardization applied before the linear term: `(x - mean) / scale`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl Scaler {
    fn apply(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect()
    }
}

/// Logistic regression, binary or multinomial.
///
/// A single coefficient row is the binary case (sigmoid of the logit gives
/// the probability of the second class). Two or more rows are scored with a
/// softmax over per-class logits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    #[serde(default)]
    pub classes: Option<Vec<i64>>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
    #[serde(default)]
    pub scaler: Option<Scaler>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_infinite() {
        // Mass is shared by the logits sitting at the infinite maximum.
        let hits = logits.iter().filter(|z| **z == max).count() as f64;
        return logits
            .iter()
            .map(|z| if *z == max { 1.0 / hits } else { 0.0 })
            .collect();
    }
    let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

fn dot(w: &[f64], x: &[f64]) -> f64 {
    w.iter().zip(x).map(|(a, b)| a * b).sum()
}

impl LogisticRegression {
    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns `ArtifactError::Decode` describing the first inconsistency.
    pub fn validate(&self, name: &str) -> Result<(), ArtifactError> {
        let rows = self.coefficients.len();
        if rows == 0 {
            return Err(ArtifactError::decode(name, "coefficients must not be empty"));
        }
        let n = self.coefficients[0].len();
        if n == 0 {
            return Err(ArtifactError::decode(name, "coefficient rows must not be empty"));
        }
        if self.coefficients.iter().any(|r| r.len() != n) {
            return Err(ArtifactError::decode(name, "coefficient rows differ in length"));
        }
        if self.intercepts.len() != rows {
            return Err(ArtifactError::decode(
                name,
                format!("expected {rows} intercepts, got {}", self.intercepts.len()),
            ));
        }
        if let Some(classes) = &self.classes {
            let outputs = if rows == 1 { 2 } else { rows };
            if classes.len() != outputs {
                return Err(ArtifactError::decode(
                    name,
                    format!("expected {outputs} classes, got {}", classes.len()),
                ));
            }
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != n || scaler.scale.len() != n {
                return Err(ArtifactError::decode(name, "scaler length does not match coefficients"));
            }
            if scaler.scale.iter().any(|s| *s == 0.0) {
                return Err(ArtifactError::decode(name, "scaler contains a zero scale"));
            }
            check_finite(name, "scaler", scaler.mean.iter().chain(&scaler.scale))?;
        }
        check_finite(name, "coefficients", self.coefficients.iter().flatten())?;
        check_finite(name, "intercepts", &self.intercepts)?;
        Ok(())
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn classes(&self) -> Option<&[i64]> {
        self.classes.as_deref()
    }

    fn n_features(&self) -> usize {
        self.coefficients[0].len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        check_row(row, self.n_features())?;
        let scaled;
        let x = match &self.scaler {
            Some(scaler) => {
                scaled = scaler.apply(row);
                scaled.as_slice()
            }
            None => row,
        };

        let logits: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(w, b)| dot(w, x) + b)
            .collect();

        if logits.len() == 1 {
            let p = sigmoid(logits[0]);
            Ok(vec![1.0 - p, p])
        } else {
            Ok(softmax(&logits))
        }
    }
}

/// Fixed-point logistic regression.
///
/// Features are quantized as `x_q = x * scale_factor`, standardized with the
/// quantized mean and inverse standard deviation, and combined with quantized
/// coefficients. The accumulated logit carries a `scale_factor^2` factor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantizedLogistic {
    pub precision_bits: u32,
    pub scale_factor: i64,
    pub coefficients_q: Vec<i64>,
    pub intercept_q: i64,
    pub scaler_mean_q: Vec<i64>,
    pub scaler_std_inv_q: Vec<i64>,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

const QUANTIZED_CLASSES: [i64; 2] = [0, 1];

impl QuantizedLogistic {
    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns `ArtifactError::Decode` describing the first inconsistency.
    pub fn validate(&self, name: &str) -> Result<(), ArtifactError> {
        let n = self.coefficients_q.len();
        if n == 0 {
            return Err(ArtifactError::decode(name, "coefficients_q must not be empty"));
        }
        if self.scaler_mean_q.len() != n || self.scaler_std_inv_q.len() != n {
            return Err(ArtifactError::decode(
                name,
                "scaler parameter lengths do not match coefficients_q",
            ));
        }
        if self.scale_factor <= 0 {
            return Err(ArtifactError::decode(name, "scale_factor must be > 0"));
        }
        if self.precision_bits >= 31 || 1_i64 << self.precision_bits != self.scale_factor {
            return Err(ArtifactError::decode(
                name,
                "scale_factor must equal 2^precision_bits",
            ));
        }
        Ok(())
    }

    /// Normalize and quantize raw features.
    ///
    /// Out-of-range values saturate instead of wrapping; the logit of an
    /// extreme row keeps its sign.
    fn quantize(&self, row: &[f64]) -> Result<Vec<i128>, InferenceError> {
        let scale = i128::from(self.scale_factor);
        row.iter()
            .zip(self.scaler_mean_q.iter().zip(&self.scaler_std_inv_q))
            .map(|(x, (mean_q, std_inv_q))| {
                if x.is_nan() {
                    return Err(InferenceError::NonFinite);
                }
                let x_scaled = (x * self.scale_factor as f64)
                    .round()
                    .clamp(i64::MIN as f64, i64::MAX as f64) as i64;
                let centered = i128::from(x_scaled) - i128::from(*mean_q);
                Ok(centered.saturating_mul(i128::from(*std_inv_q)) / scale)
            })
            .collect()
    }

    fn logit(&self, row: &[f64]) -> Result<f64, InferenceError> {
        let x_q = self.quantize(row)?;
        let mut acc = i128::from(self.intercept_q).saturating_mul(i128::from(self.scale_factor));
        for (x, coef) in x_q.iter().zip(&self.coefficients_q) {
            acc = acc.saturating_add(x.saturating_mul(i128::from(*coef)));
        }
        let scale = self.scale_factor as f64;
        Ok(acc as f64 / (scale * scale))
    }
}

impl ProbabilisticClassifier for QuantizedLogistic {
    fn classes(&self) -> Option<&[i64]> {
        Some(&QUANTIZED_CLASSES)
    }

    fn n_features(&self) -> usize {
        self.coefficients_q.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, InferenceError> {
        check_row(row, self.n_features())?;
        let p = sigmoid(self.logit(row)?);
        Ok(vec![1.0 - p, p])
    }
}

/// Linear scorer with no probability interface: `w . x + b`.
///
/// The raw score is used directly as the risk probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl LinearRegressor {
    /// Check internal consistency.
    ///
    /// # Errors
    /// Returns `ArtifactError::Decode` describing the first inconsistency.
    pub fn validate(&self, name: &str) -> Result<(), ArtifactError> {
        if self.coefficients.is_empty() {
            return Err(ArtifactError::decode(name, "coefficients must not be empty"));
        }
        check_finite(
            name,
            "coefficients",
            self.coefficients.iter().chain(std::iter::once(&self.intercept)),
        )
    }
}

impl LabelClassifier for LinearRegressor {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    fn predict(&self, row: &[f64]) -> Result<f64, InferenceError> {
        check_row(row, self.n_features())?;
        Ok(dot(&self.coefficients, row) + self.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary(coef: f64, intercept: f64) -> LogisticRegression {
        LogisticRegression {
            classes: Some(vec![0, 1]),
            coefficients: vec![vec![coef]],
            intercepts: vec![intercept],
            scaler: None,
            feature_names: None,
        }
    }

    #[test]
    fn test_binary_logistic() {
        let model = binary(1.0, 0.0);
        model.validate("m").expect("valid");
        let p = model.predict_proba(&[0.0]).expect("predict");
        assert!((p[0] - 0.5).abs() < 1e-12);
        assert!((p[1] - 0.5).abs() < 1e-12);

        let p = model.predict_proba(&[3.0]).expect("predict");
        assert!((p[1] - sigmoid(3.0)).abs() < 1e-12);
        assert!((p[0] + p[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sigmoid_is_stable_for_large_logits() {
        assert_eq!(sigmoid(1_000.0), 1.0);
        assert_eq!(sigmoid(-1_000.0), 0.0);
    }

    #[test]
    fn test_scaler_applied() {
        let mut model = binary(1.0, 0.0);
        model.scaler = Some(Scaler {
            mean: vec![10.0],
            scale: vec![2.0],
        });
        let p = model.predict_proba(&[10.0]).expect("predict");
        assert!((p[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_multinomial_softmax() {
        let model = LogisticRegression {
            classes: Some(vec![0, 1, 2]),
            coefficients: vec![vec![0.0], vec![0.0], vec![0.0]],
            intercepts: vec![0.0, 0.0, 0.0],
            scaler: None,
            feature_names: None,
        };
        model.validate("m").expect("valid");
        let p = model.predict_proba(&[1.0]).expect("predict");
        assert_eq!(p.len(), 3);
        for v in p {
            assert!((v - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_logistic_validation() {
        let mut model = binary(1.0, 0.0);
        model.intercepts.push(1.0);
        assert!(model.validate("m").is_err());

        let mut model = binary(1.0, 0.0);
        model.classes = Some(vec![0, 1, 2]);
        assert!(model.validate("m").is_err());

        let mut model = binary(f64::NAN, 0.0);
        model.classes = None;
        assert!(model.validate("m").is_err());
    }

    #[test]
    fn test_row_width_checked() {
        let model = binary(1.0, 0.0);
        assert_eq!(
            model.predict_proba(&[1.0, 2.0]),
            Err(InferenceError::FeatureCount {
                got: 2,
                expected: 1
            })
        );
    }

    #[test]
    fn test_quantized_identity_scaler() {
        // mean 0 and std_inv == scale: standardization is the identity.
        let model = QuantizedLogistic {
            precision_bits: 12,
            scale_factor: 4096,
            coefficients_q: vec![4096, 0],
            intercept_q: 0,
            scaler_mean_q: vec![0, 0],
            scaler_std_inv_q: vec![4096, 4096],
            feature_names: None,
        };
        model.validate("q").expect("valid");

        let p = model.predict_proba(&[0.0, 5.0]).expect("predict");
        assert!((p[1] - 0.5).abs() < 1e-9);

        let p = model.predict_proba(&[2.0, 5.0]).expect("predict");
        assert!((p[1] - sigmoid(2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_quantized_saturates_extreme_inputs() {
        let model = QuantizedLogistic {
            precision_bits: 16,
            scale_factor: 65536,
            coefficients_q: vec![3408, -3408],
            intercept_q: 0,
            scaler_mean_q: vec![4_518_052, 0],
            scaler_std_inv_q: vec![1093, 65536],
            feature_names: None,
        };
        model.validate("q").expect("valid");

        for x in [1e15, 1e300, f64::MAX] {
            let p = model.predict_proba(&[x, 0.0]).expect("saturates");
            assert_eq!(p[1], 1.0, "{x}");
            let p = model.predict_proba(&[0.0, x]).expect("saturates");
            assert_eq!(p[1], 0.0, "{x}");
        }
        let p = model.predict_proba(&[-1e300, 0.0]).expect("saturates");
        assert_eq!(p[1], 0.0);

        assert_eq!(
            model.predict_proba(&[f64::NAN, 0.0]),
            Err(InferenceError::NonFinite)
        );
    }

    #[test]
    fn test_softmax_with_infinite_logits() {
        let p = softmax(&[1.0, f64::INFINITY, 3.0]);
        assert_eq!(p, vec![0.0, 1.0, 0.0]);

        let p = softmax(&[f64::INFINITY, f64::INFINITY, 0.0]);
        assert_eq!(p, vec![0.5, 0.5, 0.0]);

        let model = LogisticRegression {
            classes: Some(vec![0, 1, 2]),
            coefficients: vec![vec![0.0], vec![1e300], vec![-1e300]],
            intercepts: vec![0.0, 0.0, 0.0],
            scaler: None,
            feature_names: None,
        };
        let p = model.predict_proba(&[1e300]).expect("predict");
        assert_eq!(p, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_quantized_rejects_inconsistent_scale() {
        let model = QuantizedLogistic {
            precision_bits: 12,
            scale_factor: 1000,
            coefficients_q: vec![1],
            intercept_q: 0,
            scaler_mean_q: vec![0],
            scaler_std_inv_q: vec![1000],
            feature_names: None,
        };
        assert!(model.validate("q").is_err());
    }

    #[test]
    fn test_linear_regressor_outputs_raw_score() {
        let model = LinearRegressor {
            coefficients: vec![0.01, 0.02],
            intercept: -0.5,
            feature_names: None,
        };
        model.validate("r").expect("valid");
        let out = model.predict(&[50.0, 10.0]).expect("predict");
        assert!((out - 0.2).abs() < 1e-12);
    }
}
