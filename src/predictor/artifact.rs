use serde::Deserialize;
use thiserror::Error;

/// Errors raised at the prediction call boundary. These are user-facing:
/// a bad feature vector must surface as a message, never a crash.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Expected {expected} features, got {got}")]
    FeatureCount { expected: usize, got: usize },

    #[error("Feature {index} is not a finite number")]
    NonFinite { index: usize },
}

/// A pre-trained binary classifier artifact.
///
/// The on-disk format is a standardized linear decision function: inputs are
/// scaled with the stored per-feature mean/scale, then dotted with the
/// weights. Callers treat the artifact as opaque and only rely on
/// [`ModelArtifact::predict`].
#[derive(Debug, Clone, Deserialize)]
pub struct ModelArtifact {
    pub name: String,

    pub feature_count: usize,

    mean: Vec<f64>,

    scale: Vec<f64>,

    weights: Vec<f64>,

    bias: f64,
}

impl ModelArtifact {
    /// Internal consistency check run once at load time. A malformed
    /// artifact is a fatal startup error, not a per-request one.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (field, len) in [
            ("mean", self.mean.len()),
            ("scale", self.scale.len()),
            ("weights", self.weights.len()),
        ] {
            if len != self.feature_count {
                anyhow::bail!(
                    "Model '{}': {field} has {len} entries, expected {}",
                    self.name,
                    self.feature_count
                );
            }
        }

        if self.scale.iter().any(|s| *s == 0.0 || !s.is_finite()) {
            anyhow::bail!("Model '{}': scale contains zero or non-finite entries", self.name);
        }

        Ok(())
    }

    /// Classify a feature vector, returning 0 or 1.
    ///
    /// Deterministic for the same input and artifact. Rejects vectors of
    /// the wrong length or containing non-finite values.
    pub fn predict(&self, features: &[f64]) -> Result<u8, PredictError> {
        if features.len() != self.feature_count {
            return Err(PredictError::FeatureCount {
                expected: self.feature_count,
                got: features.len(),
            });
        }

        if let Some(index) = features.iter().position(|f| !f.is_finite()) {
            return Err(PredictError::NonFinite { index });
        }

        let score = features
            .iter()
            .enumerate()
            .map(|(i, x)| self.weights[i] * ((x - self.mean[i]) / self.scale[i]))
            .sum::<f64>()
            + self.bias;

        Ok(u8::from(score > 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(feature_count: usize, weights: Vec<f64>, bias: f64) -> ModelArtifact {
        ModelArtifact {
            name: "test".to_string(),
            feature_count,
            mean: vec![0.0; feature_count],
            scale: vec![1.0; feature_count],
            weights,
            bias,
        }
    }

    #[test]
    fn test_predict_is_deterministic_binary() {
        let model = artifact(3, vec![1.0, -1.0, 0.5], -0.25);
        let features = [2.0, 1.0, 0.5];

        let first = model.predict(&features).unwrap();
        let second = model.predict(&features).unwrap();

        assert_eq!(first, second);
        assert!(first == 0 || first == 1);
    }

    #[test]
    fn test_predict_label_follows_decision_function() {
        let model = artifact(2, vec![1.0, 1.0], 0.0);

        assert_eq!(model.predict(&[1.0, 1.0]).unwrap(), 1);
        assert_eq!(model.predict(&[-1.0, -1.0]).unwrap(), 0);
    }

    #[test]
    fn test_predict_applies_scaling() {
        let model = ModelArtifact {
            name: "scaled".to_string(),
            feature_count: 1,
            mean: vec![10.0],
            scale: vec![2.0],
            weights: vec![1.0],
            bias: 0.0,
        };

        // (14 - 10) / 2 = 2.0 -> positive
        assert_eq!(model.predict(&[14.0]).unwrap(), 1);
        // (6 - 10) / 2 = -2.0 -> negative
        assert_eq!(model.predict(&[6.0]).unwrap(), 0);
    }

    #[test]
    fn test_predict_rejects_wrong_feature_count() {
        let model = artifact(8, vec![0.0; 8], 0.0);
        let err = model.predict(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(
            err,
            PredictError::FeatureCount {
                expected: 8,
                got: 2
            }
        ));
    }

    #[test]
    fn test_predict_rejects_non_finite() {
        let model = artifact(2, vec![1.0, 1.0], 0.0);
        let err = model.predict(&[1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, PredictError::NonFinite { index: 1 }));
    }

    #[test]
    fn test_validate_rejects_mismatched_lengths() {
        let model = ModelArtifact {
            name: "broken".to_string(),
            feature_count: 3,
            mean: vec![0.0; 2],
            scale: vec![1.0; 3],
            weights: vec![0.0; 3],
            bias: 0.0,
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_scale() {
        let model = ModelArtifact {
            name: "broken".to_string(),
            feature_count: 1,
            mean: vec![0.0],
            scale: vec![0.0],
            weights: vec![1.0],
            bias: 0.0,
        };
        assert!(model.validate().is_err());
    }
}
