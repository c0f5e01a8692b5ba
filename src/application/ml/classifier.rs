use crate::domain::errors::{ConfigError, TrainingError};
use crate::domain::types::FeatureVector;
use std::fmt;
use std::str::FromStr;

/// Probability at or above which a prediction is labelled "up".
///
/// Kept at 0.55 (not 0.5) so metrics stay comparable across runs.
pub const DECISION_THRESHOLD: f64 = 0.55;

/// Label derived from a probability of the positive class.
pub fn predicted_label(probability_up: f64) -> u8 {
    if probability_up >= DECISION_THRESHOLD {
        1
    } else {
        0
    }
}

/// A fitted binary classifier.
pub trait FittedModel: Send + Sync {
    /// Probability of the positive class ("up") for each row.
    fn predict_proba(&self, features: &[FeatureVector]) -> Result<Vec<f64>, TrainingError>;
}

/// Interface for linear probabilistic binary classifiers
pub trait Classifier: Send + Sync {
    fn fit(
        &self,
        features: &[FeatureVector],
        labels: &[bool],
    ) -> Result<Box<dyn FittedModel>, TrainingError>;

    /// Get model name/type
    fn name(&self) -> &str;
}

/// Rejects empty, misaligned or non-finite training input.
pub fn validate_training_input(
    features: &[FeatureVector],
    labels: &[bool],
) -> Result<(), TrainingError> {
    if features.is_empty() {
        return Err(TrainingError::FitFailed {
            reason: "no training rows".to_string(),
        });
    }
    if features.len() != labels.len() {
        return Err(TrainingError::FitFailed {
            reason: format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            ),
        });
    }
    validate_features(features)
}

/// Rejects non-finite feature values.
pub fn validate_features(features: &[FeatureVector]) -> Result<(), TrainingError> {
    for (row, values) in features.iter().enumerate() {
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(TrainingError::MalformedFeatures {
                row,
                reason: format!("non-finite value {}", bad),
            });
        }
    }
    Ok(())
}

/// Classifier backends selectable through `MODEL_CLASSIFIER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    BalancedLogistic,
    SmartcoreLogistic,
}

impl ClassifierKind {
    pub fn build(self) -> Box<dyn Classifier> {
        match self {
            ClassifierKind::BalancedLogistic => {
                Box::new(super::logistic::BalancedLogisticRegression::default())
            }
            ClassifierKind::SmartcoreLogistic => {
                Box::new(super::smartcore_classifier::SmartCoreLogisticClassifier::default())
            }
        }
    }
}

impl FromStr for ClassifierKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "balanced_logistic" => Ok(ClassifierKind::BalancedLogistic),
            "smartcore_logistic" => Ok(ClassifierKind::SmartcoreLogistic),
            _ => Err(ConfigError::InvalidValue {
                key: "MODEL_CLASSIFIER".to_string(),
                value: s.to_string(),
                reason: "must be 'balanced_logistic' or 'smartcore_logistic'".to_string(),
            }),
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierKind::BalancedLogistic => write!(f, "balanced_logistic"),
            ClassifierKind::SmartcoreLogistic => write!(f, "smartcore_logistic"),
        }
    }
}
