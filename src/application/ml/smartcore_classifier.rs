use super::classifier::{validate_training_input, Classifier, FittedModel};
use super::logistic::LogisticModel;
use crate::domain::errors::TrainingError;
use crate::domain::ml::FEATURE_COUNT;
use crate::domain::types::FeatureVector;
use smartcore::linalg::basic::arrays::Array;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};
use tracing::debug;

/// Logistic regression backed by smartcore (no class weighting).
///
/// The fitted coefficients are copied out of the smartcore model so that
/// scoring does not depend on the library's label-only `predict`.
pub struct SmartCoreLogisticClassifier {
    /// L2 penalty passed to smartcore.
    pub alpha: f64,
}

impl Default for SmartCoreLogisticClassifier {
    fn default() -> Self {
        Self { alpha: 1.0 }
    }
}

impl SmartCoreLogisticClassifier {
    fn to_matrix(features: &[FeatureVector]) -> Result<DenseMatrix<f64>, TrainingError> {
        let rows: Vec<Vec<f64>> = features.iter().map(|f| f.to_vec()).collect();
        DenseMatrix::from_2d_vec(&rows).map_err(|e| TrainingError::FitFailed {
            reason: format!("Matrix creation failed: {}", e),
        })
    }

    fn flatten(matrix: &DenseMatrix<f64>) -> Vec<f64> {
        let (rows, cols) = matrix.shape();
        let mut values = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                values.push(*matrix.get((r, c)));
            }
        }
        values
    }
}

impl Classifier for SmartCoreLogisticClassifier {
    fn fit(
        &self,
        features: &[FeatureVector],
        labels: &[bool],
    ) -> Result<Box<dyn FittedModel>, TrainingError> {
        validate_training_input(features, labels)?;

        let x = Self::to_matrix(features)?;
        let y: Vec<i32> = labels.iter().map(|l| i32::from(*l)).collect();
        let params = LogisticRegressionParameters::default().with_alpha(self.alpha);

        let model = LogisticRegression::fit(&x, &y, params).map_err(|e| {
            TrainingError::FitFailed {
                reason: format!("Training error: {}", e),
            }
        })?;

        let weights = Self::flatten(model.coefficients());
        let intercept = Self::flatten(model.intercept());
        if weights.len() != FEATURE_COUNT || intercept.len() != 1 {
            return Err(TrainingError::FitFailed {
                reason: format!(
                    "unexpected coefficient shape: {} weights, {} intercepts",
                    weights.len(),
                    intercept.len()
                ),
            });
        }

        let mut coefficients = [0.0; FEATURE_COUNT];
        coefficients.copy_from_slice(&weights);
        debug!("SmartCore logistic fit on {} rows", features.len());

        Ok(Box::new(LogisticModel {
            coefficients,
            intercept: intercept[0],
        }))
    }

    fn name(&self) -> &str {
        "SmartCore Logistic Regression"
    }
}
