//! L2-regularised logistic regression with balanced class weights.
//!
//! Each sample of class `k` is weighted by `n / (2 * n_k)` so that both
//! directions contribute equally to the loss regardless of label imbalance.
//! The objective is minimised with Newton steps and a backtracking line
//! search, capped at `max_iter` iterations. The intercept is not penalised.

use super::classifier::{validate_features, validate_training_input, Classifier, FittedModel};
use crate::domain::errors::TrainingError;
use crate::domain::ml::FEATURE_COUNT;
use crate::domain::types::FeatureVector;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DIM: usize = FEATURE_COUNT + 1;

#[derive(Debug, Clone)]
pub struct BalancedLogisticRegression {
    /// Inverse regularisation strength.
    pub c: f64,
    pub max_iter: usize,
    /// Convergence tolerance on the largest Newton step component.
    pub tol: f64,
}

impl Default for BalancedLogisticRegression {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 500,
            tol: 1e-8,
        }
    }
}

/// Fitted weights of a logistic model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: FeatureVector,
    pub intercept: f64,
}

impl LogisticModel {
    fn decision(&self, x: &FeatureVector) -> f64 {
        self.coefficients
            .iter()
            .zip(x.iter())
            .map(|(w, v)| w * v)
            .sum::<f64>()
            + self.intercept
    }
}

impl FittedModel for LogisticModel {
    fn predict_proba(&self, features: &[FeatureVector]) -> Result<Vec<f64>, TrainingError> {
        validate_features(features).map_err(|e| TrainingError::PredictFailed {
            reason: e.to_string(),
        })?;
        Ok(features.iter().map(|x| sigmoid(self.decision(x))).collect())
    }
}

impl Classifier for BalancedLogisticRegression {
    fn fit(
        &self,
        features: &[FeatureVector],
        labels: &[bool],
    ) -> Result<Box<dyn FittedModel>, TrainingError> {
        Ok(Box::new(self.fit_model(features, labels)?))
    }

    fn name(&self) -> &str {
        "Balanced Logistic Regression"
    }
}

impl BalancedLogisticRegression {
    pub fn fit_model(
        &self,
        features: &[FeatureVector],
        labels: &[bool],
    ) -> Result<LogisticModel, TrainingError> {
        validate_training_input(features, labels)?;
        if self.c <= 0.0 || !self.c.is_finite() {
            return Err(TrainingError::FitFailed {
                reason: format!("regularisation C must be positive, got {}", self.c),
            });
        }

        let n = labels.len() as f64;
        let n_up = labels.iter().filter(|l| **l).count() as f64;
        let n_down = n - n_up;
        // Single-class input degenerates to plain (unit) weights.
        let (w_up, w_down) = if n_up > 0.0 && n_down > 0.0 {
            (n / (2.0 * n_up), n / (2.0 * n_down))
        } else {
            (1.0, 1.0)
        };

        let rows: Vec<[f64; DIM]> = features.iter().map(augment).collect();
        let targets: Vec<f64> = labels.iter().map(|l| if *l { 1.0 } else { 0.0 }).collect();
        let weights: Vec<f64> = labels
            .iter()
            .map(|l| if *l { w_up } else { w_down })
            .collect();
        let lambda = 1.0 / self.c;

        let problem = Problem {
            rows: &rows,
            targets: &targets,
            weights: &weights,
            lambda,
        };

        let mut beta = [0.0; DIM];
        let mut objective = problem.objective(&beta);
        let mut converged = false;

        for iteration in 0..self.max_iter {
            let (gradient, hessian) = problem.gradient_and_hessian(&beta);
            let step = solve(hessian, gradient).ok_or_else(|| TrainingError::FitFailed {
                reason: "singular Hessian".to_string(),
            })?;

            // Backtracking: halve the step until the objective stops increasing
            let mut scale = 1.0;
            let mut attempts = 0;
            let (candidate, candidate_objective) = loop {
                let mut trial = beta;
                for j in 0..DIM {
                    trial[j] = beta[j] - scale * step[j];
                }
                let trial_objective = problem.objective(&trial);
                attempts += 1;
                if trial_objective <= objective || attempts >= 40 {
                    break (trial, trial_objective);
                }
                scale *= 0.5;
            };

            let max_step = step.iter().map(|s| (s * scale).abs()).fold(0.0, f64::max);
            beta = candidate;
            objective = candidate_objective;

            if max_step < self.tol {
                debug!("Logistic fit converged after {} iterations", iteration + 1);
                converged = true;
                break;
            }
        }

        if !converged {
            debug!(
                "Logistic fit hit iteration cap ({}) without converging",
                self.max_iter
            );
        }

        if beta.iter().any(|b| !b.is_finite()) {
            return Err(TrainingError::FitFailed {
                reason: "solver diverged".to_string(),
            });
        }

        let mut coefficients = [0.0; FEATURE_COUNT];
        coefficients.copy_from_slice(&beta[..FEATURE_COUNT]);
        Ok(LogisticModel {
            coefficients,
            intercept: beta[FEATURE_COUNT],
        })
    }
}

struct Problem<'a> {
    rows: &'a [[f64; DIM]],
    targets: &'a [f64],
    weights: &'a [f64],
    lambda: f64,
}

impl Problem<'_> {
    fn objective(&self, beta: &[f64; DIM]) -> f64 {
        let loss: f64 = self
            .rows
            .iter()
            .zip(self.targets.iter())
            .zip(self.weights.iter())
            .map(|((x, y), s)| {
                let z = dot(x, beta);
                s * (softplus(z) - y * z)
            })
            .sum();
        let penalty: f64 = beta[..FEATURE_COUNT].iter().map(|b| b * b).sum();
        loss + 0.5 * self.lambda * penalty
    }

    fn gradient_and_hessian(&self, beta: &[f64; DIM]) -> ([f64; DIM], [[f64; DIM]; DIM]) {
        let mut gradient = [0.0; DIM];
        let mut hessian = [[0.0; DIM]; DIM];

        for ((x, y), s) in self.rows.iter().zip(self.targets.iter()).zip(self.weights.iter()) {
            let p = sigmoid(dot(x, beta));
            let residual = s * (p - y);
            let curvature = s * p * (1.0 - p);
            for j in 0..DIM {
                gradient[j] += residual * x[j];
                for k in 0..DIM {
                    hessian[j][k] += curvature * x[j] * x[k];
                }
            }
        }

        for j in 0..FEATURE_COUNT {
            gradient[j] += self.lambda * beta[j];
            hessian[j][j] += self.lambda;
        }
        // Keeps the intercept row invertible when every probability saturates
        hessian[FEATURE_COUNT][FEATURE_COUNT] += 1e-12;

        (gradient, hessian)
    }
}

fn augment(x: &FeatureVector) -> [f64; DIM] {
    let mut row = [1.0; DIM];
    row[..FEATURE_COUNT].copy_from_slice(x);
    row
}

fn dot(x: &[f64; DIM], beta: &[f64; DIM]) -> f64 {
    x.iter().zip(beta.iter()).map(|(a, b)| a * b).sum()
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// ln(1 + e^z) without overflow.
fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

/// Gaussian elimination with partial pivoting. `None` when singular.
fn solve(mut a: [[f64; DIM]; DIM], mut b: [f64; DIM]) -> Option<[f64; DIM]> {
    for col in 0..DIM {
        let pivot = (col..DIM).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-300 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..DIM {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..DIM {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; DIM];
    for row in (0..DIM).rev() {
        let tail: f64 = ((row + 1)..DIM).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(first: f64) -> FeatureVector {
        [first, 0.0, 0.0, 0.0, 0.0, 0.0]
    }

    #[test]
    fn test_balanced_weights_neutralise_imbalance() {
        // Uninformative features: only the intercept can move.
        // 9 ups vs 3 downs would give p = 0.75 unweighted; balanced gives 0.5.
        let features = vec![[0.0; FEATURE_COUNT]; 12];
        let mut labels = vec![true; 9];
        labels.extend(vec![false; 3]);

        let model = BalancedLogisticRegression::default()
            .fit_model(&features, &labels)
            .unwrap();
        let proba = model.predict_proba(&[[0.0; FEATURE_COUNT]]).unwrap();

        assert!((proba[0] - 0.5).abs() < 1e-6, "got {}", proba[0]);
    }

    #[test]
    fn test_learns_positive_relationship() {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let x = (i as f64 - 20.0) / 10.0;
            features.push(row(x));
            // Mostly up when x > 0, with some noise
            labels.push(if i % 7 == 0 { x <= 0.0 } else { x > 0.0 });
        }

        let model = BalancedLogisticRegression::default()
            .fit_model(&features, &labels)
            .unwrap();

        assert!(model.coefficients[0] > 0.0);
        let proba = model.predict_proba(&[row(-2.0), row(2.0)]).unwrap();
        assert!(proba[0] < 0.5);
        assert!(proba[1] > 0.5);
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_separable_data_stays_finite() {
        let features: Vec<FeatureVector> = (0..20).map(|i| row(i as f64)).collect();
        let labels: Vec<bool> = (0..20).map(|i| i >= 10).collect();

        let model = BalancedLogisticRegression::default()
            .fit_model(&features, &labels)
            .unwrap();

        assert!(model.coefficients.iter().all(|c| c.is_finite()));
        assert!(model.intercept.is_finite());
    }

    #[test]
    fn test_rejects_non_finite_input() {
        let features = vec![row(f64::INFINITY), row(1.0)];
        let result = BalancedLogisticRegression::default().fit(&features, &[true, false]);
        assert!(matches!(
            result,
            Err(TrainingError::MalformedFeatures { row: 0, .. })
        ));
    }

    #[test]
    fn test_predict_rejects_non_finite_input() {
        let model = LogisticModel {
            coefficients: [0.0; FEATURE_COUNT],
            intercept: 0.0,
        };
        let result = model.predict_proba(&[row(f64::NAN)]);
        assert!(matches!(result, Err(TrainingError::PredictFailed { .. })));
    }

    #[test]
    fn test_solve_identity() {
        let mut a = [[0.0; DIM]; DIM];
        for (i, r) in a.iter_mut().enumerate() {
            r[i] = 2.0;
        }
        let x = solve(a, [2.0; DIM]).unwrap();
        assert!(x.iter().all(|v| (v - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_softplus_matches_naive_form() {
        for z in [-5.0, -0.5, 0.0, 0.5, 5.0] {
            let naive = (1.0 + f64::exp(z)).ln();
            assert!((softplus(z) - naive).abs() < 1e-12);
        }
        assert!(softplus(1000.0).is_finite());
    }
}
