//! Per-symbol directional classifier training.
//!
//! Every symbol is handled on its own: rows are grouped by symbol, put in
//! chronological order, and run through the same policy:
//!
//! 1. drop unlabeled rows; skip the symbol below `min_rows`
//! 2. zero-fill missing features
//! 3. skip the symbol when only one label class is present
//! 4. pick the largest time split whose training prefix holds both classes
//! 5. without such a split, fit on everything and record no evaluation
//! 6. otherwise fit on the prefix and evaluate on the suffix when it holds
//!    both classes
//!
//! Data-quality conditions never fail the run. Fit or scoring errors only
//! drop the affected symbol.

use super::classifier::{Classifier, FittedModel};
use super::evaluation::{accuracy, roc_auc};
use super::split::{has_both_classes, select_time_split, TimeSplit};
use crate::domain::errors::TrainingError;
use crate::domain::types::{EvaluationRecord, FeatureRow, FeatureVector};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

pub const DEFAULT_MIN_ROWS: usize = 12;

#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub min_rows: usize,
    pub model_version: String,
    /// Train symbols on the rayon pool instead of sequentially.
    pub parallel: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            min_rows: DEFAULT_MIN_ROWS,
            model_version: "v1".to_string(),
            parallel: false,
        }
    }
}

/// Why a symbol did not get a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    InsufficientRows { labeled: usize, required: usize },
    SingleClass,
    Failed(String),
}

impl SkipReason {
    /// Short key used when counting skips in the run summary.
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::InsufficientRows { .. } => "insufficient_rows",
            SkipReason::SingleClass => "single_class",
            SkipReason::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientRows { labeled, required } => {
                write!(f, "{} labeled rows < {} required", labeled, required)
            }
            SkipReason::SingleClass => write!(f, "single label class"),
            SkipReason::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Models and metrics produced by one training run.
#[derive(Default)]
pub struct TrainingOutcome {
    pub models: BTreeMap<String, Box<dyn FittedModel>>,
    pub evaluations: BTreeMap<String, EvaluationRecord>,
    pub skipped: BTreeMap<String, SkipReason>,
}

impl TrainingOutcome {
    pub fn trained_count(&self) -> usize {
        self.models.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn skipped_by_reason(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for reason in self.skipped.values() {
            *counts.entry(reason.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Evaluation records in symbol order, ready for the metrics sink.
    pub fn evaluation_records(&self) -> Vec<EvaluationRecord> {
        self.evaluations.values().cloned().collect()
    }
}

enum SymbolResult {
    Trained {
        model: Box<dyn FittedModel>,
        evaluation: EvaluationRecord,
        split: Option<TimeSplit>,
    },
    Skipped(SkipReason),
}

pub struct PerSymbolTrainer {
    classifier: Box<dyn Classifier>,
    config: TrainerConfig,
}

impl PerSymbolTrainer {
    pub fn new(classifier: Box<dyn Classifier>, config: TrainerConfig) -> Self {
        Self { classifier, config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Train one model per qualifying symbol.
    pub fn train_per_symbol(&self, rows: &[FeatureRow]) -> TrainingOutcome {
        let groups: Vec<(String, Vec<&FeatureRow>)> = group_by_symbol(rows).into_iter().collect();
        info!(
            "Training {} symbols with {} (min_rows={}, parallel={})",
            groups.len(),
            self.classifier.name(),
            self.config.min_rows,
            self.config.parallel
        );

        let results: Vec<(String, SymbolResult)> = if self.config.parallel {
            groups
                .par_iter()
                .map(|(symbol, group)| (symbol.clone(), self.train_symbol(symbol, group)))
                .collect()
        } else {
            groups
                .iter()
                .map(|(symbol, group)| (symbol.clone(), self.train_symbol(symbol, group)))
                .collect()
        };

        let mut outcome = TrainingOutcome::default();
        for (symbol, result) in results {
            match result {
                SymbolResult::Trained {
                    model,
                    evaluation,
                    split,
                } => {
                    match split {
                        Some(s) => debug!(
                            "{}: trained on {}/{} rows (fraction {:.2}), auc={:?}, acc={:?}",
                            symbol,
                            s.train_len,
                            evaluation.row_count,
                            s.fraction,
                            evaluation.auc,
                            evaluation.accuracy
                        ),
                        None => debug!(
                            "{}: no valid time split, trained on all {} rows without evaluation",
                            symbol, evaluation.row_count
                        ),
                    }
                    outcome.models.insert(symbol.clone(), model);
                    outcome.evaluations.insert(symbol, evaluation);
                }
                SymbolResult::Skipped(reason) => {
                    if let SkipReason::Failed(_) = reason {
                        warn!("{}: skipped, {}", symbol, reason);
                    } else {
                        debug!("{}: skipped, {}", symbol, reason);
                    }
                    outcome.skipped.insert(symbol, reason);
                }
            }
        }

        info!(
            "Per-symbol models trained: {} | skipped: {}",
            outcome.trained_count(),
            outcome.skipped_count()
        );
        outcome
    }

    fn train_symbol(&self, symbol: &str, rows: &[&FeatureRow]) -> SymbolResult {
        if let Err(e) = ensure_chronological(symbol, rows) {
            return SymbolResult::Skipped(SkipReason::Failed(e.to_string()));
        }

        let (features, labels): (Vec<FeatureVector>, Vec<bool>) = rows
            .iter()
            .filter_map(|row| row.label.map(|label| (row.dense_features(), label)))
            .unzip();

        if labels.len() < self.config.min_rows {
            return SymbolResult::Skipped(SkipReason::InsufficientRows {
                labeled: labels.len(),
                required: self.config.min_rows,
            });
        }

        if !has_both_classes(&labels) {
            return SymbolResult::Skipped(SkipReason::SingleClass);
        }

        match self.fit_and_evaluate(symbol, &features, &labels) {
            Ok(result) => result,
            Err(e) => SymbolResult::Skipped(SkipReason::Failed(e.to_string())),
        }
    }

    fn fit_and_evaluate(
        &self,
        symbol: &str,
        features: &[FeatureVector],
        labels: &[bool],
    ) -> Result<SymbolResult, TrainingError> {
        let row_count = labels.len();
        let split = select_time_split(labels);

        let (model, auc, acc) = match split {
            None => {
                let model = self.classifier.fit(features, labels)?;
                (model, None, None)
            }
            Some(s) => {
                let model = self
                    .classifier
                    .fit(&features[..s.train_len], &labels[..s.train_len])?;
                let held_out_x = &features[s.train_len..];
                let held_out_y = &labels[s.train_len..];

                if !held_out_y.is_empty() && has_both_classes(held_out_y) {
                    let proba = model.predict_proba(held_out_x)?;
                    (model, roc_auc(held_out_y, &proba), accuracy(held_out_y, &proba))
                } else {
                    (model, None, None)
                }
            }
        };

        Ok(SymbolResult::Trained {
            model,
            evaluation: EvaluationRecord {
                symbol: symbol.to_string(),
                auc,
                accuracy: acc,
                row_count,
                model_version: self.config.model_version.clone(),
            },
            split,
        })
    }
}

/// Groups rows by symbol, each group sorted by date.
pub fn group_by_symbol(rows: &[FeatureRow]) -> BTreeMap<String, Vec<&FeatureRow>> {
    let mut groups: BTreeMap<String, Vec<&FeatureRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.symbol.clone()).or_default().push(row);
    }
    for group in groups.values_mut() {
        // Stable sort keeps provider order for equal dates, which are rejected later
        group.sort_by_key(|row| row.date);
    }
    groups
}

/// Dates within a symbol must be strictly increasing.
fn ensure_chronological(symbol: &str, rows: &[&FeatureRow]) -> Result<(), TrainingError> {
    for pair in rows.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(TrainingError::DuplicateDate {
                symbol: symbol.to_string(),
                date: pair[1].date,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::logistic::BalancedLogisticRegression;
    use chrono::{Duration, NaiveDate};

    fn day(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + Duration::days(i as i64)
    }

    fn rows_for(symbol: &str, labels: &[Option<bool>]) -> Vec<FeatureRow> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let signal = match label {
                    Some(true) => 1.0,
                    Some(false) => -1.0,
                    None => 0.0,
                };
                FeatureRow::new(
                    day(i),
                    symbol,
                    [Some(signal), Some(signal * 2.0), None, Some(i as f64 % 3.0), None, None],
                    *label,
                )
            })
            .collect()
    }

    fn trainer(min_rows: usize) -> PerSymbolTrainer {
        PerSymbolTrainer::new(
            Box::new(BalancedLogisticRegression::default()),
            TrainerConfig {
                min_rows,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_group_by_symbol_sorts_dates() {
        let mut rows = rows_for("AAPL", &[Some(true), Some(false), Some(true)]);
        rows.reverse();
        let groups = group_by_symbol(&rows);
        let dates: Vec<NaiveDate> = groups["AAPL"].iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(0), day(1), day(2)]);
    }

    #[test]
    fn test_insufficient_rows_skipped() {
        let labels: Vec<Option<bool>> = (0..10).map(|i| Some(i % 2 == 0)).collect();
        let outcome = trainer(12).train_per_symbol(&rows_for("Y", &labels));

        assert!(outcome.models.is_empty());
        assert!(outcome.evaluations.is_empty());
        assert_eq!(
            outcome.skipped["Y"],
            SkipReason::InsufficientRows {
                labeled: 10,
                required: 12
            }
        );
    }

    #[test]
    fn test_unlabeled_rows_do_not_count_towards_min_rows() {
        let mut labels: Vec<Option<bool>> = (0..11).map(|i| Some(i % 2 == 0)).collect();
        labels.extend([None, None, None]);
        let outcome = trainer(12).train_per_symbol(&rows_for("AAPL", &labels));
        assert!(matches!(
            outcome.skipped["AAPL"],
            SkipReason::InsufficientRows { labeled: 11, .. }
        ));
    }

    #[test]
    fn test_single_class_skipped() {
        let labels = vec![Some(false); 30];
        let outcome = trainer(12).train_per_symbol(&rows_for("Z", &labels));

        assert!(outcome.models.is_empty());
        assert!(outcome.evaluations.is_empty());
        assert_eq!(outcome.skipped["Z"], SkipReason::SingleClass);
    }

    #[test]
    fn test_single_class_suffix_gives_null_evaluation() {
        // 20 labeled rows, first 18 hold both classes, rows 19-20 are both up
        let mut labels: Vec<Option<bool>> = (0..18).map(|i| Some(i % 3 == 0)).collect();
        labels.extend([Some(true), Some(true)]);
        let outcome = trainer(12).train_per_symbol(&rows_for("X", &labels));

        assert!(outcome.models.contains_key("X"));
        let eval = &outcome.evaluations["X"];
        assert_eq!(eval.auc, None);
        assert_eq!(eval.accuracy, None);
        assert_eq!(eval.row_count, 20);
    }

    #[test]
    fn test_no_valid_split_trains_on_everything() {
        // The only "up" sits past every training prefix
        let mut labels = vec![Some(false); 12];
        labels[11] = Some(true);
        let outcome = trainer(12).train_per_symbol(&rows_for("LATE", &labels));

        assert!(outcome.models.contains_key("LATE"));
        let eval = &outcome.evaluations["LATE"];
        assert_eq!(eval.auc, None);
        assert_eq!(eval.accuracy, None);
        assert_eq!(eval.row_count, 12);
    }

    #[test]
    fn test_valid_split_produces_metrics() {
        let labels: Vec<Option<bool>> = (0..40).map(|i| Some(i % 2 == 0)).collect();
        let outcome = trainer(12).train_per_symbol(&rows_for("MSFT", &labels));

        let eval = &outcome.evaluations["MSFT"];
        let auc = eval.auc.expect("auc should be measured");
        let acc = eval.accuracy.expect("accuracy should be measured");
        assert!((0.0..=1.0).contains(&auc));
        assert!((0.0..=1.0).contains(&acc));
        // Features carry the label signal, so the held-out ranking is perfect
        assert_eq!(auc, 1.0);
        assert_eq!(eval.model_version, "v1");
    }

    #[test]
    fn test_duplicate_dates_isolated_to_symbol() {
        let labels: Vec<Option<bool>> = (0..20).map(|i| Some(i % 2 == 0)).collect();
        let mut rows = rows_for("DUP", &labels);
        rows[5].date = rows[4].date;
        rows.extend(rows_for("GOOD", &labels));

        let outcome = trainer(12).train_per_symbol(&rows);

        assert!(matches!(outcome.skipped["DUP"], SkipReason::Failed(_)));
        assert!(outcome.models.contains_key("GOOD"));
        assert!(!outcome.evaluations.contains_key("DUP"));
    }

    #[test]
    fn test_malformed_features_isolated_to_symbol() {
        let labels: Vec<Option<bool>> = (0..20).map(|i| Some(i % 2 == 0)).collect();
        let mut rows = rows_for("BAD", &labels);
        rows[3].features[2] = Some(f64::INFINITY);
        rows.extend(rows_for("GOOD", &labels));

        let outcome = trainer(12).train_per_symbol(&rows);

        assert!(matches!(outcome.skipped["BAD"], SkipReason::Failed(_)));
        assert!(outcome.models.contains_key("GOOD"));
        assert_eq!(outcome.skipped_by_reason().get("failed"), Some(&1));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut rows = Vec::new();
        for (n, symbol) in ["A", "B", "C", "D"].iter().enumerate() {
            let labels: Vec<Option<bool>> = (0..(10 + n * 5)).map(|i| Some(i % 2 == n % 2)).collect();
            rows.extend(rows_for(symbol, &labels));
        }

        let sequential = trainer(12).train_per_symbol(&rows);
        let parallel = PerSymbolTrainer::new(
            Box::new(BalancedLogisticRegression::default()),
            TrainerConfig {
                parallel: true,
                ..Default::default()
            },
        )
        .train_per_symbol(&rows);

        assert_eq!(sequential.evaluations, parallel.evaluations);
        assert_eq!(sequential.skipped, parallel.skipped);
    }
}
