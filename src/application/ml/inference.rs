//! Next-day direction scoring for the most recent feature date.

use super::classifier::{predicted_label, FittedModel};
use crate::domain::types::{FeatureRow, FeatureVector, PredictionRecord};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Default)]
pub struct InferenceOutcome {
    /// Latest date across all rows, `None` when there were no rows.
    pub date: Option<NaiveDate>,
    pub predictions: Vec<PredictionRecord>,
    /// Symbols whose model failed to score, with the reason.
    pub failed: BTreeMap<String, String>,
}

/// Latest date present in `rows`.
pub fn latest_date(rows: &[FeatureRow]) -> Option<NaiveDate> {
    rows.iter().map(|row| row.date).max()
}

/// Scores every row dated at the global latest date whose symbol has a model.
///
/// Rows with a missing label are scored like any other. Symbols without a
/// model produce nothing, and a scoring failure only drops that symbol.
pub fn predict_latest(
    rows: &[FeatureRow],
    models: &BTreeMap<String, Box<dyn FittedModel>>,
    model_version: &str,
) -> InferenceOutcome {
    let Some(date) = latest_date(rows) else {
        return InferenceOutcome::default();
    };

    let mut latest: BTreeMap<&str, Vec<FeatureVector>> = BTreeMap::new();
    for row in rows.iter().filter(|row| row.date == date) {
        latest
            .entry(row.symbol.as_str())
            .or_default()
            .push(row.dense_features());
    }

    let mut outcome = InferenceOutcome {
        date: Some(date),
        ..Default::default()
    };

    for (symbol, features) in latest {
        let Some(model) = models.get(symbol) else {
            continue;
        };
        match model.predict_proba(&features) {
            Ok(probabilities) => {
                outcome
                    .predictions
                    .extend(probabilities.into_iter().map(|p| PredictionRecord {
                        date,
                        symbol: symbol.to_string(),
                        probability_up: p,
                        predicted_label: predicted_label(p),
                        model_version: model_version.to_string(),
                    }));
            }
            Err(e) => {
                warn!("{}: prediction failed: {}", symbol, e);
                outcome.failed.insert(symbol.to_string(), e.to_string());
            }
        }
    }

    info!(
        "Predictions generated for {}: {} rows",
        date,
        outcome.predictions.len()
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::logistic::LogisticModel;
    use crate::domain::ml::FEATURE_COUNT;

    fn model(intercept: f64) -> Box<dyn FittedModel> {
        Box::new(LogisticModel {
            coefficients: [0.0; FEATURE_COUNT],
            intercept,
        })
    }

    fn row(day: u32, symbol: &str) -> FeatureRow {
        FeatureRow::new(
            NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            symbol,
            [None; FEATURE_COUNT],
            None,
        )
    }

    #[test]
    fn test_only_latest_global_date_is_scored() {
        let rows = vec![row(1, "AAPL"), row(2, "AAPL"), row(3, "MSFT"), row(1, "MSFT")];
        let mut models = BTreeMap::new();
        models.insert("AAPL".to_string(), model(0.0));
        models.insert("MSFT".to_string(), model(0.0));

        let outcome = predict_latest(&rows, &models, "v1");

        // AAPL has no row on the 3rd, so only MSFT is predicted
        assert_eq!(outcome.date, NaiveDate::from_ymd_opt(2025, 3, 3));
        assert_eq!(outcome.predictions.len(), 1);
        assert_eq!(outcome.predictions[0].symbol, "MSFT");
    }

    #[test]
    fn test_label_follows_threshold() {
        let rows = vec![row(5, "UP"), row(5, "FLAT")];
        let mut models = BTreeMap::new();
        // sigmoid(0.4) ~ 0.599, sigmoid(0.1) ~ 0.525
        models.insert("UP".to_string(), model(0.4));
        models.insert("FLAT".to_string(), model(0.1));

        let outcome = predict_latest(&rows, &models, "v2");
        let by_symbol: BTreeMap<&str, &PredictionRecord> = outcome
            .predictions
            .iter()
            .map(|p| (p.symbol.as_str(), p))
            .collect();

        assert_eq!(by_symbol["UP"].predicted_label, 1);
        assert_eq!(by_symbol["FLAT"].predicted_label, 0);
        assert!(by_symbol["FLAT"].probability_up > 0.5);
        assert!(outcome.predictions.iter().all(|p| p.model_version == "v2"));
    }

    #[test]
    fn test_symbol_without_model_is_ignored() {
        let rows = vec![row(5, "AAPL"), row(5, "NEW")];
        let mut models = BTreeMap::new();
        models.insert("AAPL".to_string(), model(0.0));

        let outcome = predict_latest(&rows, &models, "v1");
        assert_eq!(outcome.predictions.len(), 1);
        assert!(outcome.failed.is_empty());
    }

    #[test]
    fn test_scoring_failure_isolated() {
        let mut bad = row(5, "BAD");
        bad.features[0] = Some(f64::NAN);
        let rows = vec![bad, row(5, "GOOD")];
        let mut models = BTreeMap::new();
        models.insert("BAD".to_string(), model(0.0));
        models.insert("GOOD".to_string(), model(0.0));

        let outcome = predict_latest(&rows, &models, "v1");
        assert_eq!(outcome.predictions.len(), 1);
        assert_eq!(outcome.predictions[0].symbol, "GOOD");
        assert!(outcome.failed.contains_key("BAD"));
    }

    #[test]
    fn test_empty_rows() {
        let outcome = predict_latest(&[], &BTreeMap::new(), "v1");
        assert!(outcome.date.is_none());
        assert!(outcome.predictions.is_empty());
    }
}
