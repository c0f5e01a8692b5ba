use chrono::{Duration, NaiveDate};
use marketpulse::application::bootstrap::{PersistenceHandle, stages};
use marketpulse::config::Config;
use marketpulse::domain::repositories::{FeatureRepository, ReportRepository};
use marketpulse::domain::types::FeatureRow;
use marketpulse::infrastructure::persistence::Database;

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 3).unwrap() + Duration::days(offset)
}

/// Labeled rows on consecutive days starting at `first_day`, followed by one
/// unlabeled row for the day after the last label.
fn symbol_rows(symbol: &str, first_day: i64, labels: &[bool]) -> Vec<FeatureRow> {
    let mut rows: Vec<FeatureRow> = labels
        .iter()
        .enumerate()
        .map(|(i, up)| {
            let ret = if *up { 0.012 } else { -0.011 };
            FeatureRow::new(
                day(first_day + i as i64),
                symbol,
                [Some(ret), Some(ret * 2.0), None, Some(2.0), Some(5.0), None],
                Some(*up),
            )
        })
        .collect();
    rows.push(FeatureRow::new(
        day(first_day + labels.len() as i64),
        symbol,
        [Some(0.012), Some(0.02), None, Some(3.0), Some(6.0), None],
        None,
    ));
    rows
}

async fn seeded_warehouse(rows: &[FeatureRow]) -> PersistenceHandle {
    let db = Database::new("sqlite::memory:", 1).await.unwrap();
    let persistence = PersistenceHandle::from_database(db);
    persistence.feature_repository.replace_all(rows).await.unwrap();
    persistence
}

fn alternating(n: usize) -> Vec<bool> {
    (0..n).map(|i| i % 2 == 0).collect()
}

#[tokio::test]
async fn test_short_flat_and_sparse_symbols_end_to_end() {
    // X: 20 labels, both classes in the first 18, suffix of two up days
    let mut x_labels = alternating(18);
    x_labels.extend([true, true]);
    // All symbols share the latest date (day 20)
    let mut rows = symbol_rows("XXX", 0, &x_labels);
    rows.extend(symbol_rows("YYY", 10, &alternating(10)));
    rows.extend(symbol_rows("ZZZ", 0, &[false; 20]));
    rows.extend(symbol_rows("WWW", 0, &alternating(20)));

    let persistence = seeded_warehouse(&rows).await;
    let config = Config::default();
    let summary = stages::train_and_infer(&config, &persistence).await.unwrap();

    assert_eq!(summary.trained_symbols, 2);
    assert_eq!(summary.skipped_by_reason.get("insufficient_rows"), Some(&1));
    assert_eq!(summary.skipped_by_reason.get("single_class"), Some(&1));
    assert_eq!(summary.metrics_rows_written, 2);
    assert_eq!(summary.prediction_rows_written, 2);
    assert_eq!(summary.prediction_date, Some(day(20)));

    let metrics: Vec<(String, Option<f64>, Option<f64>, i64, String)> = sqlx::query_as(
        "SELECT symbol, auc, accuracy, n_rows, model_version FROM ml_model_metrics ORDER BY symbol",
    )
    .fetch_all(&persistence.db.pool)
    .await
    .unwrap();

    assert_eq!(metrics.len(), 2);
    let (ref w_symbol, w_auc, w_acc, w_rows, ref version) = metrics[0];
    assert_eq!(w_symbol, "WWW");
    assert!(w_auc.is_some());
    assert!(w_acc.is_some());
    assert_eq!(w_rows, 20);
    assert_eq!(version, "v1");

    // XXX keeps its model but its held-out slice has one class only
    let (ref x_symbol, x_auc, x_acc, x_rows, _) = metrics[1];
    assert_eq!(x_symbol, "XXX");
    assert_eq!(x_auc, None);
    assert_eq!(x_acc, None);
    assert_eq!(x_rows, 20);
}

#[tokio::test]
async fn test_predictions_only_for_latest_date_and_respect_threshold() {
    let mut rows = symbol_rows("AAA", 0, &alternating(30));
    rows.extend(symbol_rows("BBB", 0, &alternating(30)));
    // CCC stops earlier, so its last row is not on the latest date
    rows.extend(symbol_rows("CCC", 0, &alternating(20)));

    let persistence = seeded_warehouse(&rows).await;
    let summary = stages::train_and_infer(&Config::default(), &persistence)
        .await
        .unwrap();
    assert_eq!(summary.trained_symbols, 3);

    let predictions: Vec<(NaiveDate, String, f64, i64)> = sqlx::query_as(
        "SELECT date, symbol, p_up, pred_label FROM ml_predictions_daily ORDER BY symbol",
    )
    .fetch_all(&persistence.db.pool)
    .await
    .unwrap();

    let symbols: Vec<&str> = predictions.iter().map(|p| p.1.as_str()).collect();
    assert_eq!(symbols, vec!["AAA", "BBB"]);
    for (date, _, p_up, label) in &predictions {
        assert_eq!(*date, day(30));
        assert!((0.0..=1.0).contains(p_up));
        assert_eq!(*label == 1, *p_up >= 0.55);
    }
}

#[tokio::test]
async fn test_repeated_runs_append_and_report_latest() {
    let rows = symbol_rows("AAA", 0, &alternating(30));
    let persistence = seeded_warehouse(&rows).await;

    let mut config = Config::default();
    stages::train_and_infer(&config, &persistence).await.unwrap();
    config.training.model_version = "v2".to_string();
    stages::train_and_infer(&config, &persistence).await.unwrap();

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ml_predictions_daily")
        .fetch_one(&persistence.db.pool)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let latest = persistence.report_repository.latest_with_qc().await.unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].symbol, "AAA");
    assert_eq!(latest[0].model_version, "v2");
    assert_eq!(latest[0].row_count, Some(30));

    let metrics = persistence
        .report_repository
        .metrics_history(Some("AAA"), 10)
        .await
        .unwrap();
    let versions: Vec<&str> = metrics.iter().map(|m| m.model_version.as_str()).collect();
    assert_eq!(versions, vec!["v2", "v1"]);
}

#[tokio::test]
async fn test_empty_warehouse_completes() {
    let persistence = seeded_warehouse(&[]).await;
    let summary = stages::train_and_infer(&Config::default(), &persistence)
        .await
        .unwrap();

    assert_eq!(summary.feature_rows, 0);
    assert_eq!(summary.metrics_rows_written, 0);
    assert_eq!(summary.prediction_rows_written, 0);
}
