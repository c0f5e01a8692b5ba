//! Terminal and CSV rendering for the report binary.

use crate::domain::types::{
    Direction, EarningsReport, ModelMetricsRow, NewsArticle, PredictionRecord, PredictionWithQc,
};
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;

const RULE_WIDTH: usize = 96;
const HEADLINE_WIDTH: usize = 60;

/// Keeps predictions whose latest AUC is at least `min_auc`.
///
/// A symbol without an AUC (never evaluated, or a single-class held-out
/// slice) does not pass any quality bar and is dropped.
pub fn filter_by_min_auc(rows: Vec<PredictionWithQc>, min_auc: f64) -> Vec<PredictionWithQc> {
    rows.into_iter()
        .filter(|p| p.auc.is_some_and(|auc| auc >= min_auc))
        .collect()
}

/// One output line of the latest-predictions report.
#[derive(Debug, Clone, Serialize)]
pub struct LatestReportRow {
    pub date: String,
    pub symbol: String,
    pub p_up: f64,
    pub pred_label: u8,
    pub direction: String,
    pub auc: Option<f64>,
    pub accuracy: Option<f64>,
    pub n_rows: Option<i64>,
    pub model_version: String,
}

impl From<&PredictionWithQc> for LatestReportRow {
    fn from(p: &PredictionWithQc) -> Self {
        Self {
            date: p.date.to_string(),
            symbol: p.symbol.clone(),
            p_up: p.probability_up,
            pred_label: p.predicted_label,
            direction: Direction::from(p.predicted_label).to_string(),
            auc: p.auc,
            accuracy: p.accuracy,
            n_rows: p.row_count,
            model_version: p.model_version.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryReportRow {
    pub date: String,
    pub symbol: String,
    pub p_up: f64,
    pub pred_label: u8,
    pub direction: String,
    pub model_version: String,
}

impl From<&PredictionRecord> for HistoryReportRow {
    fn from(p: &PredictionRecord) -> Self {
        Self {
            date: p.date.to_string(),
            symbol: p.symbol.clone(),
            p_up: p.probability_up,
            pred_label: p.predicted_label,
            direction: Direction::from(p.predicted_label).to_string(),
            model_version: p.model_version.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsReportRow {
    pub trained_at: String,
    pub symbol: String,
    pub auc: Option<f64>,
    pub accuracy: Option<f64>,
    pub n_rows: i64,
    pub model_version: String,
}

impl From<&ModelMetricsRow> for MetricsReportRow {
    fn from(m: &ModelMetricsRow) -> Self {
        Self {
            trained_at: m.trained_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            symbol: m.symbol.clone(),
            auc: m.auc,
            accuracy: m.accuracy,
            n_rows: m.row_count,
            model_version: m.model_version.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsReportRow {
    pub published_at: String,
    pub symbol: String,
    pub sentiment: Option<f64>,
    pub headline: String,
}

impl From<&NewsArticle> for NewsReportRow {
    fn from(n: &NewsArticle) -> Self {
        Self {
            published_at: n.published_at.format("%Y-%m-%d %H:%M").to_string(),
            symbol: n.symbol.clone(),
            sentiment: n.sentiment,
            headline: n.headline.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EarningsReportRow {
    pub report_date: String,
    pub symbol: String,
    pub actual_eps: Option<f64>,
    pub consensus_eps: Option<f64>,
    pub surprise_pct: Option<f64>,
}

impl From<&EarningsReport> for EarningsReportRow {
    fn from(e: &EarningsReport) -> Self {
        Self {
            report_date: e.report_date.to_string(),
            symbol: e.symbol.clone(),
            actual_eps: e.actual_eps,
            consensus_eps: e.consensus_eps,
            surprise_pct: e.surprise_pct,
        }
    }
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v))
}

pub fn render_latest_table(rows: &[LatestReportRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} | {:<8} | {:>6} | {:<9} | {:>6} | {:>6} | {:>6} | {:<8}\n",
        "Date", "Symbol", "P(up)", "Direction", "AUC", "Acc", "Rows", "Model"
    ));
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    for row in rows {
        out.push_str(&format!(
            "{:<10} | {:<8} | {:>6.3} | {:<9} | {:>6} | {:>6} | {:>6} | {:<8}\n",
            row.date,
            row.symbol,
            row.p_up,
            row.direction,
            optional(row.auc),
            optional(row.accuracy),
            row.n_rows.map_or_else(|| "-".to_string(), |n| n.to_string()),
            row.model_version
        ));
    }
    out
}

pub fn render_history_table(rows: &[HistoryReportRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} | {:<8} | {:>6} | {:<9} | {:<8}\n",
        "Date", "Symbol", "P(up)", "Direction", "Model"
    ));
    out.push_str(&"-".repeat(RULE_WIDTH / 2));
    out.push('\n');

    for row in rows {
        out.push_str(&format!(
            "{:<10} | {:<8} | {:>6.3} | {:<9} | {:<8}\n",
            row.date, row.symbol, row.p_up, row.direction, row.model_version
        ));
    }
    out
}

pub fn render_metrics_table(rows: &[MetricsReportRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<19} | {:<8} | {:>6} | {:>6} | {:>6} | {:<8}\n",
        "Trained at", "Symbol", "AUC", "Acc", "Rows", "Model"
    ));
    out.push_str(&"-".repeat(RULE_WIDTH * 3 / 4));
    out.push('\n');

    for row in rows {
        out.push_str(&format!(
            "{:<19} | {:<8} | {:>6} | {:>6} | {:>6} | {:<8}\n",
            row.trained_at,
            row.symbol,
            optional(row.auc),
            optional(row.accuracy),
            row.n_rows,
            row.model_version
        ));
    }
    out
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut short: String = text.chars().take(width.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

pub fn render_news_table(rows: &[NewsReportRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<16} | {:<8} | {:>9} | {}\n",
        "Published", "Symbol", "Sentiment", "Headline"
    ));
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');

    for row in rows {
        out.push_str(&format!(
            "{:<16} | {:<8} | {:>9} | {}\n",
            row.published_at,
            row.symbol,
            optional(row.sentiment),
            truncate(&row.headline, HEADLINE_WIDTH)
        ));
    }
    out
}

pub fn render_earnings_table(rows: &[EarningsReportRow]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} | {:<8} | {:>10} | {:>12} | {:>10}\n",
        "Reported", "Symbol", "EPS actual", "EPS estimate", "Surprise %"
    ));
    out.push_str(&"-".repeat(RULE_WIDTH * 3 / 4));
    out.push('\n');

    for row in rows {
        out.push_str(&format!(
            "{:<10} | {:<8} | {:>10} | {:>12} | {:>10}\n",
            row.report_date,
            row.symbol,
            optional(row.actual_eps),
            optional(row.consensus_eps),
            row.surprise_pct.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
        ));
    }
    out
}

/// Writes `rows` as CSV with a header line. Missing values are empty cells.
pub fn write_csv<T: Serialize, W: Write>(rows: &[T], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_writer(writer);
    for row in rows {
        wtr.serialize(row).context("Failed to serialize report row")?;
    }
    wtr.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn latest(symbol: &str, p: f64, label: u8, auc: Option<f64>) -> PredictionWithQc {
        PredictionWithQc {
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            symbol: symbol.to_string(),
            probability_up: p,
            predicted_label: label,
            auc,
            accuracy: auc,
            row_count: auc.map(|_| 480),
            model_version: "v1".to_string(),
        }
    }

    #[test]
    fn test_latest_table_shows_direction_and_placeholders() {
        let rows: Vec<LatestReportRow> = [
            latest("AAPL", 0.61, 1, Some(0.58)),
            latest("MSFT", 0.42, 0, None),
        ]
        .iter()
        .map(LatestReportRow::from)
        .collect();

        let table = render_latest_table(&rows);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Direction"));
        assert!(lines[2].contains("AAPL") && lines[2].contains("UP") && lines[2].contains("0.580"));
        assert!(lines[3].contains("DOWN"));
        assert!(lines[3].contains(" - "));
    }

    #[test]
    fn test_csv_leaves_missing_metrics_empty() {
        let rows = vec![LatestReportRow::from(&latest("MSFT", 0.42, 0, None))];
        let mut buf = Vec::new();
        write_csv(&rows, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "date,symbol,p_up,pred_label,direction,auc,accuracy,n_rows,model_version"
        );
        assert_eq!(lines.next().unwrap(), "2025-06-02,MSFT,0.42,0,DOWN,,,,v1");
    }

    #[test]
    fn test_history_table_lists_every_row() {
        let record = PredictionRecord {
            date: NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(),
            symbol: "AAPL".to_string(),
            probability_up: 0.55,
            predicted_label: 1,
            model_version: "v1".to_string(),
        };
        let rows = vec![HistoryReportRow::from(&record); 3];
        assert_eq!(render_history_table(&rows).lines().count(), 5);
    }

    #[test]
    fn test_min_auc_drops_unevaluated_symbols() {
        let rows = vec![
            latest("AAPL", 0.61, 1, Some(0.66)),
            latest("MSFT", 0.42, 0, None),
            latest("NVDA", 0.58, 1, Some(0.64)),
            latest("TSLA", 0.50, 0, Some(0.65)),
        ];

        let kept: Vec<String> = filter_by_min_auc(rows.clone(), 0.65)
            .into_iter()
            .map(|p| p.symbol)
            .collect();
        assert_eq!(kept, vec!["AAPL", "TSLA"]);

        // Even a zero bar requires an AUC
        assert_eq!(filter_by_min_auc(rows, 0.0).len(), 3);
    }

    #[test]
    fn test_metrics_table_and_csv() {
        let metrics = ModelMetricsRow {
            trained_at: NaiveDate::from_ymd_opt(2025, 6, 2)
                .unwrap()
                .and_hms_milli_opt(21, 5, 7, 250)
                .unwrap(),
            symbol: "AAPL".to_string(),
            auc: Some(0.612),
            accuracy: None,
            row_count: 480,
            model_version: "v1".to_string(),
        };
        let rows = vec![MetricsReportRow::from(&metrics)];

        let table = render_metrics_table(&rows);
        let line = table.lines().nth(2).unwrap();
        assert!(line.starts_with("2025-06-02 21:05:07 | AAPL"));
        assert!(line.contains("0.612") && line.contains(" - ") && line.contains("480"));

        let mut buf = Vec::new();
        write_csv(&rows, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "trained_at,symbol,auc,accuracy,n_rows,model_version",
                "2025-06-02 21:05:07,AAPL,0.612,,480,v1",
            ]
        );
    }

    #[test]
    fn test_news_and_earnings_tables() {
        let article = NewsArticle {
            symbol: "AAPL".to_string(),
            published_at: Utc.with_ymd_and_hms(2025, 6, 2, 13, 45, 0).unwrap(),
            headline: "A".repeat(80),
            sentiment: Some(0.25),
            raw_payload: serde_json::Value::Null,
        };
        let news = render_news_table(&[NewsReportRow::from(&article)]);
        let line = news.lines().nth(2).unwrap();
        assert!(line.starts_with("2025-06-02 13:45 | AAPL"));
        assert!(line.ends_with(&format!("{}...", "A".repeat(57))));

        let report = EarningsReport {
            symbol: "MSFT".to_string(),
            report_date: NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
            actual_eps: Some(3.46),
            consensus_eps: Some(3.22),
            surprise_pct: Some(7.4534),
            raw_payload: serde_json::Value::Null,
        };
        let earnings = render_earnings_table(&[EarningsReportRow::from(&report)]);
        let line = earnings.lines().nth(2).unwrap();
        assert!(line.starts_with("2025-04-30 | MSFT"));
        assert!(line.contains("3.460") && line.contains("7.45"));
    }
}
