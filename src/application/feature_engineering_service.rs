use crate::domain::repositories::{FeatureRepository, RawMarketDataRepository};
use crate::domain::types::{EarningsReport, FeatureRow, NewsArticle, PriceBar, RawFeatures};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use std::collections::BTreeMap;
use std::sync::Arc;
use ta::indicators::StandardDeviation;
use ta::Next;
use tracing::{debug, info, warn};

/// Number of daily returns behind `vol_20d`.
pub const VOLATILITY_WINDOW: usize = 20;
/// Lag of `ret_5d`.
pub const MULTI_DAY_RETURN_LAG: usize = 5;
/// Calendar days counted by `articles_3d` (t-2 ..= t).
pub const NEWS_WINDOW_DAYS: i64 = 3;

/// Derives the daily feature table from raw prices, news and earnings.
pub struct FeatureBuilder {
    volatility_window: usize,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self {
            volatility_window: VOLATILITY_WINDOW,
        }
    }
}

impl FeatureBuilder {
    /// Builds one row per (symbol, trading date) with a close.
    ///
    /// Output is ordered by symbol then date. Symbols without prices produce
    /// no rows even when they have news or earnings.
    pub fn build(
        &self,
        prices: &[PriceBar],
        news: &[NewsArticle],
        earnings: &[EarningsReport],
    ) -> Result<Vec<FeatureRow>> {
        let closes = daily_closes(prices);
        let article_counts = daily_article_counts(news);
        let reports = earnings_by_symbol(earnings);

        let mut rows = Vec::new();
        for (symbol, series) in &closes {
            let counts = article_counts.get(symbol.as_str());
            let symbol_reports = reports.get(symbol.as_str()).map(Vec::as_slice).unwrap_or(&[]);
            let built = self.build_symbol(symbol, series, counts, symbol_reports)?;
            debug!("{}: {} feature rows", symbol, built.len());
            rows.extend(built);
        }
        Ok(rows)
    }

    fn build_symbol(
        &self,
        symbol: &str,
        series: &[(NaiveDate, f64)],
        article_counts: Option<&BTreeMap<NaiveDate, usize>>,
        reports: &[&EarningsReport],
    ) -> Result<Vec<FeatureRow>> {
        let mut volatility = StandardDeviation::new(self.volatility_window)
            .map_err(|e| anyhow::anyhow!("Invalid volatility window: {:?}", e))?;
        let mut returns_seen = 0usize;

        let mut rows = Vec::with_capacity(series.len());
        for (i, (date, close)) in series.iter().enumerate() {
            let ret_d1 = i
                .checked_sub(1)
                .and_then(|prev| simple_return(*close, series[prev].1));
            let ret_5d = i
                .checked_sub(MULTI_DAY_RETURN_LAG)
                .and_then(|prev| simple_return(*close, series[prev].1));

            let vol_20d = match ret_d1 {
                Some(r) => {
                    let std = volatility.next(r);
                    returns_seen += 1;
                    (returns_seen >= self.volatility_window).then_some(std)
                }
                None => None,
            };

            let articles_1d = count_between(article_counts, *date, *date);
            let articles_3d = count_between(
                article_counts,
                *date - Duration::days(NEWS_WINDOW_DAYS - 1),
                *date,
            );
            let surprise_pct = latest_surprise(reports, *date);

            let label = series.get(i + 1).map(|(_, next)| next > close);

            let features: RawFeatures = [
                ret_d1,
                ret_5d,
                vol_20d,
                Some(articles_1d as f64),
                Some(articles_3d as f64),
                surprise_pct,
            ];
            rows.push(FeatureRow::new(*date, symbol, features, label));
        }
        Ok(rows)
    }
}

fn simple_return(close: f64, previous: f64) -> Option<f64> {
    (previous != 0.0).then(|| close / previous - 1.0)
}

/// Close per (symbol, UTC date). The last loaded bar of a date wins.
fn daily_closes(prices: &[PriceBar]) -> BTreeMap<String, Vec<(NaiveDate, f64)>> {
    let mut by_symbol: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    for bar in prices {
        let Some(ts) = DateTime::<Utc>::from_timestamp(bar.timestamp, 0) else {
            warn!("{}: skipping bar with invalid timestamp {}", bar.symbol, bar.timestamp);
            continue;
        };
        let Some(close) = bar.close.to_f64() else {
            continue;
        };
        by_symbol
            .entry(bar.symbol.clone())
            .or_default()
            .insert(ts.date_naive(), close);
    }
    by_symbol
        .into_iter()
        .map(|(symbol, closes)| (symbol, closes.into_iter().collect()))
        .collect()
}

fn daily_article_counts(news: &[NewsArticle]) -> BTreeMap<&str, BTreeMap<NaiveDate, usize>> {
    let mut counts: BTreeMap<&str, BTreeMap<NaiveDate, usize>> = BTreeMap::new();
    for article in news {
        *counts
            .entry(article.symbol.as_str())
            .or_default()
            .entry(article.published_at.date_naive())
            .or_insert(0) += 1;
    }
    counts
}

fn count_between(
    counts: Option<&BTreeMap<NaiveDate, usize>>,
    from: NaiveDate,
    to: NaiveDate,
) -> usize {
    counts
        .map(|c| c.range(from..=to).map(|(_, n)| n).sum())
        .unwrap_or(0)
}

fn earnings_by_symbol(earnings: &[EarningsReport]) -> BTreeMap<&str, Vec<&EarningsReport>> {
    let mut by_symbol: BTreeMap<&str, Vec<&EarningsReport>> = BTreeMap::new();
    for report in earnings {
        by_symbol.entry(report.symbol.as_str()).or_default().push(report);
    }
    for reports in by_symbol.values_mut() {
        reports.sort_by_key(|r| r.report_date);
    }
    by_symbol
}

/// Surprise of the most recent report dated on or before `date`.
fn latest_surprise(reports: &[&EarningsReport], date: NaiveDate) -> Option<f64> {
    reports
        .iter()
        .rev()
        .find(|r| r.report_date <= date)
        .and_then(|r| r.surprise_pct)
}

/// Rebuilds the `features_daily` table from the raw tables.
pub struct FeatureEngineeringService {
    raw: Arc<dyn RawMarketDataRepository>,
    features: Arc<dyn FeatureRepository>,
    builder: FeatureBuilder,
}

impl FeatureEngineeringService {
    pub fn new(
        raw: Arc<dyn RawMarketDataRepository>,
        features: Arc<dyn FeatureRepository>,
    ) -> Self {
        Self {
            raw,
            features,
            builder: FeatureBuilder::default(),
        }
    }

    /// Returns the number of feature rows written.
    pub async fn rebuild(&self) -> Result<usize> {
        let prices = self.raw.load_prices().await.context("Failed to load raw prices")?;
        let news = self.raw.load_news().await.context("Failed to load raw news")?;
        let earnings = self
            .raw
            .load_earnings()
            .await
            .context("Failed to load raw earnings")?;

        let rows = self.builder.build(&prices, &news, &earnings)?;
        let written = self
            .features
            .replace_all(&rows)
            .await
            .context("Failed to write feature table")?;

        info!(
            "Feature table rebuilt: {} rows from {} bars, {} articles, {} earnings reports",
            written,
            prices.len(),
            news.len(),
            earnings.len()
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn bar(symbol: &str, d: u32, hour: u32, close: Decimal) -> PriceBar {
        let ts = Utc.with_ymd_and_hms(2025, 1, d, hour, 30, 0).unwrap();
        PriceBar {
            symbol: symbol.to_string(),
            timestamp: ts.timestamp(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1_000,
        }
    }

    fn article(symbol: &str, d: u32) -> NewsArticle {
        NewsArticle {
            symbol: symbol.to_string(),
            published_at: Utc.with_ymd_and_hms(2025, 1, d, 12, 0, 0).unwrap(),
            headline: "headline".to_string(),
            sentiment: None,
            raw_payload: json!({}),
        }
    }

    #[test]
    fn test_returns_and_labels() {
        let prices: Vec<PriceBar> = [dec!(100), dec!(110), dec!(99), dec!(99), dec!(120), dec!(100), dec!(130)]
            .into_iter()
            .enumerate()
            .map(|(i, c)| bar("AAPL", i as u32 + 1, 14, c))
            .collect();

        let rows = FeatureBuilder::default().build(&prices, &[], &[]).unwrap();
        assert_eq!(rows.len(), 7);

        assert_eq!(rows[0].features[0], None);
        assert!((rows[1].features[0].unwrap() - 0.10).abs() < 1e-12);
        assert_eq!(rows[4].features[1], None);
        assert!((rows[5].features[1].unwrap() - 0.0).abs() < 1e-12);
        assert!((rows[6].features[1].unwrap() - (130.0 / 110.0 - 1.0)).abs() < 1e-12);

        assert_eq!(rows[0].label, Some(true));
        assert_eq!(rows[1].label, Some(false));
        // Flat day is not "up"
        assert_eq!(rows[2].label, Some(false));
        assert_eq!(rows[6].label, None);
    }

    #[test]
    fn test_last_loaded_bar_of_a_date_wins() {
        let prices = vec![
            bar("AAPL", 1, 14, dec!(100)),
            bar("AAPL", 2, 14, dec!(50)),
            bar("AAPL", 2, 20, dec!(200)),
        ];
        let rows = FeatureBuilder::default().build(&prices, &[], &[]).unwrap();
        assert_eq!(rows.len(), 2);
        assert!((rows[1].features[0].unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_volatility_needs_full_window() {
        let prices: Vec<PriceBar> = (0..23)
            .map(|i| {
                let close = if i % 2 == 0 { dec!(100) } else { dec!(101) };
                let date = day(1) + Duration::days(i);
                let ts = date.and_hms_opt(15, 0, 0).unwrap().and_utc().timestamp();
                PriceBar {
                    timestamp: ts,
                    ..bar("MSFT", 1, 15, close)
                }
            })
            .collect();

        let rows = FeatureBuilder::default().build(&prices, &[], &[]).unwrap();
        // 20th return lands on row 20
        assert!(rows[19].features[2].is_none());
        let vol = rows[20].features[2].unwrap();
        assert!(vol > 0.0 && vol.is_finite());
        assert!(rows[22].features[2].is_some());
    }

    #[test]
    fn test_article_windows() {
        let prices: Vec<PriceBar> = (1..=5).map(|d| bar("AAPL", d, 14, dec!(10))).collect();
        let news = vec![
            article("AAPL", 1),
            article("AAPL", 3),
            article("AAPL", 3),
            article("AAPL", 5),
            article("MSFT", 5),
        ];
        let rows = FeatureBuilder::default().build(&prices, &news, &[]).unwrap();

        let articles_1d: Vec<f64> = rows.iter().map(|r| r.features[3].unwrap()).collect();
        let articles_3d: Vec<f64> = rows.iter().map(|r| r.features[4].unwrap()).collect();
        assert_eq!(articles_1d, vec![1.0, 0.0, 2.0, 0.0, 1.0]);
        assert_eq!(articles_3d, vec![1.0, 1.0, 3.0, 2.0, 3.0]);
    }

    #[test]
    fn test_latest_surprise_as_of_date() {
        let prices: Vec<PriceBar> = (1..=4).map(|d| bar("AAPL", d, 14, dec!(10))).collect();
        let report = |d: u32, s: Option<f64>| EarningsReport {
            symbol: "AAPL".to_string(),
            report_date: day(d),
            actual_eps: None,
            consensus_eps: None,
            surprise_pct: s,
            raw_payload: json!({}),
        };
        let earnings = vec![report(3, Some(-1.5)), report(2, Some(4.0))];

        let rows = FeatureBuilder::default().build(&prices, &[], &earnings).unwrap();
        let surprises: Vec<Option<f64>> = rows.iter().map(|r| r.features[5]).collect();
        assert_eq!(surprises, vec![None, Some(4.0), Some(-1.5), Some(-1.5)]);
    }

    #[test]
    fn test_symbols_are_independent() {
        let prices = vec![
            bar("MSFT", 1, 14, dec!(10)),
            bar("AAPL", 1, 14, dec!(10)),
            bar("AAPL", 2, 14, dec!(11)),
        ];
        let rows = FeatureBuilder::default().build(&prices, &[], &[]).unwrap();
        let keys: Vec<(&str, NaiveDate)> = rows.iter().map(|r| (r.symbol.as_str(), r.date)).collect();
        assert_eq!(keys, vec![("AAPL", day(1)), ("AAPL", day(2)), ("MSFT", day(1))]);
        assert_eq!(rows[2].label, None);
    }
}
