use super::common::ChartResponse;
use crate::domain::ports::MarketDataService;
use crate::domain::types::PriceBar;
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use tracing::{debug, warn};

pub struct YahooMarketDataService {
    client: ClientWithMiddleware,
    base_url: String,
}

impl YahooMarketDataService {
    pub fn new(base_url: String) -> Self {
        Self {
            client: HttpClientFactory::create_client(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl MarketDataService for YahooMarketDataService {
    async fn get_daily_bars(
        &self,
        symbol: &str,
        range: &str,
    ) -> Result<(Vec<PriceBar>, serde_json::Value)> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let url_with_query = build_url_with_query(&url, &[("range", range), ("interval", "1d")]);

        let response = self
            .client
            .get(&url_with_query)
            .send()
            .await
            .with_context(|| format!("Failed to fetch price chart for {}", symbol))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Yahoo chart request for {} failed ({}): {}", symbol, status, body);
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .with_context(|| format!("Invalid chart payload for {}", symbol))?;
        let bars = parse_chart(symbol, &payload)?;
        debug!("Yahoo: {} daily bars for {} ({})", bars.len(), symbol, range);
        Ok((bars, payload))
    }
}

/// Extracts daily bars from a chart payload. Bars without a close are dropped.
pub fn parse_chart(symbol: &str, payload: &serde_json::Value) -> Result<Vec<PriceBar>> {
    let response: ChartResponse =
        serde_json::from_value(payload.clone()).context("Unexpected chart payload shape")?;

    if let Some(error) = response.chart.error {
        anyhow::bail!(
            "Yahoo chart error for {}: {} {}",
            symbol,
            error.code.unwrap_or_default(),
            error.description.unwrap_or_default()
        );
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        warn!("Yahoo: empty chart result for {}", symbol);
        return Ok(Vec::new());
    };
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let value = |series: &[Option<f64>], i: usize| series.get(i).copied().flatten();
    let to_decimal = |v: f64| Decimal::from_f64(v).context("Price out of decimal range");

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(close) = value(&quote.close, i) else {
            continue;
        };
        bars.push(PriceBar {
            symbol: symbol.to_string(),
            timestamp: *ts,
            open: to_decimal(value(&quote.open, i).unwrap_or(close))?,
            high: to_decimal(value(&quote.high, i).unwrap_or(close))?,
            low: to_decimal(value(&quote.low, i).unwrap_or(close))?,
            close: to_decimal(close)?,
            volume: value(&quote.volume, i).unwrap_or(0.0).max(0.0) as u64,
        });
    }
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_chart_skips_missing_closes() {
        let payload = json!({
            "chart": {
                "result": [{
                    "meta": {"symbol": "AAPL"},
                    "timestamp": [1735828200, 1735914600, 1736173800],
                    "indicators": {"quote": [{
                        "open": [248.93, null, 244.31],
                        "high": [249.1, null, 247.33],
                        "low": [241.82, null, 243.2],
                        "close": [243.85, null, 245.0],
                        "volume": [55740700, null, 45045600]
                    }]}
                }],
                "error": null
            }
        });

        let bars = parse_chart("AAPL", &payload).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, 1735828200);
        assert_eq!(bars[0].close.round_dp(2), dec!(243.85));
        assert_eq!(bars[1].volume, 45045600);
    }

    #[test]
    fn test_parse_chart_error() {
        let payload = json!({
            "chart": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}
        });
        let err = parse_chart("NOPE", &payload).unwrap_err();
        assert!(err.to_string().contains("Not Found"));
    }

    #[test]
    fn test_parse_chart_empty_result() {
        let payload = json!({"chart": {"result": [], "error": null}});
        assert!(parse_chart("AAPL", &payload).unwrap().is_empty());
    }
}
