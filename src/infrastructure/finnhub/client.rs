use super::common::{FinnhubEarnings, FinnhubNewsItem};
use crate::domain::ports::{EarningsDataService, NewsDataService};
use crate::domain::types::{EarningsReport, NewsArticle};
use crate::infrastructure::core::http_client_factory::{HttpClientFactory, build_url_with_query};
use crate::infrastructure::news::SentimentAnalyzer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, warn};

/// Finnhub accepts the API key as a header, which keeps it out of request
/// URLs and therefore out of transport error messages.
const TOKEN_HEADER: &str = "X-Finnhub-Token";

pub struct FinnhubClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    sentiment: SentimentAnalyzer,
}

impl FinnhubClient {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self::with_client(HttpClientFactory::create_client(), base_url, api_key)
    }

    pub fn with_client(client: ClientWithMiddleware, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            sentiment: SentimentAnalyzer::new(),
        }
    }

    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(build_url_with_query(&url, params))
            .header(TOKEN_HEADER, self.api_key.as_str())
            .send()
            .await
            .with_context(|| format!("Failed to call Finnhub {}", path))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Finnhub {} failed ({}): {}", path, status, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Invalid Finnhub {} payload", path))
    }

    /// Converts `/company-news` items, scoring each headline.
    pub fn parse_news(&self, symbol: &str, payload: &serde_json::Value) -> Result<Vec<NewsArticle>> {
        let items = payload.as_array().context("Expected a news array")?;
        let mut articles = Vec::with_capacity(items.len());
        for raw in items {
            let item: FinnhubNewsItem = match serde_json::from_value(raw.clone()) {
                Ok(item) => item,
                Err(e) => {
                    warn!("Finnhub: skipping malformed news item for {}: {}", symbol, e);
                    continue;
                }
            };
            let Some(published_at) = DateTime::<Utc>::from_timestamp(item.datetime, 0) else {
                continue;
            };
            let sentiment = (!item.headline.trim().is_empty())
                .then(|| self.sentiment.analyze(&item.headline));
            articles.push(NewsArticle {
                symbol: symbol.to_string(),
                published_at,
                headline: item.headline,
                sentiment,
                raw_payload: raw.clone(),
            });
        }
        Ok(articles)
    }
}

/// Converts `/stock/earnings` items.
pub fn parse_earnings(symbol: &str, payload: &serde_json::Value) -> Result<Vec<EarningsReport>> {
    let items = payload.as_array().context("Expected an earnings array")?;
    let mut reports = Vec::with_capacity(items.len());
    for raw in items {
        let item: FinnhubEarnings = match serde_json::from_value(raw.clone()) {
            Ok(item) => item,
            Err(e) => {
                warn!("Finnhub: skipping malformed earnings item for {}: {}", symbol, e);
                continue;
            }
        };
        let Ok(report_date) = NaiveDate::parse_from_str(&item.period, "%Y-%m-%d") else {
            warn!("Finnhub: bad earnings period '{}' for {}", item.period, symbol);
            continue;
        };
        reports.push(EarningsReport {
            symbol: symbol.to_string(),
            report_date,
            actual_eps: item.actual,
            consensus_eps: item.estimate,
            surprise_pct: item.surprise_percent,
            raw_payload: raw.clone(),
        });
    }
    Ok(reports)
}

#[async_trait]
impl NewsDataService for FinnhubClient {
    async fn get_company_news(
        &self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NewsArticle>> {
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        let payload = self
            .get_json(
                "/company-news",
                &[("symbol", symbol), ("from", from.as_str()), ("to", to.as_str())],
            )
            .await?;
        let articles = self.parse_news(symbol, &payload)?;
        debug!("Finnhub: {} articles for {} ({} .. {})", articles.len(), symbol, from, to);
        Ok(articles)
    }
}

#[async_trait]
impl EarningsDataService for FinnhubClient {
    async fn get_earnings(&self, symbol: &str) -> Result<Vec<EarningsReport>> {
        let payload = self.get_json("/stock/earnings", &[("symbol", symbol)]).await?;
        let reports = parse_earnings(symbol, &payload)?;
        debug!("Finnhub: {} earnings reports for {}", reports.len(), symbol);
        Ok(reports)
    }
}
