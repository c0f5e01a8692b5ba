use serde::Deserialize;

/// Item of `/company-news`
#[derive(Debug, Clone, Deserialize)]
pub struct FinnhubNewsItem {
    /// Publication time, unix seconds
    pub datetime: i64,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub summary: String,
}

/// Item of `/stock/earnings`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinnhubEarnings {
    /// Fiscal period end, `YYYY-MM-DD`
    pub period: String,
    pub actual: Option<f64>,
    pub estimate: Option<f64>,
    pub surprise_percent: Option<f64>,
}
