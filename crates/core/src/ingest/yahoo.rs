use crate::config::Settings;
use crate::ingest::provider::{HeadlineFeed, PriceFeed};
use crate::ingest::types::{DailyClose, HistoryRequest, PriceSeries};
use anyhow::{Context, Result};
use chrono::DateTime;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
// Yahoo rejects requests without a browser-like agent.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) spy-signals/0.1";

#[derive(Debug, Clone)]
pub struct YahooClient {
    http: reqwest::Client,
    base_url: String,
    user_agent: String,
}

impl YahooClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .yahoo_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = settings.yahoo_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        let user_agent = settings
            .yahoo_user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build yahoo http client")?;

        Ok(Self {
            http,
            base_url,
            user_agent,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&self.user_agent)?);
        Ok(headers)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.url(path);
        let res = self
            .http
            .get(&url)
            .headers(self.headers()?)
            .query(query)
            .send()
            .await
            .with_context(|| format!("yahoo request failed: {url}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read yahoo response")?;

        if !status.is_success() {
            // Chart errors come back as JSON with a description; prefer that over raw text.
            if let Ok(env) = serde_json::from_str::<ChartEnvelope>(&text) {
                if let Some(err) = env.chart.error {
                    anyhow::bail!("yahoo HTTP {status}: {} ({})", err.description, err.code);
                }
            }
            anyhow::bail!("yahoo HTTP {status}: {text}");
        }

        serde_json::from_str::<T>(&text)
            .with_context(|| format!("yahoo response has unexpected shape: {text}"))
    }
}

#[async_trait::async_trait]
impl PriceFeed for YahooClient {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_daily_closes(&self, request: &HistoryRequest) -> Result<PriceSeries> {
        let path = format!("/v8/finance/chart/{}", request.ticker);
        let envelope: ChartEnvelope = self
            .get_json(
                &path,
                &[
                    ("range", request.range.as_str()),
                    ("interval", request.interval.as_str()),
                    ("events", "div,split"),
                ],
            )
            .await?;

        let series = parse_chart(envelope, request.adjusted)
            .with_context(|| format!("failed to parse chart for {}", request.ticker))?;

        tracing::debug!(
            ticker = %request.ticker,
            bars = series.len(),
            last_date = ?series.last_date(),
            "yahoo chart fetched"
        );
        Ok(series)
    }
}

#[async_trait::async_trait]
impl HeadlineFeed for YahooClient {
    async fn latest_headline(&self, ticker: &str) -> Result<Option<String>> {
        let res: SearchResponse = self
            .get_json(
                "/v1/finance/search",
                &[("q", ticker), ("quotesCount", "0"), ("newsCount", "1")],
            )
            .await?;
        Ok(first_headline(res))
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
    #[serde(default)]
    adjclose: Vec<AdjCloseBlock>,
}

#[derive(Debug, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseBlock {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    #[serde(default)]
    title: Option<String>,
}

fn parse_chart(envelope: ChartEnvelope, adjusted: bool) -> Result<PriceSeries> {
    if let Some(err) = envelope.chart.error {
        anyhow::bail!("yahoo chart error: {} ({})", err.description, err.code);
    }

    let result = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .context("yahoo chart returned no result")?;

    let adjclose = result
        .indicators
        .adjclose
        .into_iter()
        .next()
        .map(|b| b.adjclose);
    let raw_close = result.indicators.quote.into_iter().next().map(|b| b.close);

    let closes = match (adjusted, adjclose, raw_close) {
        (true, Some(adj), _) => adj,
        (_, _, Some(raw)) => raw,
        (_, Some(adj), None) => adj,
        (_, None, None) => Vec::new(),
    };

    anyhow::ensure!(
        closes.len() == result.timestamp.len(),
        "yahoo chart length mismatch: {} timestamps, {} closes",
        result.timestamp.len(),
        closes.len()
    );

    let mut bars = Vec::with_capacity(closes.len());
    for (ts, close) in result.timestamp.iter().zip(closes) {
        // Bars with no print (halts, partial sessions) come back as null.
        let Some(close) = close else { continue };
        let local = DateTime::from_timestamp(ts + result.meta.gmtoffset, 0)
            .with_context(|| format!("invalid yahoo timestamp: {ts}"))?;
        bars.push(DailyClose {
            date: local.date_naive(),
            close,
        });
    }

    Ok(PriceSeries::new(bars))
}

fn first_headline(res: SearchResponse) -> Option<String> {
    res.news
        .into_iter()
        .next()
        .and_then(|n| n.title)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
