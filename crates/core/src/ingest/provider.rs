use crate::ingest::types::{HistoryRequest, PriceSeries};
use anyhow::Result;

#[async_trait::async_trait]
pub trait PriceFeed: Send + Sync {
    fn provider_name(&self) -> &'static str;

    /// Daily closes for the requested window, oldest first. An empty or short
    /// series is returned as-is; length checks belong to the caller.
    async fn fetch_daily_closes(&self, request: &HistoryRequest) -> Result<PriceSeries>;
}

#[async_trait::async_trait]
pub trait HeadlineFeed: Send + Sync {
    /// Most recent news headline for the ticker, if the provider has one.
    async fn latest_headline(&self, ticker: &str) -> Result<Option<String>>;
}
