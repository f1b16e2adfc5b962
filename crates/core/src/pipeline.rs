use crate::domain::snapshot::{SignalSnapshot, SnapshotMetrics};
use crate::indicators::signals::SignalFlags;
use crate::indicators::{self, round2, RSI_PERIOD, SMA_PERIOD};
use crate::ingest::provider::{HeadlineFeed, PriceFeed};
use crate::ingest::types::{HistoryRequest, PriceSeries};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};

#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub snapshot: SignalSnapshot,
    pub bars: usize,
    pub last_bar_date: Option<NaiveDate>,
}

/// Build the snapshot from an already fetched series. Fails with
/// [`indicators::InsufficientDataError`] below the minimum series length.
pub fn compute_snapshot(
    ticker: &str,
    series: &PriceSeries,
    news: String,
    now: DateTime<Utc>,
) -> anyhow::Result<SignalSnapshot> {
    indicators::ensure_min_observations(series.len())?;

    let closes = series.closes();
    let raw_close = *closes.last().context("price series is empty")?;
    let raw_rsi = indicators::rsi::latest_rsi(&closes, RSI_PERIOD)?;
    let raw_sma = indicators::sma::latest_sma(&closes, SMA_PERIOD)?;

    let last_close = round2(raw_close);
    let rsi2 = round2(raw_rsi);
    let sma200 = round2(raw_sma);

    let flags = SignalFlags::derive(&closes, rsi2, last_close, sma200);

    Ok(SignalSnapshot {
        ticker: ticker.to_string(),
        rsi_2_below_30: flags.rsi_2_below_30,
        three_lower_closes: flags.three_lower_closes,
        above_sma200: flags.above_sma200,
        metrics: SnapshotMetrics {
            last_close,
            rsi2,
            sma200,
            news,
        },
        updated_at: now.trunc_subsecs(0),
    })
}

/// Fetch, compute and assemble one snapshot. Price acquisition errors are
/// fatal; headline errors are logged and leave `news` empty. Nothing is
/// persisted here.
pub async fn run_once(
    prices: &dyn PriceFeed,
    headlines: &dyn HeadlineFeed,
    request: &HistoryRequest,
    now: DateTime<Utc>,
) -> anyhow::Result<PipelineRun> {
    let series = prices
        .fetch_daily_closes(request)
        .await
        .with_context(|| format!("{} price fetch failed for {}", prices.provider_name(), request.ticker))?;

    tracing::info!(
        ticker = %request.ticker,
        provider = prices.provider_name(),
        bars = series.len(),
        last_bar_date = ?series.last_date(),
        "price series fetched"
    );

    indicators::ensure_min_observations(series.len())?;

    let news = match headlines.latest_headline(&request.ticker).await {
        Ok(headline) => headline.unwrap_or_default(),
        Err(err) => {
            tracing::warn!(ticker = %request.ticker, error = %err, "headline fetch failed; publishing without news");
            String::new()
        }
    };

    let snapshot = compute_snapshot(&request.ticker, &series, news, now)?;

    Ok(PipelineRun {
        snapshot,
        bars: series.len(),
        last_bar_date: series.last_date(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::InsufficientDataError;
    use crate::ingest::types::DailyClose;
    use chrono::{Duration, TimeZone};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedPrices {
        series: PriceSeries,
    }

    #[async_trait::async_trait]
    impl PriceFeed for FixedPrices {
        fn provider_name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch_daily_closes(&self, _request: &HistoryRequest) -> anyhow::Result<PriceSeries> {
            Ok(self.series.clone())
        }
    }

    struct FailingPrices;

    #[async_trait::async_trait]
    impl PriceFeed for FailingPrices {
        fn provider_name(&self) -> &'static str {
            "failing"
        }

        async fn fetch_daily_closes(&self, _request: &HistoryRequest) -> anyhow::Result<PriceSeries> {
            anyhow::bail!("connection refused")
        }
    }

    #[derive(Default)]
    struct StubHeadlines {
        headline: Option<String>,
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl HeadlineFeed for StubHeadlines {
        async fn latest_headline(&self, _ticker: &str) -> anyhow::Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("search endpoint 429");
            }
            Ok(self.headline.clone())
        }
    }

    fn series_from(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        PriceSeries::new(
            closes
                .iter()
                .enumerate()
                .map(|(i, &close)| DailyClose {
                    date: start + Duration::days(i as i64),
                    close,
                })
                .collect(),
        )
    }

    fn flat_then_drop() -> PriceSeries {
        let mut closes = vec![100.0; 210];
        closes.push(90.0);
        series_from(&closes)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 21, 15, 0).unwrap() + Duration::milliseconds(750)
    }

    fn request() -> HistoryRequest {
        HistoryRequest::one_year_daily("SPY")
    }

    #[test]
    fn flat_run_then_single_drop() {
        let snap = compute_snapshot("SPY", &flat_then_drop(), String::new(), now()).unwrap();
        assert!(snap.rsi_2_below_30);
        assert!(!snap.above_sma200);
        assert!(!snap.three_lower_closes);
        assert_eq!(snap.metrics.last_close, 90.0);
        assert_eq!(snap.metrics.rsi2, 0.0);
        assert_eq!(snap.metrics.sma200, 99.95);
        assert_eq!(snap.updated_at, Utc.with_ymd_and_hms(2026, 3, 2, 21, 15, 0).unwrap());
    }

    #[test]
    fn three_day_decline_sets_flag() {
        let mut closes = vec![100.0; 208];
        closes.extend([102.0, 101.0, 100.0]);
        let snap = compute_snapshot("SPY", &series_from(&closes), String::new(), now()).unwrap();
        assert!(snap.three_lower_closes);
    }

    #[test]
    fn steady_uptrend_is_above_average_and_not_oversold() {
        let closes: Vec<f64> = (0..252).map(|i| 400.0 + i as f64 * 0.5).collect();
        let snap = compute_snapshot("SPY", &series_from(&closes), String::new(), now()).unwrap();
        assert!(snap.above_sma200);
        assert!(!snap.rsi_2_below_30);
        assert_eq!(snap.metrics.rsi2, 100.0);
        assert_eq!(snap.metrics.last_close, 525.5);
    }

    #[test]
    fn close_equal_to_average_is_not_above() {
        let closes = vec![250.0; 230];
        let snap = compute_snapshot("SPY", &series_from(&closes), String::new(), now()).unwrap();
        assert!(!snap.above_sma200);
    }

    #[test]
    fn short_series_is_insufficient_data() {
        let closes = vec![100.0; 209];
        let err = compute_snapshot("SPY", &series_from(&closes), String::new(), now()).unwrap_err();
        let typed = err.downcast_ref::<InsufficientDataError>().unwrap();
        assert_eq!(typed.actual, 209);
        assert_eq!(typed.required, 210);
    }

    #[tokio::test]
    async fn run_once_carries_headline() {
        let prices = FixedPrices { series: flat_then_drop() };
        let headlines = StubHeadlines {
            headline: Some("Stocks slide".to_string()),
            ..Default::default()
        };
        let run = run_once(&prices, &headlines, &request(), now()).await.unwrap();
        assert_eq!(run.snapshot.metrics.news, "Stocks slide");
        assert_eq!(run.bars, 211);
        assert_eq!(run.last_bar_date, flat_then_drop().last_date());
    }

    #[tokio::test]
    async fn headline_failure_only_blanks_news() {
        let prices = FixedPrices { series: flat_then_drop() };
        let ok = StubHeadlines {
            headline: Some("Stocks slide".to_string()),
            ..Default::default()
        };
        let failing = StubHeadlines {
            fail: true,
            ..Default::default()
        };

        let with_news = run_once(&prices, &ok, &request(), now()).await.unwrap().snapshot;
        let without = run_once(&prices, &failing, &request(), now()).await.unwrap().snapshot;

        assert_eq!(without.metrics.news, "");
        let mut expected = with_news.clone();
        expected.metrics.news = String::new();
        assert_eq!(without, expected);
    }

    #[tokio::test]
    async fn short_series_fails_before_headline_fetch() {
        let prices = FixedPrices {
            series: series_from(&[100.0; 50]),
        };
        let headlines = StubHeadlines::default();
        let err = run_once(&prices, &headlines, &request(), now()).await.unwrap_err();
        assert!(err.downcast_ref::<InsufficientDataError>().is_some());
        assert_eq!(headlines.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_series_is_insufficient_data() {
        let prices = FixedPrices {
            series: PriceSeries::default(),
        };
        let err = run_once(&prices, &StubHeadlines::default(), &request(), now())
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<InsufficientDataError>().map(|e| e.actual),
            Some(0)
        );
    }

    #[tokio::test]
    async fn acquisition_error_propagates() {
        let err = run_once(&FailingPrices, &StubHeadlines::default(), &request(), now())
            .await
            .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("failing price fetch failed for SPY"));
        assert!(msg.contains("connection refused"));
    }

    #[tokio::test]
    async fn identical_input_gives_identical_snapshot_modulo_timestamp() {
        let prices = FixedPrices { series: flat_then_drop() };
        let headlines = StubHeadlines::default();
        let first = run_once(&prices, &headlines, &request(), now()).await.unwrap().snapshot;
        let later = now() + Duration::hours(24);
        let second = run_once(&prices, &headlines, &request(), later).await.unwrap().snapshot;

        assert_ne!(first.updated_at, second.updated_at);
        let mut aligned = second.clone();
        aligned.updated_at = first.updated_at;
        assert_eq!(first, aligned);
    }
}
