use anyhow::Context;
use clap::Parser;
use spy_signals_core::ingest::types::HistoryRequest;
use spy_signals_core::ingest::yahoo::YahooClient;
use spy_signals_core::pipeline::{self, PipelineRun};
use spy_signals_core::storage::snapshot_file;
use spy_signals_core::time::us_market;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "spy_signals_worker")]
struct Args {
    /// Compute and print the signals without writing the snapshot file.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = spy_signals_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(&settings, &args).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "signal update failed");
    }
    result
}

async fn run(settings: &spy_signals_core::config::Settings, args: &Args) -> anyhow::Result<()> {
    let client = YahooClient::from_settings(settings)?;
    let request = HistoryRequest::one_year_daily(spy_signals_core::TICKER);
    let now = chrono::Utc::now();

    let run = pipeline::run_once(&client, &client, &request, now).await?;
    warn_if_stale(&run, now);

    if args.dry_run {
        tracing::info!(ticker = %run.snapshot.ticker, dry_run = true, "snapshot computed; not written");
    } else {
        let path = settings.resolve_snapshot_path()?;
        snapshot_file::write_snapshot_atomic(&path, &run.snapshot)
            .with_context(|| format!("failed to persist {} snapshot", run.snapshot.ticker))?;
    }

    for line in run.snapshot.summary_lines() {
        println!("{line}");
    }
    Ok(())
}

fn warn_if_stale(run: &PipelineRun, now: chrono::DateTime<chrono::Utc>) {
    let Some(last) = run.last_bar_date else { return };
    if us_market::is_stale(last, now) {
        tracing::warn!(
            last_bar_date = %last,
            expected = %us_market::expected_session_date(now),
            "price feed looks stale; publishing anyway"
        );
    }
}

fn init_sentry(settings: &spy_signals_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
