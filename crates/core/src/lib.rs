pub mod domain;
pub mod indicators;
pub mod ingest;
pub mod pipeline;
pub mod storage;
pub mod time;

/// Instrument tracked by the job.
pub const TICKER: &str = "SPY";

/// File name of the published snapshot.
pub const SNAPSHOT_FILE_NAME: &str = "spy_signals.json";

pub mod config {
    use anyhow::Context;
    use std::path::PathBuf;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub sentry_dsn: Option<String>,
        pub yahoo_base_url: Option<String>,
        pub yahoo_timeout_secs: Option<u64>,
        pub yahoo_user_agent: Option<String>,
        pub snapshot_path: Option<PathBuf>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let yahoo_timeout_secs = non_empty_var("YAHOO_TIMEOUT_SECS")
                .map(|s| parse_timeout_secs(&s))
                .transpose()?;

            Ok(Self {
                sentry_dsn: non_empty_var("SENTRY_DSN"),
                yahoo_base_url: non_empty_var("YAHOO_BASE_URL"),
                yahoo_timeout_secs,
                yahoo_user_agent: non_empty_var("YAHOO_USER_AGENT"),
                snapshot_path: non_empty_var("SPY_SIGNALS_PATH").map(PathBuf::from),
            })
        }

        /// Where the snapshot is published: `SPY_SIGNALS_PATH` if set, otherwise
        /// next to the running executable.
        pub fn resolve_snapshot_path(&self) -> anyhow::Result<PathBuf> {
            if let Some(path) = &self.snapshot_path {
                return Ok(path.clone());
            }

            let exe = std::env::current_exe().context("failed to resolve current executable")?;
            let dir = exe
                .parent()
                .context("current executable has no parent directory")?;
            Ok(dir.join(crate::SNAPSHOT_FILE_NAME))
        }
    }

    fn parse_timeout_secs(s: &str) -> anyhow::Result<u64> {
        let secs = s
            .parse::<u64>()
            .with_context(|| format!("YAHOO_TIMEOUT_SECS must be an integer (got {s:?})"))?;
        anyhow::ensure!(secs > 0, "YAHOO_TIMEOUT_SECS must be positive");
        Ok(secs)
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

}
