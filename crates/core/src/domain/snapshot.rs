use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Published indicator state for one instrument. Rebuilt from scratch on every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    pub ticker: String,
    #[serde(with = "flag")]
    pub rsi_2_below_30: bool,
    #[serde(with = "flag")]
    pub three_lower_closes: bool,
    #[serde(with = "flag")]
    pub above_sma200: bool,
    pub metrics: SnapshotMetrics,
    #[serde(with = "utc_seconds")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMetrics {
    pub last_close: f64,
    pub rsi2: f64,
    pub sma200: f64,
    #[serde(default)]
    pub news: String,
}

impl SignalSnapshot {
    /// Operator-facing summary printed after each run.
    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!(
                "{} signals updated at {}",
                self.ticker,
                self.updated_at.format(utc_seconds::FORMAT)
            ),
            format!("  last_close      = {}", self.metrics.last_close),
            format!(
                "  rsi2            = {}  -> rsi_2_below_30  = {}",
                self.metrics.rsi2,
                u8::from(self.rsi_2_below_30)
            ),
            format!("  sma200          = {}", self.metrics.sma200),
            format!("  three_lower     = {}", u8::from(self.three_lower_closes)),
            format!("  above_sma200    = {}", u8::from(self.above_sma200)),
        ]
    }
}

/// Booleans travel as 0/1 on the wire.
mod flag {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(de::Error::custom(format!("flag must be 0 or 1 (got {other})"))),
        }
    }
}

/// `YYYY-MM-DDTHH:MM:SSZ`, no fractional seconds.
mod utc_seconds {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&s, FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(de::Error::custom)
    }
}
