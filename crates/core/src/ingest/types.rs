use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: f64,
}

/// Daily closes ordered by date, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub bars: Vec<DailyClose>,
}

impl PriceSeries {
    pub fn new(bars: Vec<DailyClose>) -> Self {
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRequest {
    pub ticker: String,
    /// Provider range token, e.g. `1y`.
    pub range: String,
    /// Provider interval token, e.g. `1d`.
    pub interval: String,
    /// Split/dividend adjusted closes.
    pub adjusted: bool,
}

impl HistoryRequest {
    /// One year of adjusted daily closes.
    pub fn one_year_daily(ticker: &str) -> Self {
        Self {
            ticker: ticker.to_string(),
            range: "1y".to_string(),
            interval: "1d".to_string(),
            adjusted: true,
        }
    }
}
