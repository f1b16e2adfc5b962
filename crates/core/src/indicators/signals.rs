use crate::indicators::RSI_OVERSOLD;

/// The three published 0/1 signals, each derived independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalFlags {
    pub rsi_2_below_30: bool,
    pub three_lower_closes: bool,
    pub above_sma200: bool,
}

impl SignalFlags {
    /// `last_rsi`, `last_close` and `last_sma` are the published (rounded)
    /// values so flags always agree with the metrics next to them. The
    /// three-day check runs on raw closes.
    pub fn derive(closes: &[f64], last_rsi: f64, last_close: f64, last_sma: f64) -> Self {
        Self {
            rsi_2_below_30: last_rsi < RSI_OVERSOLD,
            three_lower_closes: three_lower_closes(closes),
            above_sma200: last_close > last_sma,
        }
    }
}

/// `close[t] < close[t-1] < close[t-2]`; false with fewer than three closes.
pub fn three_lower_closes(closes: &[f64]) -> bool {
    match closes {
        [.., a, b, c] => c < b && b < a,
        _ => false,
    }
}
