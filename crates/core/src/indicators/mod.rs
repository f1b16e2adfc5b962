//! Indicator engine: RSI, simple moving average and the derived 0/1 signals.

pub mod rsi;
pub mod signals;
pub mod sma;

use std::fmt;

pub const RSI_PERIOD: usize = 2;
pub const SMA_PERIOD: usize = 200;
pub const RSI_OVERSOLD: f64 = 30.0;

/// 200-period average plus a short lookback margin.
pub const MIN_OBSERVATIONS: usize = 210;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsufficientDataError {
    pub required: usize,
    pub actual: usize,
}

impl fmt::Display for InsufficientDataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "not enough data: {} rows (need {}+)",
            self.actual, self.required
        )
    }
}

impl std::error::Error for InsufficientDataError {}

pub fn ensure_min_observations(len: usize) -> Result<(), InsufficientDataError> {
    if len < MIN_OBSERVATIONS {
        return Err(InsufficientDataError {
            required: MIN_OBSERVATIONS,
            actual: len,
        });
    }
    Ok(())
}

/// Two decimal places, ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
