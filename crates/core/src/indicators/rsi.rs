//! Relative Strength Index over recursively smoothed gains and losses.
//!
//! Smoothing uses `alpha = 1 / period` and is seeded with the first observed
//! change rather than a simple average:
//!
//! ```text
//! avg[1] = x[1]
//! avg[i] = (1 - alpha) * avg[i-1] + alpha * x[i]
//! ```
//!
//! A value is reported once `period` changes have contributed. When the
//! smoothed loss is exactly zero the RSI is 100.

use anyhow::Result;

/// RSI for every index of `closes`; `None` until enough changes are available.
pub fn rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut gains = Vec::with_capacity(closes.len());
    let mut losses = Vec::with_capacity(closes.len());
    gains.push(None);
    losses.push(None);
    for pair in closes.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(Some(change.max(0.0)));
        losses.push(Some((-change).max(0.0)));
    }
    gains.truncate(closes.len());
    losses.truncate(closes.len());

    let alpha = 1.0 / period as f64;
    let avg_gain = smooth(&gains, alpha, period);
    let avg_loss = smooth(&losses, alpha, period);

    avg_gain
        .into_iter()
        .zip(avg_loss)
        .map(|(g, l)| match (g, l) {
            (Some(g), Some(l)) => Some(rsi_from_averages(g, l)),
            _ => None,
        })
        .collect()
}

/// RSI at the most recent index.
pub fn latest_rsi(closes: &[f64], period: usize) -> Result<f64> {
    anyhow::ensure!(period > 0, "rsi period must be positive");
    anyhow::ensure!(
        closes.len() > period,
        "rsi({period}) needs at least {} closes (got {})",
        period + 1,
        closes.len()
    );

    rsi(closes, period)
        .last()
        .copied()
        .flatten()
        .ok_or_else(|| anyhow::anyhow!("rsi({period}) undefined at latest close"))
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Recursive exponential smoothing. Leading `None`s are skipped; output is
/// withheld until `min_periods` observations have been folded in.
fn smooth(values: &[Option<f64>], alpha: f64, min_periods: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut state: Option<f64> = None;
    let mut seen = 0usize;

    for value in values {
        if let Some(x) = *value {
            state = Some(match state {
                None => x,
                Some(prev) => (1.0 - alpha) * prev + alpha * x,
            });
            seen += 1;
        }
        out.push(if seen >= min_periods { state } else { None });
    }

    out
}
