use anyhow::Result;

/// Trailing arithmetic mean; `None` until `period` closes are available.
pub fn sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return out;
    }

    for (end, window) in (period - 1..).zip(closes.windows(period)) {
        out[end] = Some(window.iter().sum::<f64>() / period as f64);
    }
    out
}

/// Mean of the last `period` closes.
pub fn latest_sma(closes: &[f64], period: usize) -> Result<f64> {
    anyhow::ensure!(period > 0, "sma period must be positive");
    anyhow::ensure!(
        closes.len() >= period,
        "sma({period}) needs at least {period} closes (got {})",
        closes.len()
    );

    let window = &closes[closes.len() - period..];
    Ok(window.iter().sum::<f64>() / period as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undefined_until_window_fills() {
        let out = sma(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn latest_matches_series_tail() {
        let closes: Vec<f64> = (1..=250).map(|i| i as f64).collect();
        let series = sma(&closes, 200);
        assert_eq!(series.last().copied().flatten(), Some(latest_sma(&closes, 200).unwrap()));
        // mean of 51..=250
        assert_eq!(latest_sma(&closes, 200).unwrap(), 150.5);
    }

    #[test]
    fn flat_run_with_final_drop() {
        let mut closes = vec![100.0; 210];
        closes.push(90.0);
        assert!((latest_sma(&closes, 200).unwrap() - 99.95).abs() < 1e-9);
    }

    #[test]
    fn short_input_is_an_error() {
        assert!(latest_sma(&[1.0; 199], 200).is_err());
        assert_eq!(sma(&[1.0; 5], 200), vec![None; 5]);
    }
}
