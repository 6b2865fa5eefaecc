//! Simple Moving Average.
//!
//! SMA[i] = mean(C[i-n+1..=i]). Warmup: first (n-1) rows are undefined.

use super::finite;

pub fn calculate_sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }

    let mut values = vec![None; closes.len()];
    for (i, window) in closes.windows(period).enumerate() {
        let mean = window.iter().sum::<f64>() / period as f64;
        values[i + period - 1] = finite(mean);
    }
    values
}
