//! MACD (Moving Average Convergence Divergence).
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9
//! Warmup: the line is undefined for the first max(fast, slow) - 1 rows; signal
//! and histogram for a further signal - 1 rows.

use super::ema::{calculate_ema, calculate_ema_of_defined};
use super::{finite, MacdColumns};

pub fn calculate_macd(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdColumns {
    if fast == 0 || slow == 0 || signal == 0 {
        let empty = vec![None; closes.len()];
        return MacdColumns {
            line: empty.clone(),
            signal: empty.clone(),
            histogram: empty,
        };
    }

    let ema_fast = calculate_ema(closes, fast);
    let ema_slow = calculate_ema(closes, slow);

    let line: Vec<Option<f64>> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => finite(f - s),
            _ => None,
        })
        .collect();
    let signal_line = calculate_ema_of_defined(&line, signal);

    MacdColumns::from_line_and_signal(line, signal_line)
}
