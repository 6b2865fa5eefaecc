//! Daily percentage change of close.

use super::finite;
use crate::domain::ohlcv::PriceSeries;

/// One entry per row; row 0 is always undefined.
pub type ReturnSeries = Vec<Option<f64>>;

pub fn compute_returns(prices: &PriceSeries) -> ReturnSeries {
    daily_returns(&prices.closes())
}

/// `(C[t] - C[t-1]) / C[t-1]`; undefined at t = 0 and after a zero close.
pub fn daily_returns(closes: &[f64]) -> ReturnSeries {
    if closes.is_empty() {
        return Vec::new();
    }
    let mut returns = Vec::with_capacity(closes.len());
    returns.push(None);
    returns.extend(closes.windows(2).map(|w| {
        if w[0] == 0.0 {
            None
        } else {
            finite((w[1] - w[0]) / w[0])
        }
    }));
    returns
}
