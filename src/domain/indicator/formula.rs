//! Whole-series reference formulas (fallback backend).

use super::macd::calculate_macd;
use super::rsi::calculate_rsi;
use super::sma::calculate_sma;
use super::{IndicatorEngine, MacdColumns};

#[derive(Debug, Clone, Copy, Default)]
pub struct FormulaEngine;

impl IndicatorEngine for FormulaEngine {
    fn name(&self) -> &'static str {
        "formula"
    }

    fn sma(&self, closes: &[f64], window: usize) -> Vec<Option<f64>> {
        calculate_sma(closes, window)
    }

    fn rsi(&self, closes: &[f64], window: usize) -> Vec<Option<f64>> {
        calculate_rsi(closes, window)
    }

    fn macd(&self, closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdColumns {
        calculate_macd(closes, fast, slow, signal)
    }
}
