//! Incremental indicator engine (primary backend).
//!
//! Each indicator is a small state machine fed one close at a time, the way a
//! live feed would drive it. Warm-up rows report `None`. Exponential and
//! Wilder smoothing run on `yata`'s `EMA` and `RMA` methods, seeded with the
//! simple average of the first window so both backends agree to within
//! floating-point accumulation error.

use super::formula::FormulaEngine;
use super::rsi::rsi_from_averages;
use super::{finite, IndicatorEngine, MacdColumns, MACD_FAST, MACD_SIGNAL, MACD_SLOW};
use crate::domain::error::TickerError;
use std::collections::VecDeque;
use tracing::warn;
use yata::core::{Method, PeriodType};
use yata::methods::{EMA, RMA};

#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingEngine;

impl IndicatorEngine for StreamingEngine {
    fn name(&self) -> &'static str {
        "streaming"
    }

    fn sma(&self, closes: &[f64], window: usize) -> Vec<Option<f64>> {
        let mut sma = RollingMean::new(window);
        closes.iter().map(|&c| sma.update(c)).collect()
    }

    fn rsi(&self, closes: &[f64], window: usize) -> Vec<Option<f64>> {
        match WilderRsi::new(window) {
            Ok(mut rsi) => closes.iter().map(|&c| rsi.update(c)).collect(),
            Err(e) => undefined_column("rsi", closes.len(), &e),
        }
    }

    fn macd(&self, closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdColumns {
        match MacdState::new(fast, slow, signal) {
            Ok(mut macd) => {
                let (line, signal): (Vec<_>, Vec<_>) =
                    closes.iter().map(|&c| macd.update(c)).unzip();
                MacdColumns::from_line_and_signal(line, signal)
            }
            Err(e) => {
                let empty = undefined_column("macd", closes.len(), &e);
                MacdColumns::from_line_and_signal(empty.clone(), empty)
            }
        }
    }
}

impl StreamingEngine {
    /// Known-answer check run before the engine is trusted for a run.
    ///
    /// First pins `yata`'s smoothing recurrences to hand-computed values, then
    /// feeds a fixed synthetic series through both engines and fails if any
    /// column disagrees beyond accumulation error.
    pub fn self_check() -> Result<(), TickerError> {
        // EMA(3): alpha = 0.5, so 20 -> 40 lands on 30.
        let mut ema = EMA::new(3, &20.0).map_err(yata_error)?;
        expect_close("ema", ema.next(&40.0), 30.0)?;
        // RMA(4): alpha = 0.25, so 10 -> 14 lands on 11.
        let mut rma = RMA::new(4, &10.0).map_err(yata_error)?;
        expect_close("rma", rma.next(&14.0), 11.0)?;

        let closes: Vec<f64> = (0..64)
            .map(|i| {
                let t = i as f64;
                100.0 + 10.0 * (t * 0.3).sin() + 0.1 * t
            })
            .collect();

        let streaming = StreamingEngine;
        let reference = FormulaEngine;

        let ours = streaming.macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let theirs = reference.macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL);
        let pairs = [
            ("sma", streaming.sma(&closes, 20), reference.sma(&closes, 20)),
            ("rsi", streaming.rsi(&closes, 14), reference.rsi(&closes, 14)),
            ("macd", ours.line, theirs.line),
            ("macd_signal", ours.signal, theirs.signal),
            ("macd_hist", ours.histogram, theirs.histogram),
        ];

        for (column, a, b) in &pairs {
            if a.len() != b.len() {
                return Err(unavailable(format!("self-check {column}: length mismatch")));
            }
            for (row, (x, y)) in a.iter().zip(b).enumerate() {
                let agree = match (x, y) {
                    (Some(x), Some(y)) => close_enough(*x, *y),
                    (None, None) => true,
                    _ => false,
                };
                if !agree {
                    return Err(unavailable(format!(
                        "self-check {column} diverged at row {row}: {x:?} vs {y:?}"
                    )));
                }
            }
        }
        Ok(())
    }
}

fn close_enough(x: f64, y: f64) -> bool {
    (x - y).abs() <= 1e-9 * x.abs().max(y.abs()).max(1.0)
}

fn expect_close(what: &str, got: f64, want: f64) -> Result<(), TickerError> {
    if close_enough(got, want) {
        Ok(())
    } else {
        Err(unavailable(format!(
            "self-check {what}: expected {want}, got {got}"
        )))
    }
}

fn unavailable(reason: String) -> TickerError {
    TickerError::BackendUnavailable {
        backend: "streaming",
        reason,
    }
}

fn yata_error(e: yata::core::Error) -> TickerError {
    unavailable(format!("yata: {e:?}"))
}

fn undefined_column(column: &str, len: usize, err: &TickerError) -> Vec<Option<f64>> {
    warn!(column, error = %err, "streaming engine cannot run this window");
    vec![None; len]
}

/// yata periods are `PeriodType` (u8 by default); zero is rejected too.
fn period(window: usize) -> Result<PeriodType, TickerError> {
    match PeriodType::try_from(window) {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(unavailable(format!("window {window} out of range"))),
    }
}

/// Trailing arithmetic mean over a fixed window.
///
/// The mean is summed from the buffer on every step rather than kept as a
/// running total, so a large value leaving the window cannot leave residue
/// behind it.
#[derive(Debug, Clone)]
pub struct RollingMean {
    window: usize,
    buf: VecDeque<f64>,
}

impl RollingMean {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            buf: VecDeque::with_capacity(window + 1),
        }
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        if self.window == 0 {
            return None;
        }
        self.buf.push_back(value);
        if self.buf.len() > self.window {
            self.buf.pop_front();
        }
        if self.buf.len() == self.window {
            finite(self.buf.iter().sum::<f64>() / self.window as f64)
        } else {
            None
        }
    }
}

/// Simple average of the first `window` inputs, then a yata method seeded with it.
#[derive(Debug, Clone)]
struct Seeded<M> {
    window: PeriodType,
    count: usize,
    seed_sum: f64,
    method: Option<M>,
}

impl<M> Seeded<M>
where
    M: Method<Params = PeriodType, Input = f64, Output = f64>,
{
    fn new(window: usize) -> Result<Self, TickerError> {
        Ok(Self {
            window: period(window)?,
            count: 0,
            seed_sum: 0.0,
            method: None,
        })
    }

    /// `Ok(None)` during warm-up; the seed itself is the first defined value.
    fn update(&mut self, value: f64) -> Result<Option<f64>, TickerError> {
        if let Some(method) = self.method.as_mut() {
            return Ok(Some(method.next(&value)));
        }
        self.count += 1;
        self.seed_sum += value;
        if self.count < usize::from(self.window) {
            return Ok(None);
        }
        let seed = self.seed_sum / f64::from(self.window);
        self.method = Some(M::new(self.window, &seed).map_err(yata_error)?);
        Ok(Some(seed))
    }
}

/// EMA seeded with the simple average of its first `window` inputs.
#[derive(Debug, Clone)]
pub struct SeededEma(Seeded<EMA>);

impl SeededEma {
    pub fn new(window: usize) -> Result<Self, TickerError> {
        Seeded::new(window).map(Self)
    }

    pub fn update(&mut self, value: f64) -> Option<f64> {
        self.0.update(value).ok().flatten().and_then(finite)
    }
}

/// RSI with Wilder smoothing, seeded by simple averages of the first `window` changes.
#[derive(Debug, Clone)]
pub struct WilderRsi {
    prev_close: Option<f64>,
    gains: Seeded<RMA>,
    losses: Seeded<RMA>,
}

impl WilderRsi {
    pub fn new(window: usize) -> Result<Self, TickerError> {
        Ok(Self {
            prev_close: None,
            gains: Seeded::new(window)?,
            losses: Seeded::new(window)?,
        })
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close)?;
        let change = close - prev;
        let avg_gain = self.gains.update(change.max(0.0)).ok().flatten();
        let avg_loss = self.losses.update((-change).max(0.0)).ok().flatten();
        rsi_from_averages(avg_gain?, avg_loss?)
    }
}

/// MACD line and signal; the signal EMA only sees defined line values.
#[derive(Debug, Clone)]
pub struct MacdState {
    fast: SeededEma,
    slow: SeededEma,
    signal: SeededEma,
}

impl MacdState {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Result<Self, TickerError> {
        Ok(Self {
            fast: SeededEma::new(fast)?,
            slow: SeededEma::new(slow)?,
            signal: SeededEma::new(signal)?,
        })
    }

    /// Feed one close, return `(line, signal)`.
    pub fn update(&mut self, close: f64) -> (Option<f64>, Option<f64>) {
        let fast = self.fast.update(close);
        let slow = self.slow.update(close);
        let line = match (fast, slow) {
            (Some(f), Some(s)) => finite(f - s),
            _ => None,
        };
        let signal = line.and_then(|l| self.signal.update(l));
        (line, signal)
    }
}
