//! Market-data access port.

use crate::domain::error::TickerError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::period::{HistoryPeriod, Interval};

pub trait DataPort {
    /// Daily bars for `ticker` covering `period`, ascending by date.
    ///
    /// An empty vector means the source had nothing for the ticker.
    fn fetch_ohlcv(
        &self,
        ticker: &str,
        period: HistoryPeriod,
        interval: Interval,
    ) -> Result<Vec<OhlcvBar>, TickerError>;
}
