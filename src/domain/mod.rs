//! Core domain types and logic.

pub mod backend;
pub mod error;
pub mod indicator;
pub mod ohlcv;
pub mod period;
pub mod pipeline;
pub mod report;
pub mod risk;
