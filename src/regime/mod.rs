//! Market regime computation: distribution days, follow-through days, and
//! the composite score that buckets the market into BULLISH/NEUTRAL/BEARISH
//! (spec §4.6).

pub mod calculator;
pub mod distribution_day;
pub mod follow_through;

pub use calculator::{RegimeCalculator, RegimeInputs};
pub use follow_through::FtdState;
