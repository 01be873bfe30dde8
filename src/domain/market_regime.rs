//! Market regime data model (spec §3 MarketRegimeAlert, §3 DistributionDay).
//! The calculator that produces these records lives in `crate::regime`.

use crate::domain::types::Regime;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DDayTrend {
    Improving,
    Worsening,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketPhase {
    ConfirmedUptrend,
    UptrendUnderPressure,
    RallyAttempt,
    Correction,
}

/// One record per trading date (spec §3 MarketRegimeAlert). Keyed by `date`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketRegimeAlert {
    pub date: NaiveDate,
    pub composite_score: f64,
    pub entry_risk_score: f64,
    pub regime: Regime,

    pub spy_d_count: u32,
    pub qqq_d_count: u32,
    pub spy_5day_delta: i32,
    pub qqq_5day_delta: i32,
    pub d_day_trend: DDayTrend,
    pub market_phase: MarketPhase,
    pub rally_day: Option<u32>,
    pub has_confirmed_ftd: bool,

    pub es_change_pct: f64,
    pub nq_change_pct: f64,
    pub ym_change_pct: f64,

    pub fear_greed_score: Option<u8>,
    pub fear_greed_rating: Option<String>,
    pub vix_close: Option<f64>,
}

/// One record per `(symbol, date)` that qualified as a distribution day
/// (spec §3 DistributionDay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionDay {
    pub symbol: String,
    pub date: NaiveDate,
    pub pct_change: f64,
    pub volume_ratio: f64,
    /// Closing price on the triggering day; basis for the 5%-advance
    /// retirement rule (spec §4.6).
    pub trigger_close: rust_decimal::Decimal,
    pub expired: bool,
}
