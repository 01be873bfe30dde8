//! `PositionContext`: the stateless snapshot a worker builds before running
//! checkers against a position (spec §4.8).

use crate::domain::types::{Grade, Regime};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct PositionContext {
    // Identity
    pub symbol: String,
    pub position_id: i64,
    pub state: f64,
    pub grade: Option<Grade>,
    pub score: Option<i32>,

    // Market
    pub market_regime: Option<Regime>,
    pub spy_price: Option<Decimal>,

    // Prices
    pub current_price: Decimal,
    pub avg_cost: Decimal,
    pub pivot: Option<Decimal>,
    pub original_pivot: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub tp1_target: Option<Decimal>,
    pub tp2_target: Option<Decimal>,

    // Derived
    pub pnl_pct: f64,

    // Technicals
    pub ma_21: Option<Decimal>,
    pub ma_50: Option<Decimal>,
    pub ma_200: Option<Decimal>,
    pub ma_10_week: Option<Decimal>,
    pub volume_ratio: f64,
    pub rvol: f64,

    // Time
    pub entry_date: Option<NaiveDate>,
    pub earnings_date: Option<NaiveDate>,
    pub now: DateTime<Utc>,

    // Extra signals consumed by individual checkers, kept out of the core
    // field list to avoid bloating every call site (spec leaves these
    // implicit: "Missing required context field for a rule" is not an
    // error, so these are all `Option`s the checkers tolerate being unset).
    pub running_high: Option<Decimal>,
    pub close_below_ma50_streak: u32,
    pub close_below_ma21_streak: u32,
    pub previously_extended: bool,
    pub gap_up_pct: Option<f64>,
    pub weeks_held: f64,
}

impl PositionContext {
    pub fn pnl_from_avg_cost(&self) -> f64 {
        if self.avg_cost.is_zero() {
            return 0.0;
        }
        use rust_decimal::prelude::ToPrimitive;
        ((self.current_price - self.avg_cost) / self.avg_cost * rust_decimal::Decimal::ONE_HUNDRED)
            .to_f64()
            .unwrap_or(0.0)
    }
}
