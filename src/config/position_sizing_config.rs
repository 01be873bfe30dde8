//! Grade-to-allocation table consumed by `ExecutionFeasibility` (spec §4.5).

use crate::domain::types::Grade;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionSizingConfig {
    pub portfolio_value: f64,
    pub adv_pass_shares: u64,
    pub adv_caution_shares: u64,
    pub tight_spread_pct: f64,
    pub normal_spread_pct: f64,
    pub wide_spread_risk_pct: f64,
    pub pct_of_adv_do_not_trade: f64,
    pub pct_of_adv_high: f64,
    pub pct_of_adv_moderate: f64,
}

impl Default for PositionSizingConfig {
    fn default() -> Self {
        Self {
            portfolio_value: 100_000.0,
            adv_pass_shares: 500_000,
            adv_caution_shares: 400_000,
            tight_spread_pct: 0.10,
            normal_spread_pct: 0.30,
            wide_spread_risk_pct: 1.0,
            pct_of_adv_do_not_trade: 5.0,
            pct_of_adv_high: 2.0,
            pct_of_adv_moderate: 1.0,
        }
    }
}

impl PositionSizingConfig {
    /// Target allocation percent for a grade (spec §4.5 grade table).
    pub fn allocation_for(&self, grade: Grade) -> f64 {
        match grade {
            Grade::APlus | Grade::A => 50.0,
            Grade::BPlus | Grade::B => 30.0,
            Grade::CPlus | Grade::C => 20.0,
            Grade::D | Grade::F => 0.0,
        }
    }
}
