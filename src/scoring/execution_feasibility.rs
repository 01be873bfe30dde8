//! `ExecutionFeasibility` (spec §4.5, component C5): shares-to-buy,
//! liquidity risk, and spread rating given a grade and market depth.

use crate::config::PositionSizingConfig;
use crate::domain::types::Grade;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvHealth {
    Pass,
    Caution,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadRating {
    Tight,
    Normal,
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OverallRisk {
    Low,
    Moderate,
    High,
    DoNotTrade,
}

#[derive(Debug, Clone)]
pub struct ExecutionFeasibility {
    pub allocation_pct: f64,
    pub position_dollars: f64,
    pub shares_needed: u64,
    pub pct_of_adv: f64,
    pub adv_health: AdvHealth,
    pub spread_rating: Option<SpreadRating>,
    pub overall_risk: OverallRisk,
}

/// Derive sizing and risk classification for a candidate entry (spec
/// §4.5). `avg_daily_volume` is shares; `bid`/`ask` optional.
pub fn evaluate(
    config: &PositionSizingConfig,
    grade: Grade,
    pivot: Decimal,
    avg_daily_volume: u64,
    bid: Option<Decimal>,
    ask: Option<Decimal>,
) -> ExecutionFeasibility {
    let allocation_pct = config.allocation_for(grade);
    let position_dollars = config.portfolio_value * (allocation_pct / 100.0);
    let pivot_f = pivot.to_f64().unwrap_or(0.0);
    let shares_needed = if pivot_f > 0.0 {
        (position_dollars / pivot_f).floor() as u64
    } else {
        0
    };
    let pct_of_adv = if avg_daily_volume > 0 {
        shares_needed as f64 / avg_daily_volume as f64 * 100.0
    } else {
        100.0
    };

    let adv_health = if avg_daily_volume as u64 >= config.adv_pass_shares {
        AdvHealth::Pass
    } else if avg_daily_volume as u64 >= config.adv_caution_shares {
        AdvHealth::Caution
    } else {
        AdvHealth::Fail
    };

    let spread_rating = match (bid, ask) {
        (Some(bid), Some(ask)) if bid > Decimal::ZERO && ask > Decimal::ZERO => {
            let mid = (bid + ask) / Decimal::TWO;
            let spread_pct = ((ask - bid) / mid * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0);
            Some(if spread_pct <= config.tight_spread_pct {
                SpreadRating::Tight
            } else if spread_pct <= config.normal_spread_pct {
                SpreadRating::Normal
            } else {
                SpreadRating::Wide
            })
        }
        _ => None,
    };

    let wide_and_risky = spread_rating == Some(SpreadRating::Wide)
        && match (bid, ask) {
            (Some(bid), Some(ask)) if bid > Decimal::ZERO => {
                let mid = (bid + ask) / Decimal::TWO;
                ((ask - bid) / mid * Decimal::ONE_HUNDRED).to_f64().unwrap_or(0.0)
                    >= config.wide_spread_risk_pct
            }
            _ => false,
        };

    let overall_risk = if adv_health == AdvHealth::Fail || pct_of_adv > config.pct_of_adv_do_not_trade {
        OverallRisk::DoNotTrade
    } else if wide_and_risky || pct_of_adv > config.pct_of_adv_high {
        OverallRisk::High
    } else if pct_of_adv > config.pct_of_adv_moderate || adv_health == AdvHealth::Caution {
        OverallRisk::Moderate
    } else {
        OverallRisk::Low
    };

    ExecutionFeasibility {
        allocation_pct,
        position_dollars,
        shares_needed,
        pct_of_adv,
        adv_health,
        spread_rating,
        overall_risk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn do_not_trade_on_adv_fail() {
        let config = PositionSizingConfig::default();
        let result = evaluate(&config, Grade::APlus, dec!(100), 100_000, None, None);
        assert_eq!(result.overall_risk, OverallRisk::DoNotTrade);
    }

    #[test]
    fn low_risk_on_ample_liquidity() {
        let config = PositionSizingConfig::default();
        let result = evaluate(&config, Grade::C, dec!(100), 10_000_000, Some(dec!(99.95)), Some(dec!(100.05)));
        assert_eq!(result.overall_risk, OverallRisk::Low);
        assert_eq!(result.spread_rating, Some(SpreadRating::Tight));
    }
}
