//! Thresholds for the checker suite (spec §4.8). Grounded on
//! `original_source/core/position_monitor/alert_checker_tool.py`'s
//! per-rule constants, reorganized one struct per checker.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StopCheckerConfig {
    /// `current_price <= stop_price * (1 + warn_pct_above_stop/100)` fires WARNING.
    pub warn_pct_above_stop: f64,
    /// Trailing stop never below `avg_cost * (1 + trailing_min_gain_pct/100)`
    /// once active (Open Question, pinned: see DESIGN.md).
    pub trailing_min_gain_pct: f64,
    /// Trailing stop trails `running_high` by this percent.
    pub trailing_pct_below_high: f64,
    /// Trailing stop only evaluated once the position has cleared TP1.
    pub trailing_active_from_state: f64,
}

impl Default for StopCheckerConfig {
    fn default() -> Self {
        Self {
            warn_pct_above_stop: 2.0,
            trailing_min_gain_pct: 10.0,
            trailing_pct_below_high: 8.0,
            trailing_active_from_state: 4.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfitCheckerConfig {
    pub eight_week_hold_weeks: f64,
    pub eight_week_hold_gain_pct: f64,
}

impl Default for ProfitCheckerConfig {
    fn default() -> Self {
        Self {
            eight_week_hold_weeks: 8.0,
            eight_week_hold_gain_pct: 20.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PyramidCheckerConfig {
    /// Add-on buy zone starts this far above the prior tranche's fill price.
    pub zone_lower_pct: f64,
    /// Above this far above the prior tranche's fill, the zone is "extended".
    pub zone_upper_pct: f64,
    pub pullback_to_ma21_tolerance_pct: f64,
}

impl Default for PyramidCheckerConfig {
    fn default() -> Self {
        Self {
            zone_lower_pct: 2.5,
            zone_upper_pct: 5.0,
            pullback_to_ma21_tolerance_pct: 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MaCheckerConfig {
    pub ma50_warning_pct: f64,
    pub ema21_sell_consecutive_days: u32,
    pub ten_week_sell_volume_ratio: f64,
    pub climax_top_gap_pct: f64,
    pub climax_top_run_up_pct: f64,
    pub climax_top_volume_ratio: f64,
}

impl Default for MaCheckerConfig {
    fn default() -> Self {
        Self {
            ma50_warning_pct: 2.0,
            ema21_sell_consecutive_days: 2,
            ten_week_sell_volume_ratio: 1.4,
            climax_top_gap_pct: 5.0,
            climax_top_run_up_pct: 25.0,
            climax_top_volume_ratio: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckerConfig {
    pub critical_score_threshold: f64,
    pub late_stage_min_stage: u32,
    pub late_stage_max_weeks_held: f64,
}

impl Default for HealthCheckerConfig {
    fn default() -> Self {
        Self {
            critical_score_threshold: 30.0,
            late_stage_min_stage: 3,
            late_stage_max_weeks_held: 26.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakoutCheckerConfig {
    pub approaching_pct: f64,
    pub volume_confirmation: f64,
    pub buy_zone_upper_pct: f64,
    pub extended_pct: f64,
}

impl Default for BreakoutCheckerConfig {
    fn default() -> Self {
        Self {
            approaching_pct: 2.0,
            volume_confirmation: 1.4,
            buy_zone_upper_pct: 5.0,
            extended_pct: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AltEntryCheckerConfig {
    pub ema21_bounce_tolerance_pct: f64,
    pub ma50_bounce_tolerance_pct: f64,
    pub pivot_retest_tolerance_pct: f64,
}

impl Default for AltEntryCheckerConfig {
    fn default() -> Self {
        Self {
            ema21_bounce_tolerance_pct: 1.5,
            ma50_bounce_tolerance_pct: 1.5,
            pivot_retest_tolerance_pct: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckersConfig {
    pub stop: StopCheckerConfig,
    pub profit: ProfitCheckerConfig,
    pub pyramid: PyramidCheckerConfig,
    pub ma: MaCheckerConfig,
    pub health: HealthCheckerConfig,
    pub breakout: BreakoutCheckerConfig,
    pub alt_entry: AltEntryCheckerConfig,
}

impl Default for CheckersConfig {
    fn default() -> Self {
        Self {
            stop: StopCheckerConfig::default(),
            profit: ProfitCheckerConfig::default(),
            pyramid: PyramidCheckerConfig::default(),
            ma: MaCheckerConfig::default(),
            health: HealthCheckerConfig::default(),
            breakout: BreakoutCheckerConfig::default(),
            alt_entry: AltEntryCheckerConfig::default(),
        }
    }
}
