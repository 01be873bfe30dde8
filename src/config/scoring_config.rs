//! The scorer's entire rule table, versioned (spec §4.4, §3 "Configuration").
//!
//! Grounded on `original_source/utils/scoring.py`'s `DEFAULT_CONFIG` table;
//! every threshold below has a direct counterpart there.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RsRatingPoints {
    pub elite: i32,      // 95-100
    pub excellent: i32,  // 90-94
    pub good: i32,       // 80-89
    pub acceptable: i32, // 70-79
    pub weak: i32,       // <70
}

impl Default for RsRatingPoints {
    fn default() -> Self {
        Self {
            elite: 5,
            excellent: 4,
            good: 2,
            acceptable: 0,
            weak: -5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternPoints {
    pub tier_a_min: i32,
    pub tier_a_max: i32,
    pub tier_b_min: i32,
    pub tier_b_max: i32,
    pub tier_c: i32,
    pub unknown_default: i32,
}

impl Default for PatternPoints {
    fn default() -> Self {
        Self {
            tier_a_min: 9,
            tier_a_max: 10,
            tier_b_min: 7,
            tier_b_max: 8,
            tier_c: 6,
            unknown_default: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct StagePoints {
    pub stage_1: i32,
    pub stage_2: i32,
    pub stage_3: i32,
    pub stage_4_plus: i32,
    pub late: i32,
    pub base_on_base_bonus: i32,
}

impl Default for StagePoints {
    fn default() -> Self {
        Self {
            stage_1: 0,
            stage_2: -1,
            stage_3: -4,
            stage_4_plus: -8,
            late: -10,
            base_on_base_bonus: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DepthPoints {
    pub shallow_max_pct: f64, // <=15
    pub shallow: i32,
    pub normal_max_pct: f64, // <=25
    pub normal: i32,
    pub deep_max_pct: f64, // <=35
    pub deep: i32,
    pub excessive: i32,
}

impl Default for DepthPoints {
    fn default() -> Self {
        Self {
            shallow_max_pct: 15.0,
            shallow: 1,
            normal_max_pct: 25.0,
            normal: 0,
            deep_max_pct: 35.0,
            deep: -2,
            excessive: -5,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LengthPoints {
    pub long_min_weeks: f64, // >=7
    pub long: i32,
    pub normal_min_weeks: f64, // >=5
    pub normal: i32,
    pub short: i32,
}

impl Default for LengthPoints {
    fn default() -> Self {
        Self {
            long_min_weeks: 7.0,
            long: 1,
            normal_min_weeks: 5.0,
            normal: 0,
            short: -1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeRatioPoints {
    pub strong_min: f64, // >=1.5
    pub strong: i32,
    pub good_min: f64, // >=1.2
    pub good: i32,
    pub acceptable_min: f64, // >=1.1
    pub acceptable: i32,
    pub neutral_min: f64, // >=0.9
    pub neutral: i32,
    pub weak: i32,
}

impl Default for VolumeRatioPoints {
    fn default() -> Self {
        Self {
            strong_min: 1.5,
            strong: 3,
            good_min: 1.2,
            good: 2,
            acceptable_min: 1.1,
            acceptable: 1,
            neutral_min: 0.9,
            neutral: 0,
            weak: -2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct MaPositionPoints {
    pub above_rising: i32,
    pub above_flat: i32,
    pub near_pct: f64, // within +-2%
    pub near: i32,
    pub below_recent: i32,
    pub below_extended: i32,
}

impl Default for MaPositionPoints {
    fn default() -> Self {
        Self {
            above_rising: 2,
            above_flat: 1,
            near_pct: 2.0,
            near: 0,
            below_recent: -1,
            below_extended: -2,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TenWeekBouncePoints {
    pub touch_tolerance_pct: f64,
    pub three_plus: i32,
    pub two: i32,
    pub one: i32,
    pub zero: i32,
    pub breakdown_min: i32,
    pub breakdown_max: i32,
}

impl Default for TenWeekBouncePoints {
    fn default() -> Self {
        Self {
            touch_tolerance_pct: 2.0,
            three_plus: 3,
            two: 2,
            one: 1,
            zero: 0,
            breakdown_min: -2,
            breakdown_max: -1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RsTrendPoints {
    pub at_new_high: i32,
    pub rising: i32,
    pub flat: i32,
    pub falling: i32,
}

impl Default for RsTrendPoints {
    fn default() -> Self {
        Self {
            at_new_high: 2,
            rising: 1,
            flat: 0,
            falling: -1,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeDryUpPoints {
    pub strong_max_ratio: f64, // <0.5
    pub strong: i32,
    pub moderate_max_ratio: f64, // <0.75
    pub moderate: i32,
    pub none: i32,
}

impl Default for VolumeDryUpPoints {
    fn default() -> Self {
        Self {
            strong_max_ratio: 0.5,
            strong: 2,
            moderate_max_ratio: 0.75,
            moderate: 1,
            none: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeThresholds {
    pub a_plus: i32,
    pub a: i32,
    pub b_plus: i32,
    pub b: i32,
    pub c_plus: i32,
    pub c: i32,
    pub d: i32,
    pub rs_floor_rating: u8,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            a_plus: 20,
            a: 15,
            b_plus: 12,
            b: 9,
            c_plus: 7,
            c: 5,
            d: 3,
            rs_floor_rating: 70,
        }
    }
}

/// The scorer's entire rule table (spec §3 "scoring_config", §4.4). `version`
/// is carried into every `ScoreDetail` for audit (spec §4.4 "must be
/// deterministic for a given config version").
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub version: u32,
    pub rs_rating: RsRatingPoints,
    pub pattern: PatternPoints,
    pub stage: StagePoints,
    pub depth: DepthPoints,
    pub length: LengthPoints,
    pub up_down_volume: VolumeRatioPoints,
    pub ma_position: MaPositionPoints,
    pub ten_week_bounce: TenWeekBouncePoints,
    pub rs_trend: RsTrendPoints,
    pub volume_dry_up: VolumeDryUpPoints,
    pub grades: GradeThresholds,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            version: 1,
            rs_rating: RsRatingPoints::default(),
            pattern: PatternPoints::default(),
            stage: StagePoints::default(),
            depth: DepthPoints::default(),
            length: LengthPoints::default(),
            up_down_volume: VolumeRatioPoints::default(),
            ma_position: MaPositionPoints::default(),
            ten_week_bounce: TenWeekBouncePoints::default(),
            rs_trend: RsTrendPoints::default(),
            volume_dry_up: VolumeDryUpPoints::default(),
            grades: GradeThresholds::default(),
        }
    }
}
