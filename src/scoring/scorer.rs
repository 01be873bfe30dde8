//! `Scorer` (spec §4.4, component C4): pure value function from a
//! position's static attributes and optional daily bars to `(score, grade,
//! detail)`. No I/O, no side effects, deterministic per `config_version`.

use crate::config::ScoringConfig;
use crate::domain::position::Position;
use crate::domain::types::{Bar, Grade, Regime};
use crate::scoring::indicators::{
    self, MaTrend, RsTrendClass,
};

#[derive(Debug, Clone)]
pub struct ScoreComponentDetail {
    pub name: &'static str,
    pub points: i32,
    pub reason: String,
}

#[derive(Debug, Clone)]
pub struct ScoreDetail {
    pub total_score: i32,
    pub static_score: i32,
    pub dynamic_score: i32,
    pub grade: Grade,
    pub config_version: u32,
    pub market_regime: Option<Regime>,
    pub components: Vec<ScoreComponentDetail>,
}

/// Optional daily-bar inputs used for the dynamic factor pass (spec §4.4
/// "scored when sufficient bars supplied").
pub struct DynamicInputs<'a> {
    pub daily_bars: &'a [Bar],
    pub index_bars: Option<&'a [Bar]>,
}

pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Static-only score (spec §4.4 static factors table).
    pub fn score(&self, position: &Position, regime: Option<Regime>) -> ScoreDetail {
        self.score_with_dynamic(position, regime, None)
    }

    /// Static + dynamic score. Dynamic factors are skipped (not scored as
    /// zero, simply omitted) when `dynamic` is `None` or bars are too few
    /// for the indicator in question.
    pub fn score_with_dynamic(
        &self,
        position: &Position,
        regime: Option<Regime>,
        dynamic: Option<DynamicInputs<'_>>,
    ) -> ScoreDetail {
        let mut components = Vec::new();
        let mut static_total = 0;

        let (rs_score, rs_reason) = self.score_rs_rating(position.rs_rating);
        static_total += rs_score;
        components.push(ScoreComponentDetail {
            name: "RS Rating",
            points: rs_score,
            reason: rs_reason,
        });

        let (pattern_score, pattern_reason) = self.score_pattern(position.pattern.as_deref());
        static_total += pattern_score;
        components.push(ScoreComponentDetail {
            name: "Pattern",
            points: pattern_score,
            reason: pattern_reason,
        });

        let (stage_score, stage_reason) = self.score_stage(position.base_stage.as_deref());
        static_total += stage_score;
        components.push(ScoreComponentDetail {
            name: "Stage",
            points: stage_score,
            reason: stage_reason,
        });

        let (depth_score, depth_reason) = self.score_depth(position.base_depth);
        static_total += depth_score;
        components.push(ScoreComponentDetail {
            name: "Depth",
            points: depth_score,
            reason: depth_reason,
        });

        let (length_score, length_reason) = self.score_length(position.base_length);
        static_total += length_score;
        components.push(ScoreComponentDetail {
            name: "Length",
            points: length_score,
            reason: length_reason,
        });

        let mut dynamic_total = 0;
        if let Some(inputs) = dynamic {
            dynamic_total += self.score_dynamic_factors(inputs, &mut components);
        }

        let total_score = static_total + dynamic_total;
        let mut grade = self.score_to_grade(total_score);

        // RS floor rule, applied last (spec §4.4).
        if let Some(rs) = position.rs_rating {
            if rs < self.config.grades.rs_floor_rating && grade > Grade::C {
                grade = Grade::C;
            }
        }

        ScoreDetail {
            total_score,
            static_score: static_total,
            dynamic_score: dynamic_total,
            grade,
            config_version: self.config.version,
            market_regime: regime,
            components,
        }
    }

    fn score_dynamic_factors(
        &self,
        inputs: DynamicInputs<'_>,
        components: &mut Vec<ScoreComponentDetail>,
    ) -> i32 {
        let mut total = 0;
        let bars = inputs.daily_bars;
        if bars.len() < 50 {
            return 0;
        }

        if let Some(ratio) = indicators::up_down_volume_ratio(bars, 50) {
            let cfg = &self.config.up_down_volume;
            let points = if ratio >= cfg.strong_min {
                cfg.strong
            } else if ratio >= cfg.good_min {
                cfg.good
            } else if ratio >= cfg.acceptable_min {
                cfg.acceptable
            } else if ratio >= cfg.neutral_min {
                cfg.neutral
            } else {
                cfg.weak
            };
            total += points;
            components.push(ScoreComponentDetail {
                name: "Up/Down Volume Ratio",
                points,
                reason: format!("ratio={ratio:.2}"),
            });
        }

        let ma_series = indicators::moving_average_series(bars, 50);
        if let Some(trend) = indicators::ma_50_position(bars, &ma_series, self.config.ma_position.near_pct) {
            let cfg = &self.config.ma_position;
            let points = match trend {
                MaTrend::AboveRising => cfg.above_rising,
                MaTrend::AboveFlat => cfg.above_flat,
                MaTrend::Near => cfg.near,
                MaTrend::BelowRecent => cfg.below_recent,
                MaTrend::BelowExtended => cfg.below_extended,
            };
            total += points;
            components.push(ScoreComponentDetail {
                name: "50-MA Position",
                points,
                reason: format!("{trend:?}"),
            });
        }

        if bars.len() >= 70 {
            let weekly = indicators::aggregate_weekly(bars);
            let ma_10w = indicators::moving_average_series(&weekly, 10);
            let bounces = indicators::ten_week_support_bounces(
                &weekly,
                &ma_10w,
                self.config.ten_week_bounce.touch_tolerance_pct,
            );
            let cfg = &self.config.ten_week_bounce;
            let points = match bounces {
                n if n >= 3 => cfg.three_plus,
                2 => cfg.two,
                1 => cfg.one,
                0 => cfg.zero,
                _ => cfg.breakdown_min,
            };
            total += points;
            components.push(ScoreComponentDetail {
                name: "10-Week Support Bounces",
                points,
                reason: format!("bounces={bounces}"),
            });
        }

        if let Some(index_bars) = inputs.index_bars {
            if let Some(class) = indicators::rs_trend(bars, index_bars, 50) {
                let cfg = &self.config.rs_trend;
                let points = match class {
                    RsTrendClass::AtNewHigh => cfg.at_new_high,
                    RsTrendClass::Rising => cfg.rising,
                    RsTrendClass::Flat => cfg.flat,
                    RsTrendClass::Falling => cfg.falling,
                };
                total += points;
                components.push(ScoreComponentDetail {
                    name: "RS Trend",
                    points,
                    reason: format!("{class:?}"),
                });
            }
        }

        if let Some(ratio) = indicators::volume_dry_up_ratio(bars, 10, 40) {
            let cfg = &self.config.volume_dry_up;
            let points = if ratio < cfg.strong_max_ratio {
                cfg.strong
            } else if ratio < cfg.moderate_max_ratio {
                cfg.moderate
            } else {
                cfg.none
            };
            total += points;
            components.push(ScoreComponentDetail {
                name: "Volume Dry-Up",
                points,
                reason: format!("ratio={ratio:.2}"),
            });
        }

        total
    }

    fn score_rs_rating(&self, rs_rating: Option<u8>) -> (i32, String) {
        let cfg = &self.config.rs_rating;
        match rs_rating {
            None => (0, "no RS rating".to_string()),
            Some(r) if r >= 95 => (cfg.elite, format!("Elite ({r})")),
            Some(r) if r >= 90 => (cfg.excellent, format!("Excellent ({r})")),
            Some(r) if r >= 80 => (cfg.good, format!("Good ({r})")),
            Some(r) if r >= 70 => (cfg.acceptable, format!("Acceptable ({r})")),
            Some(r) => (cfg.weak, format!("Weak ({r})")),
        }
    }

    fn score_pattern(&self, pattern: Option<&str>) -> (i32, String) {
        let cfg = &self.config.pattern;
        let lower = pattern.map(|p| p.to_lowercase());
        match lower.as_deref() {
            Some(p) if p.contains("cup") && p.contains("handle") => (cfg.tier_a_max, "Cup w/Handle (Tier A)".to_string()),
            Some(p) if p.contains("double bottom") => (cfg.tier_a_min, "Double Bottom (Tier A)".to_string()),
            Some(p) if p.contains("flat base") || p.contains("high tight flag") => {
                (cfg.tier_b_max, format!("{p} (Tier B)"))
            }
            Some(p) if p.contains("cup") || p.contains("ascending base") || p.contains("ipo base") => {
                (cfg.tier_b_min, format!("{p} (Tier B)"))
            }
            Some(p) if p.contains("consolidation") || p.contains("saucer") || p.contains("tight") => {
                (cfg.tier_c, format!("{p} (Tier C)"))
            }
            Some(p) => (cfg.unknown_default, format!("{p} (unrecognized, default)")),
            None => (cfg.unknown_default, "no pattern (default)".to_string()),
        }
    }

    fn score_stage(&self, base_stage: Option<&str>) -> (i32, String) {
        let cfg = &self.config.stage;
        let Some(stage) = base_stage else {
            return (0, "no stage recorded".to_string());
        };
        let base_on_base = stage.contains('(');
        let bonus = if base_on_base { cfg.base_on_base_bonus } else { 0 };

        let leading_digit = stage.chars().next().and_then(|c| c.to_digit(10));
        let points = if stage.eq_ignore_ascii_case("late") {
            cfg.late
        } else {
            match leading_digit {
                Some(1) => cfg.stage_1,
                Some(2) => cfg.stage_2,
                Some(3) => cfg.stage_3,
                Some(n) if n >= 4 => cfg.stage_4_plus,
                _ => 0,
            }
        };
        (points + bonus, format!("stage {stage}"))
    }

    fn score_depth(&self, base_depth: Option<f64>) -> (i32, String) {
        let cfg = &self.config.depth;
        match base_depth {
            None => (0, "no depth recorded".to_string()),
            Some(d) if d <= cfg.shallow_max_pct => (cfg.shallow, format!("{d:.1}% (shallow)")),
            Some(d) if d <= cfg.normal_max_pct => (cfg.normal, format!("{d:.1}% (normal)")),
            Some(d) if d <= cfg.deep_max_pct => (cfg.deep, format!("{d:.1}% (deep)")),
            Some(d) => (cfg.excessive, format!("{d:.1}% (excessive)")),
        }
    }

    fn score_length(&self, base_length: Option<f64>) -> (i32, String) {
        let cfg = &self.config.length;
        match base_length {
            None => (0, "no length recorded".to_string()),
            Some(w) if w >= cfg.long_min_weeks => (cfg.long, format!("{w:.0}wk (long)")),
            Some(w) if w >= cfg.normal_min_weeks => (cfg.normal, format!("{w:.0}wk (normal)")),
            Some(w) => (cfg.short, format!("{w:.0}wk (short)")),
        }
    }

    fn score_to_grade(&self, score: i32) -> Grade {
        let g = &self.config.grades;
        if score >= g.a_plus {
            Grade::APlus
        } else if score >= g.a {
            Grade::A
        } else if score >= g.b_plus {
            Grade::BPlus
        } else if score >= g.b {
            Grade::B
        } else if score >= g.c_plus {
            Grade::CPlus
        } else if score >= g.c {
            Grade::C
        } else if score >= g.d {
            Grade::D
        } else {
            Grade::F
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_position() -> Position {
        let mut p = Position::new("NVDA", "default");
        p.rs_rating = Some(82);
        p.pattern = Some("Cup w/Handle".to_string());
        p.base_stage = Some("2(2)".to_string());
        p.base_depth = Some(18.0);
        p.base_length = Some(8.0);
        p
    }

    #[test]
    fn scenario_s5_score_rescoring_determinism() {
        let scorer = Scorer::new(ScoringConfig::default());
        let position = sample_position();

        let first = scorer.score(&position, Some(Regime::Bullish));
        let second = scorer.score(&position, Some(Regime::Bullish));

        assert_eq!(first.total_score, second.total_score);
        assert_eq!(first.grade, second.grade);
        assert_eq!(first.total_score, 14);
        assert_eq!(first.grade, Grade::BPlus);
    }

    #[test]
    fn testable_property_6_rs_floor_dominance() {
        let scorer = Scorer::new(ScoringConfig::default());
        let mut position = sample_position();
        position.rs_rating = Some(60);

        let detail = scorer.score(&position, None);
        assert!(detail.grade <= Grade::C);
    }
}
