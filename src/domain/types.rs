//! Shared value types used across providers, checkers, and the scorer.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Real-time quote snapshot, as returned by a `RealtimeQuoteProvider` (§4.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Quote {
    pub bid: Decimal,
    pub ask: Decimal,
    pub last: Decimal,
    pub volume: u64,
    pub avg_volume_50d: u64,
    pub ma_21: Decimal,
    pub ma_50: Decimal,
    pub ma_200: Decimal,
    pub time: DateTime<Utc>,
}

impl Quote {
    /// Intraday relative volume vs the trailing 50-day average.
    pub fn rvol(&self) -> f64 {
        if self.avg_volume_50d == 0 {
            return 0.0;
        }
        self.volume as f64 / self.avg_volume_50d as f64
    }

    /// Mid-point spread as a fraction of the last price (e.g. 0.001 = 0.1%).
    pub fn spread_pct(&self) -> Option<f64> {
        if self.bid <= Decimal::ZERO || self.ask <= Decimal::ZERO || self.last <= Decimal::ZERO {
            return None;
        }
        let spread = (self.ask - self.bid).abs();
        (spread / self.last).to_string().parse::<f64>().ok()
    }
}

/// A single daily OHLCV bar, as returned by a `HistoricalBarsProvider` (§4.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

/// CNN-style fear & greed reading, as returned by a `SentimentProvider` (§4.2).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FearGreed {
    pub date: NaiveDate,
    pub score: u8, // 0..=100
    pub rating: FearGreedRating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FearGreedRating {
    ExtremeFear,
    Fear,
    Neutral,
    Greed,
    ExtremeGreed,
}

impl FearGreedRating {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=24 => Self::ExtremeFear,
            25..=44 => Self::Fear,
            45..=55 => Self::Neutral,
            56..=75 => Self::Greed,
            _ => Self::ExtremeGreed,
        }
    }
}

/// Alert severity (§3 Alert, §6 alert type catalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Profit,
    Info,
    Neutral,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Profit => "profit",
            Severity::Info => "info",
            Severity::Neutral => "neutral",
        };
        write!(f, "{s}")
    }
}

/// Top-level alert classification (§6 alert type catalog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    Stop,
    Profit,
    Pyramid,
    Add,
    Technical,
    Health,
    Breakout,
    AltEntry,
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertType::Stop => "STOP",
            AlertType::Profit => "PROFIT",
            AlertType::Pyramid => "PYRAMID",
            AlertType::Add => "ADD",
            AlertType::Technical => "TECHNICAL",
            AlertType::Health => "HEALTH",
            AlertType::Breakout => "BREAKOUT",
            AlertType::AltEntry => "ALT_ENTRY",
        };
        write!(f, "{s}")
    }
}

/// Alert sub-classification within an `AlertType` (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSubtype {
    HardStop,
    TrailingStop,
    Warning,
    Tp1,
    Tp2,
    EightWeekHold,
    P1Ready,
    P1Extended,
    P2Ready,
    P2Extended,
    Pullback,
    Ma50Warning,
    Ma50Sell,
    Ema21Sell,
    TenWeekSell,
    ClimaxTop,
    Critical,
    Earnings,
    LateStage,
    Approaching,
    Confirmed,
    InBuyZone,
    Extended,
    Suppressed,
    Ema21Bounce,
    Ma50Bounce,
    PivotRetestAfterExtension,
}

impl std::fmt::Display for AlertSubtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertSubtype::HardStop => "HARD_STOP",
            AlertSubtype::TrailingStop => "TRAILING_STOP",
            AlertSubtype::Warning => "WARNING",
            AlertSubtype::Tp1 => "TP1",
            AlertSubtype::Tp2 => "TP2",
            AlertSubtype::EightWeekHold => "EIGHT_WEEK_HOLD",
            AlertSubtype::P1Ready => "P1_READY",
            AlertSubtype::P1Extended => "P1_EXTENDED",
            AlertSubtype::P2Ready => "P2_READY",
            AlertSubtype::P2Extended => "P2_EXTENDED",
            AlertSubtype::Pullback => "PULLBACK",
            AlertSubtype::Ma50Warning => "MA_50_WARNING",
            AlertSubtype::Ma50Sell => "MA_50_SELL",
            AlertSubtype::Ema21Sell => "EMA_21_SELL",
            AlertSubtype::TenWeekSell => "TEN_WEEK_SELL",
            AlertSubtype::ClimaxTop => "CLIMAX_TOP",
            AlertSubtype::Critical => "CRITICAL",
            AlertSubtype::Earnings => "EARNINGS",
            AlertSubtype::LateStage => "LATE_STAGE",
            AlertSubtype::Approaching => "APPROACHING",
            AlertSubtype::Confirmed => "CONFIRMED",
            AlertSubtype::InBuyZone => "IN_BUY_ZONE",
            AlertSubtype::Extended => "EXTENDED",
            AlertSubtype::Suppressed => "SUPPRESSED",
            AlertSubtype::Ema21Bounce => "21_EMA_BOUNCE",
            AlertSubtype::Ma50Bounce => "50_MA_BOUNCE",
            AlertSubtype::PivotRetestAfterExtension => "PIVOT_RETEST_AFTER_EXTENSION",
        };
        write!(f, "{s}")
    }
}

/// Market-wide regime bucket (§3 MarketRegimeAlert, §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Regime {
    Bullish,
    Neutral,
    Bearish,
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Regime::Bullish => "BULLISH",
            Regime::Neutral => "NEUTRAL",
            Regime::Bearish => "BEARISH",
        };
        write!(f, "{s}")
    }
}

/// CAN-SLIM entry grade (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Grade {
    F,
    D,
    C,
    CPlus,
    B,
    BPlus,
    A,
    APlus,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Grade::APlus => "A+",
            Grade::A => "A",
            Grade::BPlus => "B+",
            Grade::B => "B",
            Grade::CPlus => "C+",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{s}")
    }
}
