//! Alert record and the static severity catalog (spec §3 Alert, §6 alert
//! type catalog).

use crate::domain::types::{AlertSubtype, AlertType, Grade, Regime, Severity};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Full context snapshot attached to every alert at emission time (spec §3
/// Alert "Snapshot" fields).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSnapshot {
    pub price: Decimal,
    pub pivot_at_alert: Option<Decimal>,
    pub avg_cost_at_alert: Decimal,
    pub pnl_pct_at_alert: f64,
    pub volume_ratio: f64,
    pub ma21: Option<Decimal>,
    pub ma50: Option<Decimal>,
    pub grade: Option<Grade>,
    pub score: Option<i32>,
    pub market_regime: Option<Regime>,
    pub state_at_alert: f64,
}

/// The alert payload a `Checker` produces; not yet persisted (spec §4.8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertData {
    pub position_id: Option<i64>,
    pub symbol: String,
    pub alert_type: AlertType,
    pub alert_subtype: AlertSubtype,
    pub snapshot: AlertSnapshot,
}

impl AlertData {
    pub fn severity(&self) -> Severity {
        severity_of(self.alert_type, self.alert_subtype)
    }
}

/// A persisted alert record (spec §3 Alert).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub position_id: Option<i64>,
    pub symbol: String,
    pub alert_type: AlertType,
    pub alert_subtype: AlertSubtype,
    pub severity: Severity,
    pub snapshot: AlertSnapshot,
    pub alert_time: DateTime<Utc>,
    pub acknowledged: bool,
    pub notified_channels: Vec<String>,
}

/// Static (type, subtype) -> severity lookup (spec §6). Falls back to
/// `Neutral` for unknown combinations (spec §4.7 `severity()`).
pub fn severity_of(alert_type: AlertType, subtype: AlertSubtype) -> Severity {
    use AlertSubtype as S;
    use AlertType as T;
    use Severity::*;

    match (alert_type, subtype) {
        (T::Stop, S::HardStop) | (T::Stop, S::TrailingStop) => Critical,
        (T::Stop, S::Warning) => Warning,
        (T::Profit, S::Tp1) | (T::Profit, S::Tp2) => Profit,
        (T::Profit, S::EightWeekHold) => Info,
        (T::Pyramid, S::P1Ready)
        | (T::Pyramid, S::P1Extended)
        | (T::Pyramid, S::P2Ready)
        | (T::Pyramid, S::P2Extended) => Info,
        (T::Add, S::Pullback) => Info,
        (T::Technical, S::Ma50Warning) => Warning,
        (T::Technical, S::Ma50Sell) | (T::Technical, S::TenWeekSell) => Critical,
        (T::Technical, S::Ema21Sell) | (T::Technical, S::ClimaxTop) => Warning,
        (T::Health, S::Critical) => Critical,
        (T::Health, S::Earnings) | (T::Health, S::LateStage) => Warning,
        (T::Breakout, S::Confirmed) | (T::Breakout, S::InBuyZone) | (T::Breakout, S::Approaching) => {
            Info
        }
        (T::Breakout, S::Extended) | (T::Breakout, S::Suppressed) => Warning,
        (T::AltEntry, _) => Info,
        _ => Neutral,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_matches_spec_table() {
        assert_eq!(
            severity_of(AlertType::Stop, AlertSubtype::HardStop),
            Severity::Critical
        );
        assert_eq!(
            severity_of(AlertType::Profit, AlertSubtype::Tp1),
            Severity::Profit
        );
        assert_eq!(
            severity_of(AlertType::Breakout, AlertSubtype::Extended),
            Severity::Warning
        );
        assert_eq!(
            severity_of(AlertType::AltEntry, AlertSubtype::Ema21Bounce),
            Severity::Info
        );
    }
}
