//! `AlertRepository` over sqlite. The type/subtype/severity enums and the
//! `AlertSnapshot` struct are stored as JSON, matching this codebase's
//! `parameters_json`/`performance_metrics_json` convention for payloads
//! too structured for individual columns.

use crate::domain::alert::{Alert, AlertSnapshot};
use crate::domain::errors::RepositoryError;
use crate::domain::repositories::AlertRepository;
use crate::domain::types::{AlertSubtype, AlertType, Severity};
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use sqlx::{Row, sqlite::SqliteRow};

pub struct SqliteAlertRepository {
    database: Database,
}

impl SqliteAlertRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

fn alert_type_str(t: AlertType) -> &'static str {
    match t {
        AlertType::Stop => "STOP",
        AlertType::Profit => "PROFIT",
        AlertType::Pyramid => "PYRAMID",
        AlertType::Add => "ADD",
        AlertType::Technical => "TECHNICAL",
        AlertType::Health => "HEALTH",
        AlertType::Breakout => "BREAKOUT",
        AlertType::AltEntry => "ALT_ENTRY",
    }
}

fn parse_alert_type(s: &str) -> AlertType {
    match s {
        "PROFIT" => AlertType::Profit,
        "PYRAMID" => AlertType::Pyramid,
        "ADD" => AlertType::Add,
        "TECHNICAL" => AlertType::Technical,
        "HEALTH" => AlertType::Health,
        "BREAKOUT" => AlertType::Breakout,
        "ALT_ENTRY" => AlertType::AltEntry,
        _ => AlertType::Stop,
    }
}

fn parse_alert_subtype(s: &str) -> AlertSubtype {
    use AlertSubtype as S;
    match s {
        "TRAILING_STOP" => S::TrailingStop,
        "WARNING" => S::Warning,
        "TP1" => S::Tp1,
        "TP2" => S::Tp2,
        "EIGHT_WEEK_HOLD" => S::EightWeekHold,
        "P1_READY" => S::P1Ready,
        "P1_EXTENDED" => S::P1Extended,
        "P2_READY" => S::P2Ready,
        "P2_EXTENDED" => S::P2Extended,
        "PULLBACK" => S::Pullback,
        "MA_50_WARNING" => S::Ma50Warning,
        "MA_50_SELL" => S::Ma50Sell,
        "EMA_21_SELL" => S::Ema21Sell,
        "TEN_WEEK_SELL" => S::TenWeekSell,
        "CLIMAX_TOP" => S::ClimaxTop,
        "CRITICAL" => S::Critical,
        "EARNINGS" => S::Earnings,
        "LATE_STAGE" => S::LateStage,
        "APPROACHING" => S::Approaching,
        "CONFIRMED" => S::Confirmed,
        "IN_BUY_ZONE" => S::InBuyZone,
        "EXTENDED" => S::Extended,
        "SUPPRESSED" => S::Suppressed,
        "21_EMA_BOUNCE" => S::Ema21Bounce,
        "50_MA_BOUNCE" => S::Ma50Bounce,
        "PIVOT_RETEST_AFTER_EXTENSION" => S::PivotRetestAfterExtension,
        _ => S::HardStop,
    }
}

fn parse_severity(s: &str) -> Severity {
    match s {
        "warning" => Severity::Warning,
        "profit" => Severity::Profit,
        "info" => Severity::Info,
        "neutral" => Severity::Neutral,
        _ => Severity::Critical,
    }
}

fn row_to_alert(row: &SqliteRow) -> Result<Alert, RepositoryError> {
    let alert_type: String = row.try_get("alert_type")?;
    let alert_subtype: String = row.try_get("alert_subtype")?;
    let severity: String = row.try_get("severity")?;
    let snapshot_json: String = row.try_get("snapshot_json")?;
    let channels_json: String = row.try_get("notified_channels_json")?;

    Ok(Alert {
        id: row.try_get("id")?,
        position_id: row.try_get("position_id")?,
        symbol: row.try_get("symbol")?,
        alert_type: parse_alert_type(&alert_type),
        alert_subtype: parse_alert_subtype(&alert_subtype),
        severity: parse_severity(&severity),
        snapshot: serde_json::from_str::<AlertSnapshot>(&snapshot_json)?,
        alert_time: row.try_get("alert_time")?,
        acknowledged: row.try_get("acknowledged")?,
        notified_channels: serde_json::from_str(&channels_json)?,
    })
}

#[async_trait]
impl AlertRepository for SqliteAlertRepository {
    async fn insert(&self, mut alert: Alert) -> Result<Alert, RepositoryError> {
        let snapshot_json = serde_json::to_string(&alert.snapshot)?;
        let channels_json = serde_json::to_string(&alert.notified_channels)?;

        let row = sqlx::query(
            r#"
            INSERT INTO alerts (position_id, symbol, alert_type, alert_subtype, severity, snapshot_json, alert_time, acknowledged, notified_channels_json)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(alert.position_id)
        .bind(&alert.symbol)
        .bind(alert_type_str(alert.alert_type))
        .bind(alert.alert_subtype.to_string())
        .bind(alert.severity.to_string())
        .bind(snapshot_json)
        .bind(alert.alert_time)
        .bind(alert.acknowledged)
        .bind(channels_json)
        .fetch_one(&self.database.pool)
        .await?;

        alert.id = row.try_get("id")?;
        Ok(alert)
    }

    async fn latest_for_position(&self, position_id: i64, limit: u32) -> Result<Vec<Alert>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM alerts WHERE position_id = ? ORDER BY alert_time DESC LIMIT ?")
            .bind(position_id)
            .bind(limit as i64)
            .fetch_all(&self.database.pool)
            .await?;
        rows.iter().map(row_to_alert).collect()
    }

    async fn latest_for_symbols(&self, symbols: &[String], limit: u32) -> Result<Vec<Alert>, RepositoryError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = symbols.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!("SELECT * FROM alerts WHERE symbol IN ({placeholders}) ORDER BY alert_time DESC LIMIT ?");
        let mut query = sqlx::query(&sql);
        for symbol in symbols {
            query = query.bind(symbol);
        }
        query = query.bind(limit as i64);
        let rows = query.fetch_all(&self.database.pool).await?;
        rows.iter().map(row_to_alert).collect()
    }

    async fn acknowledge(&self, id: i64) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE alerts SET acknowledged = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.database.pool)
            .await?;
        Ok(())
    }

    async fn latest_of_kind(&self, position_id: i64, alert_type: &str, alert_subtype: &str) -> Result<Option<Alert>, RepositoryError> {
        let row = sqlx::query(
            "SELECT * FROM alerts WHERE position_id = ? AND alert_type = ? AND alert_subtype = ? ORDER BY alert_time DESC LIMIT 1",
        )
        .bind(position_id)
        .bind(alert_type)
        .bind(alert_subtype)
        .fetch_optional(&self.database.pool)
        .await?;
        row.as_ref().map(row_to_alert).transpose()
    }
}
