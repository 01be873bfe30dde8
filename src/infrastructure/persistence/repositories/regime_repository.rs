//! `RegimeRepository` over sqlite: one row per trading date, upserted by
//! the market worker each cycle.

use crate::domain::errors::RepositoryError;
use crate::domain::market_regime::{DDayTrend, MarketPhase, MarketRegimeAlert};
use crate::domain::repositories::RegimeRepository;
use crate::domain::types::Regime;
use crate::infrastructure::persistence::Database;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Row, sqlite::SqliteRow};

pub struct SqliteRegimeRepository {
    database: Database,
}

impl SqliteRegimeRepository {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

fn regime_str(r: Regime) -> &'static str {
    match r {
        Regime::Bullish => "BULLISH",
        Regime::Neutral => "NEUTRAL",
        Regime::Bearish => "BEARISH",
    }
}

fn parse_regime(s: &str) -> Regime {
    match s {
        "BULLISH" => Regime::Bullish,
        "BEARISH" => Regime::Bearish,
        _ => Regime::Neutral,
    }
}

fn d_day_trend_str(t: DDayTrend) -> &'static str {
    match t {
        DDayTrend::Improving => "IMPROVING",
        DDayTrend::Worsening => "WORSENING",
        DDayTrend::Flat => "FLAT",
    }
}

fn parse_d_day_trend(s: &str) -> DDayTrend {
    match s {
        "IMPROVING" => DDayTrend::Improving,
        "WORSENING" => DDayTrend::Worsening,
        _ => DDayTrend::Flat,
    }
}

fn market_phase_str(p: MarketPhase) -> &'static str {
    match p {
        MarketPhase::ConfirmedUptrend => "CONFIRMED_UPTREND",
        MarketPhase::UptrendUnderPressure => "UPTREND_UNDER_PRESSURE",
        MarketPhase::RallyAttempt => "RALLY_ATTEMPT",
        MarketPhase::Correction => "CORRECTION",
    }
}

fn parse_market_phase(s: &str) -> MarketPhase {
    match s {
        "CONFIRMED_UPTREND" => MarketPhase::ConfirmedUptrend,
        "UPTREND_UNDER_PRESSURE" => MarketPhase::UptrendUnderPressure,
        "RALLY_ATTEMPT" => MarketPhase::RallyAttempt,
        _ => MarketPhase::Correction,
    }
}

fn row_to_alert(row: &SqliteRow) -> Result<MarketRegimeAlert, RepositoryError> {
    let regime: String = row.try_get("regime")?;
    let d_day_trend: String = row.try_get("d_day_trend")?;
    let market_phase: String = row.try_get("market_phase")?;

    Ok(MarketRegimeAlert {
        date: row.try_get("date")?,
        composite_score: row.try_get("composite_score")?,
        entry_risk_score: row.try_get("entry_risk_score")?,
        regime: parse_regime(&regime),
        spy_d_count: row.try_get::<i64, _>("spy_d_count")? as u32,
        qqq_d_count: row.try_get::<i64, _>("qqq_d_count")? as u32,
        spy_5day_delta: row.try_get::<i64, _>("spy_5day_delta")? as i32,
        qqq_5day_delta: row.try_get::<i64, _>("qqq_5day_delta")? as i32,
        d_day_trend: parse_d_day_trend(&d_day_trend),
        market_phase: parse_market_phase(&market_phase),
        rally_day: row.try_get::<Option<i64>, _>("rally_day")?.map(|v| v as u32),
        has_confirmed_ftd: row.try_get("has_confirmed_ftd")?,
        es_change_pct: row.try_get("es_change_pct")?,
        nq_change_pct: row.try_get("nq_change_pct")?,
        ym_change_pct: row.try_get("ym_change_pct")?,
        fear_greed_score: row.try_get::<Option<i64>, _>("fear_greed_score")?.map(|v| v as u8),
        fear_greed_rating: row.try_get("fear_greed_rating")?,
        vix_close: row.try_get("vix_close")?,
    })
}

#[async_trait]
impl RegimeRepository for SqliteRegimeRepository {
    async fn upsert(&self, alert: MarketRegimeAlert) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO market_regime_alerts (
                date, composite_score, entry_risk_score, regime,
                spy_d_count, qqq_d_count, spy_5day_delta, qqq_5day_delta,
                d_day_trend, market_phase, rally_day, has_confirmed_ftd,
                es_change_pct, nq_change_pct, ym_change_pct,
                fear_greed_score, fear_greed_rating, vix_close
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(date) DO UPDATE SET
                composite_score = excluded.composite_score,
                entry_risk_score = excluded.entry_risk_score,
                regime = excluded.regime,
                spy_d_count = excluded.spy_d_count,
                qqq_d_count = excluded.qqq_d_count,
                spy_5day_delta = excluded.spy_5day_delta,
                qqq_5day_delta = excluded.qqq_5day_delta,
                d_day_trend = excluded.d_day_trend,
                market_phase = excluded.market_phase,
                rally_day = excluded.rally_day,
                has_confirmed_ftd = excluded.has_confirmed_ftd,
                es_change_pct = excluded.es_change_pct,
                nq_change_pct = excluded.nq_change_pct,
                ym_change_pct = excluded.ym_change_pct,
                fear_greed_score = excluded.fear_greed_score,
                fear_greed_rating = excluded.fear_greed_rating,
                vix_close = excluded.vix_close
            "#,
        )
        .bind(alert.date)
        .bind(alert.composite_score)
        .bind(alert.entry_risk_score)
        .bind(regime_str(alert.regime))
        .bind(alert.spy_d_count as i64)
        .bind(alert.qqq_d_count as i64)
        .bind(alert.spy_5day_delta as i64)
        .bind(alert.qqq_5day_delta as i64)
        .bind(d_day_trend_str(alert.d_day_trend))
        .bind(market_phase_str(alert.market_phase))
        .bind(alert.rally_day.map(|v| v as i64))
        .bind(alert.has_confirmed_ftd)
        .bind(alert.es_change_pct)
        .bind(alert.nq_change_pct)
        .bind(alert.ym_change_pct)
        .bind(alert.fear_greed_score.map(|v| v as i64))
        .bind(&alert.fear_greed_rating)
        .bind(alert.vix_close)
        .execute(&self.database.pool)
        .await?;
        Ok(())
    }

    async fn latest(&self) -> Result<Option<MarketRegimeAlert>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM market_regime_alerts ORDER BY date DESC LIMIT 1")
            .fetch_optional(&self.database.pool)
            .await?;
        row.as_ref().map(row_to_alert).transpose()
    }

    async fn for_date(&self, date: NaiveDate) -> Result<Option<MarketRegimeAlert>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM market_regime_alerts WHERE date = ?")
            .bind(date)
            .fetch_optional(&self.database.pool)
            .await?;
        row.as_ref().map(row_to_alert).transpose()
    }

    async fn range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<MarketRegimeAlert>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM market_regime_alerts WHERE date >= ? AND date <= ? ORDER BY date")
            .bind(start)
            .bind(end)
            .fetch_all(&self.database.pool)
            .await?;
        rows.iter().map(row_to_alert).collect()
    }
}
