//! The checker suite: stateless, reentrant rule evaluators run by the
//! workers against a `PositionContext` snapshot (spec §4.8).

mod alt_entry_checker;
mod breakout_checker;
mod health_checker;
mod ma_checker;
mod profit_checker;
mod pyramid_checker;
mod stop_checker;

pub use alt_entry_checker::AltEntryChecker;
pub use breakout_checker::BreakoutChecker;
pub use health_checker::HealthChecker;
pub use ma_checker::MaChecker;
pub use profit_checker::ProfitChecker;
pub use pyramid_checker::PyramidChecker;
pub use stop_checker::StopChecker;

use crate::config::Config;
use crate::domain::alert::{AlertData, AlertSnapshot};
use crate::domain::checker_context::PositionContext;
use crate::domain::repositories::AlertRepository;
use tracing::{error, warn};

/// A single rule evaluator. Implementations hold no state beyond their own
/// config; the repository is authoritative for cooldown/dedup (spec §4.8).
pub trait Checker: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, ctx: &PositionContext, config: &Config) -> Vec<AlertData>;
}

/// Build the `AlertSnapshot` every `AlertData` carries (spec §3 Alert
/// "Snapshot" fields).
pub(crate) fn snapshot(ctx: &PositionContext) -> AlertSnapshot {
    AlertSnapshot {
        price: ctx.current_price,
        pivot_at_alert: ctx.pivot,
        avg_cost_at_alert: ctx.avg_cost,
        pnl_pct_at_alert: ctx.pnl_pct,
        volume_ratio: ctx.volume_ratio,
        ma21: ctx.ma_21,
        ma50: ctx.ma_50,
        grade: ctx.grade,
        score: ctx.score,
        market_regime: ctx.market_regime,
        state_at_alert: ctx.state,
    }
}

/// A named group of checkers run together by one worker (spec §4.9: the
/// BreakoutWorker and PositionWorker each attach a different subset).
pub struct CheckerSuite {
    checkers: Vec<Box<dyn Checker>>,
}

impl CheckerSuite {
    pub fn new(checkers: Vec<Box<dyn Checker>>) -> Self {
        Self { checkers }
    }

    /// Stop/Profit/Pyramid/MA/Health, run against active (state >= 1)
    /// positions by the `PositionWorker`.
    pub fn position_suite() -> Self {
        Self::new(vec![
            Box::new(StopChecker),
            Box::new(ProfitChecker),
            Box::new(PyramidChecker),
            Box::new(MaChecker),
            Box::new(HealthChecker),
        ])
    }

    /// Breakout + AltEntry, run against watchlist positions by the
    /// `BreakoutWorker`.
    pub fn breakout_suite() -> Self {
        Self::new(vec![Box::new(BreakoutChecker), Box::new(AltEntryChecker)])
    }

    /// Run every attached checker, catching and logging panics/errors from
    /// any single one so the rest still evaluate (spec §4.8 "failure
    /// semantics"). Cooldown-suppressed duplicates are dropped here, using
    /// the repository's `latest_of_kind` as the authoritative record.
    pub async fn evaluate(
        &self,
        ctx: &PositionContext,
        config: &Config,
        alert_repo: &dyn AlertRepository,
    ) -> Vec<AlertData> {
        let mut out = Vec::new();
        for checker in &self.checkers {
            let candidates = self.run_one(checker.as_ref(), ctx, config);
            for candidate in candidates {
                match self.in_cooldown(&candidate, ctx, config, alert_repo).await {
                    Ok(true) => continue,
                    Ok(false) => out.push(candidate),
                    Err(e) => {
                        warn!(checker = checker.name(), error = %e, "cooldown lookup failed, emitting anyway");
                        out.push(candidate);
                    }
                }
            }
        }
        out
    }

    /// Status-check mode (spec §4.8 "bypass cooldowns ... used by the
    /// GUI"): no repository calls, no persistence, used for read-only
    /// dashboards.
    pub fn evaluate_status(&self, ctx: &PositionContext, config: &Config) -> Vec<AlertData> {
        self.checkers
            .iter()
            .flat_map(|checker| self.run_one(checker.as_ref(), ctx, config))
            .collect()
    }

    fn run_one(&self, checker: &dyn Checker, ctx: &PositionContext, config: &Config) -> Vec<AlertData> {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| checker.check(ctx, config)));
        match result {
            Ok(alerts) => alerts,
            Err(_) => {
                error!(checker = checker.name(), symbol = %ctx.symbol, "checker panicked, skipping");
                Vec::new()
            }
        }
    }

    async fn in_cooldown(
        &self,
        candidate: &AlertData,
        ctx: &PositionContext,
        config: &Config,
        alert_repo: &dyn AlertRepository,
    ) -> Result<bool, crate::domain::errors::RepositoryError> {
        let alert_type = candidate.alert_type.to_string();
        let alert_subtype = candidate.alert_subtype.to_string();
        let cooldown_minutes = config.alerts.cooldown_for(&alert_type, &alert_subtype);
        if cooldown_minutes <= 0 {
            return Ok(false);
        }
        let latest = alert_repo
            .latest_of_kind(ctx.position_id, &alert_type, &alert_subtype)
            .await?;
        Ok(match latest {
            Some(prev) => {
                let elapsed = ctx.now.signed_duration_since(prev.alert_time);
                elapsed < chrono::Duration::minutes(cooldown_minutes)
            }
            None => false,
        })
    }
}
