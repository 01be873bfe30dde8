//! Closed-position learning record (spec §3 Outcome). Written on final
//! close; read by the (external, out-of-scope) offline learning subsystem.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    Success,
    Partial,
    Stopped,
    Failed,
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OutcomeKind::Success => "SUCCESS",
            OutcomeKind::Partial => "PARTIAL",
            OutcomeKind::Stopped => "STOPPED",
            OutcomeKind::Failed => "FAILED",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OutcomeKind {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "SUCCESS" => Self::Success,
            "PARTIAL" => Self::Partial,
            "STOPPED" => Self::Stopped,
            "FAILED" => Self::Failed,
            other => anyhow::bail!("unknown outcome kind: {other}"),
        })
    }
}

/// All scoring-at-entry factors plus the realized result (spec §3 Outcome).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub id: i64,
    pub position_id: i64,
    pub symbol: String,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_grade: Option<String>,
    pub entry_score: Option<i32>,
    pub rs_rating: Option<u8>,
    pub eps_rating: Option<u8>,
    pub pattern: Option<String>,
    pub base_stage: Option<String>,
    pub gross_pct: f64,
    pub holding_days: i64,
    pub outcome: OutcomeKind,
}
