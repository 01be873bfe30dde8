//! Append-only field-change audit log (spec §3 PositionHistory, §9 design
//! note on snapshot reconstruction).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    ManualEdit,
    StateTransition,
    SystemCalc,
    PriceUpdate,
    Current,
}

impl std::fmt::Display for ChangeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChangeSource::ManualEdit => "manual_edit",
            ChangeSource::StateTransition => "state_transition",
            ChangeSource::SystemCalc => "system_calc",
            ChangeSource::PriceUpdate => "price_update",
            ChangeSource::Current => "current",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ChangeSource {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "manual_edit" => Self::ManualEdit,
            "state_transition" => Self::StateTransition,
            "system_calc" => Self::SystemCalc,
            "price_update" => Self::PriceUpdate,
            "current" => Self::Current,
            other => anyhow::bail!("unknown change_source: {other}"),
        })
    }
}

/// One row in the append-only history log. Key is
/// `(position_id, field_name, changed_at)` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionHistoryEntry {
    pub position_id: i64,
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub change_source: ChangeSource,
    pub changed_at: DateTime<Utc>,
}

/// A single field diff produced by a repository `update()` call (spec §4.3
/// "change capture"). Only fields that actually changed produce an entry.
pub struct FieldDiff {
    pub field_name: &'static str,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

impl FieldDiff {
    pub fn of<T: PartialEq + ToString>(
        field_name: &'static str,
        old: &Option<T>,
        new: &Option<T>,
    ) -> Option<FieldDiff> {
        if old.as_ref().map(T::to_string) == new.as_ref().map(T::to_string) {
            return None;
        }
        Some(FieldDiff {
            field_name,
            old_value: old.as_ref().map(T::to_string),
            new_value: new.as_ref().map(T::to_string),
        })
    }
}

/// Reconstruct a position snapshot as of a point in time by walking history
/// backward from the current row: materialize current state, then for each
/// change event in descending time, revert the named field to `old_value`,
/// emitting a snapshot per distinct timestamp (spec §9 design note). The
/// `apply` callback mutates a `serde_json::Value`-keyed snapshot map in
/// place; callers own the concrete position representation.
pub fn reconstruct_snapshots<F>(
    current: serde_json::Map<String, serde_json::Value>,
    history_desc: &[PositionHistoryEntry],
    mut apply: F,
) -> Vec<(DateTime<Utc>, serde_json::Map<String, serde_json::Value>)>
where
    F: FnMut(&mut serde_json::Map<String, serde_json::Value>, &str, Option<&str>),
{
    let mut snapshots = Vec::new();
    let mut working = current;
    let mut last_ts: Option<DateTime<Utc>> = None;

    for entry in history_desc {
        if last_ts != Some(entry.changed_at) {
            snapshots.push((entry.changed_at, working.clone()));
            last_ts = Some(entry.changed_at);
        }
        apply(&mut working, &entry.field_name, entry.old_value.as_deref());
    }
    snapshots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_diff_detects_change() {
        let diff = FieldDiff::of("stop_price", &Some(10.0), &Some(12.0));
        assert!(diff.is_some());
        let diff = diff.unwrap();
        assert_eq!(diff.old_value.as_deref(), Some("10"));
        assert_eq!(diff.new_value.as_deref(), Some("12"));
    }

    #[test]
    fn field_diff_skips_unchanged() {
        assert!(FieldDiff::of("stop_price", &Some(10.0), &Some(10.0)).is_none());
    }

    #[test]
    fn reconstruct_walks_backward_per_timestamp() {
        use chrono::TimeZone;
        let mut current = serde_json::Map::new();
        current.insert("stop_price".into(), serde_json::json!("12"));

        let t1 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let history = vec![PositionHistoryEntry {
            position_id: 1,
            field_name: "stop_price".into(),
            old_value: Some("10".into()),
            new_value: Some("12".into()),
            change_source: ChangeSource::ManualEdit,
            changed_at: t1,
        }];

        let snaps = reconstruct_snapshots(current, &history, |map, field, old| {
            map.insert(
                field.to_string(),
                serde_json::json!(old.unwrap_or_default()),
            );
        });
        assert_eq!(snaps.len(), 1);
        assert_eq!(snaps[0].1["stop_price"], serde_json::json!("12"));
    }
}
