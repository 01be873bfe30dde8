//! Position data model and state machine (spec §3, §6).

use crate::domain::errors::RepositoryError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// Legal position states. The discriminant values are the numeric `state`
/// stored on `Position` (spec §3): numeric so the sentinel `-1.5`
/// (`WatchingExited`) sorts between `Closed` (-2) and `Watchlist` (0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionState(pub f64);

impl PositionState {
    pub const STOPPED_OUT: PositionState = PositionState(-2.0);
    pub const MANUAL_EXIT: PositionState = PositionState(-1.0);
    pub const WATCHING_EXITED: PositionState = PositionState(-1.5);
    pub const WATCHLIST: PositionState = PositionState(0.0);
    pub const ENTRY1: PositionState = PositionState(1.0);
    pub const ENTRY2: PositionState = PositionState(2.0);
    pub const ENTRY3: PositionState = PositionState(3.0);
    pub const TP1_TAKEN: PositionState = PositionState(4.0);
    pub const TP2_TAKEN: PositionState = PositionState(5.0);
    pub const TRAILING: PositionState = PositionState(6.0);

    pub fn is_terminal(&self) -> bool {
        *self == Self::STOPPED_OUT || *self == Self::MANUAL_EXIT
    }

    pub fn is_watchlist(&self) -> bool {
        *self == Self::WATCHLIST
    }

    pub fn is_watching_exited(&self) -> bool {
        *self == Self::WATCHING_EXITED
    }

    /// `state >= 1` per spec §3/§4.8 "PositionWorker target set".
    pub fn is_active_entry(&self) -> bool {
        self.0 >= Self::ENTRY1.0
    }
}

impl Eq for PositionState {}

/// One of the three possible entry tranches (spec §3 "Entry tranches").
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EntryTranche {
    pub shares: Decimal,
    pub price: Decimal,
    pub date: Option<NaiveDate>,
}

impl EntryTranche {
    pub fn is_filled(&self) -> bool {
        self.shares > Decimal::ZERO && self.price > Decimal::ZERO
    }
}

/// One of the two profit-taking tranches (spec §3 "Exit tranches").
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExitTranche {
    pub sold: Decimal,
    pub price: Decimal,
    pub date: Option<NaiveDate>,
}

/// A tracked instrument with a CAN-SLIM state machine (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: i64,
    pub symbol: String,
    pub portfolio: String,
    pub state: PositionState,

    pub e1: EntryTranche,
    pub e2: EntryTranche,
    pub e3: EntryTranche,
    pub tp1: ExitTranche,
    pub tp2: ExitTranche,

    // Derived, recomputed by the repository on every tranche-affecting update.
    pub total_shares: Decimal,
    pub avg_cost: Decimal,
    pub current_pnl_pct: f64,

    // Sticky once explicitly set by the caller (spec §3 invariants).
    pub stop_price: Option<Decimal>,
    pub tp1_target: Option<Decimal>,
    pub tp2_target: Option<Decimal>,

    /// Percent-below-avg-cost / percent-above-avg-cost used to compute the
    /// *default* stop/tp targets when not explicitly overridden. Grounded on
    /// `original_source/data/repositories/position_repo.py`'s
    /// `avg_cost * (1 - hard_stop_pct/100)` formula.
    pub hard_stop_pct: f64,
    pub tp1_pct: f64,
    pub tp2_pct: f64,

    // Chart metadata
    pub pattern: Option<String>,
    pub base_stage: Option<String>,
    pub base_depth: Option<f64>,
    pub base_length: Option<f64>,
    pub pivot: Option<Decimal>,
    pub pivot_set_date: Option<NaiveDate>,
    pub original_pivot: Option<Decimal>,

    // Ratings
    pub rs_rating: Option<u8>,
    pub eps_rating: Option<u8>,
    pub comp_rating: Option<u8>,
    pub ad_rating: Option<String>,
    pub industry_rank: Option<u32>,
    pub fund_count: Option<u32>,

    // Scoring cache
    pub entry_grade: Option<String>,
    pub entry_score: Option<i32>,

    // Market-facing cache
    pub last_price: Option<Decimal>,
    pub last_price_time: Option<DateTime<Utc>>,
    pub avg_volume_50d: Option<u64>,
    pub earnings_date: Option<NaiveDate>,

    // Lifecycle flags
    pub needs_sheet_sync: bool,
    pub watching_exited_since: Option<DateTime<Utc>>,
    pub ma_test_count: u32,
}

impl Position {
    pub fn new(symbol: impl Into<String>, portfolio: impl Into<String>) -> Self {
        Self {
            id: 0,
            symbol: symbol.into(),
            portfolio: portfolio.into(),
            state: PositionState::WATCHLIST,
            e1: EntryTranche::default(),
            e2: EntryTranche::default(),
            e3: EntryTranche::default(),
            tp1: ExitTranche::default(),
            tp2: ExitTranche::default(),
            total_shares: Decimal::ZERO,
            avg_cost: Decimal::ZERO,
            current_pnl_pct: 0.0,
            stop_price: None,
            tp1_target: None,
            tp2_target: None,
            hard_stop_pct: 7.0,
            tp1_pct: 20.0,
            tp2_pct: 25.0,
            pattern: None,
            base_stage: None,
            base_depth: None,
            base_length: None,
            pivot: None,
            pivot_set_date: None,
            original_pivot: None,
            rs_rating: None,
            eps_rating: None,
            comp_rating: None,
            ad_rating: None,
            industry_rank: None,
            fund_count: None,
            entry_grade: None,
            entry_score: None,
            last_price: None,
            last_price_time: None,
            avg_volume_50d: None,
            earnings_date: None,
            needs_sheet_sync: false,
            watching_exited_since: None,
            ma_test_count: 0,
        }
    }

    /// Set `pivot` and `pivot_set_date` atomically (spec §3 invariant).
    pub fn set_pivot(&mut self, pivot: Decimal, today: NaiveDate) {
        self.pivot = Some(pivot);
        self.pivot_set_date = Some(today);
    }

    /// `total_shares = Σe.shares - Σtp.sold`, `avg_cost` over acquired shares
    /// only (spec §3 invariants, testable property 1).
    pub fn recalculate_derived(&mut self) {
        let acquired: Decimal = [self.e1, self.e2, self.e3]
            .iter()
            .map(|t| t.shares)
            .sum();
        let sold: Decimal = self.tp1.sold + self.tp2.sold;
        self.total_shares = (acquired - sold).max(Decimal::ZERO);

        let cost: Decimal = [self.e1, self.e2, self.e3]
            .iter()
            .map(|t| t.shares * t.price)
            .sum();
        self.avg_cost = if acquired > Decimal::ZERO {
            cost / acquired
        } else {
            Decimal::ZERO
        };
    }

    /// Recompute `current_pnl_pct` from a live price (spec `update_price`).
    pub fn recalculate_pnl(&mut self, price: Decimal) {
        if self.avg_cost > Decimal::ZERO {
            let pct = (price - self.avg_cost) / self.avg_cost * Decimal::ONE_HUNDRED;
            self.current_pnl_pct = pct.to_f64().unwrap_or(0.0);
        } else {
            self.current_pnl_pct = 0.0;
        }
    }

    /// Recompute `stop_price`/`tp1_target`/`tp2_target` from `avg_cost`
    /// unless the caller explicitly set them in this same update
    /// (sticky-override semantics, spec §3/§4.3, testable property 2).
    pub fn apply_default_targets(&mut self, skip_stop: bool, skip_tp1: bool, skip_tp2: bool) {
        if self.avg_cost <= Decimal::ZERO {
            return;
        }
        let hundred = Decimal::ONE_HUNDRED;
        if !skip_stop {
            self.stop_price =
                Some(self.avg_cost * (Decimal::ONE - Decimal::from_f64(self.hard_stop_pct).unwrap_or_default() / hundred));
        }
        if !skip_tp1 {
            self.tp1_target =
                Some(self.avg_cost * (Decimal::ONE + Decimal::from_f64(self.tp1_pct).unwrap_or_default() / hundred));
        }
        if !skip_tp2 {
            self.tp2_target =
                Some(self.avg_cost * (Decimal::ONE + Decimal::from_f64(self.tp2_pct).unwrap_or_default() / hundred));
        }
    }

    /// Validate `state >= 1 => e1 filled` invariant (spec §3).
    pub fn validate_entry_invariant(&self) -> bool {
        if self.state.0 >= PositionState::ENTRY1.0 {
            return self.e1.is_filled();
        }
        true
    }
}

/// A requested state transition plus the fields supplied to satisfy it
/// (spec §6 state machine table).
#[derive(Debug, Clone, Default)]
pub struct TransitionFields {
    pub e1_shares: Option<Decimal>,
    pub e1_price: Option<Decimal>,
    pub e2_shares: Option<Decimal>,
    pub e2_price: Option<Decimal>,
    pub e3_shares: Option<Decimal>,
    pub e3_price: Option<Decimal>,
    pub tp1_sold: Option<Decimal>,
    pub tp1_price: Option<Decimal>,
    pub tp2_sold: Option<Decimal>,
    pub tp2_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    pub new_pivot: Option<Decimal>,
    pub exit_date: Option<NaiveDate>,
    pub exit_price: Option<Decimal>,
    pub exit_reason: Option<String>,
}

/// Validate a requested transition against the state machine table in
/// spec §6. Returns `Ok(())` if `to` is reachable from `from` and all
/// required fields are present; otherwise an error describing what's
/// missing or why the transition itself is illegal.
pub fn validate_transition(
    from: PositionState,
    to: PositionState,
    fields: &TransitionFields,
) -> Result<(), RepositoryError> {
    use PositionState as S;

    let require = |present: bool, field: &'static str| -> Result<(), RepositoryError> {
        if present {
            Ok(())
        } else {
            Err(RepositoryError::MissingTransitionField {
                from: from.0,
                to: to.0,
                field,
            })
        }
    };

    match (from, to) {
        (S::WATCHLIST, S::ENTRY1) => {
            require(fields.e1_shares.is_some(), "e1_shares")?;
            require(fields.e1_price.is_some(), "e1_price")?;
            require(fields.stop_price.is_some(), "stop_price")?;
            Ok(())
        }
        (S::ENTRY1, S::ENTRY2) => {
            require(fields.e2_shares.is_some(), "e2_shares")?;
            require(fields.e2_price.is_some(), "e2_price")
        }
        (S::ENTRY2, S::ENTRY3) => {
            require(fields.e3_shares.is_some(), "e3_shares")?;
            require(fields.e3_price.is_some(), "e3_price")
        }
        (S::ENTRY1, S::ENTRY3) => {
            // Skip-fill: either tranche pair must be present.
            let has_e2 = fields.e2_shares.is_some() && fields.e2_price.is_some();
            let has_e3 = fields.e3_shares.is_some() && fields.e3_price.is_some();
            if has_e2 || has_e3 {
                Ok(())
            } else {
                Err(RepositoryError::MissingTransitionField {
                    from: from.0,
                    to: to.0,
                    field: "e2_or_e3_tranche",
                })
            }
        }
        (S::ENTRY1, S::TP1_TAKEN) | (S::ENTRY2, S::TP1_TAKEN) => {
            require(fields.tp1_sold.is_some(), "tp1_sold")?;
            require(fields.tp1_price.is_some(), "tp1_price")
        }
        (S::ENTRY2, S::TP2_TAKEN) | (S::ENTRY3, S::TP2_TAKEN) | (S::TP1_TAKEN, S::TP2_TAKEN) => {
            require(fields.tp2_sold.is_some(), "tp2_sold")?;
            require(fields.tp2_price.is_some(), "tp2_price")
        }
        (S::ENTRY2, S::TRAILING) | (S::ENTRY3, S::TRAILING) | (S::TP1_TAKEN, S::TRAILING) => Ok(()),
        (from, S::MANUAL_EXIT) if from.0 >= S::ENTRY1.0 && from.0 <= S::TRAILING.0 => {
            require(fields.exit_date.is_some(), "exit_date")?;
            require(fields.exit_price.is_some(), "exit_price")?;
            require(fields.exit_reason.is_some(), "exit_reason")
        }
        (from, S::STOPPED_OUT) if from.0 >= S::ENTRY1.0 && from.0 <= S::TRAILING.0 => {
            require(fields.exit_date.is_some(), "exit_date")?;
            require(fields.exit_price.is_some(), "exit_price")
        }
        (S::WATCHLIST, S::MANUAL_EXIT) => Ok(()),
        (from, S::WATCHING_EXITED)
            if from == S::STOPPED_OUT || from == S::MANUAL_EXIT || from.0 >= S::ENTRY1.0 =>
        {
            require(fields.exit_price.is_some(), "exit_price")?;
            require(fields.exit_reason.is_some(), "exit_reason")
        }
        (S::WATCHING_EXITED, S::WATCHLIST) => require(fields.new_pivot.is_some(), "new_pivot"),
        (S::WATCHING_EXITED, S::ENTRY1) => {
            require(fields.e1_shares.is_some(), "e1_shares")?;
            require(fields.e1_price.is_some(), "e1_price")?;
            require(fields.stop_price.is_some(), "stop_price")
        }
        (S::WATCHING_EXITED, S::STOPPED_OUT) => Ok(()),
        _ => Err(RepositoryError::IllegalTransition(from.0, to.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tranche(shares: Decimal, price: Decimal) -> EntryTranche {
        EntryTranche {
            shares,
            price,
            date: None,
        }
    }

    #[test]
    fn recalc_total_shares_and_avg_cost() {
        let mut p = Position::new("NVDA", "default");
        p.e1 = tranche(dec!(100), dec!(10));
        p.e2 = tranche(dec!(100), dec!(20));
        p.tp1.sold = dec!(50);
        p.recalculate_derived();
        assert_eq!(p.total_shares, dec!(150));
        assert_eq!(p.avg_cost, dec!(15));
    }

    #[test]
    fn sticky_override_is_respected() {
        let mut p = Position::new("AMD", "default");
        p.e1 = tranche(dec!(100), dec!(100));
        p.recalculate_derived();
        p.stop_price = Some(dec!(42)); // explicit user override
        p.apply_default_targets(true, false, false);
        assert_eq!(p.stop_price, Some(dec!(42)));
        assert!(p.tp1_target.is_some());
    }

    #[test]
    fn legal_transition_requires_fields() {
        let err = validate_transition(
            PositionState::WATCHLIST,
            PositionState::ENTRY1,
            &TransitionFields::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::MissingTransitionField { field: "e1_shares", .. }
        ));
    }

    #[test]
    fn illegal_transition_is_rejected() {
        let err = validate_transition(
            PositionState::WATCHLIST,
            PositionState::TP2_TAKEN,
            &TransitionFields::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RepositoryError::IllegalTransition(_, _)));
    }
}
