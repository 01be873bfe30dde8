//! Scenario S3: stop-out, watchlist re-entry, and the watching-exited
//! expiry path (spec §8 "S3 — Re-entry lifecycle").

use canslim_monitor::domain::position::{Position, PositionState, TransitionFields};
use canslim_monitor::domain::repositories::PositionRepository;
use canslim_monitor::infrastructure::persistence::Database;
use canslim_monitor::infrastructure::persistence::repositories::SqlitePositionRepository;
use rust_decimal_macros::dec;

async fn fresh_repo() -> (SqlitePositionRepository, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("positions.db");
    let database = Database::new(&format!("sqlite://{}", path.display())).await.unwrap();
    (SqlitePositionRepository::new(database), dir)
}

#[tokio::test]
async fn stop_out_then_return_to_watchlist_with_a_new_pivot() {
    let (repo, _dir) = fresh_repo().await;

    let mut position = Position::new("X", "default");
    position.pivot = Some(dec!(100));
    let position = repo.create(position).await.unwrap();

    let entry_fields = TransitionFields {
        e1_shares: Some(dec!(100)),
        e1_price: Some(dec!(100)),
        stop_price: Some(dec!(93)),
        ..Default::default()
    };
    repo.transition(position.id, PositionState::ENTRY1, entry_fields).await.unwrap();

    let stop_fields = TransitionFields {
        exit_price: Some(dec!(92)),
        exit_reason: Some("hard stop".to_string()),
        ..Default::default()
    };
    let watching = repo
        .transition(position.id, PositionState::WATCHING_EXITED, stop_fields)
        .await
        .unwrap();

    assert_eq!(watching.state, PositionState::WATCHING_EXITED);
    assert_eq!(watching.original_pivot, Some(dec!(100)));
    assert!(!watching.e1.is_filled());
    assert_eq!(watching.total_shares, dec!(0));
    assert!(watching.watching_exited_since.is_some());

    let reentry_fields = TransitionFields { new_pivot: Some(dec!(120)), ..Default::default() };
    let back_on_watchlist = repo.transition(position.id, PositionState::WATCHLIST, reentry_fields).await.unwrap();

    assert_eq!(back_on_watchlist.state, PositionState::WATCHLIST);
    assert_eq!(back_on_watchlist.pivot, Some(dec!(120)));
    assert!(back_on_watchlist.watching_exited_since.is_none());
}

#[tokio::test]
async fn watching_exited_position_can_expire_to_stopped_out() {
    let (repo, _dir) = fresh_repo().await;

    let position = repo.create(Position::new("Y", "default")).await.unwrap();
    let entry_fields = TransitionFields {
        e1_shares: Some(dec!(50)),
        e1_price: Some(dec!(50)),
        stop_price: Some(dec!(45)),
        ..Default::default()
    };
    repo.transition(position.id, PositionState::ENTRY1, entry_fields).await.unwrap();

    let exit_fields = TransitionFields {
        exit_price: Some(dec!(44)),
        exit_reason: Some("hard stop".to_string()),
        ..Default::default()
    };
    repo.transition(position.id, PositionState::WATCHING_EXITED, exit_fields).await.unwrap();

    // A worker cycle 61 days later would find this position still
    // watching-exited and transition it to STOPPED_OUT (the
    // `watching_exited_expiry_days` path in `PositionWorker::run_cycle`);
    // here we exercise the underlying transition directly.
    let expired = repo
        .transition(position.id, PositionState::STOPPED_OUT, TransitionFields::default())
        .await
        .unwrap();
    assert_eq!(expired.state, PositionState::STOPPED_OUT);
}
