//! Integration tests for the table registry, using a mock simulation.

use std::sync::Arc;

use tetrahall_protocol::{GameOverReason, TableId, TableStatus, User, UserId};
use tetrahall_registry::{
    GameSim, RegistryError, SimError, TableRegistry, GAME_SECONDS,
};
use tokio::time::{self, Duration};

// =========================================================================
// Mock simulations
// =========================================================================

/// A simulation that just records whether it is running.
#[derive(Debug)]
struct NoopSim {
    running: bool,
}

impl GameSim for NoopSim {
    fn new_game(
        _height: usize,
        _width: usize,
        _lookahead: usize,
        _tick_ms: u64,
    ) -> Result<Self, SimError> {
        Ok(Self { running: false })
    }

    fn start(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

/// A simulation whose construction always fails.
#[derive(Debug)]
struct BrokenSim;

impl GameSim for BrokenSim {
    fn new_game(
        _height: usize,
        _width: usize,
        _lookahead: usize,
        _tick_ms: u64,
    ) -> Result<Self, SimError> {
        Err(SimError("engine unavailable".into()))
    }

    fn start(&mut self) {}
    fn stop(&mut self) {}
}

fn user(uid: u64) -> Arc<User> {
    Arc::new(User::new(uid, format!("user-{uid}")))
}

fn registry() -> TableRegistry<NoopSim> {
    TableRegistry::new()
}

// =========================================================================
// Registry / index consistency
// =========================================================================

#[test]
fn test_index_tracks_id_map_through_create_and_delete() {
    let reg = registry();
    for raw in [5u64, 1, 9, 3] {
        reg.new_table(TableId(raw), "t", "10.0.0.1:9000", 0).unwrap();
    }
    assert_eq!(
        reg.sorted_ids(),
        vec![TableId(1), TableId(3), TableId(5), TableId(9)]
    );
    assert_eq!(reg.len(), 4);

    reg.del_table(TableId(5));
    assert_eq!(reg.sorted_ids(), vec![TableId(1), TableId(3), TableId(9)]);
    assert_eq!(reg.len(), 3);
    assert!(reg.get(TableId(5)).is_none());

    // Idempotent delete.
    reg.del_table(TableId(5));
    assert_eq!(reg.len(), 3);
}

#[test]
fn test_new_table_duplicate_id_fails_and_changes_nothing() {
    let reg = registry();
    let first = reg.new_table(TableId(7), "original", "10.0.0.1:9000", 50).unwrap();
    let err = reg
        .new_table(TableId(7), "impostor", "10.0.0.2:9000", 99)
        .unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyExists(TableId(7))));

    assert_eq!(reg.len(), 1);
    assert_eq!(reg.sorted_ids(), vec![TableId(7)]);
    let kept = reg.get(TableId(7)).unwrap();
    assert!(Arc::ptr_eq(&first, &kept));
    assert_eq!(kept.title(), "original");
    assert_eq!(kept.bet(), 50);
}

#[test]
fn test_join_unknown_table_is_not_found() {
    let reg = registry();
    let err = reg.join_table(TableId(1), user(10), false).unwrap_err();
    assert!(matches!(err, RegistryError::NotFound(TableId(1))));
    assert!(reg.is_empty());
}

// =========================================================================
// Seats, observers, readiness
// =========================================================================

#[test]
fn test_seats_fill_in_order_and_reject_a_third_player() {
    let reg = registry();
    reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();

    reg.join_table(TableId(1), user(10), false).unwrap();
    reg.join_table(TableId(1), user(20), false).unwrap();
    let err = reg.join_table(TableId(1), user(30), false).unwrap_err();
    assert!(matches!(err, RegistryError::RoomFull(TableId(1))));

    let table = reg.get(TableId(1)).unwrap();
    assert!(table.is_full());
    assert_eq!(table.player_uids(), vec![UserId(10), UserId(20)]);
}

#[test]
fn test_joining_a_half_full_table_leaves_the_other_seat_untouched() {
    let reg = registry();
    let table = reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    table.join(user(10)).unwrap();
    table.join(user(20)).unwrap();

    table.quit(UserId(10));
    assert!(!table.is_full());

    table.join(user(30)).unwrap();
    assert_eq!(table.player_uids(), vec![UserId(30), UserId(20)]);
    assert_eq!(table.opponent_of(UserId(20)), Some(UserId(30)));
    assert!(table.is_player_one(UserId(30)));
}

#[test]
fn test_observers_join_even_when_seats_are_full() {
    let reg = registry();
    let table = reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    table.join(user(10)).unwrap();
    table.join(user(20)).unwrap();

    reg.join_table(TableId(1), user(30), true).unwrap();
    assert_eq!(table.observer_uids(), vec![UserId(30)]);
    assert!(table.contains_user(UserId(30)));

    let mut all = table.all_user_uids();
    all.sort();
    assert_eq!(all, vec![UserId(10), UserId(20), UserId(30)]);
}

#[test]
fn test_quit_vacates_seat_and_clears_its_ready_flag() {
    let reg = registry();
    let table = reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    table.join(user(10)).unwrap();
    table.join(user(20)).unwrap();
    table.switch_ready(UserId(10));
    table.switch_ready(UserId(20));
    assert!(table.should_start());

    table.quit(UserId(10));
    let view = table.view();
    assert!(view.player_one.is_none());
    assert!(!view.player_one_ready);
    assert!(view.player_two_ready);
    assert!(!table.should_start());

    // Unknown uid is a no-op.
    table.quit(UserId(99));
    assert_eq!(table.player_uids(), vec![UserId(20)]);
}

#[test]
fn test_switch_ready_ignores_non_players() {
    let reg = registry();
    let table = reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    table.join(user(10)).unwrap();
    table.join_observer(user(30));

    table.switch_ready(UserId(30));
    table.switch_ready(UserId(99));
    let view = table.view();
    assert!(!view.player_one_ready);
    assert!(!view.player_two_ready);

    table.switch_ready(UserId(10));
    assert!(table.view().player_one_ready);
    table.switch_ready(UserId(10));
    assert!(!table.view().player_one_ready);
}

// =========================================================================
// Expiry policy
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_empty_table_expires_after_ten_seconds() {
    let reg = registry();
    let table = reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();

    time::advance(Duration::from_secs(10)).await;
    assert!(!table.expired(), "boundary value must not expire");

    time::advance(Duration::from_millis(1)).await;
    assert!(table.expired());
}

#[tokio::test(start_paused = true)]
async fn test_occupied_waiting_table_expires_after_an_hour() {
    let reg = registry();
    let table = reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    table.join(user(10)).unwrap();

    time::advance(Duration::from_secs(3600)).await;
    assert!(!table.expired());

    time::advance(Duration::from_millis(1)).await;
    assert!(table.expired());
}

#[tokio::test(start_paused = true)]
async fn test_running_game_expires_after_five_minutes() {
    let reg = registry();
    let table = reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    table.join(user(10)).unwrap();
    table.join(user(20)).unwrap();
    table.start_game().unwrap();

    time::advance(Duration::from_secs(300)).await;
    assert!(!table.expired());

    time::advance(Duration::from_millis(1)).await;
    assert!(table.expired());
}

#[tokio::test(start_paused = true)]
async fn test_sweep_snapshots_but_does_not_remove() {
    let reg = registry();
    reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    reg.new_table(TableId(2), "t", "10.0.0.1:9000", 0).unwrap();
    reg.get(TableId(2)).unwrap().join(user(10)).unwrap();

    time::advance(Duration::from_secs(11)).await;
    reg.scan_expired();

    let expired: Vec<TableId> = reg.expired_tables().into_iter().map(|(id, _)| id).collect();
    assert_eq!(expired, vec![TableId(1)], "only the empty table is stale");
    assert_eq!(reg.len(), 2, "detection must not remove from the live map");
}

#[tokio::test(start_paused = true)]
async fn test_background_scan_flags_stale_tables() {
    let reg = registry();
    reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    let _scan = reg.start_expiry_scan();
    tokio::task::yield_now().await;
    assert!(reg.expired_tables().is_empty(), "fresh table is not flagged");

    time::advance(Duration::from_secs(16)).await;
    tokio::task::yield_now().await;
    let expired: Vec<TableId> = reg.expired_tables().into_iter().map(|(id, _)| id).collect();
    assert_eq!(expired, vec![TableId(1)]);
}

#[tokio::test(start_paused = true)]
async fn test_release_expired_is_idempotent() {
    let reg = registry();
    reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    time::advance(Duration::from_secs(11)).await;
    reg.scan_expired();

    reg.release_expired(TableId(1));
    assert!(reg.get(TableId(1)).is_none());
    assert!(reg.expired_tables().is_empty());
    assert!(reg.sorted_ids().is_empty());

    // Second release of the same id: no-op, no panic.
    reg.release_expired(TableId(1));
    assert!(reg.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_del_table_drops_expired_snapshot_entry() {
    let reg = registry();
    reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    time::advance(Duration::from_secs(11)).await;
    reg.scan_expired();
    assert_eq!(reg.expired_tables().len(), 1);

    reg.del_table(TableId(1));
    assert!(reg.get(TableId(1)).is_none());
    assert!(reg.expired_tables().is_empty());
    assert!(reg.sorted_ids().is_empty());
}

// =========================================================================
// Game lifecycle and countdown
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_start_game_runs_countdown_ticks() {
    let reg = registry();
    let table = reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    table.join(user(10)).unwrap();
    table.join(user(20)).unwrap();

    let mut ticks = table.take_tick_rx().unwrap();
    assert!(table.take_tick_rx().is_none(), "receiver is handed out once");

    table.start_game().unwrap();
    assert_eq!(table.status(), TableStatus::InGame);

    assert_eq!(ticks.recv().await, Some(GAME_SECONDS - 1));
    assert_eq!(ticks.recv().await, Some(GAME_SECONDS - 2));
}

#[tokio::test(start_paused = true)]
async fn test_countdown_timeout_signals_game_over() {
    let reg = registry();
    let table = reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    table.join(user(10)).unwrap();
    table.join(user(20)).unwrap();

    // Nobody drains the tick channel: it fills to its bound and the
    // countdown must keep going regardless.
    let mut game_over = table.take_game_over_rx().unwrap();
    table.start_game().unwrap();

    assert_eq!(game_over.recv().await, Some(GameOverReason::Timeout));
    assert!(table.remained_seconds() <= 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_game_ends_countdown_without_signal() {
    let reg = registry();
    let table = reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    table.join(user(10)).unwrap();
    table.join(user(20)).unwrap();

    let mut game_over = table.take_game_over_rx().unwrap();
    table.start_game().unwrap();
    table.stop_game();
    assert_eq!(table.status(), TableStatus::Waiting);
    table.with_sims(|one, two| {
        assert!(one.is_some() && two.is_some(), "stop keeps sims until reset");
    });

    time::advance(Duration::from_secs(200)).await;
    assert!(
        game_over.try_recv().is_err(),
        "a stopped game must not report a timeout"
    );
}

#[tokio::test(start_paused = true)]
async fn test_reset_table_restores_the_waiting_baseline() {
    let reg = registry();
    let table = reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    table.join(user(10)).unwrap();
    table.join(user(20)).unwrap();
    table.switch_ready(UserId(10));
    table.switch_ready(UserId(20));
    table.start_game().unwrap();
    table.stop_game();

    table.reset_table();
    let view = table.view();
    assert_eq!(view.status, TableStatus::Waiting);
    assert!(!view.player_one_ready);
    assert!(!view.player_two_ready);
    assert_eq!(table.remained_seconds(), GAME_SECONDS);
    table.with_sims(|one, two| {
        assert!(one.is_none() && two.is_none());
    });
}

#[tokio::test(start_paused = true)]
async fn test_start_game_propagates_simulation_failure() {
    let reg: TableRegistry<BrokenSim> = TableRegistry::new();
    let table = reg.new_table(TableId(1), "t", "10.0.0.1:9000", 0).unwrap();
    table.join(user(10)).unwrap();
    table.join(user(20)).unwrap();

    assert!(table.start_game().is_err());
    assert_eq!(table.status(), TableStatus::Waiting);
}

// =========================================================================
// Pagination
// =========================================================================

fn populated(count: u64) -> TableRegistry<NoopSim> {
    let reg = registry();
    for raw in 1..=count {
        reg.new_table(TableId(raw), format!("table {raw}"), "10.0.0.1:9000", 0)
            .unwrap();
    }
    reg
}

fn page_ids(views: &[tetrahall_registry::TableView]) -> Vec<u64> {
    views.iter().map(|v| v.id.0).collect()
}

#[test]
fn test_pagination_first_page() {
    let reg = populated(20);
    let page = reg.paginate(9, 1, false);
    assert_eq!(page_ids(&page), (1..=9).collect::<Vec<_>>());
}

#[test]
fn test_pagination_short_last_page_clamps_to_data() {
    let reg = populated(20);
    let page = reg.paginate(9, 3, false);
    assert_eq!(page_ids(&page), vec![19, 20]);
}

#[test]
fn test_pagination_beyond_range_lands_on_the_last_window() {
    let reg = populated(20);
    let last = reg.paginate(9, 3, false);
    let overshot = reg.paginate(9, 99, false);
    assert_eq!(page_ids(&overshot), page_ids(&last));
}

#[test]
fn test_pagination_defaults_for_non_positive_arguments() {
    let reg = populated(12);
    // Size defaults to 9, page defaults to 1.
    assert_eq!(page_ids(&reg.paginate(0, -3, false)), (1..=9).collect::<Vec<_>>());
}

#[test]
fn test_pagination_exact_page_boundary() {
    let reg = populated(9);
    assert_eq!(page_ids(&reg.paginate(9, 1, false)), (1..=9).collect::<Vec<_>>());
    // Page 2 overshoots and clamps back onto the one full page.
    assert_eq!(page_ids(&reg.paginate(9, 2, false)), (1..=9).collect::<Vec<_>>());
}

#[test]
fn test_pagination_empty_registry_returns_empty() {
    let reg = registry();
    assert!(reg.paginate(9, 1, false).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_pagination_joinable_filter_hides_running_games() {
    let reg = populated(3);
    let table = reg.get(TableId(2)).unwrap();
    table.join(user(10)).unwrap();
    table.join(user(20)).unwrap();
    table.start_game().unwrap();

    assert_eq!(page_ids(&reg.paginate(9, 1, true)), vec![1, 3]);
    assert_eq!(page_ids(&reg.paginate(9, 1, false)), vec![1, 2, 3]);
}

#[test]
fn test_view_serializes_with_stable_field_names() {
    let reg = registry();
    let table = reg.new_table(TableId(1), "high rollers", "10.0.0.1:9000", 25).unwrap();
    table.join(user(10)).unwrap();

    let json = serde_json::to_value(table.view()).unwrap();
    assert_eq!(json["id"], 1);
    assert_eq!(json["title"], "high rollers");
    assert_eq!(json["host"], "10.0.0.1:9000");
    assert_eq!(json["status"], "Waiting");
    assert_eq!(json["bet"], 25);
    assert_eq!(json["player_one"]["uid"], 10);
    assert!(json["player_two"].is_null());
    assert_eq!(json["player_one_ready"], false);
    assert_eq!(json["observers"], serde_json::json!([]));
}
