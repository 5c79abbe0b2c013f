use chrono::{Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use dailydo_core::db::{open_db, open_db_in_memory};
use dailydo_core::repo::task_store::{DAILY_TASKS_KEY, GENERAL_TASKS_KEY, LAST_RESET_DATE_KEY};
use dailydo_core::{
    Clock, KeyValueStore, ListKind, ManualClock, ResetTrigger, SqliteKvStore, TaskBoard,
};

const TWO_TASKS: &str = r#"[
    {"id":"6f1c1c1e-8a55-4d55-9a6f-0f3f7a6f9a01","text":"a","completed":false,"date":"2024-04-30T09:00:00Z"},
    {"id":"6f1c1c1e-8a55-4d55-9a6f-0f3f7a6f9a02","text":"b","completed":true,"date":"2024-04-30T09:05:00Z"}
]"#;

fn kv() -> SqliteKvStore {
    SqliteKvStore::try_new(open_db_in_memory().unwrap()).unwrap()
}

fn clock() -> ManualClock {
    ManualClock::utc(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap())
}

fn seed(kv: &SqliteKvStore, marker: &str) {
    kv.set(DAILY_TASKS_KEY, TWO_TASKS).unwrap();
    kv.set(GENERAL_TASKS_KEY, TWO_TASKS).unwrap();
    kv.set(LAST_RESET_DATE_KEY, marker).unwrap();
}

#[test]
fn marker_from_today_keeps_daily_tasks() {
    let kv = kv();
    let clock = clock();
    seed(&kv, "2024-05-01");

    let board = TaskBoard::open(&kv, &clock).unwrap();

    assert_eq!(board.daily().len(), 2);
    assert_eq!(board.general().len(), 2);
    assert_eq!(board.last_reset(), clock.today());
}

#[test]
fn marker_from_yesterday_clears_daily_on_open() {
    let kv = kv();
    let clock = clock();
    seed(&kv, "2024-04-30");

    let board = TaskBoard::open(&kv, &clock).unwrap();

    assert!(board.daily().is_empty());
    assert_eq!(board.general().len(), 2);
    assert_eq!(kv.get(DAILY_TASKS_KEY).unwrap().as_deref(), Some("[]"));
    assert_eq!(
        kv.get(LAST_RESET_DATE_KEY).unwrap().as_deref(),
        Some("2024-05-01")
    );
}

#[test]
fn missing_or_unparseable_marker_forces_reset() {
    for marker in [None, Some("Wed May 01 2024"), Some("garbage")] {
        let kv = kv();
        let clock = clock();
        kv.set(DAILY_TASKS_KEY, TWO_TASKS).unwrap();
        if let Some(marker) = marker {
            kv.set(LAST_RESET_DATE_KEY, marker).unwrap();
        }

        let board = TaskBoard::open(&kv, &clock).unwrap();

        assert!(board.daily().is_empty(), "marker {marker:?} kept daily tasks");
        assert_eq!(
            kv.get(LAST_RESET_DATE_KEY).unwrap().as_deref(),
            Some("2024-05-01")
        );
    }
}

#[test]
fn check_is_idempotent_within_a_day() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    board.add_task(ListKind::Daily, "water plants").unwrap();

    clock.advance(Duration::hours(10));
    assert!(!board.check_for_reset().unwrap());
    assert!(!board.check_for_reset().unwrap());
    assert_eq!(board.daily().len(), 1);
}

#[test]
fn check_after_day_change_clears_only_daily() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    board.add_task(ListKind::Daily, "water plants").unwrap();
    board.add_task(ListKind::General, "file taxes").unwrap();

    clock.advance(Duration::days(1));
    assert!(board
        .check_for_reset_with(ResetTrigger::Poll)
        .unwrap());
    assert!(!board.check_for_reset().unwrap());

    assert!(board.daily().is_empty());
    assert_eq!(board.general().len(), 1);
    assert_eq!(
        board.last_reset(),
        NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
    );

    let reopened = TaskBoard::open(&kv, &clock).unwrap();
    assert!(reopened.daily().is_empty());
    assert_eq!(reopened.general().len(), 1);
}

#[test]
fn reset_follows_the_local_calendar_not_utc() {
    let kv = kv();
    // 21:30 UTC is 23:30 local at +02:00.
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 21, 30, 0).unwrap(), plus_two);
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    board.add_task(ListKind::Daily, "late task").unwrap();

    // Still 2024-05-01 in UTC, already 2024-05-02 locally.
    clock.advance(Duration::minutes(45));
    assert!(board.check_for_reset().unwrap());
    assert!(board.daily().is_empty());
}

#[test]
fn clock_moving_backwards_across_a_day_also_resets() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    board.add_task(ListKind::Daily, "a").unwrap();

    clock.advance(Duration::days(-1));

    assert!(board.check_for_reset().unwrap());
    assert!(board.daily().is_empty());
}

#[test]
fn reset_cancels_a_drag_from_the_daily_list() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    board.add_task(ListKind::Daily, "a").unwrap();
    board.add_task(ListKind::General, "b").unwrap();

    board.begin_drag(ListKind::Daily, 0).unwrap();
    clock.advance(Duration::days(1));
    board.check_for_reset().unwrap();
    assert!(board.drag_session().is_none());

    board.begin_drag(ListKind::General, 0).unwrap();
    clock.advance(Duration::days(1));
    board.check_for_reset().unwrap();
    assert!(board.drag_session().is_some());
}

#[test]
fn board_left_open_keeps_tasks_added_after_another_board_reset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dailydo.sqlite3");
    let open_kv = || SqliteKvStore::try_new(open_db(&path).unwrap()).unwrap();
    let clock = ManualClock::utc(Utc.with_ymd_and_hms(2024, 5, 1, 23, 0, 0).unwrap());

    let mut watching = TaskBoard::open(open_kv(), &clock).unwrap();
    watching.add_task(ListKind::Daily, "from yesterday").unwrap();
    clock.advance(Duration::hours(2));

    let mut one_shot = TaskBoard::open(open_kv(), &clock).unwrap();
    assert!(one_shot.daily().is_empty());
    let added = one_shot
        .add_task(ListKind::Daily, "added today")
        .unwrap()
        .unwrap();
    drop(one_shot);

    assert!(watching.check_for_reset_with(ResetTrigger::Poll).unwrap());
    assert_eq!(watching.last_reset(), clock.today());
    assert_eq!(watching.daily().len(), 1);
    assert!(watching.daily().find(added).is_some());
    assert!(!watching.check_for_reset().unwrap());

    let reopened = TaskBoard::open(open_kv(), &clock).unwrap();
    assert_eq!(reopened.daily().len(), 1);
    assert_eq!(reopened.daily().get(0).unwrap().text, "added today");
}
