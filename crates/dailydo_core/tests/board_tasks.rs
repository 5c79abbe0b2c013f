use chrono::{Duration, TimeZone, Utc};
use dailydo_core::db::open_db_in_memory;
use dailydo_core::repo::task_store::{
    DAILY_TASKS_KEY, GENERAL_TASKS_KEY, LAST_RESET_DATE_KEY, THEME_KEY,
};
use dailydo_core::{
    BoardError, KeyValueStore, ListKind, ManualClock, RenderedRow, SqliteKvStore, StoreError,
    StoreResult, TaskBoard, TaskList, TaskStore, Theme,
};
use std::cell::Cell;

fn kv() -> SqliteKvStore {
    SqliteKvStore::try_new(open_db_in_memory().unwrap()).unwrap()
}

/// 2024-05-01 08:00 UTC.
fn clock() -> ManualClock {
    ManualClock::utc(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap())
}

/// SQLite store that rejects writes to one key once armed.
struct FailingWrites<'a> {
    inner: &'a SqliteKvStore,
    fail_key: Cell<Option<&'static str>>,
}

impl KeyValueStore for FailingWrites<'_> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if self.fail_key.get() == Some(key) {
            return Err(StoreError::from(rusqlite::Error::InvalidQuery));
        }
        self.inner.set(key, value)
    }
}

fn texts(list: &TaskList) -> Vec<&str> {
    list.iter().map(|task| task.text.as_str()).collect()
}

fn rows_for(list: &TaskList) -> Vec<RenderedRow> {
    list.iter()
        .enumerate()
        .map(|(i, task)| RenderedRow {
            task_id: task.id,
            top: i as f64 * 40.0,
            height: 40.0,
        })
        .collect()
}

#[test]
fn add_trims_text_and_starts_incomplete() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();

    let id = board
        .add_task(ListKind::General, "  buy milk  ")
        .unwrap()
        .unwrap();

    let task = board.general().find(id).unwrap();
    assert_eq!(task.text, "buy milk");
    assert!(!task.completed);
    assert_eq!(task.date, Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());

    let reopened = TaskBoard::open(&kv, &clock).unwrap();
    assert_eq!(reopened.general().as_slice(), board.general().as_slice());
}

#[test]
fn blank_add_is_a_no_op() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();

    assert_eq!(board.add_task(ListKind::Daily, "   \t ").unwrap(), None);
    assert_eq!(board.add_task(ListKind::General, "").unwrap(), None);
    assert!(board.daily().is_empty());
    assert!(board.general().is_empty());
    assert_eq!(kv.get(GENERAL_TASKS_KEY).unwrap(), None);
}

#[test]
fn toggle_twice_restores_state_and_persists() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    let id = board.add_task(ListKind::Daily, "stretch").unwrap().unwrap();

    assert!(board.toggle_task(ListKind::Daily, id).unwrap());
    assert!(TaskBoard::open(&kv, &clock).unwrap().daily().find(id).unwrap().completed);

    assert!(!board.toggle_at(ListKind::Daily, 0).unwrap());
    assert!(!TaskBoard::open(&kv, &clock).unwrap().daily().find(id).unwrap().completed);
}

#[test]
fn delete_shrinks_list_and_shifts_later_items() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    for text in ["a", "b", "c"] {
        board.add_task(ListKind::General, text).unwrap();
    }

    let removed = board.delete_at(ListKind::General, 1).unwrap();

    assert_eq!(removed.text, "b");
    assert_eq!(texts(board.general()), ["a", "c"]);
    assert_eq!(
        texts(TaskBoard::open(&kv, &clock).unwrap().general()),
        ["a", "c"]
    );
}

#[test]
fn positional_calls_reject_out_of_range_indices() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    board.add_task(ListKind::Daily, "only").unwrap();

    let err = board.toggle_at(ListKind::Daily, 3).unwrap_err();
    assert!(matches!(
        err,
        BoardError::IndexOutOfRange {
            list: ListKind::Daily,
            index: 3,
            len: 1
        }
    ));
    assert!(matches!(
        board.delete_at(ListKind::General, 0),
        Err(BoardError::IndexOutOfRange { len: 0, .. })
    ));
}

#[test]
fn id_addressed_calls_reject_tasks_from_the_other_list() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    let id = board.add_task(ListKind::Daily, "daily").unwrap().unwrap();

    assert!(matches!(
        board.toggle_task(ListKind::General, id),
        Err(BoardError::TaskNotFound(missing)) if missing == id
    ));
    assert!(matches!(
        board.delete_task(ListKind::General, id),
        Err(BoardError::TaskNotFound(_))
    ));
    assert_eq!(board.daily().len(), 1);
}

#[test]
fn same_list_move_to_end() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    for text in ["a", "b", "c"] {
        board.add_task(ListKind::Daily, text).unwrap();
    }

    let outcome = board
        .move_task(ListKind::Daily, 0, ListKind::Daily, 3)
        .unwrap();

    assert_eq!(outcome.index, 2);
    assert_eq!(texts(board.daily()), ["b", "c", "a"]);
    assert_eq!(
        texts(TaskBoard::open(&kv, &clock).unwrap().daily()),
        ["b", "c", "a"]
    );
}

#[test]
fn cross_list_move_of_only_item_keeps_identity() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    let id = board.add_task(ListKind::Daily, "carry over").unwrap().unwrap();
    board.toggle_task(ListKind::Daily, id).unwrap();
    let before = board.daily().find(id).unwrap().clone();

    board
        .move_task(ListKind::Daily, 0, ListKind::General, 0)
        .unwrap();

    assert!(board.daily().is_empty());
    assert_eq!(board.general().as_slice(), [before]);

    let reopened = TaskBoard::open(&kv, &clock).unwrap();
    assert!(reopened.daily().is_empty());
    assert_eq!(reopened.general().find(id).map(|t| t.completed), Some(true));
}

#[test]
fn move_by_id_finds_the_source_list() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    board.add_task(ListKind::General, "a").unwrap();
    let id = board.add_task(ListKind::General, "b").unwrap().unwrap();

    let outcome = board.move_task_by_id(id, ListKind::Daily, 10).unwrap();

    assert_eq!(outcome.index, 0);
    assert_eq!(texts(board.daily()), ["b"]);
    assert_eq!(texts(board.general()), ["a"]);
}

#[test]
fn move_with_bad_source_changes_nothing() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    board.add_task(ListKind::General, "a").unwrap();

    let err = board
        .move_task(ListKind::General, 5, ListKind::Daily, 0)
        .unwrap_err();

    assert!(matches!(err, BoardError::IndexOutOfRange { index: 5, .. }));
    assert_eq!(texts(board.general()), ["a"]);
    assert!(board.daily().is_empty());
}

#[test]
fn drag_across_lists_uses_pointer_position() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    board.add_task(ListKind::Daily, "x").unwrap();
    board.add_task(ListKind::General, "a").unwrap();
    board.add_task(ListKind::General, "b").unwrap();

    let session = board.begin_drag(ListKind::Daily, 0).unwrap();
    assert_eq!(board.drag_session(), Some(&session));

    // General midpoints are 20 and 60; 45 lands between them.
    let rows = rows_for(board.general());
    let outcome = board.drop_dragged(ListKind::General, &rows, 45.0).unwrap();

    assert_eq!(outcome.task_id, session.task_id);
    assert_eq!(texts(board.general()), ["a", "x", "b"]);
    assert!(board.daily().is_empty());
    assert!(board.drag_session().is_none());
}

#[test]
fn drag_within_list_ignores_the_dragged_row() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    for text in ["a", "b", "c"] {
        board.add_task(ListKind::Daily, text).unwrap();
    }

    board.begin_drag(ListKind::Daily, 0).unwrap();
    let rows = rows_for(board.daily());
    board.drop_dragged(ListKind::Daily, &rows, 500.0).unwrap();

    assert_eq!(texts(board.daily()), ["b", "c", "a"]);
}

#[test]
fn drop_without_drag_is_an_error() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    board.add_task(ListKind::Daily, "a").unwrap();

    assert!(matches!(
        board.drop_dragged(ListKind::General, &[], 0.0),
        Err(BoardError::NoActiveDrag)
    ));

    board.begin_drag(ListKind::Daily, 0).unwrap();
    assert!(board.cancel_drag().is_some());
    assert!(matches!(
        board.drop_dragged(ListKind::General, &[], 0.0),
        Err(BoardError::NoActiveDrag)
    ));
    assert_eq!(texts(board.daily()), ["a"]);
}

#[test]
fn deleting_the_dragged_task_ends_the_drag() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    let id = board.add_task(ListKind::General, "a").unwrap().unwrap();

    board.begin_drag(ListKind::General, 0).unwrap();
    board.delete_task(ListKind::General, id).unwrap();

    assert!(board.drag_session().is_none());
}

#[test]
fn theme_toggle_persists() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    assert_eq!(board.theme(), Theme::Dark);

    assert_eq!(board.toggle_theme().unwrap(), Theme::Light);
    assert_eq!(kv.get(THEME_KEY).unwrap().as_deref(), Some("light"));
    assert_eq!(TaskBoard::open(&kv, &clock).unwrap().theme(), Theme::Light);

    board.set_theme(Theme::Dark).unwrap();
    assert_eq!(TaskBoard::open(&kv, &clock).unwrap().theme(), Theme::Dark);
}

#[test]
fn legacy_records_without_ids_load() {
    let kv = kv();
    let clock = clock();
    kv.set(
        GENERAL_TASKS_KEY,
        r#"[{"text":"old","completed":true,"date":"2024-04-30T10:00:00.000Z"},
            {"text":"older","completed":false,"date":"2024-04-29T10:00:00.000Z"}]"#,
    )
    .unwrap();

    let mut board = TaskBoard::open(&kv, &clock).unwrap();

    assert_eq!(texts(board.general()), ["old", "older"]);
    let first = board.general().get(0).unwrap().id;
    let second = board.general().get(1).unwrap().id;
    assert_ne!(first, second);
    assert!(!board.toggle_task(ListKind::General, first).unwrap());
}

#[test]
fn ids_given_to_legacy_records_survive_reopening() {
    let kv = kv();
    let clock = clock();
    kv.set(
        GENERAL_TASKS_KEY,
        r#"[{"text":"old","completed":false,"date":"2024-04-30T10:00:00.000Z"}]"#,
    )
    .unwrap();

    let id = TaskBoard::open(&kv, &clock).unwrap().general().get(0).unwrap().id;
    assert!(kv.get(GENERAL_TASKS_KEY).unwrap().unwrap().contains(&id.to_string()));

    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    assert!(board.toggle_task(ListKind::General, id).unwrap());
    assert_eq!(
        TaskStore::new(&kv)
            .load_tasks_checked(ListKind::General)
            .unwrap()
            .assigned_ids,
        0
    );
}

#[test]
fn failed_cross_list_move_never_loses_the_task() {
    let kv = kv();
    let clock = clock();
    let store = FailingWrites {
        inner: &kv,
        fail_key: Cell::new(None),
    };
    let mut board = TaskBoard::open(&store, &clock).unwrap();
    let id = board.add_task(ListKind::Daily, "in flight").unwrap().unwrap();

    store.fail_key.set(Some(DAILY_TASKS_KEY));
    let err = board
        .move_task(ListKind::Daily, 0, ListKind::General, 0)
        .unwrap_err();
    assert!(matches!(err, BoardError::Store(_)));

    let stored = TaskStore::new(&kv);
    assert!(stored
        .load_tasks(ListKind::General)
        .unwrap()
        .iter()
        .any(|task| task.id == id));
}

#[test]
fn malformed_stored_lists_load_empty() {
    let kv = kv();
    let clock = clock();
    kv.set(LAST_RESET_DATE_KEY, "2024-05-01").unwrap();
    kv.set(DAILY_TASKS_KEY, "[{broken").unwrap();
    kv.set(GENERAL_TASKS_KEY, "42").unwrap();

    let board = TaskBoard::open(&kv, &clock).unwrap();

    assert!(board.daily().is_empty());
    assert!(board.general().is_empty());
}

#[test]
fn mutation_after_midnight_clears_daily_first() {
    let kv = kv();
    let clock = clock();
    let mut board = TaskBoard::open(&kv, &clock).unwrap();
    board.add_task(ListKind::Daily, "yesterday's").unwrap();

    clock.advance(Duration::days(1));
    board.add_task(ListKind::Daily, "today's").unwrap();

    assert_eq!(texts(board.daily()), ["today's"]);
    assert_eq!(kv.get(LAST_RESET_DATE_KEY).unwrap().as_deref(), Some("2024-05-02"));
}
