#![forbid(unsafe_code)]

use cb_core::DueStatus;
use cb_storage::{
    CompleteIntervalTaskRequest, CreateIntervalTaskRequest, SqliteStore, StoreError,
    UpdateIntervalTaskRequest,
};
use std::path::PathBuf;
use time::Date;
use time::macros::date;

fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let dir = base.join(format!("cb_storage_{test_name}_{pid}_{nonce}"));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn ms_at_noon(date: Date) -> i64 {
    let days = (date - date!(1970 - 01 - 01)).whole_days();
    days * 86_400_000 + 43_200_000
}

fn task_request(title: &str, category: &str, interval_days: u32, created: Date) -> CreateIntervalTaskRequest {
    CreateIntervalTaskRequest {
        title: title.to_string(),
        category: category.to_string(),
        interval_days,
        created_by: None,
        created_at_ms: ms_at_noon(created),
    }
}

#[test]
fn a_never_completed_task_is_due_one_interval_after_creation() {
    let storage_dir = temp_dir("due_after_creation");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let task = store
        .create_interval_task(task_request("Descale kettle", "Kitchen", 7, date!(2024 - 01 - 01)))
        .expect("create task");

    let view = store
        .get_interval_task(task.id, date!(2024 - 01 - 08))
        .expect("get view");
    assert_eq!(view.due_date, date!(2024 - 01 - 08));
    assert_eq!(view.days_remaining, 0);
    assert_eq!(view.status, DueStatus::Due);
    assert_eq!(view.last_completed_at_ms, None);
}

#[test]
fn completing_moves_the_anchor_without_touching_the_task_row() {
    let storage_dir = temp_dir("completion_moves_anchor");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let task = store
        .create_interval_task(task_request("Descale kettle", "Kitchen", 7, date!(2024 - 01 - 01)))
        .expect("create task");

    let completed_at_ms = ms_at_noon(date!(2024 - 01 - 08));
    store
        .complete_interval_task(CompleteIntervalTaskRequest {
            id: task.id,
            user_id: Some(2),
            completed_at_ms,
        })
        .expect("complete");

    let view = store
        .get_interval_task(task.id, date!(2024 - 01 - 09))
        .expect("get view");
    assert_eq!(view.status, DueStatus::Upcoming);
    assert_eq!(view.days_remaining, 6);
    assert_eq!(view.due_date, date!(2024 - 01 - 15));
    assert_eq!(view.last_completed_at_ms, Some(completed_at_ms));
    // The stored row itself is untouched.
    assert_eq!(view.task.created_at_ms, ms_at_noon(date!(2024 - 01 - 01)));
}

#[test]
fn an_unattended_task_goes_overdue() {
    let storage_dir = temp_dir("goes_overdue");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let task = store
        .create_interval_task(task_request("Change filter", "", 7, date!(2024 - 01 - 01)))
        .expect("create task");

    let view = store
        .get_interval_task(task.id, date!(2024 - 01 - 10))
        .expect("get view");
    assert_eq!(view.status, DueStatus::Overdue);
    assert_eq!(view.days_remaining, -2);
}

#[test]
fn listing_orders_by_due_date() {
    let storage_dir = temp_dir("listing_orders");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    store
        .create_interval_task(task_request("Water ferns", "Plants", 14, date!(2024 - 01 - 01)))
        .expect("create task");
    store
        .create_interval_task(task_request("Flip mattress", "Bedroom", 3, date!(2024 - 01 - 01)))
        .expect("create task");

    let views = store
        .list_interval_tasks(date!(2024 - 01 - 02))
        .expect("list views");
    let titles: Vec<_> = views.iter().map(|view| view.task.title.as_str()).collect();
    assert_eq!(titles, vec!["Flip mattress", "Water ferns"]);
}

#[test]
fn history_is_most_recent_first_and_bounded() {
    let storage_dir = temp_dir("history_order");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let task = store
        .create_interval_task(task_request("Wash towels", "", 7, date!(2024 - 01 - 01)))
        .expect("create task");

    for day in [date!(2024 - 01 - 02), date!(2024 - 01 - 09), date!(2024 - 01 - 16)] {
        store
            .complete_interval_task(CompleteIntervalTaskRequest {
                id: task.id,
                user_id: None,
                completed_at_ms: ms_at_noon(day),
            })
            .expect("complete");
    }

    let history = store.interval_task_history(task.id, 2).expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].completed_at_ms, ms_at_noon(date!(2024 - 01 - 16)));
    assert_eq!(history[1].completed_at_ms, ms_at_noon(date!(2024 - 01 - 09)));

    assert!(matches!(
        store.interval_task_history(42, 10),
        Err(StoreError::UnknownIntervalTask)
    ));
}

#[test]
fn completing_an_unknown_task_is_reported() {
    let storage_dir = temp_dir("complete_unknown_interval");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    assert!(matches!(
        store.complete_interval_task(CompleteIntervalTaskRequest {
            id: 42,
            user_id: None,
            completed_at_ms: 0,
        }),
        Err(StoreError::UnknownIntervalTask)
    ));
}

#[test]
fn categories_are_distinct_sorted_and_skip_uncategorized() {
    let storage_dir = temp_dir("categories");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    for (title, category) in [
        ("Descale kettle", "Kitchen"),
        ("Clean drain", "Bathroom"),
        ("Wipe hob", "Kitchen"),
        ("Misc errand", ""),
    ] {
        store
            .create_interval_task(task_request(title, category, 7, date!(2024 - 01 - 01)))
            .expect("create task");
    }

    let categories = store.interval_task_categories().expect("categories");
    assert_eq!(categories, vec!["Bathroom".to_string(), "Kitchen".to_string()]);
}

#[test]
fn updates_edit_fields_in_place() {
    let storage_dir = temp_dir("interval_update");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let task = store
        .create_interval_task(task_request("Vacuum car", "", 30, date!(2024 - 01 - 01)))
        .expect("create task");

    let updated = store
        .update_interval_task(UpdateIntervalTaskRequest {
            id: task.id,
            interval_days: Some(14),
            ..Default::default()
        })
        .expect("update");
    assert_eq!(updated.interval_days, 14);
    assert_eq!(updated.title, "Vacuum car");

    let view = store
        .get_interval_task(task.id, date!(2024 - 01 - 10))
        .expect("get view");
    assert_eq!(view.due_date, date!(2024 - 01 - 15));

    assert!(matches!(
        store.update_interval_task(UpdateIntervalTaskRequest {
            id: task.id,
            ..Default::default()
        }),
        Err(StoreError::InvalidInput(_))
    ));
}

#[test]
fn deletion_cascades_into_the_completion_log() {
    let storage_dir = temp_dir("interval_delete_cascades");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let task = store
        .create_interval_task(task_request("Oil hinges", "", 90, date!(2024 - 01 - 01)))
        .expect("create task");
    store
        .complete_interval_task(CompleteIntervalTaskRequest {
            id: task.id,
            user_id: None,
            completed_at_ms: ms_at_noon(date!(2024 - 01 - 05)),
        })
        .expect("complete");

    store.delete_interval_task(task.id).expect("delete");
    assert!(matches!(
        store.get_interval_task(task.id, date!(2024 - 01 - 10)),
        Err(StoreError::UnknownIntervalTask)
    ));
    assert!(matches!(
        store.delete_interval_task(task.id),
        Err(StoreError::UnknownIntervalTask)
    ));
}
