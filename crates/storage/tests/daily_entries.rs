#![forbid(unsafe_code)]

use cb_storage::{
    CreateDailyEntryRequest, SqliteStore, StoreError, UpdateDailyEntryRequest,
};
use std::path::PathBuf;
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

fn entry_request(day_of_week: u8, label: &str, interval_weeks: u32) -> CreateDailyEntryRequest {
    CreateDailyEntryRequest {
        user_id: 1,
        day_of_week,
        label: label.to_string(),
        interval_weeks,
        reference_date: None,
    }
}

#[test]
fn weekly_entries_apply_on_their_weekday() {
    let storage_dir = temp_dir("weekly_applies");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    // 1 = Monday, 3 = Wednesday.
    store.create_daily_entry(entry_request(1, "Office", 1)).expect("create");
    store.create_daily_entry(entry_request(3, "Gym", 1)).expect("create");

    let monday = store.daily_entries_on(date!(2024 - 01 - 08)).expect("entries");
    assert_eq!(monday.len(), 1);
    assert_eq!(monday[0].label, "Office");

    let tuesday = store.daily_entries_on(date!(2024 - 01 - 09)).expect("entries");
    assert!(tuesday.is_empty());
}

#[test]
fn biweekly_entries_respect_the_reference_date() {
    let storage_dir = temp_dir("biweekly_reference");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let mut request = entry_request(1, "Market shift", 2);
    request.reference_date = Some(date!(2024 - 01 - 01));
    store.create_daily_entry(request).expect("create");

    assert_eq!(
        store.daily_entries_on(date!(2024 - 01 - 15)).expect("entries").len(),
        1
    );
    assert!(store.daily_entries_on(date!(2024 - 01 - 08)).expect("entries").is_empty());
}

#[test]
fn updates_edit_in_place_and_can_clear_the_reference_date() {
    let storage_dir = temp_dir("daily_update");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let mut request = entry_request(1, "Office", 2);
    request.reference_date = Some(date!(2024 - 01 - 01));
    let entry = store.create_daily_entry(request).expect("create");

    let updated = store
        .update_daily_entry(UpdateDailyEntryRequest {
            id: entry.id,
            label: Some("Home office".to_string()),
            interval_weeks: Some(1),
            reference_date: Some(None),
            ..Default::default()
        })
        .expect("update");
    assert_eq!(updated.label, "Home office");
    assert_eq!(updated.interval_weeks, 1);
    assert_eq!(updated.reference_date, None);

    // Back to plain weekly: applies on every Monday again.
    assert_eq!(
        store.daily_entries_on(date!(2024 - 01 - 08)).expect("entries").len(),
        1
    );
}

#[test]
fn validation_rejects_out_of_range_fields() {
    let storage_dir = temp_dir("daily_validation");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let err = store
        .create_daily_entry(entry_request(7, "Bad weekday", 1))
        .expect_err("weekday out of range");
    assert!(matches!(err, StoreError::InvalidInput(_)));

    let err = store
        .create_daily_entry(entry_request(1, "Bad interval", 0))
        .expect_err("interval out of range");
    assert!(matches!(err, StoreError::InvalidInput(_)));
}

#[test]
fn delete_reports_unknown_entries() {
    let storage_dir = temp_dir("daily_delete");
    let mut store = SqliteStore::open(&storage_dir).expect("open store");

    let entry = store.create_daily_entry(entry_request(5, "Cleaning day", 1)).expect("create");
    store.delete_daily_entry(entry.id).expect("delete");
    assert!(matches!(
        store.delete_daily_entry(entry.id),
        Err(StoreError::UnknownEntry)
    ));
    assert!(store.list_daily_entries().expect("list").is_empty());
}
