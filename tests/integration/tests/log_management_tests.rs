//! Log management flows against in-memory stores
//!
//! Run with: cargo test -p integration-tests --test log_management_tests

use carfuse_core::{FilterError, FilterSpec, SortOrder};
use chrono::{NaiveDate, NaiveDateTime};
use integration_tests::{fixtures::*, test_now, TestStores};

fn at(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 5, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

// ============================================================================
// Create / Get
// ============================================================================

#[tokio::test]
async fn test_create_and_get_log_entry() {
    let stores = TestStores::start().await.unwrap();
    let service = stores.service();

    let id = service.create_log_entry(login_request(42)).await.unwrap();
    let entry = service.get_log_by_id(id).await.unwrap().unwrap();

    assert_eq!(entry.category, "auth");
    assert_eq!(entry.message.as_deref(), Some("User logged in"));
    assert_eq!(entry.user_id, Some(42));
    assert_eq!(entry.log_level.as_deref(), Some("info"));
    assert_eq!(entry.request_id.as_deref(), Some("req-test"));
    assert_eq!(entry.created_at.as_deref(), Some("2024-05-15 12:00:00"));
    assert_eq!(entry.details["password"], "***REDACTED***");
    assert_eq!(entry.details["method"], "password");
    assert_eq!(entry.details["request_id"], "req-test");
}

#[tokio::test]
async fn test_create_redacts_containers_under_sensitive_keys() {
    let stores = TestStores::start().await.unwrap();
    let service = stores.service();

    let mut request = login_request(7);
    request.context = Some(serde_json::json!({
        "token": {"access": "xyz", "refresh": "abc"},
        "passwords": ["p1", "p2"],
        "device": {"os": "linux"}
    }));
    let id = service.create_log_entry(request).await.unwrap();
    let entry = service.get_log_by_id(id).await.unwrap().unwrap();

    assert_eq!(entry.details["token"], "***REDACTED***");
    assert_eq!(entry.details["passwords"], "***REDACTED***");
    assert_eq!(entry.details["device"]["os"], "linux");
    assert!(!entry.details.to_string().contains("xyz"));
}

#[tokio::test]
async fn test_create_sanitizes_message_and_rejects_bad_level() {
    let stores = TestStores::start().await.unwrap();
    let service = stores.service();

    let mut request = login_request(1);
    request.message = "  <script>alert(1)</script> done ".to_string();
    let id = service.create_log_entry(request).await.unwrap();
    let entry = service.get_log_by_id(id).await.unwrap().unwrap();
    assert_eq!(entry.message.as_deref(), Some("scriptalert(1)/script done"));

    let mut request = login_request(1);
    request.log_level = Some("loud".to_string());
    let err = service.create_log_entry(request).await.unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_get_missing_log_is_none() {
    let stores = TestStores::start().await.unwrap();
    assert!(stores.service().get_log_by_id(404).await.unwrap().is_none());
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_get_logs_paginates_with_metadata() {
    let stores = TestStores::start().await.unwrap();
    let rows: Vec<SeedRow> = (1..=5)
        .map(|day| SeedRow::new("booking", format!("Booking {day}"), at(day, 9)).user(7))
        .chain([SeedRow::new("booking", "Other user", at(6, 9)).user(8)])
        .collect();
    seed(stores.secure(), &rows).await.unwrap();

    let filters = FilterSpec::new()
        .with_user_id(7)
        .with_sort("created_at", SortOrder::Asc)
        .with_page(3, 2);
    let list = stores.service().get_logs(&filters).await.unwrap();

    let meta = list.pagination.unwrap();
    assert_eq!(meta.total, 5);
    assert_eq!(meta.per_page, 2);
    assert_eq!(meta.current_page, 3);
    assert_eq!(meta.last_page, 3);
    assert_eq!(meta.from, 5);
    assert_eq!(meta.to, 5);
    assert_eq!(list.data.len(), 1);
    assert_eq!(list.data[0].message.as_deref(), Some("Booking 5"));
}

#[tokio::test]
async fn test_get_logs_relative_date_and_level() {
    let stores = TestStores::start().await.unwrap();
    seed(
        stores.secure(),
        &[
            SeedRow::new("payment", "Today error", at(15, 9)).level("error"),
            SeedRow::new("payment", "Today info", at(15, 10)),
            SeedRow::new("payment", "Old error", at(1, 9)).level("error"),
        ],
    )
    .await
    .unwrap();

    let filters = FilterSpec::new()
        .with_relative_date("today")
        .with_log_level("error");
    let list = stores.service().get_logs(&filters).await.unwrap();

    assert_eq!(list.pagination.unwrap().total, 1);
    assert_eq!(list.data[0].message.as_deref(), Some("Today error"));
}

#[tokio::test]
async fn test_get_logs_without_pagination() {
    let stores = TestStores::start().await.unwrap();
    let rows: Vec<SeedRow> = (1..=4)
        .map(|day| SeedRow::new("auth", "Login", at(day, 8)))
        .collect();
    seed(stores.secure(), &rows).await.unwrap();

    let list = stores
        .service()
        .get_logs(&FilterSpec::new().without_pagination(Some(3)))
        .await
        .unwrap();

    assert!(list.pagination.is_none());
    assert_eq!(list.data.len(), 3);
}

#[tokio::test]
async fn test_query_string_filters() {
    let stores = TestStores::start().await.unwrap();
    seed(
        stores.secure(),
        &[
            SeedRow::new("auth", "Login", at(2, 8)).booking(11),
            SeedRow::new("booking", "Created", at(3, 8)).booking(11),
            SeedRow::new("system", "Cron", at(4, 8)).booking(12),
        ],
    )
    .await
    .unwrap();

    let filters = FilterSpec::from_query_pairs([
        ("booking_id", "11"),
        ("categories[]", "auth,booking"),
        ("page", "not-a-number"),
    ])
    .unwrap();
    assert_eq!(filters.malformed().len(), 1);

    let list = stores.service().get_logs(&filters).await.unwrap();
    assert_eq!(list.pagination.unwrap().total, 2);

    let err = FilterSpec::from_query_pairs([("custom_where", "1=1")]).unwrap_err();
    assert!(matches!(err, FilterError::PrivilegedKey(_)));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_unguarded_delete_is_rejected_and_nothing_is_removed() {
    let stores = TestStores::start().await.unwrap();
    seed(stores.secure(), &[SeedRow::new("auth", "Login", at(1, 8))])
        .await
        .unwrap();
    let service = stores.service();

    let err = service
        .delete_logs(&FilterSpec::new(), false)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.error_code(), "COMPILATION_REJECTED");

    let err = service
        .delete_logs(&FilterSpec::new().with_log_level("loud"), false)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "COMPILATION_REJECTED");

    let list = service.get_logs(&FilterSpec::new()).await.unwrap();
    assert_eq!(list.pagination.unwrap().total, 1);
}

#[tokio::test]
async fn test_filtered_delete_runs_in_batches() {
    let stores = TestStores::start().await.unwrap();
    assert_eq!(stores.settings.delete_batch_size, 2);

    let rows: Vec<SeedRow> = (1..=3)
        .map(|day| SeedRow::new("auth", "Login", at(day, 8)).user(5))
        .chain([SeedRow::new("auth", "Login", at(4, 8)).user(6)])
        .collect();
    seed(stores.secure(), &rows).await.unwrap();
    let service = stores.service();

    let deleted = service
        .delete_logs(&FilterSpec::new().with_user_id(5), false)
        .await
        .unwrap();
    assert_eq!(deleted, 3);

    let again = service
        .delete_logs(&FilterSpec::new().with_user_id(5), false)
        .await
        .unwrap();
    assert_eq!(again, 0);

    let list = service.get_logs(&FilterSpec::new()).await.unwrap();
    assert_eq!(list.pagination.unwrap().total, 1);
    assert_eq!(list.data[0].user_id, Some(6));
}

#[tokio::test]
async fn test_forced_bulk_delete() {
    let stores = TestStores::start().await.unwrap();
    let rows: Vec<SeedRow> = (1..=5)
        .map(|day| SeedRow::new("system", "Tick", at(day, 0)))
        .collect();
    seed(stores.secure(), &rows).await.unwrap();

    let deleted = stores
        .service()
        .delete_logs(&FilterSpec::new(), true)
        .await
        .unwrap();
    assert_eq!(deleted, 5);
}

// ============================================================================
// Export
// ============================================================================

#[tokio::test]
async fn test_export_writes_csv_with_header() {
    let stores = TestStores::start().await.unwrap();
    seed(
        stores.secure(),
        &[
            SeedRow::new("payment", "Refund, partial", at(10, 8)).user(3),
            SeedRow::new("payment", "Charge", at(11, 8)).user(3),
            SeedRow::new("auth", "Login", at(12, 8)).user(4),
        ],
    )
    .await
    .unwrap();

    let filters = FilterSpec::new()
        .with_category("payment")
        .with_sort("created_at", SortOrder::Asc)
        .with_export_fields(["id", "category", "message", "user_id"])
        .with_header_names(["Log", "Type", "Text", "Customer"]);
    let export = stores.service().export_logs(&filters).await.unwrap();

    assert_eq!(export.row_count, 2);
    assert!(export.file_name.starts_with("audit_logs_export_20240515_120000_"));
    assert!(export.file_name.ends_with(".csv"));
    assert_eq!(export.export_id.len(), "20240515_120000_".len() + 8);
    assert_eq!(export.expiry_formatted, "2024-05-16 12:00:00");
    assert_eq!(
        export.expiry_time,
        test_now().and_utc().timestamp() + 24 * 3600
    );

    let path = std::path::Path::new(&export.file_path);
    assert!(path.starts_with(stores.export_dir.path()));

    let mut reader = csv::Reader::from_path(path).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header, ["Log", "Type", "Text", "Customer"]);
    let records: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0][1], "payment");
    assert_eq!(records[0][2], "Refund, partial");
    assert_eq!(records[0][3], "3");
}

#[tokio::test]
async fn test_export_default_columns() {
    let stores = TestStores::start().await.unwrap();
    seed(stores.secure(), &[SeedRow::new("auth", "Login", at(1, 8))])
        .await
        .unwrap();

    let export = stores
        .service()
        .export_logs(&FilterSpec::new())
        .await
        .unwrap();

    let mut reader = csv::Reader::from_path(&export.file_path).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header.len(), 10);
    assert_eq!(header[0], "ID");
    assert_eq!(header[1], "Category");
}
