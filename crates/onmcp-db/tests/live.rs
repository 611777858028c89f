//! Live integration tests for onmcp-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/onmcp-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use onmcp_core::{AgencyStatus, SyncLogStatus};
use onmcp_db::{
    complete_sync_log, count_crm_locations, create_sync_log, fail_sync_log, get_agency_config,
    get_crm_location_by_external_id, get_sync_log, health_check, list_crm_locations, list_sync_logs,
    mark_missing_locations, record_agency_sync, set_agency_status, upsert_agency_config,
    upsert_crm_location, AgencyConfigUpdate, DbError, NewLocation, SyncLogCounts,
};

fn location(external_id: &str, name: &str) -> NewLocation {
    NewLocation {
        external_id: external_id.to_string(),
        name: Some(name.to_string()),
        city: Some("Austin".to_string()),
        phone: Some("+15125550100".to_string()),
        metadata: serde_json::json!({ "id": external_id, "name": name }),
        ..NewLocation::default()
    }
}

async fn agency_row_count(pool: &sqlx::PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM agency_config")
        .fetch_one(pool)
        .await
        .expect("count agency_config")
}

// ---------------------------------------------------------------------------
// pool
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn health_check_passes_on_migrated_database(pool: sqlx::PgPool) {
    health_check(&pool).await.expect("health check");
}

#[sqlx::test(migrations = false)]
async fn health_check_reports_missing_schema(pool: sqlx::PgPool) {
    let err = health_check(&pool)
        .await
        .expect_err("unmigrated database should fail");
    assert!(matches!(err, DbError::SchemaMissing("agency_config")));
}

// ---------------------------------------------------------------------------
// agency_config
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn agency_config_is_absent_until_first_write(pool: sqlx::PgPool) {
    assert!(get_agency_config(&pool).await.expect("get").is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn agency_config_upserts_stay_a_single_row(pool: sqlx::PgPool) {
    let first = upsert_agency_config(
        &pool,
        &AgencyConfigUpdate {
            agency_name: Some("Acme Agency".to_string()),
            agency_id: Some("ag-1".to_string()),
            ..AgencyConfigUpdate::default()
        },
    )
    .await
    .expect("first upsert");
    assert_eq!(first.id, 1);
    assert!(first.api_base_url.is_none());

    let second = upsert_agency_config(
        &pool,
        &AgencyConfigUpdate {
            api_version: Some("2099-01-01".to_string()),
            ..AgencyConfigUpdate::default()
        },
    )
    .await
    .expect("second upsert");

    assert_eq!(second.id, 1);
    assert_eq!(second.agency_name, "Acme Agency", "omitted fields are kept");
    assert_eq!(second.agency_id.as_deref(), Some("ag-1"));
    assert_eq!(second.api_version.as_deref(), Some("2099-01-01"));
    assert_eq!(agency_row_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn agency_config_rejects_a_second_row(pool: sqlx::PgPool) {
    let result = sqlx::query("INSERT INTO agency_config (id) VALUES (2)")
        .execute(&pool)
        .await;
    assert!(result.is_err(), "CHECK (id = 1) must reject other ids");
}

#[sqlx::test(migrations = "../../migrations")]
async fn set_agency_status_creates_row_when_missing(pool: sqlx::PgPool) {
    set_agency_status(&pool, AgencyStatus::Syncing)
        .await
        .expect("set status");

    let row = get_agency_config(&pool).await.expect("get").expect("row");
    assert_eq!(row.status, AgencyStatus::Syncing);
    assert_eq!(agency_row_count(&pool).await, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn record_agency_sync_sets_active_with_timestamp_and_count(pool: sqlx::PgPool) {
    set_agency_status(&pool, AgencyStatus::Syncing)
        .await
        .expect("set status");
    record_agency_sync(&pool, 42).await.expect("record sync");

    let row = get_agency_config(&pool).await.expect("get").expect("row");
    assert_eq!(row.status, AgencyStatus::Active);
    assert_eq!(row.location_count, 42);
    assert!(row.last_sync_at.is_some());
}

// ---------------------------------------------------------------------------
// crm_locations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_crm_location_inserts_then_updates(pool: sqlx::PgPool) {
    let inserted = upsert_crm_location(&pool, &location("loc-1", "Downtown"))
        .await
        .expect("insert");
    assert!(inserted, "first write is an insert");

    let updated = upsert_crm_location(&pool, &location("loc-1", "Downtown East"))
        .await
        .expect("update");
    assert!(!updated, "second write is an update");

    let rows = list_crm_locations(&pool).await.expect("list");
    assert_eq!(rows.len(), 1, "external_id is the natural key");
    assert_eq!(rows[0].name.as_deref(), Some("Downtown East"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_crm_location_replaces_absent_fields_with_null(pool: sqlx::PgPool) {
    upsert_crm_location(&pool, &location("loc-1", "Downtown"))
        .await
        .expect("insert");

    let sparse = NewLocation {
        external_id: "loc-1".to_string(),
        name: Some("Downtown".to_string()),
        metadata: serde_json::json!({ "id": "loc-1" }),
        ..NewLocation::default()
    };
    upsert_crm_location(&pool, &sparse).await.expect("update");

    let row = get_crm_location_by_external_id(&pool, "loc-1")
        .await
        .expect("get")
        .expect("row");
    assert!(row.city.is_none(), "update is a full replace, not a merge");
    assert!(row.phone.is_none());
    assert_eq!(row.metadata, serde_json::json!({ "id": "loc-1" }));
}

#[sqlx::test(migrations = "../../migrations")]
async fn mark_missing_locations_tombstones_and_upsert_clears(pool: sqlx::PgPool) {
    for (id, name) in [("a", "Alpha"), ("b", "Beta"), ("c", "Gamma")] {
        upsert_crm_location(&pool, &location(id, name))
            .await
            .expect("insert");
    }

    let marked = mark_missing_locations(&pool, &["a".to_string(), "c".to_string()])
        .await
        .expect("mark");
    assert_eq!(marked, 1);
    assert_eq!(count_crm_locations(&pool).await.expect("count"), 2);

    let again = mark_missing_locations(&pool, &["a".to_string(), "c".to_string()])
        .await
        .expect("mark again");
    assert_eq!(again, 0, "already-tombstoned rows are not re-marked");

    upsert_crm_location(&pool, &location("b", "Beta"))
        .await
        .expect("reappear");
    let row = get_crm_location_by_external_id(&pool, "b")
        .await
        .expect("get")
        .expect("row");
    assert!(row.removed_upstream_at.is_none());
    assert_eq!(count_crm_locations(&pool).await.expect("count"), 3);
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_crm_locations_orders_by_name(pool: sqlx::PgPool) {
    upsert_crm_location(&pool, &location("z", "Zeta"))
        .await
        .expect("insert");
    upsert_crm_location(&pool, &location("a", "Alpha"))
        .await
        .expect("insert");

    let names: Vec<Option<String>> = list_crm_locations(&pool)
        .await
        .expect("list")
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(
        names,
        vec![Some("Alpha".to_string()), Some("Zeta".to_string())]
    );
}

// ---------------------------------------------------------------------------
// crm_sync_logs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn sync_log_completes_once(pool: sqlx::PgPool) {
    let log = create_sync_log(&pool, "full").await.expect("create");
    assert_eq!(log.status, SyncLogStatus::Running);
    assert!(log.completed_at.is_none());

    let counts = SyncLogCounts {
        total: 3,
        added: 2,
        updated: 1,
        deactivated: 0,
        duration_ms: 120,
    };
    complete_sync_log(&pool, log.id, &counts)
        .await
        .expect("complete");

    let row = get_sync_log(&pool, log.id).await.expect("get");
    assert_eq!(row.status, SyncLogStatus::Completed);
    assert_eq!(row.total_synced, 3);
    assert_eq!(row.added, 2);
    assert_eq!(row.updated, 1);
    assert_eq!(row.duration_ms, Some(120));
    assert!(row.completed_at.is_some());

    let again = complete_sync_log(&pool, log.id, &counts).await;
    assert!(matches!(
        again,
        Err(DbError::InvalidSyncLogTransition { .. })
    ));
    let fail = fail_sync_log(&pool, log.id, "late failure", 1).await;
    assert!(
        matches!(fail, Err(DbError::InvalidSyncLogTransition { .. })),
        "completed entries are never mutated"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn sync_log_fail_records_message(pool: sqlx::PgPool) {
    let log = create_sync_log(&pool, "full").await.expect("create");
    fail_sync_log(&pool, log.id, "CRM unreachable", 15)
        .await
        .expect("fail");

    let row = get_sync_log(&pool, log.id).await.expect("get");
    assert_eq!(row.status, SyncLogStatus::Failed);
    assert_eq!(row.error_message.as_deref(), Some("CRM unreachable"));
    assert!(row.completed_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_sync_log_missing_is_not_found(pool: sqlx::PgPool) {
    assert!(matches!(
        get_sync_log(&pool, 999).await,
        Err(DbError::NotFound)
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_sync_logs_returns_newest_first(pool: sqlx::PgPool) {
    let first = create_sync_log(&pool, "full").await.expect("create");
    let second = create_sync_log(&pool, "full").await.expect("create");

    let rows = list_sync_logs(&pool, 10).await.expect("list");
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}
