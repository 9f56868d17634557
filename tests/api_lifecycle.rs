//! End-to-end lifecycle flows over the HTTP surface.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{send, send_as, test_app};

async fn create_country(app: &common::TestApp, name: &str, iso2: &str) -> i64 {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/admin/countries",
        Some(json!({"name": name, "iso2": iso2})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["data"]["id"].as_i64().expect("created id")
}

#[tokio::test]
async fn test_country_soft_delete_restore_force_delete_flow() {
    let app = test_app().await;
    let id = create_country(&app, "France", "fr").await;

    // Soft delete hides the row from default reads.
    let (status, body) = send(&app, "DELETE", &format!("/api/v1/admin/countries/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = send(&app, "GET", &format!("/api/v1/admin/countries/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "GET",
        &format!("/api/v1/admin/countries/{id}?include_trashed=true"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body["data"]["deleted_at"].is_null());

    // Force delete is rejected until the row is trashed; the row above IS
    // trashed, so restore it first and check the ordering rule both ways.
    let (status, body) = send_as(
        &app,
        "PATCH",
        &format!("/api/v1/admin/countries/{id}/restore"),
        None,
        7,
        "Registrar",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["deleted_at"].is_null());
    assert_eq!(body["data"]["updated_by_name"], "Registrar");

    let (status, _) =
        send(&app, "DELETE", &format!("/api/v1/admin/countries/{id}/force-destroy"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "active rows must not be force-deletable");

    send(&app, "DELETE", &format!("/api/v1/admin/countries/{id}"), None).await;
    let (status, _) =
        send(&app, "DELETE", &format!("/api/v1/admin/countries/{id}/force-destroy"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/v1/admin/countries/{id}?include_trashed=true"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_validation_failure_shape() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/countries",
        Some(json!({"name": "", "iso2": "fra"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["data"].is_null());
    assert!(body["errors"]["name"].is_array());
    assert!(body["errors"]["iso2"].is_array());
}

#[tokio::test]
async fn test_pagination_envelope_and_clamping() {
    let app = test_app().await;
    for (name, iso2) in [("Austria", "at"), ("Belgium", "be"), ("Croatia", "hr")] {
        create_country(&app, name, iso2).await;
    }

    let (status, body) =
        send(&app, "GET", "/api/v1/admin/countries?page=1&per_page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let pagination = &body["pagination"];
    assert_eq!(pagination["total"], 3);
    assert_eq!(pagination["last_page"], 2);
    assert_eq!(pagination["has_more_pages"], true);
    assert_eq!(pagination["from"], 1);
    assert_eq!(pagination["to"], 2);
    assert_eq!(
        pagination["next_page_url"],
        "/api/v1/admin/countries?page=2&per_page=2"
    );
    // Previous + two numbered pages + Next.
    assert_eq!(pagination["links"].as_array().map(Vec::len), Some(4));
    assert_eq!(pagination["links"][1]["active"], true);

    // Server-side ceiling on per_page.
    let (_, body) = send(&app, "GET", "/api/v1/admin/countries?per_page=500", None).await;
    assert_eq!(body["pagination"]["per_page"], 100);

    // Active filters survive into the navigation URLs.
    let (_, body) =
        send(&app, "GET", "/api/v1/admin/countries?search=belg&per_page=1", None).await;
    assert_eq!(
        body["pagination"]["first_page_url"],
        "/api/v1/admin/countries?search=belg&page=1&per_page=1"
    );
}

#[tokio::test]
async fn test_search_and_status_filters() {
    let app = test_app().await;
    let id = create_country(&app, "Denmark", "dk").await;
    create_country(&app, "Estonia", "ee").await;

    let (_, body) = send(&app, "GET", "/api/v1/admin/countries?search=denm", None).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Denmark");

    send(&app, "PATCH", &format!("/api/v1/admin/countries/{id}/toggle-status"), None).await;
    let (_, body) = send(&app, "GET", "/api/v1/admin/countries?status=false", None).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Denmark");
    assert_eq!(body["data"][0]["status"], false);
}

#[tokio::test]
async fn test_bulk_operations_count_matched_rows_only() {
    let app = test_app().await;
    let a = create_country(&app, "Finland", "fi").await;
    let b = create_country(&app, "Greece", "gr").await;
    create_country(&app, "Hungary", "hu").await;

    // One id does not exist; the two matches are still processed.
    let (status, body) = send(
        &app,
        "DELETE",
        "/api/v1/admin/countries/bulk-destroy",
        Some(json!({"ids": [a, b, 9999]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "2 records moved to trash");

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/v1/admin/countries/bulk-restore",
        Some(json!({"ids": [a, b]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "2 records restored");

    // No trashed row matches at all -> not found.
    let (status, _) = send(
        &app,
        "DELETE",
        "/api/v1/admin/countries/bulk-force-destroy",
        Some(json!({"ids": [a, b]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        "PATCH",
        "/api/v1/admin/countries/bulk-status",
        Some(json!({"ids": [a, b], "status": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "2 records updated");

    // Emptying an empty trash succeeds with zero removals.
    let (status, body) =
        send(&app, "DELETE", "/api/v1/admin/countries/empty-trash", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "0 records permanently deleted");
}

#[tokio::test]
async fn test_statistics_overview() {
    let app = test_app().await;
    let a = create_country(&app, "Iceland", "is").await;
    create_country(&app, "Latvia", "lv").await;
    send(&app, "DELETE", &format!("/api/v1/admin/countries/{a}"), None).await;

    let (status, body) =
        send(&app, "GET", "/api/v1/admin/countries/statistics/overview", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["active"], 1);
    assert_eq!(body["data"]["trashed"], 1);
    assert_eq!(body["data"]["today"], 2);
}

#[tokio::test]
async fn test_duplicate_creates_inactive_copy() {
    let app = test_app().await;
    let id = create_country(&app, "Norway", "no").await;

    let (status, body) =
        send(&app, "POST", &format!("/api/v1/admin/countries/{id}/duplicate"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["name"], "Norway (Copy)");
    assert_eq!(body["data"]["status"], false);
    // The unique ISO code is mutated, not copied verbatim.
    assert_ne!(body["data"]["iso2"], "NO");
}

#[tokio::test]
async fn test_audit_stamps_from_actor_headers() {
    let app = test_app().await;
    let (status, body) = send_as(
        &app,
        "POST",
        "/api/v1/admin/countries",
        Some(json!({"name": "Portugal", "iso2": "pt"})),
        3,
        "Editor",
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["created_by"], 3);
    assert_eq!(body["data"]["created_by_name"], "Editor");

    // Anonymous update keeps the previous stamp.
    let id = body["data"]["id"].as_i64().expect("id");
    let (_, body) = send(
        &app,
        "PATCH",
        &format!("/api/v1/admin/countries/{id}"),
        Some(json!({"phone_code": "+351"})),
    )
    .await;
    assert_eq!(body["data"]["updated_by_name"], "Editor");
    assert_eq!(body["data"]["phone_code"], "+351");
}

#[tokio::test]
async fn test_state_carries_country_reference() {
    let app = test_app().await;
    let country_id = create_country(&app, "Spain", "es").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/states",
        Some(json!({"country_id": country_id, "name": "Andalusia"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["country"]["name"], "Spain");

    // A city must belong to a state of its own country.
    let other = create_country(&app, "Sweden", "se").await;
    let state_id = body["data"]["id"].as_i64().expect("state id");
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/cities",
        Some(json!({"country_id": other, "state_id": state_id, "name": "Seville"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["state_id"].is_array());
}
