//! Public surface: published-only visibility, slug addressing, and immunity
//! to trash-visibility query flags.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{send, test_app, TestApp};

async fn create_news(app: &TestApp, title: &str, status: bool) -> (i64, String) {
    let (code, body) = send(
        app,
        "POST",
        "/api/v1/admin/news",
        Some(json!({"title": title, "excerpt": "excerpt", "status": status})),
    )
    .await;
    assert_eq!(code, StatusCode::CREATED, "create failed: {body}");
    (
        body["data"]["id"].as_i64().expect("id"),
        body["data"]["slug"].as_str().expect("slug").to_string(),
    )
}

#[tokio::test]
async fn test_public_news_shows_published_only() {
    let app = test_app().await;
    let (_, published_slug) = create_news(&app, "Autumn Enrollment Open", true).await;
    let (_, draft_slug) = create_news(&app, "Unreviewed Draft", false).await;

    let (status, body) = send(&app, "GET", "/api/v1/public/news", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["slug"], published_slug.as_str());

    let (status, body) =
        send(&app, "GET", &format!("/api/v1/public/news/{published_slug}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Autumn Enrollment Open");

    let (status, _) =
        send(&app, "GET", &format!("/api/v1/public/news/{draft_slug}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_list_ignores_trash_flags() {
    let app = test_app().await;
    let (id, slug) = create_news(&app, "Retired Notice", true).await;
    send(&app, "DELETE", &format!("/api/v1/admin/news/{id}"), None).await;

    // Trashed rows stay hidden even when the caller asks for them.
    let (status, body) =
        send(&app, "GET", "/api/v1/public/news?include_trashed=true", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 0);

    let (status, _) = send(&app, "GET", &format!("/api/v1/public/news/{slug}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_testimonial_by_id_respects_status() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/testimonials",
        Some(json!({"name": "Alumni A", "message": "Great faculty."})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["data"]["id"].as_i64().expect("id");

    let (status, body) =
        send(&app, "GET", &format!("/api/v1/public/testimonials/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Alumni A");

    send(&app, "PATCH", &format!("/api/v1/admin/testimonials/{id}/toggle-status"), None).await;
    let (status, _) =
        send(&app, "GET", &format!("/api/v1/public/testimonials/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_courses_by_slug() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/courses",
        Some(json!({"title": "Computer Science", "duration": "3 years", "fee": 1200.0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    let slug = body["data"]["slug"].as_str().expect("slug").to_string();

    let (status, body) = send(&app, "GET", &format!("/api/v1/public/courses/{slug}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Computer Science");
    assert_eq!(body["data"]["fee"], 1200.0);

    // Unpublished courses stay off the public catalog.
    send(
        &app,
        "POST",
        "/api/v1/admin/courses",
        Some(json!({"title": "Draft Program", "status": false})),
    )
    .await;
    let (_, body) = send(&app, "GET", "/api/v1/public/courses", None).await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_public_pages_and_faqs() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/pages",
        Some(json!({"title": "Admissions", "body": "<p>Apply here.</p>"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let slug = body["data"]["slug"].as_str().expect("slug").to_string();

    let (status, body) = send(&app, "GET", &format!("/api/v1/public/pages/{slug}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Admissions");

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/faqs",
        Some(json!({"question": "When does term start?", "answer": "September."})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let faq_id = body["data"]["id"].as_i64().expect("id");

    let (status, body) = send(&app, "GET", "/api/v1/public/faqs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["id"].as_i64(), Some(faq_id));
}
