//! Singleton settings over HTTP: upsert behavior, secret masking, and the
//! external config mirror.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{send, send_as, test_app};

#[tokio::test]
async fn test_general_settings_upsert() {
    let app = test_app().await;

    // Unconfigured read answers success with null data.
    let (status, body) = send(&app, "GET", "/api/v1/admin/settings/general", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"].is_null());

    let (status, body) = send_as(
        &app,
        "POST",
        "/api/v1/admin/settings/general",
        Some(json!({"site_name": "Campanile University"})),
        1,
        "Root",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let first_id = body["data"]["id"].as_i64().expect("id");

    // A second save updates the same logical row.
    let (_, body) = send_as(
        &app,
        "POST",
        "/api/v1/admin/settings/general",
        Some(json!({"site_name": "Campanile", "phone": "+1 555 0100"})),
        2,
        "Admin",
    )
    .await;
    assert_eq!(body["data"]["id"].as_i64(), Some(first_id));
    assert_eq!(body["data"]["site_name"], "Campanile");
    assert_eq!(body["data"]["created_by"], 1);
    assert_eq!(body["data"]["updated_by"], 2);
}

#[tokio::test]
async fn test_mail_validation_and_masking() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/settings/mail",
        Some(json!({"mailer": "smtp", "from_address": "not-an-email"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["from_address"].is_array());

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/settings/mail",
        Some(json!({
            "mailer": "smtp",
            "host": "smtp.campanile.edu",
            "port": 587,
            "username": "mailer",
            "password": "hunter2",
            "from_address": "noreply@campanile.edu"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // The stored password never comes back in the clear.
    assert_eq!(body["data"]["password"], "********");

    let (_, body) = send(&app, "GET", "/api/v1/admin/settings/mail", None).await;
    assert_eq!(body["data"]["password"], "********");
    assert_eq!(body["data"]["host"], "smtp.campanile.edu");

    // The mirror file carries the real value for the mail collaborator.
    let mirror = std::fs::read_to_string(app.env_file()).expect("mirror file");
    assert!(mirror.contains("MAIL_PASSWORD=hunter2"));
    assert!(mirror.contains("MAIL_HOST=smtp.campanile.edu"));
}

#[tokio::test]
async fn test_sms_gateway_switch_clears_stale_credentials() {
    let app = test_app().await;

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/admin/settings/sms",
        Some(json!({
            "sms_gateway": "twilio",
            "twilio_sid": "AC123",
            "twilio_token": "tok-secret",
            "twilio_from": "+15550100"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let mirror = std::fs::read_to_string(app.env_file()).expect("mirror file");
    assert!(mirror.contains("SMS_GATEWAY=twilio"));
    assert!(mirror.contains("TWILIO_TOKEN=tok-secret"));

    // Switching gateways clears the previous gateway both in the row and in
    // the mirror, even when stale fields are still posted.
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/settings/sms",
        Some(json!({
            "sms_gateway": "vonage",
            "twilio_sid": "stale",
            "vonage_key": "vk",
            "vonage_secret": "vs",
            "vonage_from": "CAMPANILE"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["twilio_sid"].is_null());
    assert_eq!(body["data"]["vonage_secret"], "********");

    let mirror = std::fs::read_to_string(app.env_file()).expect("mirror file");
    assert!(mirror.contains("SMS_GATEWAY=vonage"));
    assert!(mirror.contains("TWILIO_TOKEN=\n") || mirror.ends_with("TWILIO_TOKEN="));
    assert!(mirror.contains("VONAGE_SECRET=vs"));
}

#[tokio::test]
async fn test_payment_settings_masking() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/settings/payment",
        Some(json!({
            "payment_gateway": "stripe",
            "stripe_key": "pk_live_1",
            "stripe_secret": "sk_live_1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["stripe_key"], "pk_live_1");
    assert_eq!(body["data"]["stripe_secret"], "********");
    assert!(body["data"]["paypal_client_id"].is_null());

    let mirror = std::fs::read_to_string(app.env_file()).expect("mirror file");
    assert!(mirror.contains("PAYMENT_GATEWAY=stripe"));
    assert!(mirror.contains("STRIPE_SECRET=sk_live_1"));

    // An unknown gateway never reaches the database.
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/admin/settings/payment",
        Some(json!({"payment_gateway": "braintree"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "unknown gateway: {body}");
    let (_, body) = send(&app, "GET", "/api/v1/admin/settings/payment", None).await;
    assert_eq!(body["data"]["payment_gateway"], "stripe");
}
