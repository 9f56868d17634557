//! Singleton settings endpoints.
//!
//! Each kind exposes `GET` (read, secrets masked) and `POST` (upsert). Mail,
//! SMS, and payment saves additionally mirror their key/value pairs into the
//! external config store after the database write; a failed mirror logs a
//! warning and the request still succeeds.

use axum::extract::State;
use axum::routing::get;
use axum::{Extension, Json, Router};
use tracing::warn;
use validator::Validate;

use crate::domain::settings::{
    AboutUs, AboutUsInput, CallToAction, CallToActionInput, GeneralSettings, GeneralSettingsInput,
    MailSettingsInput, MailSettingsView, PaymentSettingsInput, PaymentSettingsView,
    SmsSettingsInput, SmsSettingsView, SocialSettings, SocialSettingsInput, TopbarSettings,
    TopbarSettingsInput,
};
use crate::platform::ExternalConfigStore;
use crate::storage::repositories::SettingsRepository;

use super::auth::CurrentActor;
use super::envelope::ApiResponse;
use super::error::ApiError;
use super::routes::AppState;

type Handler<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

fn repo(state: &AppState) -> SettingsRepository {
    SettingsRepository::new(state.pool.clone())
}

fn mirror(store: &dyn ExternalConfigStore, pairs: Vec<(&'static str, Option<String>)>) {
    for (key, value) in pairs {
        if let Err(err) = store.set_variable(key, value.as_deref().unwrap_or("")) {
            warn!(key, error = %err, "Failed to mirror setting to external config store");
        }
    }
}

async fn get_general(State(state): State<AppState>) -> Handler<GeneralSettings> {
    let settings = repo(&state).get_general().await?;
    Ok(Json(ApiResponse::maybe("General settings retrieved successfully", settings)))
}

async fn save_general(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    Json(input): Json<GeneralSettingsInput>,
) -> Handler<GeneralSettings> {
    input.validate()?;
    let saved = repo(&state).save_general(input, actor.as_ref()).await?;
    Ok(Json(ApiResponse::ok("General settings saved successfully", saved)))
}

async fn get_mail(State(state): State<AppState>) -> Handler<MailSettingsView> {
    let settings = repo(&state).get_mail().await?;
    Ok(Json(ApiResponse::maybe(
        "Mail settings retrieved successfully",
        settings.as_ref().map(MailSettingsView::from),
    )))
}

async fn save_mail(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    Json(input): Json<MailSettingsInput>,
) -> Handler<MailSettingsView> {
    input.validate()?;
    let saved = repo(&state).save_mail(input, actor.as_ref()).await?;
    mirror(state.env_store.as_ref(), saved.mirror_pairs());
    Ok(Json(ApiResponse::ok("Mail settings saved successfully", MailSettingsView::from(&saved))))
}

async fn get_sms(State(state): State<AppState>) -> Handler<SmsSettingsView> {
    let settings = repo(&state).get_sms().await?;
    Ok(Json(ApiResponse::maybe(
        "SMS settings retrieved successfully",
        settings.as_ref().map(SmsSettingsView::from),
    )))
}

async fn save_sms(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    Json(input): Json<SmsSettingsInput>,
) -> Handler<SmsSettingsView> {
    input.validate()?;
    let saved = repo(&state).save_sms(input, actor.as_ref()).await?;
    mirror(state.env_store.as_ref(), saved.mirror_pairs());
    Ok(Json(ApiResponse::ok("SMS settings saved successfully", SmsSettingsView::from(&saved))))
}

async fn get_payment(State(state): State<AppState>) -> Handler<PaymentSettingsView> {
    let settings = repo(&state).get_payment().await?;
    Ok(Json(ApiResponse::maybe(
        "Payment settings retrieved successfully",
        settings.as_ref().map(PaymentSettingsView::from),
    )))
}

async fn save_payment(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    Json(input): Json<PaymentSettingsInput>,
) -> Handler<PaymentSettingsView> {
    input.validate()?;
    let saved = repo(&state).save_payment(input, actor.as_ref()).await?;
    mirror(state.env_store.as_ref(), saved.mirror_pairs());
    Ok(Json(ApiResponse::ok(
        "Payment settings saved successfully",
        PaymentSettingsView::from(&saved),
    )))
}

async fn get_topbar(State(state): State<AppState>) -> Handler<TopbarSettings> {
    let settings = repo(&state).get_topbar().await?;
    Ok(Json(ApiResponse::maybe("Topbar settings retrieved successfully", settings)))
}

async fn save_topbar(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    Json(input): Json<TopbarSettingsInput>,
) -> Handler<TopbarSettings> {
    input.validate()?;
    let saved = repo(&state).save_topbar(input, actor.as_ref()).await?;
    Ok(Json(ApiResponse::ok("Topbar settings saved successfully", saved)))
}

async fn get_social(State(state): State<AppState>) -> Handler<SocialSettings> {
    let settings = repo(&state).get_social().await?;
    Ok(Json(ApiResponse::maybe("Social settings retrieved successfully", settings)))
}

async fn save_social(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    Json(input): Json<SocialSettingsInput>,
) -> Handler<SocialSettings> {
    input.validate()?;
    let saved = repo(&state).save_social(input, actor.as_ref()).await?;
    Ok(Json(ApiResponse::ok("Social settings saved successfully", saved)))
}

async fn get_about_us(State(state): State<AppState>) -> Handler<AboutUs> {
    let content = repo(&state).get_about_us().await?;
    Ok(Json(ApiResponse::maybe("About-us content retrieved successfully", content)))
}

async fn save_about_us(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    Json(input): Json<AboutUsInput>,
) -> Handler<AboutUs> {
    input.validate()?;
    let saved = repo(&state).save_about_us(input, actor.as_ref()).await?;
    Ok(Json(ApiResponse::ok("About-us content saved successfully", saved)))
}

async fn get_call_to_action(State(state): State<AppState>) -> Handler<CallToAction> {
    let content = repo(&state).get_call_to_action().await?;
    Ok(Json(ApiResponse::maybe("Call-to-action content retrieved successfully", content)))
}

async fn save_call_to_action(
    State(state): State<AppState>,
    Extension(CurrentActor(actor)): Extension<CurrentActor>,
    Json(input): Json<CallToActionInput>,
) -> Handler<CallToAction> {
    input.validate()?;
    let saved = repo(&state).save_call_to_action(input, actor.as_ref()).await?;
    Ok(Json(ApiResponse::ok("Call-to-action content saved successfully", saved)))
}

pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/general", get(get_general).post(save_general))
        .route("/mail", get(get_mail).post(save_mail))
        .route("/sms", get(get_sms).post(save_sms))
        .route("/payment", get(get_payment).post(save_payment))
        .route("/topbar", get(get_topbar).post(save_topbar))
        .route("/social", get(get_social).post(save_social))
        .route("/about-us", get(get_about_us).post(save_about_us))
        .route("/call-to-action", get(get_call_to_action).post(save_call_to_action))
}
