//! Public read-only endpoints.
//!
//! Everything here is implicitly scoped to published (`status = true`),
//! non-trashed rows; the trash-visibility query flags are ignored so the
//! public surface can never see drafts or trashed content.

use axum::extract::{Path, Query, RawQuery, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::domain::{
    Course, Faq, GalleryItem, News, Page as PageEntity, Slider, Testimonial, WebEvent,
};
use crate::errors::Error;
use crate::storage::repositories::{
    CourseRepository, FaqRepository, GalleryRepository, NewsRepository, PageRepository,
    SliderRepository, StatusFilter, TestimonialRepository, WebEventRepository,
};
use crate::storage::{ListParams, TrashFilter};

use super::envelope::ApiResponse;
use super::error::ApiError;
use super::routes::AppState;

type ListResult<T> = std::result::Result<Json<ApiResponse<Vec<T>>>, ApiError>;
type ShowResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

fn published() -> StatusFilter {
    StatusFilter { status: Some(true) }
}

/// Strip trash-visibility flags from caller-supplied parameters.
fn public_params(mut params: ListParams) -> ListParams {
    params.include_trashed = false;
    params.only_trashed = false;
    params
}

async fn list_news(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    RawQuery(query): RawQuery,
) -> ListResult<News> {
    let params = public_params(params);
    let page = NewsRepository::new(state.pool.clone()).list(&params, &published()).await?;
    Ok(Json(ApiResponse::paginated(
        "News retrieved successfully",
        "/api/v1/public/news",
        query.as_deref(),
        page,
    )))
}

async fn show_news(State(state): State<AppState>, Path(slug): Path<String>) -> ShowResult<News> {
    let news = NewsRepository::new(state.pool.clone())
        .find_by_slug(&slug)
        .await?
        .filter(|n| n.status)
        .ok_or_else(|| Error::not_found("News", &slug))?;
    Ok(Json(ApiResponse::ok("News retrieved successfully", news)))
}

async fn list_pages(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    RawQuery(query): RawQuery,
) -> ListResult<PageEntity> {
    let params = public_params(params);
    let page = PageRepository::new(state.pool.clone()).list(&params, &published()).await?;
    Ok(Json(ApiResponse::paginated(
        "Pages retrieved successfully",
        "/api/v1/public/pages",
        query.as_deref(),
        page,
    )))
}

async fn show_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ShowResult<PageEntity> {
    let page = PageRepository::new(state.pool.clone())
        .find_by_slug(&slug)
        .await?
        .filter(|p| p.status)
        .ok_or_else(|| Error::not_found("Page", &slug))?;
    Ok(Json(ApiResponse::ok("Page retrieved successfully", page)))
}

async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    RawQuery(query): RawQuery,
) -> ListResult<WebEvent> {
    let params = public_params(params);
    let page = WebEventRepository::new(state.pool.clone()).list(&params, &published()).await?;
    Ok(Json(ApiResponse::paginated(
        "Events retrieved successfully",
        "/api/v1/public/events",
        query.as_deref(),
        page,
    )))
}

async fn show_event(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ShowResult<WebEvent> {
    let event = WebEventRepository::new(state.pool.clone())
        .find_by_slug(&slug)
        .await?
        .filter(|e| e.status)
        .ok_or_else(|| Error::not_found("Event", &slug))?;
    Ok(Json(ApiResponse::ok("Event retrieved successfully", event)))
}

async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    RawQuery(query): RawQuery,
) -> ListResult<Course> {
    let params = public_params(params);
    let page = CourseRepository::new(state.pool.clone()).list(&params, &published()).await?;
    Ok(Json(ApiResponse::paginated(
        "Courses retrieved successfully",
        "/api/v1/public/courses",
        query.as_deref(),
        page,
    )))
}

async fn show_course(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ShowResult<Course> {
    let course = CourseRepository::new(state.pool.clone())
        .find_by_slug(&slug)
        .await?
        .filter(|c| c.status)
        .ok_or_else(|| Error::not_found("Course", &slug))?;
    Ok(Json(ApiResponse::ok("Course retrieved successfully", course)))
}

async fn list_testimonials(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    RawQuery(query): RawQuery,
) -> ListResult<Testimonial> {
    let params = public_params(params);
    let page = TestimonialRepository::new(state.pool.clone()).list(&params, &published()).await?;
    Ok(Json(ApiResponse::paginated(
        "Testimonials retrieved successfully",
        "/api/v1/public/testimonials",
        query.as_deref(),
        page,
    )))
}

async fn show_testimonial(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ShowResult<Testimonial> {
    let testimonial = TestimonialRepository::new(state.pool.clone())
        .find(id, TrashFilter::Active)
        .await?
        .filter(|t| t.status)
        .ok_or_else(|| Error::not_found("Testimonial", id))?;
    Ok(Json(ApiResponse::ok("Testimonial retrieved successfully", testimonial)))
}

async fn list_sliders(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    RawQuery(query): RawQuery,
) -> ListResult<Slider> {
    let params = public_params(params);
    let page = SliderRepository::new(state.pool.clone()).list(&params, &published()).await?;
    Ok(Json(ApiResponse::paginated(
        "Sliders retrieved successfully",
        "/api/v1/public/sliders",
        query.as_deref(),
        page,
    )))
}

async fn show_slider(State(state): State<AppState>, Path(id): Path<i64>) -> ShowResult<Slider> {
    let slider = SliderRepository::new(state.pool.clone())
        .find(id, TrashFilter::Active)
        .await?
        .filter(|s| s.status)
        .ok_or_else(|| Error::not_found("Slider", id))?;
    Ok(Json(ApiResponse::ok("Slider retrieved successfully", slider)))
}

async fn list_faqs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    RawQuery(query): RawQuery,
) -> ListResult<Faq> {
    let params = public_params(params);
    let page = FaqRepository::new(state.pool.clone()).list(&params, &published()).await?;
    Ok(Json(ApiResponse::paginated(
        "FAQs retrieved successfully",
        "/api/v1/public/faqs",
        query.as_deref(),
        page,
    )))
}

async fn show_faq(State(state): State<AppState>, Path(id): Path<i64>) -> ShowResult<Faq> {
    let faq = FaqRepository::new(state.pool.clone())
        .find(id, TrashFilter::Active)
        .await?
        .filter(|f| f.status)
        .ok_or_else(|| Error::not_found("Faq", id))?;
    Ok(Json(ApiResponse::ok("FAQ retrieved successfully", faq)))
}

async fn list_galleries(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    RawQuery(query): RawQuery,
) -> ListResult<GalleryItem> {
    let params = public_params(params);
    let page = GalleryRepository::new(state.pool.clone()).list(&params, &published()).await?;
    Ok(Json(ApiResponse::paginated(
        "Gallery retrieved successfully",
        "/api/v1/public/galleries",
        query.as_deref(),
        page,
    )))
}

async fn show_gallery_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ShowResult<GalleryItem> {
    let item = GalleryRepository::new(state.pool.clone())
        .find(id, TrashFilter::Active)
        .await?
        .filter(|g| g.status)
        .ok_or_else(|| Error::not_found("Gallery item", id))?;
    Ok(Json(ApiResponse::ok("Gallery item retrieved successfully", item)))
}

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/news", get(list_news))
        .route("/news/{slug}", get(show_news))
        .route("/pages", get(list_pages))
        .route("/pages/{slug}", get(show_page))
        .route("/events", get(list_events))
        .route("/events/{slug}", get(show_event))
        .route("/courses", get(list_courses))
        .route("/courses/{slug}", get(show_course))
        .route("/testimonials", get(list_testimonials))
        .route("/testimonials/{id}", get(show_testimonial))
        .route("/sliders", get(list_sliders))
        .route("/sliders/{id}", get(show_slider))
        .route("/faqs", get(list_faqs))
        .route("/faqs/{id}", get(show_faq))
        .route("/galleries", get(list_galleries))
        .route("/galleries/{id}", get(show_gallery_item))
}
