//! Public-facing web content: news, pages, events, testimonials, sliders,
//! FAQs, and gallery items.
//!
//! Sluggable entities (news, pages, events) get their slug from the slug
//! generator at create/duplicate time; callers never supply one directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub body: Option<String>,
    pub image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewNews {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    pub body: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateNews {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub excerpt: Option<String>,
    pub body: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub body: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewPage {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    pub body: Option<String>,
    #[validate(length(max = 250))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePage {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    pub body: Option<String>,
    #[validate(length(max = 250))]
    pub meta_title: Option<String>,
    #[validate(length(max = 500))]
    pub meta_description: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebEvent {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewWebEvent {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    pub description: Option<String>,
    #[validate(length(max = 250))]
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateWebEvent {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 250))]
    pub venue: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub summary: Option<String>,
    pub body: Option<String>,
    pub image: Option<String>,
    pub duration: Option<String>,
    pub fee: Option<f64>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCourse {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    #[validate(length(max = 500))]
    pub summary: Option<String>,
    pub body: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    #[validate(length(max = 120))]
    pub duration: Option<String>,
    #[validate(range(min = 0.0))]
    pub fee: Option<f64>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCourse {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub summary: Option<String>,
    pub body: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    #[validate(length(max = 120))]
    pub duration: Option<String>,
    #[validate(range(min = 0.0))]
    pub fee: Option<f64>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: i64,
    pub name: String,
    pub designation: Option<String>,
    pub message: String,
    pub image: Option<String>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewTestimonial {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(length(max = 120))]
    pub designation: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTestimonial {
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    #[validate(length(max = 120))]
    pub designation: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub message: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slider {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub image: Option<String>,
    pub link: Option<String>,
    pub sort_order: i64,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSlider {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    #[validate(length(max = 250))]
    pub subtitle: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    #[validate(length(max = 500))]
    pub link: Option<String>,
    pub sort_order: Option<i64>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateSlider {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    #[validate(length(max = 250))]
    pub subtitle: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    #[validate(length(max = 500))]
    pub link: Option<String>,
    pub sort_order: Option<i64>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faq {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub sort_order: i64,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewFaq {
    #[validate(length(min = 1, max = 500))]
    pub question: String,
    #[validate(length(min = 1))]
    pub answer: String,
    pub sort_order: Option<i64>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateFaq {
    #[validate(length(min = 1, max = 500))]
    pub question: Option<String>,
    #[validate(length(min = 1))]
    pub answer: Option<String>,
    pub sort_order: Option<i64>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryItem {
    pub id: i64,
    pub title: String,
    pub image: Option<String>,
    pub caption: Option<String>,
    pub status: bool,
    pub created_by: Option<i64>,
    pub created_by_name: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewGalleryItem {
    #[validate(length(min = 1, max = 250))]
    pub title: String,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    #[validate(length(max = 500))]
    pub caption: Option<String>,
    pub status: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateGalleryItem {
    #[validate(length(min = 1, max = 250))]
    pub title: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    #[validate(length(max = 500))]
    pub caption: Option<String>,
    pub status: Option<bool>,
}
