//! # Domain Models
//!
//! Typed entity structs and input DTOs for every lifecycle-managed resource.
//! Fields are explicit and compile-time checked; "mass-fill from request"
//! becomes an explicit `New*` / `Update*` DTO consumed by the repositories.

pub mod access;
pub mod actor;
pub mod content;
pub mod geo;
pub mod reference;
pub mod settings;
pub mod stats;

pub use access::{NewPermission, NewRole, Permission, Role, UpdatePermission, UpdateRole};
pub use actor::Actor;
pub use content::{
    Course, Faq, GalleryItem, NewCourse, NewFaq, NewGalleryItem, NewNews, NewPage, NewSlider,
    NewTestimonial, NewWebEvent, News, Page, Slider, Testimonial, UpdateCourse, UpdateFaq,
    UpdateGalleryItem, UpdateNews, UpdatePage, UpdateSlider, UpdateTestimonial, UpdateWebEvent,
    WebEvent,
};
pub use geo::{
    City, Country, NewCity, NewCountry, NewState, RelatedRef, State, UpdateCity, UpdateCountry,
    UpdateState,
};
pub use reference::{
    Currency, Language, NewCurrency, NewLanguage, NewTimezone, Timezone, UpdateCurrency,
    UpdateLanguage, UpdateTimezone,
};
pub use stats::LifecycleStatistics;

use serde::{Deserialize, Serialize};

/// Audit stamp: a weak reference to the acting user, populated
/// opportunistically when a caller is authenticated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub id: Option<i64>,
    pub name: Option<String>,
}

impl AuditStamp {
    pub fn from_actor(actor: Option<&Actor>) -> Self {
        match actor {
            Some(actor) => Self { id: Some(actor.id), name: Some(actor.name.clone()) },
            None => Self::default(),
        }
    }
}
