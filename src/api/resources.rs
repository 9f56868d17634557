//! `LifecycleResource` bindings for every managed entity.
//!
//! Each binding is a zero-sized marker delegating straight to its repository;
//! image-bearing entities additionally report their blob paths so a force
//! delete removes the stored file.

use crate::domain::{
    Actor, City, Country, Course, Currency, Faq, GalleryItem, Language, NewCity, NewCountry,
    NewCourse, NewCurrency, NewFaq, NewGalleryItem, NewLanguage, NewNews, NewPage, NewPermission,
    NewRole, NewSlider, NewState, NewTestimonial, NewTimezone, NewWebEvent, News, Page,
    Permission, Role, Slider, State, Testimonial, Timezone, UpdateCity, UpdateCountry,
    UpdateCourse, UpdateCurrency, UpdateFaq, UpdateGalleryItem, UpdateLanguage, UpdateNews,
    UpdatePage, UpdatePermission, UpdateRole, UpdateSlider, UpdateState, UpdateTestimonial,
    UpdateTimezone, UpdateWebEvent, WebEvent,
};
use crate::errors::Result;
use crate::storage::repositories::{
    CityFilter, CityRepository, CountryRepository, CourseRepository, CurrencyRepository,
    FaqRepository, GalleryRepository, LanguageRepository, NewsRepository, PageRepository,
    PermissionFilter, PermissionRepository, RoleRepository, SliderRepository, StateFilter,
    StateRepository, StatusFilter, TestimonialRepository, TimezoneRepository, WebEventRepository,
};
use crate::storage::{DbPool, LifecycleTable, ListParams, Page as ResultPage, TrashFilter};

use super::resource::LifecycleResource;

macro_rules! lifecycle_resource {
    (@delegate $repo:ident) => {
        async fn list(
            pool: &DbPool,
            params: &ListParams,
            filter: &Self::Filter,
        ) -> Result<ResultPage<Self::Entity>> {
            $repo::new(pool.clone()).list(params, filter).await
        }

        async fn create(
            pool: &DbPool,
            input: Self::New,
            actor: Option<&Actor>,
        ) -> Result<Self::Entity> {
            $repo::new(pool.clone()).create(input, actor).await
        }

        async fn find(
            pool: &DbPool,
            id: i64,
            trash: TrashFilter,
        ) -> Result<Option<Self::Entity>> {
            $repo::new(pool.clone()).find(id, trash).await
        }

        async fn update(
            pool: &DbPool,
            id: i64,
            update: Self::Update,
            actor: Option<&Actor>,
        ) -> Result<Self::Entity> {
            $repo::new(pool.clone()).update(id, update, actor).await
        }

        async fn duplicate(
            pool: &DbPool,
            id: i64,
            actor: Option<&Actor>,
        ) -> Result<Self::Entity> {
            $repo::new(pool.clone()).duplicate(id, actor).await
        }
    };
    ($resource:ident, $repo:ident, $segment:literal, $entity:ty, $new:ty, $update:ty, $filter:ty) => {
        pub struct $resource;

        impl LifecycleResource for $resource {
            const TABLE: LifecycleTable = $repo::TABLE;
            const SEGMENT: &'static str = $segment;

            type Entity = $entity;
            type New = $new;
            type Update = $update;
            type Filter = $filter;

            lifecycle_resource!(@delegate $repo);
        }
    };
    // Variant for entities owning an `image` blob.
    ($resource:ident, $repo:ident, $segment:literal, $entity:ty, $new:ty, $update:ty, $filter:ty, image) => {
        pub struct $resource;

        impl LifecycleResource for $resource {
            const TABLE: LifecycleTable = $repo::TABLE;
            const SEGMENT: &'static str = $segment;

            type Entity = $entity;
            type New = $new;
            type Update = $update;
            type Filter = $filter;

            lifecycle_resource!(@delegate $repo);

            fn blob_paths(entity: &Self::Entity) -> Vec<String> {
                entity.image.iter().cloned().collect()
            }
        }
    };
}

lifecycle_resource!(CountryResource, CountryRepository, "countries", Country, NewCountry, UpdateCountry, StatusFilter);
lifecycle_resource!(StateResource, StateRepository, "states", State, NewState, UpdateState, StateFilter);
lifecycle_resource!(CityResource, CityRepository, "cities", City, NewCity, UpdateCity, CityFilter);
lifecycle_resource!(CurrencyResource, CurrencyRepository, "currencies", Currency, NewCurrency, UpdateCurrency, StatusFilter);
lifecycle_resource!(LanguageResource, LanguageRepository, "languages", Language, NewLanguage, UpdateLanguage, StatusFilter);
lifecycle_resource!(TimezoneResource, TimezoneRepository, "timezones", Timezone, NewTimezone, UpdateTimezone, StatusFilter);
lifecycle_resource!(RoleResource, RoleRepository, "roles", Role, NewRole, UpdateRole, StatusFilter);
lifecycle_resource!(PermissionResource, PermissionRepository, "permissions", Permission, NewPermission, UpdatePermission, PermissionFilter);
lifecycle_resource!(NewsResource, NewsRepository, "news", News, NewNews, UpdateNews, StatusFilter, image);
lifecycle_resource!(PageResource, PageRepository, "pages", Page, NewPage, UpdatePage, StatusFilter);
lifecycle_resource!(WebEventResource, WebEventRepository, "events", WebEvent, NewWebEvent, UpdateWebEvent, StatusFilter, image);
lifecycle_resource!(CourseResource, CourseRepository, "courses", Course, NewCourse, UpdateCourse, StatusFilter, image);
lifecycle_resource!(TestimonialResource, TestimonialRepository, "testimonials", Testimonial, NewTestimonial, UpdateTestimonial, StatusFilter, image);
lifecycle_resource!(SliderResource, SliderRepository, "sliders", Slider, NewSlider, UpdateSlider, StatusFilter, image);
lifecycle_resource!(FaqResource, FaqRepository, "faqs", Faq, NewFaq, UpdateFaq, StatusFilter);
lifecycle_resource!(GalleryResource, GalleryRepository, "galleries", GalleryItem, NewGalleryItem, UpdateGalleryItem, StatusFilter, image);
