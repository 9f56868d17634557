//! Request context middleware.
//!
//! The upstream identity layer terminates authentication and forwards the
//! verified user as `x-actor-id` / `x-actor-name` headers; here they become an
//! explicit `Actor` carried as a request extension. Requests without the
//! headers run anonymously, which mutating operations record as absent audit
//! stamps.

use axum::extract::Request;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::Actor;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// The acting user for the current request, if one was forwarded.
#[derive(Debug, Clone, Default)]
pub struct CurrentActor(pub Option<Actor>);

pub async fn with_actor(mut request: Request, next: Next) -> Response {
    let actor = actor_from_headers(request.headers());
    request.extensions_mut().insert(CurrentActor(actor));
    next.run(request).await
}

fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let id: i64 = headers.get(ACTOR_ID_HEADER)?.to_str().ok()?.trim().parse().ok()?;
    let name = headers
        .get(ACTOR_NAME_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("user-{}", id));
    Some(Actor::new(id, name))
}

/// Tag every request with a fresh id, span it, and echo the id back.
pub async fn request_id(request: Request, next: Next) -> Response {
    let id = Uuid::new_v4();
    let span = tracing::info_span!(
        "http_request",
        request_id = %id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (key, value) in pairs {
            map.insert(
                axum::http::HeaderName::from_bytes(key.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        map
    }

    #[test]
    fn test_actor_parsed_from_headers() {
        let actor =
            actor_from_headers(&headers(&[("x-actor-id", "42"), ("x-actor-name", "Registrar")]));
        assert_eq!(actor, Some(Actor::new(42, "Registrar")));
    }

    #[test]
    fn test_missing_or_bad_id_means_anonymous() {
        assert_eq!(actor_from_headers(&headers(&[("x-actor-name", "Ghost")])), None);
        assert_eq!(actor_from_headers(&headers(&[("x-actor-id", "not-a-number")])), None);
    }

    #[test]
    fn test_name_falls_back_to_id() {
        let actor = actor_from_headers(&headers(&[("x-actor-id", "7"), ("x-actor-name", "  ")]));
        assert_eq!(actor, Some(Actor::new(7, "user-7")));
    }
}
