//! HTTP-facing error rendering.
//!
//! Domain errors and request validation failures both come out in the same
//! `{success: false, message, data: null}` envelope; validation adds an
//! `errors` map of field name to messages and answers 422.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use validator::ValidationErrors;

use crate::errors::Error;

#[derive(Debug)]
pub enum ApiError {
    Domain(Error),
    Invalid(ValidationErrors),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError::Domain(err)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Invalid(errors)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
    data: Option<()>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, Vec<String>>>,
}

fn validation_map(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    errors
        .field_errors()
        .iter()
        .map(|(field, field_errors)| {
            let messages = field_errors
                .iter()
                .map(|e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Validation failed on '{}'", e.code),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            ApiError::Invalid(validation) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "The given data was invalid".to_string(),
                Some(validation_map(&validation)),
            ),
            ApiError::Domain(err) => {
                let status = StatusCode::from_u16(err.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let errors = match &err {
                    Error::Validation { message, field: Some(field) } => {
                        let mut map = BTreeMap::new();
                        map.insert(field.clone(), vec![message.clone()]);
                        Some(map)
                    }
                    _ => None,
                };
                if status.is_server_error() {
                    tracing::error!(error = %err, "Request failed");
                }
                (status, err.to_string(), errors)
            }
        };

        (status, Json(ErrorBody { success: false, message, data: None, errors })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(length(min = 1))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_validation_errors_grouped_by_field() {
        let probe = Probe { name: String::new(), email: "nope".to_string() };
        let errors = probe.validate().unwrap_err();
        let map = validation_map(&errors);
        assert!(map.contains_key("name"));
        assert!(map.contains_key("email"));
    }

    #[tokio::test]
    async fn test_domain_error_status_mapping() {
        let response = ApiError::from(Error::not_found("Country", 9)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ApiError::from(Error::validation("bad input")).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = ApiError::from(Error::conflict("exists", "Country")).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
