//! API handlers for the Pustaka REST endpoints

pub mod auth;
pub mod books;
pub mod categories;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

/// JSON extractor that runs payload validation and answers 400 on failure.
///
/// The stock `Json` extractor rejects malformed bodies with 422; this wraps
/// it so both deserialization and validation failures surface as the same
/// validation error.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection: JsonRejection| AppError::Validation(rejection.body_text()))?;

        value.validate().map_err(validation_message)?;

        Ok(ValidatedJson(value))
    }
}

/// Flatten validator errors into a single user-facing message
fn validation_message(errors: ValidationErrors) -> AppError {
    let mut parts: Vec<String> = Vec::new();
    for (field, field_errors) in errors.field_errors() {
        for error in field_errors {
            match &error.message {
                Some(message) => parts.push(message.to_string()),
                None => parts.push(format!("{} is invalid", field)),
            }
        }
    }
    parts.sort();
    AppError::Validation(parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookPayload;

    #[test]
    fn validation_errors_flatten_to_a_single_message() {
        let payload = BookPayload {
            title: String::new(),
            description: "desc".to_string(),
            image: "http://example.com/cover.png".to_string(),
            release_year: 1970,
            price: "Rp 100.000".to_string(),
            total_page: 120,
            category: 1,
        };

        let errors = payload.validate().unwrap_err();
        let AppError::Validation(message) = validation_message(errors) else {
            panic!("expected a validation error");
        };

        assert!(message.contains("title must not be empty"));
        assert!(message.contains("release_year must be between 1980 and 2021"));
    }
}
