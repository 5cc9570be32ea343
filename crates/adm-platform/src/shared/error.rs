//! Platform Error Types

use thiserror::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response, Json},
};
use utoipa::ToSchema;

#[derive(Error, Debug)]
pub enum AdmissionsError {
    #[error("No {entity_type} found with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("{field} already exists. Please use a different value.")]
    Duplicate { field: String },

    #[error("{message}")]
    Validation { message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Your token has expired! Please log in again.")]
    TokenExpired,

    #[error("Invalid token. Please log in again!")]
    InvalidToken,

    #[error("{message}")]
    Forbidden { message: String },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bson::de::Error),

    #[error("Mail error: {message}")]
    Mail { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AdmissionsError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>) -> Self {
        Self::Duplicate { field: field.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AdmissionsError::NotFound { .. } => StatusCode::NOT_FOUND,
            AdmissionsError::Duplicate { .. } => StatusCode::BAD_REQUEST,
            AdmissionsError::Validation { .. } => StatusCode::BAD_REQUEST,
            AdmissionsError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            AdmissionsError::TokenExpired => StatusCode::UNAUTHORIZED,
            AdmissionsError::InvalidToken => StatusCode::UNAUTHORIZED,
            AdmissionsError::Forbidden { .. } => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdmissionsError>;

/// Error response body: every failure leaves the service as this envelope.
/// `status` is "fail" for client errors and "error" for server errors.
#[derive(Debug, serde::Serialize, ToSchema)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl IntoResponse for AdmissionsError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Internals stay server-side; the caller only sees a generic message.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Something went very wrong!".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            status: if status.is_client_error() { "fail" } else { "error" }.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(
            AdmissionsError::validation("bad input").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AdmissionsError::duplicate("email").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AdmissionsError::unauthorized("no token").into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AdmissionsError::forbidden("admin only").into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AdmissionsError::not_found("Student", "X").into_response().status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_token_errors_are_unauthorized() {
        assert_eq!(
            AdmissionsError::TokenExpired.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AdmissionsError::InvalidToken.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_internal_errors_map_to_500() {
        assert_eq!(
            AdmissionsError::internal("boom").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_duplicate_message_names_field() {
        let err = AdmissionsError::duplicate("email");
        assert_eq!(err.to_string(), "email already exists. Please use a different value.");
    }
}
