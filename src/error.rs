//! API error taxonomy.
//!
//! # Responsibilities
//! - Map pipeline failures to HTTP status codes
//! - Serialize the uniform `{success: false, error}` envelope
//! - Keep store internals out of client-visible messages
//!
//! # Design Decisions
//! - Validation surfaces the first offending field's message
//! - Store errors log full detail server-side, clients see a generic 500
//! - Rate-limit rejections carry a Retry-After header

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the request pipeline.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Input failed schema or semantic validation (400).
    #[error("{0}")]
    Validation(String),

    /// No session, unknown token, or no organization membership (401).
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated but lacking the required capability (403).
    #[error("insufficient permissions")]
    Forbidden,

    /// Too many requests within the current window (429).
    #[error("rate limit exceeded")]
    RateLimited {
        /// Seconds until the window resets.
        retry_after_secs: u64,
    },

    /// Persistence collaborator failed (500, sanitized).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Health check dependency failure (503).
    #[error("service unavailable")]
    Unavailable,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Message safe to serialize to the client.
    ///
    /// Store errors are never echoed: their detail stays in the server log.
    pub fn client_message(&self) -> String {
        match self {
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Store(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Store(err) = &self {
            tracing::error!(error = %err, "store operation failed");
        }

        let status = self.status();
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.client_message(),
        }));

        let mut response = (status, body).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_matches_taxonomy() {
        assert_eq!(
            ApiError::Validation("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::RateLimited { retry_after_secs: 1 }.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::Store(StoreError::Unavailable("db down".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(ApiError::Unavailable.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn store_detail_is_not_leaked() {
        let err = ApiError::Store(StoreError::Query("relation accounts is broken".into()));
        assert_eq!(err.client_message(), "internal server error");
    }

    #[test]
    fn validation_message_is_surfaced_verbatim() {
        let err = ApiError::Validation("status is required for update_status".into());
        assert_eq!(err.client_message(), "status is required for update_status");
    }
}
