//! Response envelope, error bodies, and request extractors.
//!
//! Success bodies are `{"data": ...}`. Errors are
//! `{"error": "...", "code": "...", "hint"?: "..."}` with the status taken
//! from the error's [`ErrorCode`](crate::error::ErrorCode).

use crate::error::{Error, Result};
use async_trait::async_trait;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{error, warn};

/// Success wrapper.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// Wrap a payload in the success envelope.
pub fn data<T: Serialize>(value: T) -> Json<Envelope<T>> {
    Json(Envelope { data: value })
}

/// `{"success": true}` body for deletes.
#[derive(Debug, Serialize)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub const OK: Self = Self { success: true };
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if self.is_public() {
            warn!(code = self.error_code().as_str(), error = %self, "Request rejected");
        } else {
            error!(code = self.error_code().as_str(), error = %self, "Request failed");
        }

        (status, Json(self.to_structured_json())).into_response()
    }
}

/// JSON body extractor that reports malformed bodies with the standard
/// error shape instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(Error::InvalidArgument(rejection.body_text())),
        }
    }
}

/// Parse a `:id` path segment.
///
/// # Errors
///
/// Returns `InvalidArgument` (400) for anything but a positive integer.
pub fn parse_task_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| Error::InvalidArgument(format!("Invalid task id '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_id() {
        assert_eq!(parse_task_id("42").unwrap(), 42);
        assert!(parse_task_id("abc").is_err());
        assert!(parse_task_id("0").is_err());
        assert!(parse_task_id("-3").is_err());
    }

    #[test]
    fn test_envelope_shape() {
        let Json(body) = data(vec![1, 2]);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"data": [1, 2]}));
    }

    #[test]
    fn test_error_status() {
        let resp = Error::TaskNotFound { id: 1 }.into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = Error::Unauthenticated.into_response();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = Error::Other("disk on fire".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
