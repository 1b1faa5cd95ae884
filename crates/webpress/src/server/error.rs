//! HTTP mapping for the closed error taxonomy.
//!
//! Every failing endpoint returns the same JSON envelope:
//! `{"error": "<code>", "message": "<human text>"}`. The status is derived
//! from the error variant here and nowhere else.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use webpress_core::{ConvertError, GateError};

/// Error envelope for the conversion service.
#[derive(Debug)]
pub(crate) struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    retry_after_secs: Option<u64>,
}

impl ApiError {
    pub(crate) fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
            retry_after_secs: None,
        }
    }
}

impl From<ConvertError> for ApiError {
    fn from(err: ConvertError) -> Self {
        let status = match &err {
            ConvertError::UnsupportedFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ConvertError::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ConvertError::MissingInput
            | ConvertError::InvalidUrl
            | ConvertError::InvalidUrlScheme
            | ConvertError::UrlFetchDisabled
            | ConvertError::Fetch(_) => StatusCode::BAD_REQUEST,
            ConvertError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ConvertError::FetchTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ConvertError::Encode(_) | ConvertError::Io(_) | ConvertError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        if !err.is_client_fault() {
            tracing::error!(code = err.code(), error = %err, "conversion failed");
        }
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
            retry_after_secs: None,
        }
    }
}

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        let (status, retry_after_secs) = match &err {
            GateError::RateLimited { retry_after_secs } => {
                (StatusCode::TOO_MANY_REQUESTS, Some(*retry_after_secs))
            }
            _ => (StatusCode::UNAUTHORIZED, None),
        };
        Self {
            status,
            code: err.code(),
            message: err.to_string(),
            retry_after_secs,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code,
            "message": self.message,
        }));
        let mut response = (self.status, body).into_response();
        if let Some(secs) = self.retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
