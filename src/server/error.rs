//! Error-to-HTTP response conversion.
//!
//! Handlers return `Result<T, AppError>`; any [`mediasort_common::Error`]
//! converts with `?`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mediasort_common::Error;
use mediasort_naming::NamingError;
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError(pub Error);

impl AppError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl From<NamingError> for AppError {
    fn from(e: NamingError) -> Self {
        Self(Error::validation(e.to_string()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.0,
                "Server error in API handler"
            );
        }

        let body = json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        });

        (status, Json(body)).into_response()
    }
}

/// Unwrap a JSON body, turning extractor rejections into a 400 with the
/// usual error body.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| Error::validation(format!("Invalid request body: {}", e.body_text())).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_produces_404() {
        let response = AppError::from(Error::not_found("batch", "abc")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn naming_error_produces_400() {
        let response = AppError::from(NamingError::EmptySeries).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn tool_error_produces_502() {
        let err = AppError::from(Error::tool("ffmpeg", "not found"));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
