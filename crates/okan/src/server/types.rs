use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::access::nav::NavShell;
use crate::access::routes::Page;
use crate::api::error::ApiError;
use crate::pages::Notice;

/// A JSON error body of the form `{ "error": ..., "details": ... }`.
#[derive(Debug)]
pub struct ApiErrorType {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<String>,
}

impl From<(StatusCode, &str, Option<String>)> for ApiErrorType {
    fn from((status, error, details): (StatusCode, &str, Option<String>)) -> Self {
        Self {
            status,
            error: error.to_string(),
            details,
        }
    }
}

impl From<ApiError> for ApiErrorType {
    fn from(e: ApiError) -> Self {
        let (status, error) = match &e {
            _ if e.needs_reauth() => (StatusCode::UNAUTHORIZED, "Session expired"),
            ApiError::NotFound { .. } => (StatusCode::NOT_FOUND, "Not found"),
            ApiError::Network { .. } => (StatusCode::BAD_GATEWAY, "Data service unreachable"),
            ApiError::Status { .. } | ApiError::Decode { .. } => {
                (StatusCode::BAD_GATEWAY, "Data service error")
            }
            ApiError::Url { .. } | ApiError::Auth(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load page data")
            }
        };
        (status, error, Some(e.to_string())).into()
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.error,
                "details": self.details,
            })),
        )
            .into_response()
    }
}

/// Body of every page response.
#[derive(Debug, Serialize)]
pub struct PageResponse {
    pub page: Page,
    pub title: &'static str,
    /// Present when someone is signed in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nav: Option<NavShell>,
    pub data: serde_json::Value,
}

/// 200 for successful actions, 422 otherwise, with the notice as body.
pub fn notice_response(notice: Notice) -> Response {
    let status = if notice.is_success() {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(notice)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::AuthFailure;

    #[test]
    fn test_api_error_statuses() {
        let expired: ApiErrorType = ApiError::Auth(AuthFailure::SessionExpired).into();
        assert_eq!(expired.status, StatusCode::UNAUTHORIZED);

        let missing: ApiErrorType = ApiError::NotFound { table: "courses" }.into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let upstream: ApiErrorType = ApiError::Status {
            status: 500,
            message: "boom".into(),
            code: None,
        }
        .into();
        assert_eq!(upstream.status, StatusCode::BAD_GATEWAY);
        assert!(upstream.details.unwrap().contains("boom"));
    }

    #[test]
    fn test_notice_status() {
        assert_eq!(
            notice_response(Notice::success("ok")).status(),
            StatusCode::OK
        );
        assert_eq!(
            notice_response(Notice::error("no")).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
