//! Error types for the HTTP API.
//!
//! [`ApiError`] unifies all failure modes into a single enum that can be
//! converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.
//!
//! Every failure maps to `500 Internal Server Error`. The body always
//! has the shape `{"error": <message>, "status": 500}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use iss_core::StoreError;

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The epoch store failed to load or answer the query.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let message = self.to_string();

        match &self {
            Self::Store(
                StoreError::MalformedTimestamp(_)
                | StoreError::EpochNotFound(_)
                | StoreError::InvalidParameter { .. },
            ) => tracing::debug!(error = %message, "Request rejected"),
            _ => tracing::error!(error = %message, "Request failed"),
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use iss_types::Timestamp;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn store_errors_become_500_with_message() {
        let timestamp: Timestamp = "2000-001T00:00:00.001Z".parse().unwrap();
        let response = ApiError::from(StoreError::EpochNotFound(timestamp)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        assert_eq!(json["status"], 500);
        assert_eq!(
            json["error"],
            "There is no epoch in the dataset whose time perfectly matches 2000-001T00:00:00.001Z"
        );
    }

    #[tokio::test]
    async fn origin_failure_is_500() {
        let error = ApiError::from(StoreError::OriginUnavailable("connection refused".to_owned()));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert!(
            json["error"]
                .as_str()
                .unwrap()
                .contains("connection refused")
        );
    }
}
