use std::ops::{Deref, DerefMut};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::report::StoreError;
use common::{CompositeError as CompositeErrorBase, ErrorCode};

#[derive(Debug)]
pub struct CompositeError(pub CompositeErrorBase);

impl CompositeError {
    pub fn new(code: ErrorCode, message: &str) -> Self {
        Self(CompositeErrorBase::new(code, message))
    }

    pub const fn to_status_code(&self) -> StatusCode {
        match self.0.code {
            ErrorCode::Ebadrequest => StatusCode::BAD_REQUEST,
            ErrorCode::Enotfound => StatusCode::NOT_FOUND,
            ErrorCode::Einternal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// `{"error": message}`, plus an `errors` object when field details exist.
    pub fn render_json(&self) -> Response {
        let status = self.to_status_code();
        let body = if self.0.has_errors() {
            json!({
                "error": self.0.message,
                "errors": self.0.errors
            })
        } else {
            json!({ "error": self.0.message })
        };
        (status, Json(body)).into_response()
    }
}

impl Deref for CompositeError {
    type Target = CompositeErrorBase;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for CompositeError {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<CompositeErrorBase> for CompositeError {
    fn from(e: CompositeErrorBase) -> Self {
        Self(e)
    }
}

impl From<StoreError> for CompositeError {
    fn from(e: StoreError) -> Self {
        Self::new(ErrorCode::Einternal, &format!("Database error: {e}"))
    }
}

impl std::fmt::Display for CompositeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for CompositeError {}

impl IntoResponse for CompositeError {
    fn into_response(self) -> Response {
        self.render_json()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_composite_error_status_codes() {
        assert_eq!(
            CompositeError::new(ErrorCode::Ebadrequest, "").to_status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CompositeError::new(ErrorCode::Enotfound, "").to_status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CompositeError::new(ErrorCode::Einternal, "").to_status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_composite_error_deref() {
        let mut error = CompositeError::new(ErrorCode::Ebadrequest, "Invalid JSON");
        error.add_detail("packageName", ErrorCode::Ebadrequest, "packageName is required");

        assert!(error.has_errors());
        assert_eq!(error.errors.len(), 1);
        assert_eq!(error.message, "Invalid JSON");
    }

    #[test]
    fn test_store_error_becomes_internal() {
        let store_error = StoreError::Sqlite(rusqlite::Error::InvalidQuery);
        let error = CompositeError::from(store_error);
        assert_eq!(error.to_status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(error.message.starts_with("Database error: "));
    }

    #[tokio::test]
    async fn test_render_json_plain() {
        let response =
            CompositeError::new(ErrorCode::Einternal, "Database error: locked").render_json();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({"error": "Database error: locked"})
        );
    }

    #[tokio::test]
    async fn test_render_json_with_details() {
        let mut error = CompositeError::new(ErrorCode::Ebadrequest, "Invalid JSON");
        error.add_detail("packageName", ErrorCode::Ebadrequest, "packageName is required");

        let body = body_json(error.into_response()).await;
        assert_eq!(body["error"], "Invalid JSON");
        assert_eq!(
            body["errors"]["packageName"],
            json!({"code": "bad_request", "message": "packageName is required"})
        );
    }
}
