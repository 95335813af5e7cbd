use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::service::{FailureKind, StylizeError};

pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::BadInput => StatusCode::BAD_REQUEST,
        FailureKind::TransformError | FailureKind::EncodeError | FailureKind::Io => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// 失败统一序列化为 `{"error": "<message>"}`。
impl IntoResponse for StylizeError {
    fn into_response(self) -> Response {
        let status = status_for(self.kind());
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
