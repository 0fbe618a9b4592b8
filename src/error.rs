use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Failures surfaced by the API. Eligibility problems are not errors (they
/// downgrade the score to the sentinel and ride along as warnings); partial
/// image-deletion failures are logged and tolerated in the delete pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A required field is missing at save time. Blocks submission, never
    /// reaches the datastore.
    #[error("{0}")]
    Validation(String),

    /// The score calculator failed on malformed data. Save is blocked; the
    /// message is localized and actionable.
    #[error("{0}")]
    Calculation(String),

    #[error("record not found")]
    NotFound,

    /// Datastore/storage/transport failure, surfaced verbatim. No automatic
    /// retries.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ApiError::Calculation(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Record not found".to_string()),
            ApiError::Transport(e) => {
                let m = e.to_string();
                let m = if m.trim().is_empty() {
                    crate::i18n::server_error(crate::i18n::Lang::default()).to_string()
                } else {
                    m
                };
                (StatusCode::INTERNAL_SERVER_ERROR, m)
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
