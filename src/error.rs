use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::APIResponse;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IsbnError {
    #[error("expected 13 digits, got {0}")]
    WrongLength(usize),
    #[error("prefix {0} is not a book (978/979)")]
    NotBookland(String),
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("library request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("library returned {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
    #[error("invalid library response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("ValidationError: {0}")]
    Validation(String),
    #[error("LibraryError: {}", crate::unpack_error(.0))]
    Library(#[from] LibraryError),
    #[error("NotFound: {0}")]
    NotFound(String),
}

impl From<IsbnError> for HandlerError {
    fn from(error: IsbnError) -> Self {
        HandlerError::Validation(format!("invalid isbn: {}", error))
    }
}

impl HandlerError {
    fn status_code(&self) -> StatusCode {
        use HandlerError::*;
        match self {
            Validation(_) => StatusCode::BAD_REQUEST,
            Library(_) => StatusCode::BAD_GATEWAY,
            NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Message shown to the user. Remote rejections pass through verbatim.
    fn public_message(&self) -> String {
        use HandlerError::*;
        match self {
            Validation(msg) | NotFound(msg) => msg.clone(),
            Library(LibraryError::Rejected(msg)) => msg.clone(),
            Library(_) => "library service unavailable".to_string(),
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::info!(error = %self, "request rejected");
        }
        (status, Json(APIResponse::error(&self.public_message()))).into_response()
    }
}
