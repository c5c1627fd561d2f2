use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::models::MutationKind;
use crate::store::StoreError;

pub type AppResult<T> = Result<T, AppError>;

/// Typed outcomes surfaced by every component; the boundary maps each to a
/// response status. No uncaught faults cross this layer.
#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or unrecognized input. The client must fix the request.
    #[error("Invalid request")]
    InvalidRequest,

    /// Target person absent for an update/remove.
    #[error("Not Found")]
    NotFound,

    /// The existence lookup itself failed. Retryable by the caller.
    #[error("Internal Error Try Later")]
    Lookup(#[source] StoreError),

    /// The transactional write failed; neither record was persisted.
    #[error("Failed to {} person", .kind.verb())]
    Mutation {
        kind: MutationKind,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Lookup(_) | Self::Mutation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
