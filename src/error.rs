use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::engine::ReconcileError;
use crate::store::StoreError;

/// Errors a handler can return; rendered as `{"message": ...}`.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    BadRequest(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    Store(StoreError),

    #[display(fmt = "{}", _0)]
    Reconcile(ReconcileError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ApiError::NotFound(format!("Attendance record {id} not found")),
            other => ApiError::Store(other),
        }
    }
}

impl From<ReconcileError> for ApiError {
    fn from(e: ReconcileError) -> Self {
        ApiError::Reconcile(e)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Reconcile(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // database details stay in the log
            ApiError::Store(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({ "message": message }))
    }
}
