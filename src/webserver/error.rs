use axum::{
    response::{IntoResponse, Response},
    Json,
};
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;

pub const NOT_LOGGED_IN_MESSAGE: &str = "Please log in first";

#[derive(Debug, Error)]
pub enum WebError {
    #[error("not logged in")]
    NotLoggedIn,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
pub(super) struct FailureBody {
    pub(super) ok: bool,
    pub(super) message: String,
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            WebError::NotLoggedIn => (StatusCode::UNAUTHORIZED, NOT_LOGGED_IN_MESSAGE.to_string()),
            WebError::Internal(e) => {
                log::error!("request failed: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong, please try again later".to_string(),
                )
            }
        };

        (status, Json(FailureBody { ok: false, message })).into_response()
    }
}

pub type WebResult<T> = Result<T, WebError>;
