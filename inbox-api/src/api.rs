use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("update request carries neither a status nor a priority")]
    EmptyUpdate,
    #[error("update request does not change the ticket")]
    NoChanges,

    #[error("ticket {0} not found")]
    TicketNotFound(i64),

    #[error("no metrics snapshot has been published yet, run the batch job")]
    MetricsUnavailable,

    #[error("ticket {0} is being updated concurrently, please retry")]
    StoreContention(i64),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::EmptyUpdate | ApiError::NoChanges => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }

            ApiError::TicketNotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),

            ApiError::MetricsUnavailable => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),

            ApiError::StoreContention(_) => (StatusCode::SERVICE_UNAVAILABLE, self.to_string()),
        }
        .into_response()
    }
}
