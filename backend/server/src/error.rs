use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use roster::{
    RemoteError, mail::MailError, payment::PaymentRejection, registration::TransitionError,
    validation::Rejection,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::mailer::MailerError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error("{0}")]
    Validation(#[from] Rejection),

    #[error("{0}")]
    Payment(#[from] PaymentRejection),

    #[error("{0}")]
    Mail(#[from] MailError),

    #[error("{0}")]
    Transition(#[from] TransitionError),

    #[error("{0}")]
    Mailer(#[from] MailerError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Service(String),
}

impl From<RemoteError> for AppError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::NotFound => AppError::NotFound,
            RemoteError::Service { status, message } => {
                error!("Store rejected request ({status}): {message}");
                AppError::Service(message)
            }
            other => {
                error!("Store unreachable: {other}");
                AppError::Service(other.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MalformedPayload | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Payment(_) => StatusCode::BAD_REQUEST,
            AppError::Mail(_) => StatusCode::BAD_REQUEST,
            AppError::Transition(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Mailer(MailerError::NotConfigured) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Mailer(_) => StatusCode::BAD_GATEWAY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Service(_) => StatusCode::BAD_GATEWAY,
        };

        let body = match &self {
            AppError::Validation(Rejection::Missing(labels)) => {
                json!({ "error": self.to_string(), "missing": labels, "invalid": [] })
            }
            AppError::Validation(Rejection::Invalid(errors)) => {
                json!({ "error": self.to_string(), "missing": [], "invalid": errors })
            }
            AppError::Payment(reason) => json!({ "error": self.to_string(), "reason": reason }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
