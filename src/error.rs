//! Handler errors, surfaced to the user through the warning page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::db::DbLockError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Wrong UUID format: {0}")]
    InvalidId(String),

    #[error("Missing name")]
    MissingName,

    #[error("Wrong period: \"{0}\"")]
    InvalidPeriod(String),

    #[error("Wrong period dim: {0}")]
    InvalidUnit(String),

    #[error("Deed not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    DatabaseUnavailable(#[from] DbLockError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Template(e) => {
                tracing::error!("Failed to render template: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
            }
            other => {
                tracing::warn!("{}", other);
                warning_redirect(&other.to_string()).into_response()
            }
        }
    }
}

/// Redirect to the warning page showing `text`
pub fn warning_redirect(text: &str) -> Redirect {
    Redirect::to(&format!("/warning?text={}", urlencoding::encode(text)))
}
