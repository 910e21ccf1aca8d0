use axum::http::StatusCode;
use thiserror::Error;

/// Top-level application error. All variants carry a human-readable message
/// for display/logging; the HTTP status mapping lives in the route layer.
#[derive(Debug, Error)]
pub enum AppError {
    // ── Validation errors ────────────────────────────────────────────────────
    #[error("Field '{field_name}' cannot be empty")]
    EmptyField { field_name: String },

    // ── Configuration errors ─────────────────────────────────────────────────
    #[error("Missing credential '{name}'")]
    MissingCredential { name: &'static str },

    // ── Upstream errors ──────────────────────────────────────────────────────
    #[error("Upstream error: {status} {body}")]
    UpstreamRejected { status: StatusCode, body: String },

    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),
}

impl AppError {
    pub fn empty_field(field_name: impl Into<String>) -> Self {
        AppError::EmptyField { field_name: field_name.into() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::EmptyField { .. })
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, AppError::MissingCredential { .. })
    }
}
