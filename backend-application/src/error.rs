use thiserror::Error;

use backend_domain::RenderError;

/// Application error taxonomy. Validation and business-rule rejections are
/// surfaced to the caller as-is; storage failures are retried at the command
/// boundary before they reach here. Nothing is silently swallowed.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("scan event '{0}' already recorded")]
    Duplicate(String),
    #[error("entrant '{0}' already claimed an entry")]
    AlreadyClaimed(String),
    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}
