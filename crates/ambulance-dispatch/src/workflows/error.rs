use axum::http::StatusCode;
use axum::response::Response;
use tracing::{error, warn};

use super::dispatch::lifecycle::TransitionError;
use super::dispatch::repository::RepositoryError;
use crate::http::error_response;

/// Error raised by the dispatch and routing services.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl WorkflowError {
    pub fn status(&self) -> StatusCode {
        match self {
            WorkflowError::NotFound(_) | WorkflowError::Repository(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            WorkflowError::Validation(_) | WorkflowError::Transition(_) => StatusCode::BAD_REQUEST,
            WorkflowError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            WorkflowError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Renders the failure envelope; `action` names the operation for 500 messages.
    pub fn into_response_for(self, action: &str) -> Response {
        let status = self.status();
        let detail = self.to_string();

        if status.is_server_error() {
            error!(%action, error = %detail, "request failed");
            return error_response(status, &format!("Failed to {action}"), &detail);
        }

        warn!(%action, status = status.as_u16(), error = %detail, "request rejected");
        let message = match &self {
            WorkflowError::NotFound(entity) => format!("{entity} not found"),
            WorkflowError::Repository(RepositoryError::Conflict) => {
                "Record was modified by another request; reload and retry".to_string()
            }
            other => capitalize(&other.to_string()),
        };
        error_response(status, &message, &detail)
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
