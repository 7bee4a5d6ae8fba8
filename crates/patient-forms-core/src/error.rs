use thiserror::Error;

use crate::validation::ValidationErrors;

/// Errors surfaced by the patient form client and controllers
#[derive(Debug, Error)]
pub enum FormsError {
    #[error("Unable to reach FHIR server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Request failed: {status} {status_text}")]
    RequestFailed { status: u16, status_text: String },

    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid page link: {0}")]
    InvalidPageLink(#[from] url::ParseError),

    #[error("Patient form is closed: the patient was deleted")]
    FormClosed,

    #[error("Patient form has not been loaded")]
    NotLoaded,
}

impl FormsError {
    /// Create a new RequestFailed error from a response status
    pub fn request_failed(status: reqwest::StatusCode) -> Self {
        Self::RequestFailed {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }

    /// HTTP status code carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this error was raised before anything was sent
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::FormClosed | Self::NotLoaded | Self::InvalidPageLink(_)
        )
    }
}

/// Result type alias for patient form operations
pub type Result<T> = std::result::Result<T, FormsError>;
