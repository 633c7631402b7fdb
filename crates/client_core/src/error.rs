use std::time::Duration;

use shared::domain::DishId;
use thiserror::Error;

/// Failure talking to the RSVP backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("server error (HTTP {status}): {message}; body: {body}")]
    Server {
        status: u16,
        message: String,
        body: String,
    },
    #[error("malformed response: {detail}; body: {body}")]
    Malformed { detail: String, body: String },
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("availability sync failed: {0}")]
    Backend(#[from] BackendError),
}

/// Rejections detected locally, before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("select a dish to bring")]
    NoDishSelected,
    #[error("dish {0} is not on the menu")]
    UnknownDish(DishId),
    #[error("'{dish}' is no longer available")]
    DishUnavailable { dish: String },
    #[error("field {0} is required")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("availability tracking has been shut down")]
    Inactive,
    #[error("no registration draft in progress")]
    NoActiveDraft,
}

impl SubmitError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Message suitable for showing to the person filling the form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => err.to_string(),
            Self::Backend(BackendError::Network(_)) => {
                "connection error; check your internet connection and try again".to_string()
            }
            Self::Backend(BackendError::Timeout(_)) => {
                "the server took too long to answer; try again".to_string()
            }
            Self::Backend(err) => format!("registration failed: {err}"),
            Self::Inactive | Self::NoActiveDraft => self.to_string(),
        }
    }
}
