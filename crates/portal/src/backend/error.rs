//! Backend client errors.

use thiserror::Error;

/// Shown when the backend cannot be reached at all.
pub const CONNECTION_ERROR_MESSAGE: &str = "Ошибка соединения. Попробуйте позже.";

/// Errors that can occur when calling the hosted backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never produced a response (DNS, refused, timeout).
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("API error: {status} - {}", .message.as_deref().unwrap_or("<no message>"))]
    Api { status: u16, message: Option<String> },

    /// The backend answered 2xx with `success: false`.
    #[error("Request rejected: {}", .message.as_deref().unwrap_or("<no message>"))]
    Rejected { message: Option<String> },

    /// The response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Decode(String),
}

impl BackendError {
    /// The message to show the user.
    ///
    /// Transport failures get a generic connectivity message, application
    /// failures the server's own message, and everything else `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Transport(_) => CONNECTION_ERROR_MESSAGE.to_string(),
            Self::Api {
                message: Some(message),
                ..
            }
            | Self::Rejected {
                message: Some(message),
            } => message.clone(),
            _ => fallback.to_string(),
        }
    }

    /// HTTP status returned by the backend, if it returned one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
