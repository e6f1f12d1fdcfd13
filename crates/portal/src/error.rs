//! Request errors and Sentry reporting.
//!
//! Handlers that render a form turn backend failures into an inline message
//! themselves. The rest return `Result<_, AppError>`; backend and session
//! failures are captured to Sentry on the way out.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use partner_portal_core::PartnerId;
use thiserror::Error;

use crate::backend::BackendError;

const SERVICE_UNAVAILABLE_MESSAGE: &str = "Ошибка сервиса. Попробуйте позже.";

/// Errors a handler can bail out with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("backend call failed: {0}")]
    Backend(#[from] BackendError),

    #[error("session store failed: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The partner is not in the admin's list.
    #[error("partner {0} not found")]
    PartnerNotFound(PartnerId),

    /// A lead status outside the known set was submitted.
    #[error("unknown lead status {0:?}")]
    UnknownStatus(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Backend(BackendError::Transport(e)) if e.is_timeout() => {
                StatusCode::GATEWAY_TIMEOUT
            }
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PartnerNotFound(_) => StatusCode::NOT_FOUND,
            Self::UnknownStatus(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Text shown to the user. Session internals are never echoed.
    fn user_message(&self) -> String {
        match self {
            Self::Backend(err) => err.user_message(SERVICE_UNAVAILABLE_MESSAGE),
            Self::Session(_) => "Внутренняя ошибка сервера".to_string(),
            Self::PartnerNotFound(_) => "Партнёр не найден".to_string(),
            Self::UnknownStatus(status) => format!("Неизвестный статус: {status}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Backend(_) | Self::Session(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(error = %self, sentry_event_id = %event_id, "Request failed");
        } else {
            tracing::info!(error = %self, "Request refused");
        }

        (self.status(), self.user_message()).into_response()
    }
}

/// Attach the signed-in partner to Sentry events.
pub fn set_sentry_user(partner_id: &PartnerId, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(partner_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Drop the Sentry user on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| scope.set_user(None));
}
