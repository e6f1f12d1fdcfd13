//! Role resolution and gating extractors.
//!
//! The viewer is resolved from the session before the handler runs, so a
//! guest reaching a protected page is redirected before any backend call.
//! Partners and admins each have one home view; an extractor for the other
//! role redirects there instead of rendering.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use partner_portal_core::{PartnerIdentity, Viewer};
use tower_sessions::Session;

use crate::models::{SessionToken, session_keys};

/// Path of the login page.
pub const LOGIN_PATH: &str = "/login";

/// Extractor resolving the current viewer. Never rejects.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentViewer(viewer): CurrentViewer) -> impl IntoResponse {
///     match viewer {
///         Viewer::Guest => "Hello, guest!".to_string(),
///         Viewer::Partner(p) | Viewer::Admin(p) => format!("Hello, {}!", p.name),
///     }
/// }
/// ```
pub struct CurrentViewer(pub Viewer);

/// Extractor that requires a signed-in, non-admin partner.
///
/// Guests go to the login page, admins to the admin panel.
pub struct RequirePartner(pub PartnerIdentity);

/// Extractor that requires a signed-in admin.
///
/// Guests go to the login page, partners to their dashboard.
pub struct RequireAdmin(pub PartnerIdentity);

/// Rejection for the role extractors.
#[derive(Debug)]
pub enum AuthRejection {
    /// Send the viewer somewhere they are allowed to be.
    Redirect(&'static str),
    /// No session layer on the request.
    MissingSession,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect(path) => Redirect::to(path).into_response(),
            Self::MissingSession => {
                tracing::error!("Session layer missing from request");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Read the viewer from the session.
///
/// A session entry that no longer deserializes is treated as absent.
async fn resolve_viewer(parts: &Parts) -> Result<Viewer, AuthRejection> {
    let session = parts
        .extensions
        .get::<Session>()
        .ok_or(AuthRejection::MissingSession)?;

    let identity = session
        .get::<PartnerIdentity>(session_keys::PARTNER)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding unreadable session identity");
            None
        });

    Ok(Viewer::resolve(identity))
}

impl<S> FromRequestParts<S> for CurrentViewer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve_viewer(parts).await.unwrap_or_default()))
    }
}

impl<S> FromRequestParts<S> for RequirePartner
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match resolve_viewer(parts).await? {
            Viewer::Partner(identity) => Ok(Self(identity)),
            Viewer::Guest => Err(AuthRejection::Redirect(LOGIN_PATH)),
            admin @ Viewer::Admin(_) => Err(AuthRejection::Redirect(admin.home_path())),
        }
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match resolve_viewer(parts).await? {
            Viewer::Admin(identity) => Ok(Self(identity)),
            Viewer::Guest => Err(AuthRejection::Redirect(LOGIN_PATH)),
            partner @ Viewer::Partner(_) => {
                tracing::warn!(
                    partner_id = ?partner.identity().map(|p| p.id),
                    path = %parts.uri.path(),
                    "Non-admin partner tried to open the admin panel"
                );
                Err(AuthRejection::Redirect(partner.home_path()))
            }
        }
    }
}

/// Write both session entries after a successful login.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn store_session(
    session: &Session,
    identity: &PartnerIdentity,
    token: &SessionToken,
) -> Result<(), tower_sessions::session::Error> {
    // A fresh ID on privilege change
    session.cycle_id().await?;
    session.insert(session_keys::PARTNER, identity).await?;
    session.insert(session_keys::SESSION_TOKEN, token).await
}

/// Remove both session entries (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<PartnerIdentity>(session_keys::PARTNER)
        .await?;
    session
        .remove::<SessionToken>(session_keys::SESSION_TOKEN)
        .await?;
    session.flush().await
}
