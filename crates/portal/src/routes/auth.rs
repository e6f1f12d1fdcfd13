//! Login and logout.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use partner_portal_core::Viewer;
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::Layout;
use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::middleware::{CurrentViewer, clear_session, store_session};
use crate::models::SessionToken;
use crate::state::AppState;

const LOGIN_FAILED_MESSAGE: &str = "Ошибка входа";
const MISSING_CREDENTIALS_MESSAGE: &str = "Введите email и пароль.";

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Login page template.
///
/// On failure the email is put back into the form; the password never is.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub email: String,
    pub error: Option<String>,
}

/// Display the login page.
///
/// Signed-in viewers go straight to their home view.
pub async fn login_page(CurrentViewer(viewer): CurrentViewer) -> Response {
    if !viewer.is_guest() {
        return Redirect::to(viewer.home_path()).into_response();
    }

    LoginTemplate {
        layout: Layout::default(),
        email: String::new(),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
///
/// On success both session entries are written and the viewer is sent to
/// their role's home. On failure nothing is written.
#[instrument(skip_all, fields(email = %form.email.trim()))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Ok(failed(&form, MISSING_CREDENTIALS_MESSAGE.to_string()));
    }

    let password = SecretString::from(form.password.clone());
    let logged_in = match state.backend().login(email, &password).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            return Ok(failed(&form, e.user_message(LOGIN_FAILED_MESSAGE)));
        }
    };

    let token = SessionToken::new(logged_in.session_token);
    store_session(&session, &logged_in.partner, &token).await?;
    set_sentry_user(&logged_in.partner.id, Some(logged_in.partner.email.as_str()));

    let viewer = Viewer::resolve(Some(logged_in.partner));
    tracing::info!(home = viewer.home_path(), "Partner logged in");

    Ok(Redirect::to(viewer.home_path()).into_response())
}

fn failed(form: &LoginForm, error: String) -> Response {
    LoginTemplate {
        layout: Layout::default(),
        email: form.email.clone(),
        error: Some(error),
    }
    .into_response()
}

/// Handle logout.
///
/// Clears both session entries whatever the role and lands on `/`.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_session(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/"))
}
