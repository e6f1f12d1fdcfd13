//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                - Landing page with calculator and registration form
//! POST /register                        - Registration action (re-renders the landing page)
//! GET  /health                          - Health check
//!
//! # Auth
//! GET  /login                           - Login page
//! POST /login                           - Login action
//! POST /logout                          - Logout action
//!
//! # Partner (requires partner)
//! GET  /dashboard                       - Leads and statistics
//! POST /dashboard/leads                 - Submit a lead
//!
//! # Admin (requires admin)
//! GET  /admin                           - Pending and approved partners
//! GET  /admin/partners/{id}/approve     - Password form for approval
//! POST /admin/partners/{id}/approve     - Approve action
//! GET  /admin/partners/{id}/reject      - Rejection confirmation
//! POST /admin/partners/{id}/reject      - Reject action
//! GET  /admin/leads                     - All leads with partner attribution
//! POST /admin/leads/{id}                - Update lead status and commission
//! ```

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod home;

use axum::{
    Router,
    routing::{MethodRouter, get, post},
};
use partner_portal_core::Viewer;

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Signed-in user shown in the page header.
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub name: String,
    pub home_path: &'static str,
    pub is_admin: bool,
}

/// Data every page layout needs.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub signed_in: Option<SignedIn>,
}

impl Layout {
    #[must_use]
    pub fn for_viewer(viewer: &Viewer) -> Self {
        let signed_in = viewer.identity().map(|identity| SignedIn {
            name: if identity.name.trim().is_empty() {
                identity.email.to_string()
            } else {
                identity.name.clone()
            },
            home_path: viewer.home_path(),
            is_admin: matches!(viewer, Viewer::Admin(_)),
        });
        Self { signed_in }
    }
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::partners))
        .route(
            "/partners/{id}/approve",
            get(admin::approve_page).post(admin::approve),
        )
        .route(
            "/partners/{id}/reject",
            get(admin::reject_page).post(admin::reject),
        )
        .route("/leads", get(admin::leads))
        .route("/leads/{id}", post(admin::update_lead))
}

/// Create the partner dashboard routes router.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/leads", post(dashboard::create_lead))
}

/// Create all routes for the portal.
///
/// With `rate_limit` set, login and registration submissions are limited
/// per client IP.
pub fn routes(rate_limit: bool) -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/register", limited(post(home::register), rate_limit))
        .route(
            "/login",
            get(auth::login_page).merge(limited(post(auth::login), rate_limit)),
        )
        .route("/logout", post(auth::logout))
        .nest("/dashboard", dashboard_routes())
        .nest("/admin", admin_routes())
}

fn limited(route: MethodRouter<AppState>, enabled: bool) -> MethodRouter<AppState> {
    if !enabled {
        return route;
    }
    match auth_rate_limiter() {
        Some(layer) => route.layer(layer),
        None => {
            tracing::error!("Invalid rate limiter quota, serving without rate limiting");
            route
        }
    }
}
