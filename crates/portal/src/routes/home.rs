//! Landing page, earnings calculator and partner registration.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use partner_portal_core::{COMMISSION_RATE, Email, Rubles, commission_for};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use super::Layout;
use crate::backend::Registration;
use crate::middleware::CurrentViewer;
use crate::state::AppState;

/// Estimate the calculator starts with.
pub const DEFAULT_ESTIMATE: Decimal = Decimal::from_parts(500_000, 0, 0, false, 0);

/// Preset estimates offered as quick links.
pub const ESTIMATE_PRESETS: [i64; 3] = [100_000, 300_000, 500_000];

const REGISTERED_MESSAGE: &str = "Заявка отправлена! Мы свяжемся с вами в ближайшее время.";
const REGISTER_FAILED_MESSAGE: &str = "Ошибка регистрации. Попробуйте позже.";
const REQUIRED_FIELDS_MESSAGE: &str = "Заполните имя, email и телефон.";
const INVALID_EMAIL_MESSAGE: &str = "Введите корректный email.";

// =============================================================================
// Form and Query Types
// =============================================================================

/// Calculator query: `?estimate=`.
#[derive(Debug, Default, Deserialize)]
pub struct CalculatorQuery {
    pub estimate: Option<String>,
}

/// Registration form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub traffic_source: String,
    #[serde(default)]
    pub experience: String,
}

// =============================================================================
// View Models
// =============================================================================

/// Earnings calculator state.
#[derive(Debug, Clone)]
pub struct CalculatorView {
    /// Raw estimate for the input field.
    pub estimate_input: String,
    pub estimate: String,
    pub earnings: String,
    pub rate_percent: String,
    pub presets: Vec<PresetView>,
}

#[derive(Debug, Clone)]
pub struct PresetView {
    pub value: i64,
    pub label: String,
    pub active: bool,
}

impl CalculatorView {
    #[must_use]
    pub fn new(estimate: Decimal) -> Self {
        let presets = ESTIMATE_PRESETS
            .iter()
            .map(|&value| PresetView {
                value,
                label: Rubles(Decimal::from(value)).to_string(),
                active: Decimal::from(value) == estimate,
            })
            .collect();

        Self {
            estimate_input: estimate.normalize().to_string(),
            estimate: Rubles(estimate).to_string(),
            earnings: Rubles(commission_for(estimate)).to_string(),
            rate_percent: (COMMISSION_RATE * Decimal::ONE_HUNDRED)
                .normalize()
                .to_string(),
            presets,
        }
    }
}

/// Parse the calculator input; anything invalid or negative gives the default.
#[must_use]
pub fn parse_estimate(raw: Option<&str>) -> Decimal {
    raw.map(|s| s.trim().replace([' ', '\u{a0}'], "").replace(',', "."))
        .and_then(|s| s.parse::<Decimal>().ok())
        .filter(|d| !d.is_sign_negative())
        .unwrap_or(DEFAULT_ESTIMATE)
}

// =============================================================================
// Templates
// =============================================================================

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub calculator: CalculatorView,
    pub form: RegisterForm,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Routes
// =============================================================================

/// Display the landing page.
#[instrument(skip_all)]
pub async fn home(
    CurrentViewer(viewer): CurrentViewer,
    Query(query): Query<CalculatorQuery>,
) -> impl IntoResponse {
    HomeTemplate {
        layout: Layout::for_viewer(&viewer),
        calculator: CalculatorView::new(parse_estimate(query.estimate.as_deref())),
        form: RegisterForm::default(),
        error: None,
        success: None,
    }
}

/// Handle registration form submission.
///
/// Re-renders the landing page: cleared with a confirmation on success, with
/// the entered values and an inline error on failure.
#[instrument(skip_all, fields(email = %form.email.trim()))]
pub async fn register(
    State(state): State<AppState>,
    CurrentViewer(viewer): CurrentViewer,
    Form(form): Form<RegisterForm>,
) -> Response {
    let page = |form: RegisterForm, error: Option<String>, success: Option<String>| HomeTemplate {
        layout: Layout::for_viewer(&viewer),
        calculator: CalculatorView::new(DEFAULT_ESTIMATE),
        form,
        error,
        success,
    };

    if [&form.name, &form.email, &form.phone]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return page(form, Some(REQUIRED_FIELDS_MESSAGE.to_string()), None).into_response();
    }

    let email = match Email::parse(&form.email) {
        Ok(email) => email,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected registration email");
            return page(form, Some(INVALID_EMAIL_MESSAGE.to_string()), None).into_response();
        }
    };

    let registration = Registration {
        name: form.name.trim().to_string(),
        email: email.into_inner(),
        phone: form.phone.trim().to_string(),
        traffic_source: form.traffic_source.clone(),
        experience: form.experience.clone(),
    };

    match state.backend().register(&registration).await {
        Ok(registered) => {
            tracing::info!(partner_id = ?registered.partner_id, "Partner application submitted");
            let message = registered
                .message
                .unwrap_or_else(|| REGISTERED_MESSAGE.to_string());
            page(RegisterForm::default(), None, Some(message)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            let message = e.user_message(REGISTER_FAILED_MESSAGE);
            page(form, Some(message), None).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_estimate() {
        assert_eq!(parse_estimate(None), DEFAULT_ESTIMATE);
        assert_eq!(parse_estimate(Some("300000")), Decimal::new(300_000, 0));
        assert_eq!(parse_estimate(Some("1 200 000")), Decimal::new(1_200_000, 0));
        assert_eq!(parse_estimate(Some("1500,5")), Decimal::new(15_005, 1));
    }

    #[test]
    fn test_invalid_or_negative_estimate_uses_default() {
        assert_eq!(parse_estimate(Some("abc")), DEFAULT_ESTIMATE);
        assert_eq!(parse_estimate(Some("-100")), DEFAULT_ESTIMATE);
        assert_eq!(parse_estimate(Some("")), DEFAULT_ESTIMATE);
    }

    #[test]
    fn test_calculator_view() {
        let view = CalculatorView::new(Decimal::new(300_000, 0));
        assert_eq!(view.earnings, "30\u{a0}000\u{a0}₽");
        assert_eq!(view.rate_percent, "10");
        assert_eq!(view.estimate_input, "300000");
        let active: Vec<i64> = view
            .presets
            .iter()
            .filter(|p| p.active)
            .map(|p| p.value)
            .collect();
        assert_eq!(active, vec![300_000]);
    }
}
