//! Partner dashboard: leads, statistics and lead submission.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use partner_portal_core::{Lead, LeadStatistics, PartnerIdentity, Viewer};
use serde::Deserialize;
use tracing::instrument;

use super::Layout;
use crate::backend::{NewLead, PartnerLeads};
use crate::middleware::RequirePartner;
use crate::state::AppState;

const LOAD_FAILED_MESSAGE: &str = "Не удалось загрузить лиды.";
const CREATE_FAILED_MESSAGE: &str = "Не удалось добавить лид.";
const REQUIRED_FIELDS_MESSAGE: &str = "Заполните имя и телефон клиента.";
const CREATED_MESSAGE: &str = "Лид добавлен.";

// =============================================================================
// Form and Query Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub created: Option<String>,
}

/// New lead form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub education_level: String,
    #[serde(default)]
    pub notes: String,
}

// =============================================================================
// View Models
// =============================================================================

/// A lead row, formatted for display.
#[derive(Debug, Clone)]
pub struct LeadRow {
    pub id: String,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: String,
    pub detail: String,
    pub status_label: String,
    pub status_class: &'static str,
    pub estimate: String,
    pub commission: String,
    pub has_commission: bool,
    pub created: String,
    pub partner: String,
}

impl From<&Lead> for LeadRow {
    fn from(lead: &Lead) -> Self {
        let detail = lead
            .project_address
            .as_deref()
            .or(lead.education_level.as_deref())
            .unwrap_or_default()
            .to_string();
        let partner = match (&lead.partner_name, &lead.partner_email) {
            (Some(name), Some(email)) => format!("{name} ({email})"),
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => String::new(),
        };

        Self {
            id: lead.id.to_string(),
            client_name: lead.client_name.clone(),
            client_phone: lead.client_phone.clone(),
            client_email: lead.client_email.clone().unwrap_or_default(),
            detail,
            status_label: lead.status.label().to_string(),
            status_class: lead.status.tone().css_class(),
            estimate: lead.estimate().to_string(),
            commission: lead.commission().to_string(),
            has_commission: lead.commission().is_positive(),
            created: lead
                .created_at
                .as_ref()
                .map(|ts| ts.display_date())
                .unwrap_or_default(),
            partner,
        }
    }
}

/// Dashboard statistics as shown.
#[derive(Debug, Clone)]
pub struct StatisticsView {
    pub total_leads: u64,
    pub approved_leads: u64,
    pub total_commission: String,
    /// Set when the supplied totals disagree with the lead list.
    pub mismatch: bool,
}

impl StatisticsView {
    /// Build the statistics view, reconciling backend totals against the list.
    ///
    /// Backend totals are displayed as given; a disagreement is logged and
    /// flagged rather than corrected.
    #[must_use]
    pub fn reconcile(supplied: Option<LeadStatistics>, leads: &[Lead]) -> Self {
        let Some(stats) = supplied else {
            tracing::warn!("Backend sent no statistics, computing from the lead list");
            return Self::from_stats(&LeadStatistics::from_leads(leads), false);
        };

        let discrepancies = stats.reconcile(leads);
        for discrepancy in &discrepancies {
            tracing::warn!(%discrepancy, "Lead statistics disagree with the lead list");
        }
        Self::from_stats(&stats, !discrepancies.is_empty())
    }

    fn from_stats(stats: &LeadStatistics, mismatch: bool) -> Self {
        Self {
            total_leads: stats.total_leads,
            approved_leads: stats.approved_leads,
            total_commission: stats.commission().to_string(),
            mismatch,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Partner dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub partner_name: String,
    pub leads: Vec<LeadRow>,
    pub stats: StatisticsView,
    pub load_error: Option<String>,
    pub form: LeadForm,
    pub form_error: Option<String>,
    pub success: Option<String>,
}

impl DashboardTemplate {
    fn new(partner: &PartnerIdentity, fetched: Result<PartnerLeads, String>) -> Self {
        let (leads, stats, load_error) = match fetched {
            Ok(data) => {
                let stats = StatisticsView::reconcile(data.statistics, &data.leads);
                (data.leads.iter().map(LeadRow::from).collect(), stats, None)
            }
            Err(message) => (
                Vec::new(),
                StatisticsView::from_stats(&LeadStatistics::default(), false),
                Some(message),
            ),
        };

        Self {
            layout: Layout::for_viewer(&Viewer::Partner(partner.clone())),
            partner_name: partner.name.clone(),
            leads,
            stats,
            load_error,
            form: LeadForm::default(),
            form_error: None,
            success: None,
        }
    }
}

async fn fetch_leads(state: &AppState, partner: &PartnerIdentity) -> Result<PartnerLeads, String> {
    state
        .backend()
        .list_leads(partner.id)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Failed to load partner leads");
            e.user_message(LOAD_FAILED_MESSAGE)
        })
}

// =============================================================================
// Routes
// =============================================================================

/// Display the partner dashboard.
#[instrument(skip_all, fields(partner_id = %partner.id))]
pub async fn dashboard(
    State(state): State<AppState>,
    RequirePartner(partner): RequirePartner,
    Query(query): Query<DashboardQuery>,
) -> impl IntoResponse {
    let fetched = fetch_leads(&state, &partner).await;
    let mut page = DashboardTemplate::new(&partner, fetched);
    if query.created.is_some() {
        page.success = Some(CREATED_MESSAGE.to_string());
    }
    page
}

/// Handle new lead submission.
///
/// The partner's email identifies them to the backend. On success the
/// dashboard is reloaded; on failure it is re-rendered with the entered values.
#[instrument(skip_all, fields(partner_id = %partner.id))]
pub async fn create_lead(
    State(state): State<AppState>,
    RequirePartner(partner): RequirePartner,
    Form(form): Form<LeadForm>,
) -> Response {
    let error = if form.name.trim().is_empty() || form.phone.trim().is_empty() {
        REQUIRED_FIELDS_MESSAGE.to_string()
    } else {
        let lead = NewLead {
            name: form.name.trim().to_string(),
            phone: form.phone.trim().to_string(),
            email: form.email.trim().to_string(),
            education_level: form.education_level.clone(),
            notes: form.notes.clone(),
        };
        match state.backend().create_lead(&partner.email, &lead).await {
            Ok(()) => {
                tracing::info!("Lead submitted");
                return Redirect::to("/dashboard?created=1").into_response();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Lead submission failed");
                e.user_message(CREATE_FAILED_MESSAGE)
            }
        }
    };

    let fetched = fetch_leads(&state, &partner).await;
    let mut page = DashboardTemplate::new(&partner, fetched);
    page.form = form;
    page.form_error = Some(error);
    page.into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use partner_portal_core::{BackendTimestamp, LeadId, LeadStatus};
    use rust_decimal::Decimal;

    use super::*;

    fn lead(status: &str, commission: i64) -> Lead {
        Lead {
            id: LeadId::new(1),
            client_name: "Анна".to_string(),
            client_phone: "+7 900".to_string(),
            client_email: None,
            project_address: None,
            education_level: Some("bachelor".to_string()),
            estimate_amount: Decimal::new(650_000, 0),
            status: LeadStatus::from(status),
            commission_amount: Decimal::new(commission, 0),
            notes: None,
            created_at: Some(BackendTimestamp::new("2024-10-30T10:00:00")),
            partner_name: None,
            partner_email: None,
        }
    }

    #[test]
    fn test_lead_row_formatting() {
        let row = LeadRow::from(&lead("approved", 65_000));
        assert_eq!(row.status_label, "Одобрен");
        assert_eq!(row.status_class, "badge-success");
        assert_eq!(row.commission, "65\u{a0}000\u{a0}₽");
        assert!(row.has_commission);
        assert_eq!(row.created, "30.10.2024");
        assert_eq!(row.detail, "bachelor");
    }

    #[test]
    fn test_unknown_status_row() {
        let row = LeadRow::from(&lead("on_hold", 0));
        assert_eq!(row.status_label, "on_hold");
        assert_eq!(row.status_class, "badge-neutral");
        assert!(!row.has_commission);
    }

    #[test]
    fn test_statistics_mismatch_is_flagged_not_corrected() {
        let leads = vec![lead("approved", 1000)];
        let supplied = LeadStatistics {
            total_leads: 5,
            approved_leads: 1,
            total_commission: Decimal::new(1000, 0),
        };
        let view = StatisticsView::reconcile(Some(supplied), &leads);
        assert!(view.mismatch);
        assert_eq!(view.total_leads, 5);
    }

    #[test]
    fn test_missing_statistics_are_computed() {
        let leads = vec![lead("approved", 1000), lead("new", 0)];
        let view = StatisticsView::reconcile(None, &leads);
        assert!(!view.mismatch);
        assert_eq!(view.total_leads, 2);
        assert_eq!(view.approved_leads, 1);
    }
}
