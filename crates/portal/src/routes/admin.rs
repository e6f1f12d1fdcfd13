//! Admin panel: partner approval and lead management.
//!
//! Every list is fetched fresh on each request. Approval controls are only
//! rendered for the actions the partner's approval state allows.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use partner_portal_core::{
    ApprovalAction, InitialPassword, Lead, LeadId, LeadStatus, MIN_PASSWORD_LENGTH, Partner,
    PartnerDecision, PartnerId, PartnerIdentity, PartnerRoster, PasswordError, Viewer,
    commission_for,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use super::Layout;
use super::dashboard::LeadRow;
use crate::backend::LeadUpdate;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

const PARTNERS_FAILED_MESSAGE: &str = "Не удалось загрузить партнёров.";
const APPROVE_FAILED_MESSAGE: &str = "Ошибка одобрения партнёра.";
const REJECT_FAILED_MESSAGE: &str = "Ошибка отклонения партнёра.";
const LEADS_FAILED_MESSAGE: &str = "Не удалось загрузить лиды.";
const UPDATE_FAILED_MESSAGE: &str = "Не удалось обновить лид.";

// =============================================================================
// Form and Query Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct PartnersQuery {
    pub done: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeadsQuery {
    pub updated: Option<LeadId>,
}

/// Approval form data.
#[derive(Default, Deserialize)]
pub struct ApproveForm {
    #[serde(default)]
    pub password: String,
    /// Echoed back for re-rendering without another fetch.
    #[serde(default)]
    pub partner_label: String,
}

/// Rejection confirmation form data.
#[derive(Debug, Default, Deserialize)]
pub struct RejectForm {
    #[serde(default)]
    pub partner_label: String,
}

/// Lead update form data.
#[derive(Debug, Default, Deserialize)]
pub struct LeadUpdateForm {
    #[serde(default)]
    pub status: String,
    /// Blank means "use the default for the status".
    #[serde(default)]
    pub commission_amount: String,
    #[serde(default)]
    pub estimate_amount: String,
    /// Status the row was rendered with; an unknown status may only be kept.
    #[serde(default)]
    pub current_status: String,
}

// =============================================================================
// View Models
// =============================================================================

/// A partner row, formatted for display.
#[derive(Debug, Clone)]
pub struct PartnerRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub traffic_source: String,
    pub experience: String,
    pub created: String,
    pub leads_count: u64,
    pub total_commission: String,
    pub can_approve: bool,
    pub can_reject: bool,
}

impl From<&Partner> for PartnerRow {
    fn from(partner: &Partner) -> Self {
        let actions = partner.approval_state().available_actions();
        Self {
            id: partner.id.to_string(),
            name: partner.name.clone(),
            email: partner.email.to_string(),
            phone: partner.phone.clone(),
            traffic_source: partner.traffic_source().unwrap_or("—").to_string(),
            experience: partner.experience().unwrap_or_default().to_string(),
            created: partner
                .created_at
                .as_ref()
                .map(|ts| ts.display_date())
                .unwrap_or_default(),
            leads_count: partner.leads_count,
            total_commission: partner.total_commission().to_string(),
            can_approve: actions.contains(&ApprovalAction::Approve),
            can_reject: actions.contains(&ApprovalAction::Reject),
        }
    }
}

/// A status choice in the lead update form.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// A lead row in the admin list, with its update form state.
#[derive(Debug, Clone)]
pub struct AdminLeadRow {
    pub row: LeadRow,
    pub current_status: String,
    pub estimate_amount: String,
    pub commission_amount: String,
    pub status_options: Vec<StatusOption>,
    pub highlighted: bool,
}

impl AdminLeadRow {
    fn new(lead: &Lead, highlighted: bool) -> Self {
        let mut status_options: Vec<StatusOption> = LeadStatus::KNOWN
            .iter()
            .map(|status| StatusOption {
                value: status.as_str().to_string(),
                label: status.label().to_string(),
                selected: *status == lead.status,
            })
            .collect();
        if !lead.status.is_known() {
            status_options.insert(
                0,
                StatusOption {
                    value: lead.status.as_str().to_string(),
                    label: lead.status.label().to_string(),
                    selected: true,
                },
            );
        }

        Self {
            row: LeadRow::from(lead),
            current_status: lead.status.as_str().to_string(),
            estimate_amount: lead.estimate_amount.normalize().to_string(),
            commission_amount: lead.commission_amount.normalize().to_string(),
            status_options,
            highlighted,
        }
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Partner list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/partners.html")]
pub struct PartnersTemplate {
    pub layout: Layout,
    pub pending: Vec<PartnerRow>,
    pub approved: Vec<PartnerRow>,
    pub total: usize,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Approval password form.
#[derive(Template, WebTemplate)]
#[template(path = "admin/approve.html")]
pub struct ApproveTemplate {
    pub layout: Layout,
    pub partner_id: PartnerId,
    pub partner_label: String,
    pub min_length: usize,
    pub error: Option<String>,
}

/// Rejection confirmation.
#[derive(Template, WebTemplate)]
#[template(path = "admin/reject.html")]
pub struct RejectTemplate {
    pub layout: Layout,
    pub partner_id: PartnerId,
    pub partner_label: String,
    pub error: Option<String>,
}

/// All leads template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/leads.html")]
pub struct LeadsTemplate {
    pub layout: Layout,
    pub leads: Vec<AdminLeadRow>,
    pub error: Option<String>,
    pub success: Option<String>,
}

fn admin_layout(admin: &PartnerIdentity) -> Layout {
    Layout::for_viewer(&Viewer::Admin(admin.clone()))
}

fn partner_label(partner: &Partner) -> String {
    if partner.name.trim().is_empty() {
        partner.email.to_string()
    } else {
        format!("{} ({})", partner.name, partner.email)
    }
}

/// Find a partner and check the action is allowed from their current state.
///
/// Returns `Ok(None)` when the transition is not allowed.
async fn partner_for_action(
    state: &AppState,
    admin: &PartnerIdentity,
    partner_id: PartnerId,
    action: ApprovalAction,
) -> Result<Option<Partner>, AppError> {
    let roster = PartnerRoster::partition(state.backend().list_partners(admin.id).await?);
    let partner = roster
        .find(partner_id)
        .cloned()
        .ok_or(AppError::PartnerNotFound(partner_id))?;

    match partner.approval_state().apply(action) {
        Ok(_) => Ok(Some(partner)),
        Err(e) => {
            tracing::info!(error = %e, "Ignoring approval action");
            Ok(None)
        }
    }
}

// =============================================================================
// Partner Routes
// =============================================================================

/// Display the pending and approved partner lists.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn partners(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<PartnersQuery>,
) -> impl IntoResponse {
    let success = match query.done.as_deref() {
        Some("approved") => Some("Партнёр одобрен.".to_string()),
        Some("rejected") => Some("Партнёр отклонён.".to_string()),
        _ => None,
    };

    let (roster, error) = match state.backend().list_partners(admin.id).await {
        Ok(partners) => (PartnerRoster::partition(partners), None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load partners");
            (
                PartnerRoster::default(),
                Some(e.user_message(PARTNERS_FAILED_MESSAGE)),
            )
        }
    };

    PartnersTemplate {
        layout: admin_layout(&admin),
        pending: roster.pending().iter().map(PartnerRow::from).collect(),
        approved: roster.approved().iter().map(PartnerRow::from).collect(),
        total: roster.total(),
        error,
        success,
    }
}

/// Display the approval password form for a pending partner.
#[instrument(skip_all, fields(admin_id = %admin.id, partner_id = %partner_id))]
pub async fn approve_page(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(partner_id): Path<PartnerId>,
) -> Result<Response, AppError> {
    let Some(partner) =
        partner_for_action(&state, &admin, partner_id, ApprovalAction::Approve).await?
    else {
        return Ok(Redirect::to("/admin").into_response());
    };

    Ok(ApproveTemplate {
        layout: admin_layout(&admin),
        partner_id,
        partner_label: partner_label(&partner),
        min_length: MIN_PASSWORD_LENGTH,
        error: None,
    }
    .into_response())
}

/// Approve a partner, setting their first password.
///
/// The password is checked before anything is sent.
#[instrument(skip_all, fields(admin_id = %admin.id, partner_id = %partner_id))]
pub async fn approve(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(partner_id): Path<PartnerId>,
    Form(form): Form<ApproveForm>,
) -> Response {
    let page = |error: String, status: StatusCode| {
        (
            status,
            ApproveTemplate {
                layout: admin_layout(&admin),
                partner_id,
                partner_label: form.partner_label.clone(),
                min_length: MIN_PASSWORD_LENGTH,
                error: Some(error),
            },
        )
            .into_response()
    };

    let password = match InitialPassword::parse(&form.password) {
        Ok(password) => password,
        Err(e) => {
            let message = match e {
                PasswordError::Empty => "Введите пароль.".to_string(),
                PasswordError::TooShort { min } => {
                    format!("Пароль должен быть не короче {min} символов.")
                }
            };
            return page(message, StatusCode::UNPROCESSABLE_ENTITY);
        }
    };

    let decision = PartnerDecision::Approve {
        partner_id,
        password,
    };
    match state.backend().manage_partner(&admin.email, &decision).await {
        Ok(()) => {
            tracing::info!("Partner approved");
            Redirect::to("/admin?done=approved").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Partner approval failed");
            page(e.user_message(APPROVE_FAILED_MESSAGE), StatusCode::BAD_GATEWAY)
        }
    }
}

/// Display the rejection confirmation for a pending partner.
#[instrument(skip_all, fields(admin_id = %admin.id, partner_id = %partner_id))]
pub async fn reject_page(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(partner_id): Path<PartnerId>,
) -> Result<Response, AppError> {
    let Some(partner) =
        partner_for_action(&state, &admin, partner_id, ApprovalAction::Reject).await?
    else {
        return Ok(Redirect::to("/admin").into_response());
    };

    Ok(RejectTemplate {
        layout: admin_layout(&admin),
        partner_id,
        partner_label: partner_label(&partner),
        error: None,
    }
    .into_response())
}

/// Reject a partner.
#[instrument(skip_all, fields(admin_id = %admin.id, partner_id = %partner_id))]
pub async fn reject(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(partner_id): Path<PartnerId>,
    Form(form): Form<RejectForm>,
) -> Response {
    let decision = PartnerDecision::Reject { partner_id };
    match state.backend().manage_partner(&admin.email, &decision).await {
        Ok(()) => {
            tracing::info!("Partner rejected");
            Redirect::to("/admin?done=rejected").into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Partner rejection failed");
            (
                StatusCode::BAD_GATEWAY,
                RejectTemplate {
                    layout: admin_layout(&admin),
                    partner_id,
                    partner_label: form.partner_label,
                    error: Some(e.user_message(REJECT_FAILED_MESSAGE)),
                },
            )
                .into_response()
        }
    }
}

// =============================================================================
// Lead Routes
// =============================================================================

async fn render_leads(
    state: &AppState,
    admin: &PartnerIdentity,
    highlighted: Option<LeadId>,
    error: Option<String>,
    success: Option<String>,
) -> LeadsTemplate {
    let (leads, load_error) = match state.backend().list_all_leads(admin.id).await {
        Ok(leads) => (leads, None),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load leads");
            (Vec::new(), Some(e.user_message(LEADS_FAILED_MESSAGE)))
        }
    };

    LeadsTemplate {
        layout: admin_layout(admin),
        leads: leads
            .iter()
            .map(|lead| AdminLeadRow::new(lead, Some(lead.id) == highlighted))
            .collect(),
        error: error.or(load_error),
        success,
    }
}

/// Display every lead with partner attribution.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn leads(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(query): Query<LeadsQuery>,
) -> impl IntoResponse {
    let success = query
        .updated
        .map(|id| format!("Лид #{id} обновлён."));
    render_leads(&state, &admin, query.updated, None, success).await
}

/// The commission to record for a lead update.
///
/// A blank field defaults to the base rate on the estimate for statuses that
/// earn commission, and to zero otherwise.
///
/// # Errors
///
/// Returns a message if the amount is not a non-negative number.
pub fn resolve_commission(
    raw: &str,
    status: &LeadStatus,
    estimate: Decimal,
) -> Result<Decimal, &'static str> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(if status.earns_commission() {
            commission_for(estimate)
        } else {
            Decimal::ZERO
        });
    }

    let amount = raw
        .replace([' ', '\u{a0}'], "")
        .replace(',', ".")
        .parse::<Decimal>()
        .map_err(|_| "Комиссия должна быть числом.")?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err("Комиссия не может быть отрицательной.");
    }
    Ok(amount.round_dp(2))
}

/// Update a lead's status and commission.
#[instrument(skip_all, fields(admin_id = %admin.id, lead_id = %lead_id))]
pub async fn update_lead(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(lead_id): Path<LeadId>,
    Form(form): Form<LeadUpdateForm>,
) -> Result<Response, AppError> {
    // Unknown statuses can be kept as they are, never introduced.
    let raw_status = form.status.trim();
    let status = LeadStatus::from(raw_status);
    if !status.is_known()
        && (raw_status.is_empty() || raw_status != form.current_status.trim())
    {
        return Err(AppError::UnknownStatus(raw_status.to_string()));
    }

    let estimate = form
        .estimate_amount
        .trim()
        .parse::<Decimal>()
        .unwrap_or(Decimal::ZERO);
    let commission_amount = match resolve_commission(&form.commission_amount, &status, estimate) {
        Ok(amount) => amount,
        Err(message) => {
            let page = render_leads(&state, &admin, Some(lead_id), Some(message.to_string()), None)
                .await;
            return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
        }
    };

    let update = LeadUpdate {
        lead_id,
        status,
        commission_amount,
    };
    match state.backend().update_lead(&admin.email, &update).await {
        Ok(_) => {
            tracing::info!(commission = %commission_amount, "Lead updated");
            Ok(Redirect::to(&format!("/admin/leads?updated={lead_id}")).into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Lead update failed");
            let message = e.user_message(UPDATE_FAILED_MESSAGE);
            let page = render_leads(&state, &admin, Some(lead_id), Some(message), None).await;
            Ok((StatusCode::BAD_GATEWAY, page).into_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use partner_portal_core::Email;

    use super::*;

    fn partner(is_approved: bool) -> Partner {
        Partner {
            id: PartnerId::new(5),
            name: "Иван".to_string(),
            email: Email::parse("ivan@example.com").unwrap(),
            phone: "123".to_string(),
            traffic_source: Some("SEO".to_string()),
            experience: None,
            is_approved,
            is_admin: false,
            created_at: None,
            leads_count: 2,
            total_commission: Decimal::new(1500, 0),
        }
    }

    #[test]
    fn test_pending_row_has_controls() {
        let row = PartnerRow::from(&partner(false));
        assert!(row.can_approve);
        assert!(row.can_reject);
        assert_eq!(row.traffic_source, "SEO");
    }

    #[test]
    fn test_approved_row_has_no_revert_control() {
        let row = PartnerRow::from(&partner(true));
        assert!(!row.can_approve);
        assert!(!row.can_reject);
        assert_eq!(row.total_commission, "1\u{a0}500\u{a0}₽");
    }

    #[test]
    fn test_blank_commission_defaults_by_status() {
        let estimate = Decimal::new(500_000, 0);
        assert_eq!(
            resolve_commission("", &LeadStatus::Approved, estimate).unwrap(),
            Decimal::new(50_000, 0)
        );
        assert_eq!(
            resolve_commission("  ", &LeadStatus::Completed, estimate).unwrap(),
            Decimal::new(50_000, 0)
        );
        assert_eq!(
            resolve_commission("", &LeadStatus::InReview, estimate).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_explicit_commission() {
        assert_eq!(
            resolve_commission("12 345,678", &LeadStatus::Approved, Decimal::ZERO).unwrap(),
            Decimal::new(1_234_568, 2)
        );
        assert!(resolve_commission("-1", &LeadStatus::Approved, Decimal::ZERO).is_err());
        assert!(resolve_commission("lots", &LeadStatus::Approved, Decimal::ZERO).is_err());
    }

    #[test]
    fn test_status_options_select_current() {
        let lead: Lead =
            serde_json::from_str(r#"{"id": 1, "status": "in_review", "estimate_amount": 1000}"#)
                .unwrap();
        let row = AdminLeadRow::new(&lead, false);
        let selected: Vec<&str> = row
            .status_options
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.value.as_str())
            .collect();
        assert_eq!(selected, vec!["in_review"]);
        assert_eq!(row.estimate_amount, "1000");
    }

    #[test]
    fn test_unknown_status_stays_selected() {
        let lead: Lead = serde_json::from_str(r#"{"id": 1, "status": "on_hold"}"#).unwrap();
        let row = AdminLeadRow::new(&lead, false);
        let selected: Vec<(&str, &str)> = row
            .status_options
            .iter()
            .filter(|o| o.selected)
            .map(|o| (o.value.as_str(), o.label.as_str()))
            .collect();
        assert_eq!(selected, vec![("on_hold", "on_hold")]);
        assert_eq!(row.status_options.len(), LeadStatus::KNOWN.len() + 1);
        assert_eq!(row.current_status, "on_hold");
    }
}
