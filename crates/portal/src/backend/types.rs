//! Request and response bodies of the hosted backend.

use partner_portal_core::{
    ApprovalAction, Lead, LeadId, LeadStatistics, LeadStatus, Partner, PartnerId, PartnerIdentity,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Every backend response may carry these alongside its payload.
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: T,
}

/// An error body: `{"error": "..."}` or `{"message": "..."}`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.error
            .or(self.message)
            .filter(|m| !m.trim().is_empty())
    }
}

/// A payload with no fields of interest.
#[derive(Debug, Default, Deserialize)]
pub struct Empty {}

// =============================================================================
// Registration
// =============================================================================

/// A partner application.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub traffic_source: String,
    pub experience: String,
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, Default)]
pub struct Registered {
    pub partner_id: Option<PartnerId>,
    /// Confirmation text supplied by the backend, if any.
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RegisterData {
    #[serde(default)]
    pub partner_id: Option<PartnerId>,
}

// =============================================================================
// Login
// =============================================================================

#[derive(Serialize)]
pub(super) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// A successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub partner: PartnerIdentity,
    pub session_token: String,
}

// =============================================================================
// Partners
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub(super) struct PartnersData {
    #[serde(default)]
    pub partners: Vec<Partner>,
}

/// Body of an approve or reject call.
#[derive(Debug, Serialize)]
pub(super) struct ManagePartnerRequest<'a> {
    pub partner_id: PartnerId,
    pub action: ApprovalAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<&'a str>,
}

// =============================================================================
// Leads
// =============================================================================

/// A partner's leads and the totals the backend computed for them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartnerLeads {
    #[serde(default)]
    pub leads: Vec<Lead>,
    #[serde(default)]
    pub statistics: Option<LeadStatistics>,
}

/// A lead submitted by a partner.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewLead {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub education_level: String,
    pub notes: String,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct LeadsData {
    #[serde(default)]
    pub leads: Vec<Lead>,
}

/// An admin change to a lead's status and commission.
#[derive(Debug, Clone, Serialize)]
pub struct LeadUpdate {
    pub lead_id: LeadId,
    pub status: LeadStatus,
    #[serde(with = "rust_decimal::serde::float")]
    pub commission_amount: Decimal,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct LeadUpdateData {
    #[serde(default)]
    pub lead: Option<Lead>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_manage_request_omits_password_on_reject() {
        let body = ManagePartnerRequest {
            partner_id: PartnerId::new(5),
            action: ApprovalAction::Reject,
            password: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"partner_id": 5, "action": "reject"})
        );
    }

    #[test]
    fn test_lead_update_sends_number() {
        let body = LeadUpdate {
            lead_id: LeadId::new(3),
            status: LeadStatus::Approved,
            commission_amount: Decimal::new(5000, 0),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"lead_id": 3, "status": "approved", "commission_amount": 5000.0})
        );
    }

    #[test]
    fn test_envelope_with_statistics() {
        let json = r#"{
            "success": true,
            "leads": [{"id": 1, "client_name": "A", "client_phone": "1", "status": "approved", "commission_amount": 100}],
            "statistics": {"total_leads": 1, "approved_leads": 1, "total_commission": 100}
        }"#;
        let envelope: Envelope<PartnerLeads> = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.success, Some(true));
        assert_eq!(envelope.data.leads.len(), 1);
        assert_eq!(envelope.data.statistics.unwrap().approved_leads, 1);
    }

    #[test]
    fn test_error_body_prefers_error_field() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error": "Invalid", "message": "other"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Invalid"));

        let body: ErrorBody = serde_json::from_str(r#"{"message": "Nope"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Nope"));
    }
}
