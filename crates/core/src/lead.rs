//! Leads, their status and the partner dashboard statistics.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::partner::null_as_default;
use crate::types::{BackendTimestamp, LeadId, Rubles};

// =============================================================================
// Status
// =============================================================================

/// Lead status as reported by the backend.
///
/// The five known statuses are not a closed contract: anything else the
/// backend sends is kept verbatim in [`LeadStatus::Other`] and rendered as
/// its raw string with [`StatusTone::Neutral`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LeadStatus {
    #[default]
    New,
    InReview,
    Approved,
    Rejected,
    Completed,
    Other(String),
}

/// Visual tone of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusTone {
    Info,
    Warning,
    Success,
    Danger,
    Neutral,
}

impl StatusTone {
    /// CSS modifier used by the badge component.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Info => "badge-info",
            Self::Warning => "badge-warning",
            Self::Success => "badge-success",
            Self::Danger => "badge-danger",
            Self::Neutral => "badge-neutral",
        }
    }
}

impl LeadStatus {
    /// Statuses an admin can assign.
    pub const KNOWN: [Self; 5] = [
        Self::New,
        Self::InReview,
        Self::Approved,
        Self::Rejected,
        Self::Completed,
    ];

    /// Wire value of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "new",
            Self::InReview => "in_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
            Self::Other(raw) => raw,
        }
    }

    /// Human-readable label; unknown statuses show their raw value.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::New => "Новый",
            Self::InReview => "На рассмотрении",
            Self::Approved => "Одобрен",
            Self::Rejected => "Отклонен",
            Self::Completed => "Завершен",
            Self::Other(raw) => raw,
        }
    }

    /// Badge tone; unknown statuses are neutral.
    #[must_use]
    pub const fn tone(&self) -> StatusTone {
        match self {
            Self::New => StatusTone::Info,
            Self::InReview => StatusTone::Warning,
            Self::Approved => StatusTone::Success,
            Self::Rejected => StatusTone::Danger,
            Self::Completed | Self::Other(_) => StatusTone::Neutral,
        }
    }

    /// Whether the status is one of the five known values.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Whether a lead in this status earns commission.
    #[must_use]
    pub const fn earns_commission(&self) -> bool {
        matches!(self, Self::Approved | Self::Completed)
    }
}

impl From<String> for LeadStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "new" => Self::New,
            "in_review" => Self::InReview,
            "approved" => Self::Approved,
            "rejected" => Self::Rejected,
            "completed" => Self::Completed,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for LeadStatus {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_owned())
    }
}

impl From<LeadStatus> for String {
    fn from(status: LeadStatus) -> Self {
        match status {
            LeadStatus::Other(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Lead
// =============================================================================

/// A lead submitted by a partner.
///
/// The backend is not consistent about field names: lead creation writes
/// `name`/`phone`/`email`, the dashboard listing reads
/// `client_name`/`client_phone`/`client_email`. Both spellings are accepted,
/// the `client_` form winning when both are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawLead")]
pub struct Lead {
    pub id: LeadId,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: Option<String>,
    pub project_address: Option<String>,
    pub education_level: Option<String>,
    pub estimate_amount: Decimal,
    pub status: LeadStatus,
    pub commission_amount: Decimal,
    pub notes: Option<String>,
    pub created_at: Option<BackendTimestamp>,
    /// Present in the admin listing only.
    pub partner_name: Option<String>,
    /// Present in the admin listing only.
    pub partner_email: Option<String>,
}

#[derive(Deserialize)]
struct RawLead {
    id: LeadId,
    #[serde(default)]
    client_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    client_phone: Option<String>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    client_email: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    project_address: Option<String>,
    #[serde(default)]
    education_level: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    estimate_amount: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    status: LeadStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    commission_amount: Decimal,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    created_at: Option<BackendTimestamp>,
    #[serde(default)]
    partner_name: Option<String>,
    #[serde(default)]
    partner_email: Option<String>,
}

impl From<RawLead> for Lead {
    fn from(raw: RawLead) -> Self {
        Self {
            id: raw.id,
            client_name: raw.client_name.or(raw.name).unwrap_or_default(),
            client_phone: raw.client_phone.or(raw.phone).unwrap_or_default(),
            client_email: non_blank(raw.client_email.or(raw.email)),
            project_address: non_blank(raw.project_address),
            education_level: non_blank(raw.education_level),
            estimate_amount: raw.estimate_amount,
            status: raw.status,
            commission_amount: raw.commission_amount,
            notes: non_blank(raw.notes),
            created_at: raw.created_at,
            partner_name: non_blank(raw.partner_name),
            partner_email: non_blank(raw.partner_email),
        }
    }
}

impl Lead {
    /// Project estimate.
    #[must_use]
    pub const fn estimate(&self) -> Rubles {
        Rubles(self.estimate_amount)
    }

    /// Commission attributed to the partner.
    #[must_use]
    pub const fn commission(&self) -> Rubles {
        Rubles(self.commission_amount)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

// =============================================================================
// Statistics
// =============================================================================

/// Lead totals shown on the partner dashboard.
///
/// The backend supplies these alongside the lead list. They count every lead,
/// the leads in `approved` status, and the commission of approved leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LeadStatistics {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_leads: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub approved_leads: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_commission: Decimal,
}

/// A disagreement between supplied statistics and the lead list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsDiscrepancy {
    TotalLeads { reported: u64, counted: u64 },
    ApprovedLeads { reported: u64, counted: u64 },
    TotalCommission { reported: Decimal, counted: Decimal },
}

impl fmt::Display for StatisticsDiscrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TotalLeads { reported, counted } => {
                write!(f, "total_leads reported {reported}, counted {counted}")
            }
            Self::ApprovedLeads { reported, counted } => {
                write!(f, "approved_leads reported {reported}, counted {counted}")
            }
            Self::TotalCommission { reported, counted } => {
                write!(f, "total_commission reported {reported}, counted {counted}")
            }
        }
    }
}

impl LeadStatistics {
    /// Compute the statistics from a lead list, the way the backend defines them.
    #[must_use]
    pub fn from_leads(leads: &[Lead]) -> Self {
        let approved = leads.iter().filter(|l| l.status == LeadStatus::Approved);
        let (approved_leads, total_commission) = approved.fold(
            (0u64, Decimal::ZERO),
            |(count, sum), lead| (count + 1, sum + lead.commission_amount),
        );

        Self {
            total_leads: leads.len() as u64,
            approved_leads,
            total_commission,
        }
    }

    /// Compare against the lead list and report every mismatch.
    #[must_use]
    pub fn reconcile(&self, leads: &[Lead]) -> Vec<StatisticsDiscrepancy> {
        let counted = Self::from_leads(leads);
        let mut discrepancies = Vec::new();

        if self.total_leads != counted.total_leads {
            discrepancies.push(StatisticsDiscrepancy::TotalLeads {
                reported: self.total_leads,
                counted: counted.total_leads,
            });
        }
        if self.approved_leads != counted.approved_leads {
            discrepancies.push(StatisticsDiscrepancy::ApprovedLeads {
                reported: self.approved_leads,
                counted: counted.approved_leads,
            });
        }
        if self.total_commission.round_dp(2) != counted.total_commission.round_dp(2) {
            discrepancies.push(StatisticsDiscrepancy::TotalCommission {
                reported: self.total_commission,
                counted: counted.total_commission,
            });
        }

        discrepancies
    }

    /// Total commission.
    #[must_use]
    pub const fn commission(&self) -> Rubles {
        Rubles(self.total_commission)
    }
}
