//! Partner records and the admin roster.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::approval::ApprovalState;
use crate::types::{BackendTimestamp, Email, PartnerId, Rubles};

/// The identity returned by login and kept in the session.
///
/// This is the "serialized partner" of the session: just enough to greet
/// the partner, resolve their role and identify them to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerIdentity {
    /// Backend partner ID (also the `admin_id` for admins).
    pub id: PartnerId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Login email, sent as `X-User-Id` on mutating calls.
    pub email: Email,
    /// Elevated privileges to approve and reject partners.
    #[serde(default)]
    pub is_admin: bool,
}

/// A partner as listed for admins.
///
/// Aggregates (`leads_count`, `total_commission`) are computed by the backend
/// and displayed as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub id: PartnerId,
    #[serde(default)]
    pub name: String,
    pub email: Email,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(default)]
    pub traffic_source: Option<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_approved: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_admin: bool,
    #[serde(default)]
    pub created_at: Option<BackendTimestamp>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub leads_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_commission: Decimal,
}

impl Partner {
    /// Where this partner stands in the approval lifecycle.
    #[must_use]
    pub const fn approval_state(&self) -> ApprovalState {
        if self.is_approved {
            ApprovalState::Approved
        } else {
            ApprovalState::Pending
        }
    }

    /// Traffic source, if one was given.
    #[must_use]
    pub fn traffic_source(&self) -> Option<&str> {
        non_blank(self.traffic_source.as_deref())
    }

    /// Experience text, if one was given.
    #[must_use]
    pub fn experience(&self) -> Option<&str> {
        non_blank(self.experience.as_deref())
    }

    /// Commission paid out so far, as reported by the backend.
    #[must_use]
    pub const fn total_commission(&self) -> Rubles {
        Rubles(self.total_commission)
    }
}

/// The partner list split by approval flag.
///
/// Every partner lands in exactly one bucket, and the order of the backend
/// listing is kept within each bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartnerRoster {
    pending: Vec<Partner>,
    approved: Vec<Partner>,
}

impl PartnerRoster {
    /// Partition a full partner list into pending and approved.
    #[must_use]
    pub fn partition(partners: Vec<Partner>) -> Self {
        let (approved, pending) = partners.into_iter().partition(|p| p.is_approved);
        Self { pending, approved }
    }

    /// Partners awaiting a decision.
    #[must_use]
    pub fn pending(&self) -> &[Partner] {
        &self.pending
    }

    /// Partners who can log in.
    #[must_use]
    pub fn approved(&self) -> &[Partner] {
        &self.approved
    }

    /// Total number of partners across both buckets.
    #[must_use]
    pub fn total(&self) -> usize {
        self.pending.len() + self.approved.len()
    }

    /// Find a partner by ID in either bucket.
    #[must_use]
    pub fn find(&self, id: PartnerId) -> Option<&Partner> {
        self.pending
            .iter()
            .chain(self.approved.iter())
            .find(|p| p.id == id)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
