//! Partner approval lifecycle.
//!
//! A partner registers into `Pending`. An admin either approves them, which
//! sets their first login password, or rejects them. Both outcomes are
//! terminal.

use core::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::PartnerId;

/// Minimum length of an initial password, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Where a partner stands in the approval lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApprovalState {
    Pending,
    Approved,
    Rejected,
}

/// An admin decision on a pending partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalAction {
    Approve,
    Reject,
}

impl ApprovalAction {
    /// Wire value of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Reject => "reject",
        }
    }
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A transition the lifecycle does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {action} a partner in state {from:?}")]
pub struct TransitionError {
    pub from: ApprovalState,
    pub action: ApprovalAction,
}

impl ApprovalState {
    /// Apply an admin action.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` unless the partner is pending.
    pub const fn apply(self, action: ApprovalAction) -> Result<Self, TransitionError> {
        match (self, action) {
            (Self::Pending, ApprovalAction::Approve) => Ok(Self::Approved),
            (Self::Pending, ApprovalAction::Reject) => Ok(Self::Rejected),
            (from, action) => Err(TransitionError { from, action }),
        }
    }

    /// Actions an admin may take from this state.
    #[must_use]
    pub const fn available_actions(self) -> &'static [ApprovalAction] {
        match self {
            Self::Pending => &[ApprovalAction::Approve, ApprovalAction::Reject],
            Self::Approved | Self::Rejected => &[],
        }
    }
}

// =============================================================================
// Initial password
// =============================================================================

/// Errors from validating an initial password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("password cannot be empty")]
    Empty,
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },
}

/// The password an admin assigns when approving a partner.
///
/// Validated before any backend call; the value stays wrapped until it is
/// written into the approval request.
#[derive(Clone)]
pub struct InitialPassword(SecretString);

impl InitialPassword {
    /// Validate a password typed by the admin.
    ///
    /// # Errors
    ///
    /// Returns an error if the password is empty or shorter than
    /// [`MIN_PASSWORD_LENGTH`] characters.
    pub fn parse(raw: &str) -> Result<Self, PasswordError> {
        if raw.is_empty() {
            return Err(PasswordError::Empty);
        }
        if raw.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(PasswordError::TooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        Ok(Self(SecretString::from(raw.to_owned())))
    }

    /// The plaintext password.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for InitialPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("InitialPassword([REDACTED])")
    }
}

// =============================================================================
// Decision
// =============================================================================

/// A validated admin decision, ready to send.
#[derive(Debug, Clone)]
pub enum PartnerDecision {
    Approve {
        partner_id: PartnerId,
        password: InitialPassword,
    },
    Reject {
        partner_id: PartnerId,
    },
}

impl PartnerDecision {
    /// The partner the decision is about.
    #[must_use]
    pub const fn partner_id(&self) -> PartnerId {
        match self {
            Self::Approve { partner_id, .. } | Self::Reject { partner_id } => *partner_id,
        }
    }

    /// The lifecycle action this decision performs.
    #[must_use]
    pub const fn action(&self) -> ApprovalAction {
        match self {
            Self::Approve { .. } => ApprovalAction::Approve,
            Self::Reject { .. } => ApprovalAction::Reject,
        }
    }

    /// The password, for approvals.
    #[must_use]
    pub const fn password(&self) -> Option<&InitialPassword> {
        match self {
            Self::Approve { password, .. } => Some(password),
            Self::Reject { .. } => None,
        }
    }
}
