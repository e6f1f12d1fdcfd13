//! Partner Portal Core - Shared domain library.
//!
//! This crate provides the domain model used by the partner portal:
//! - `portal` - Public site, partner dashboard and admin panel
//! - `integration-tests` - End-to-end tests against a mocked backend
//!
//! # Architecture
//!
//! The core crate contains only types and rules - no I/O, no HTTP clients,
//! no session handling. Everything the hosted backend decides (credentials,
//! lead storage, commission attribution) stays there; this crate only models
//! what the portal needs to route, validate and render.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, emails, money and backend timestamps
//! - [`partner`] - Partner records, session identity and the pending/approved roster
//! - [`lead`] - Leads, the open lead status set and dashboard statistics
//! - [`approval`] - The partner approval state machine
//! - [`viewer`] - Role resolution for the current request
//! - [`commission`] - Commission rate and earnings calculation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod approval;
pub mod commission;
pub mod lead;
pub mod partner;
pub mod types;
pub mod viewer;

pub use approval::{
    ApprovalAction, ApprovalState, InitialPassword, MIN_PASSWORD_LENGTH, PartnerDecision,
    PasswordError, TransitionError,
};
pub use commission::{COMMISSION_RATE, commission_for};
pub use lead::{Lead, LeadStatistics, LeadStatus, StatisticsDiscrepancy, StatusTone};
pub use partner::{Partner, PartnerIdentity, PartnerRoster};
pub use types::*;
pub use viewer::Viewer;
