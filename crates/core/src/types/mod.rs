//! Core value types for the partner portal.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod timestamp;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::Rubles;
pub use timestamp::BackendTimestamp;
