//! Session-stored models for the portal.

pub mod session;

pub use session::{SessionToken, keys as session_keys};
