//! Session-related types.
//!
//! Types stored in the session for authentication state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque credential issued by the backend at login.
///
/// Stored alongside the partner identity and never rendered.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// Session keys for authentication data.
///
/// Both entries are written together at login and removed together at logout.
pub mod keys {
    /// Key for the serialized partner identity.
    pub const PARTNER: &str = "partner";

    /// Key for the backend session token.
    pub const SESSION_TOKEN: &str = "session_token";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = SessionToken::new("tok_123".to_string());
        assert_eq!(format!("{token:?}"), "SessionToken([REDACTED])");
        assert_eq!(token.as_str(), "tok_123");
    }
}
