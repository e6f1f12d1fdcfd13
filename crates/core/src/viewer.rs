//! The role of whoever is making the current request.

use crate::partner::PartnerIdentity;

/// Who is looking at the page.
///
/// Resolved once per request from the session. Admins and partners each have
/// exactly one home view and are never shown the other's.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Viewer {
    #[default]
    Guest,
    Partner(PartnerIdentity),
    Admin(PartnerIdentity),
}

impl Viewer {
    /// Resolve the viewer from the identity stored in the session.
    #[must_use]
    pub fn resolve(identity: Option<PartnerIdentity>) -> Self {
        match identity {
            None => Self::Guest,
            Some(identity) if identity.is_admin => Self::Admin(identity),
            Some(identity) => Self::Partner(identity),
        }
    }

    /// The view this viewer lands on.
    #[must_use]
    pub const fn home_path(&self) -> &'static str {
        match self {
            Self::Guest => "/",
            Self::Partner(_) => "/dashboard",
            Self::Admin(_) => "/admin",
        }
    }

    /// The signed-in identity, if any.
    #[must_use]
    pub const fn identity(&self) -> Option<&PartnerIdentity> {
        match self {
            Self::Guest => None,
            Self::Partner(identity) | Self::Admin(identity) => Some(identity),
        }
    }

    #[must_use]
    pub const fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{Email, PartnerId};

    fn identity(is_admin: bool) -> PartnerIdentity {
        PartnerIdentity {
            id: PartnerId::new(1),
            name: "A".to_string(),
            email: Email::parse("a@a.com").unwrap(),
            is_admin,
        }
    }

    #[test]
    fn test_resolve_by_role() {
        assert_eq!(Viewer::resolve(None), Viewer::Guest);
        assert!(matches!(
            Viewer::resolve(Some(identity(false))),
            Viewer::Partner(_)
        ));
        assert!(matches!(
            Viewer::resolve(Some(identity(true))),
            Viewer::Admin(_)
        ));
    }

    #[test]
    fn test_home_paths_are_exclusive() {
        assert_eq!(Viewer::Guest.home_path(), "/");
        assert_eq!(Viewer::resolve(Some(identity(false))).home_path(), "/dashboard");
        assert_eq!(Viewer::resolve(Some(identity(true))).home_path(), "/admin");
    }

    #[test]
    fn test_guest_has_no_identity() {
        assert!(Viewer::Guest.identity().is_none());
        assert!(Viewer::Guest.is_guest());
    }
}
