//! Role to landing-surface resolution.

use std::fmt;

use super::{Role, User};

/// Navigation target inside the marketplace frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Public landing page.
    Landing,
    /// Sign-in page.
    Login,
    /// Administrator dashboard.
    Admin,
    /// Manager dashboard.
    Manager,
    /// Vendor dashboard.
    Vendor,
    /// Customer dashboard.
    Customer,
}

impl Destination {
    /// Route path for the destination.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::Login => "/login",
            Self::Admin => "/admin",
            Self::Manager => "/manager",
            Self::Vendor => "/vendor",
            Self::Customer => "/customer",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Resolve the dashboard for a role; no role means the landing page.
///
/// # Examples
/// ```
/// use marketplace_client::domain::{destination_for, Destination, Role};
///
/// assert_eq!(destination_for(Some(Role::Vendor)), Destination::Vendor);
/// assert_eq!(destination_for(None), Destination::Landing);
/// ```
#[must_use]
pub const fn destination_for(role: Option<Role>) -> Destination {
    match role {
        Some(Role::Admin) => Destination::Admin,
        Some(Role::Manager) => Destination::Manager,
        Some(Role::Vendor) => Destination::Vendor,
        Some(Role::Customer) => Destination::Customer,
        None => Destination::Landing,
    }
}

/// Resolve the dashboard for the current user, if any.
#[must_use]
pub fn dashboard_for(user: Option<&User>) -> Destination {
    destination_for(user.and_then(User::role))
}
