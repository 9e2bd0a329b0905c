//! Driving port the session bridge uses to move the user between surfaces.

use url::Url;

use crate::domain::Destination;

/// Port for in-app navigation and external hand-offs.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Move to an in-app surface.
    fn navigate(&self, destination: Destination);

    /// Leave the app for an external URL (OAuth consent screens).
    fn redirect_external(&self, url: &Url);
}
