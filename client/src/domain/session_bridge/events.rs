//! Bootstrap and push-event handling.
//!
//! Neither path has a synchronous caller, so failures are logged and
//! swallowed rather than raised or shown to the user.

use tracing::{debug, info, warn};

use crate::domain::SessionEvent;
use crate::domain::ports::AuthSubscription;

use super::SessionBridge;
use super::errors::{REFRESH_FAILED, auth_failure};

impl SessionBridge {
    /// Resolve an existing provider session and install its user.
    ///
    /// Clears the loading flag however it exits. Runs automatically from
    /// [`SessionBridge::start`]; exposed for callers embedding the bridge in
    /// their own task layout.
    pub async fn bootstrap(&self) {
        let _loading = self.state().loading();
        let session = match self.ports().auth.current_session().await {
            Ok(session) => session,
            Err(err) => {
                let err = auth_failure(err, REFRESH_FAILED);
                warn!(error = %err, "session bootstrap failed");
                return;
            }
        };

        let Some(session) = session else {
            debug!("no existing session at bootstrap");
            return;
        };

        match self.load_user(session.user_id()).await {
            Ok(user) => {
                info!(user_id = %user.id(), "restored session");
                self.state().install(user);
            }
            Err(err) => warn!(error = %err, "failed to load profile at bootstrap"),
        }
    }

    /// Apply one provider event to local state.
    pub async fn handle_event(&self, event: SessionEvent) {
        debug!(event = event.label(), "auth state change");
        match event {
            SessionEvent::SignedIn(Some(session)) | SessionEvent::TokenRefreshed(Some(session)) => {
                match self.load_user(session.user_id()).await {
                    Ok(user) => self.state().install(user),
                    Err(err) => warn!(
                        error = %err,
                        user_id = %session.user_id(),
                        "failed to load profile for auth event"
                    ),
                }
            }
            SessionEvent::SignedOut => self.state().clear(),
            SessionEvent::SignedIn(None)
            | SessionEvent::TokenRefreshed(None)
            | SessionEvent::Other { .. } => {}
        }
        self.state().set_loading(false);
    }

    pub(super) async fn listen(self, mut subscription: AuthSubscription) {
        while let Some(event) = subscription.next_event().await {
            self.handle_event(event).await;
        }
        debug!("auth event stream closed");
    }
}
