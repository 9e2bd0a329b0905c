//! Auth session bridge.
//!
//! Owns the process-wide "current user + loading" state and keeps it
//! consistent across three writers:
//!
//! - bootstrap, run once when the bridge starts;
//! - the push-event listener, fed by the provider subscription;
//! - explicit user operations (login, logout, registration, ...).
//!
//! Bootstrap and the listener start together and are not ordered against each
//! other. Every write replaces the user value whole, so interleaving resolves
//! as last-write-wins: whichever write completes last is what consumers see,
//! regardless of which started first.
//!
//! Consumers hold a [`SessionBridge`] (cheap to clone) and read snapshots or
//! subscribe to changes; they never mutate state directly.

mod errors;
mod events;
mod operations;
mod state;

pub use state::SessionState;

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use url::Url;

use crate::domain::ports::{AuthGateway, Navigator, Notifier, ProfileRepository};
use crate::domain::{DomainError, User, UserId, map_profile};

use self::errors::{PROFILE_FETCH_FAILED, PROFILE_NOT_FOUND, profile_failure};
use self::state::StateCell;

/// Port bundle required by the session bridge.
#[derive(Clone)]
pub struct SessionBridgePorts {
    /// Hosted authentication provider.
    pub auth: Arc<dyn AuthGateway>,
    /// Hosted `users`/`vendors` tables.
    pub profiles: Arc<dyn ProfileRepository>,
    /// In-app navigation.
    pub navigator: Arc<dyn Navigator>,
    /// Transient notifications.
    pub notifier: Arc<dyn Notifier>,
}

struct BridgeInner {
    ports: SessionBridgePorts,
    oauth_redirect: Url,
    state: StateCell,
}

/// Explicit session context injected into presentation code.
#[derive(Clone)]
pub struct SessionBridge {
    inner: Arc<BridgeInner>,
}

impl SessionBridge {
    /// Build a bridge. Nothing runs until [`SessionBridge::start`].
    ///
    /// `oauth_redirect` is where the provider sends users back after OAuth
    /// consent, email confirmation and password reset links.
    pub fn new(ports: SessionBridgePorts, oauth_redirect: Url) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                ports,
                oauth_redirect,
                state: StateCell::new(),
            }),
        }
    }

    /// Subscribe to provider events and run bootstrap concurrently.
    ///
    /// Must be called inside a Tokio runtime. The returned handle owns both
    /// tasks; dropping it or calling [`SessionHandle::shutdown`] releases
    /// the provider subscription.
    pub fn start(&self) -> SessionHandle {
        let subscription = self.inner.ports.auth.subscribe();
        let listener = tokio::spawn(self.clone().listen(subscription));
        let bootstrap = {
            let bridge = self.clone();
            tokio::spawn(async move { bridge.bootstrap().await })
        };
        debug!("session bridge started");
        SessionHandle {
            bridge: self.clone(),
            listener: Some(listener),
            bootstrap: Some(bootstrap),
        }
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> SessionState {
        self.inner.state.snapshot()
    }

    /// Signed-in user, if any.
    pub fn current_user(&self) -> Option<User> {
        self.snapshot().user().cloned()
    }

    /// Whether an operation or bootstrap is in flight.
    pub fn is_loading(&self) -> bool {
        self.snapshot().loading()
    }

    /// Receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    fn ports(&self) -> &SessionBridgePorts {
        &self.inner.ports
    }

    fn state(&self) -> &StateCell {
        &self.inner.state
    }

    /// Fetch and map the canonical user for `id`.
    async fn load_user(&self, id: &UserId) -> Result<User, DomainError> {
        let row = self
            .ports()
            .profiles
            .find_user(id)
            .await
            .map_err(|err| profile_failure(err, PROFILE_FETCH_FAILED))?
            .ok_or_else(|| DomainError::not_found(PROFILE_NOT_FOUND))?;
        map_profile(&row).ok_or_else(|| {
            warn!(user_id = %id, "profile row lacks id or email");
            DomainError::not_found(PROFILE_NOT_FOUND)
        })
    }

    /// Surface the outcome of a user-initiated operation.
    fn finish(&self, outcome: Result<(), DomainError>, success: &str) -> Result<(), DomainError> {
        match &outcome {
            Ok(()) => self.ports().notifier.success(success),
            Err(err) => self.ports().notifier.error(err.message()),
        }
        outcome
    }
}

/// Running bridge: bootstrap task plus push-event listener.
pub struct SessionHandle {
    bridge: SessionBridge,
    listener: Option<JoinHandle<()>>,
    bootstrap: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// The bridge these tasks drive.
    pub fn bridge(&self) -> &SessionBridge {
        &self.bridge
    }

    /// Wait until bootstrap has finished.
    pub async fn ready(&mut self) {
        if let Some(task) = self.bootstrap.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "session bootstrap task ended abnormally");
            }
        }
    }

    /// Stop listening for push events and release the subscription.
    ///
    /// Returns once the listener task, and with it the subscription, has
    /// been dropped.
    pub async fn shutdown(mut self) {
        if let Some(task) = self.bootstrap.take() {
            task.abort();
        }
        if let Some(task) = self.listener.take() {
            task.abort();
            match task.await {
                Ok(()) => {}
                Err(err) if err.is_cancelled() => {}
                Err(err) => warn!(error = %err, "session listener ended abnormally"),
            }
        }
        debug!("session bridge stopped");
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.bootstrap.take() {
            task.abort();
        }
        if let Some(task) = self.listener.take() {
            task.abort();
        }
    }
}
