//! Driven port for the hosted authentication provider.
//!
//! The session bridge talks to the provider only through this trait, so
//! bridge tests substitute a deterministic double instead of the HTTP
//! adapter.

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

use crate::domain::{LoginCredentials, OAuthProvider, Registration, Session, SessionEvent, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by authentication gateway adapters.
    pub enum AuthGatewayError {
        /// The provider answered and refused the request; `message` is the
        /// provider's own wording.
        Rejected { message: String } => "{message}",
        /// The provider could not be reached.
        Transport { message: String } => "auth provider unreachable: {message}",
        /// The provider answered with a payload the adapter could not read.
        Decode { message: String } => "auth provider response unreadable: {message}",
    }
}

/// Result of a sign-up request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUpOutcome {
    /// Identifier of the created account.
    pub user_id: UserId,
    /// Immediate session; `None` when email confirmation is required.
    pub session: Option<Session>,
}

type Unsubscribe = Box<dyn FnOnce() + Send + Sync>;

/// Live subscription to provider push events.
///
/// The provider-side listener is released exactly once: by
/// [`AuthSubscription::unsubscribe`] or, failing that, on drop.
pub struct AuthSubscription {
    events: mpsc::UnboundedReceiver<SessionEvent>,
    unsubscribe: Option<Unsubscribe>,
}

impl AuthSubscription {
    /// Wrap a receiver and the hook that detaches it from the provider.
    pub fn new(
        events: mpsc::UnboundedReceiver<SessionEvent>,
        unsubscribe: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            events,
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    /// Wait for the next event; `None` once the provider closes the stream.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    /// Detach from the provider. Later calls are no-ops.
    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.unsubscribe.take() {
            release();
        }
        self.events.close();
    }

    /// Whether the provider-side listener is still attached.
    pub fn is_active(&self) -> bool {
        self.unsubscribe.is_some()
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for AuthSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSubscription")
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

/// Port for the hosted authentication provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange email and password for a session.
    async fn sign_in_with_password(
        &self,
        credentials: &LoginCredentials,
    ) -> Result<Session, AuthGatewayError>;

    /// Build the provider authorisation URL for an OAuth hand-off.
    async fn sign_in_with_oauth(
        &self,
        provider: OAuthProvider,
        redirect_to: &Url,
    ) -> Result<Url, AuthGatewayError>;

    /// Create an account carrying the registration metadata.
    async fn sign_up(
        &self,
        registration: &Registration,
        redirect_to: &Url,
    ) -> Result<SignUpOutcome, AuthGatewayError>;

    /// End the current session.
    async fn sign_out(&self) -> Result<(), AuthGatewayError>;

    /// Drop the locally held session without contacting the provider.
    ///
    /// Used when `sign_out` fails, so a later `current_session` or refresh
    /// cannot bring the user back.
    fn discard_local_session(&self);

    /// Adopt the session carried by an OAuth or email-link redirect.
    ///
    /// `callback` is the full URL the provider redirected to; tokens arrive
    /// in its fragment (or query) alongside any provider error.
    async fn session_from_callback(&self, callback: &Url) -> Result<Session, AuthGatewayError>;

    /// Session the provider currently holds, if any.
    async fn current_session(&self) -> Result<Option<Session>, AuthGatewayError>;

    /// Re-fetch the signed-in user's identifier from the provider.
    async fn current_user_id(&self) -> Result<Option<UserId>, AuthGatewayError>;

    /// Change the signed-in user's password.
    async fn update_password(&self, new_password: &str) -> Result<(), AuthGatewayError>;

    /// Send a password reset email that links back to `redirect_to`.
    async fn reset_password_for_email(
        &self,
        email: &str,
        redirect_to: &Url,
    ) -> Result<(), AuthGatewayError>;

    /// Subscribe to provider push events.
    fn subscribe(&self) -> AuthSubscription;
}
