//! Provider sessions and the push-event taxonomy.

use std::fmt;

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

use super::UserId;

/// Authenticated provider session.
///
/// Tokens live in zeroizing storage and never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    email: Option<String>,
    access_token: Zeroizing<String>,
    refresh_token: Option<Zeroizing<String>>,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Build a session for `user_id` carrying `access_token`.
    pub fn new(user_id: UserId, access_token: impl Into<String>) -> Self {
        Self {
            user_id,
            email: None,
            access_token: Zeroizing::new(access_token.into()),
            refresh_token: None,
            expires_at: None,
        }
    }

    /// Attach the email the provider reports for the session user.
    #[must_use]
    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// Attach a refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token.map(Zeroizing::new);
        self
    }

    /// Attach the access token expiry.
    #[must_use]
    pub fn with_expires_at(mut self, expires_at: Option<DateTime<Utc>>) -> Self {
        self.expires_at = expires_at;
        self
    }

    /// Identifier of the signed-in user.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Email reported by the provider.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Bearer token for authenticated requests.
    pub fn access_token(&self) -> &str {
        self.access_token.as_str()
    }

    /// Token used to obtain a fresh access token.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|token| token.as_str())
    }

    /// When the access token stops being accepted.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Authentication state change pushed by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A user signed in.
    SignedIn(Option<Session>),
    /// The current user signed out.
    SignedOut,
    /// The provider rotated the access token.
    TokenRefreshed(Option<Session>),
    /// Any other provider notification; carries the raw event name.
    Other {
        /// Provider event name.
        kind: String,
    },
}

impl SessionEvent {
    /// Classify a provider event name.
    ///
    /// # Examples
    /// ```
    /// use marketplace_client::domain::SessionEvent;
    ///
    /// assert_eq!(SessionEvent::from_wire("SIGNED_OUT", None), SessionEvent::SignedOut);
    /// assert!(matches!(
    ///     SessionEvent::from_wire("USER_UPDATED", None),
    ///     SessionEvent::Other { .. }
    /// ));
    /// ```
    #[must_use]
    pub fn from_wire(kind: &str, session: Option<Session>) -> Self {
        match kind {
            "SIGNED_IN" => Self::SignedIn(session),
            "SIGNED_OUT" => Self::SignedOut,
            "TOKEN_REFRESHED" => Self::TokenRefreshed(session),
            other => Self::Other {
                kind: other.to_owned(),
            },
        }
    }

    /// Stable label used in logs.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::SignedIn(_) => "SIGNED_IN",
            Self::SignedOut => "SIGNED_OUT",
            Self::TokenRefreshed(_) => "TOKEN_REFRESHED",
            Self::Other { kind } => kind.as_str(),
        }
    }
}
