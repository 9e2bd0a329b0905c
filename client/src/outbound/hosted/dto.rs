//! Wire DTOs for the hosted auth service.
//!
//! Responses decode into these DTOs first, then map into domain sessions in
//! one pass. Request bodies borrow from domain values so secrets are not
//! copied.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{RegistrationMetadata, Session, UserId};

#[derive(Deserialize)]
pub(super) struct TokenResponseDto {
    pub(super) access_token: String,
    #[serde(default)]
    pub(super) refresh_token: Option<String>,
    #[serde(default)]
    pub(super) expires_in: Option<i64>,
    #[serde(default)]
    pub(super) expires_at: Option<i64>,
    pub(super) user: AuthUserDto,
}

#[derive(Debug, Deserialize)]
pub(super) struct AuthUserDto {
    pub(super) id: UserId,
    #[serde(default)]
    pub(super) email: Option<String>,
}

/// Sign-up answers with a full session when email confirmation is off and
/// with the bare user otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
pub(super) enum SignUpResponseDto {
    Session(TokenResponseDto),
    User(AuthUserDto),
}

impl TokenResponseDto {
    /// Absolute `expires_at` wins; otherwise `expires_in` counts from `now`.
    pub(super) fn into_session(self, now: DateTime<Utc>) -> Session {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| {
                self.expires_in
                    .and_then(TimeDelta::try_seconds)
                    .and_then(|delta| now.checked_add_signed(delta))
            });
        Session::new(self.user.id, self.access_token)
            .with_email(self.user.email)
            .with_refresh_token(self.refresh_token)
            .with_expires_at(expires_at)
    }
}

/// On-disk form of the session kept between runs.
#[derive(Serialize, Deserialize)]
pub(super) struct StoredSessionDto {
    pub(super) user_id: UserId,
    #[serde(default)]
    pub(super) email: Option<String>,
    pub(super) access_token: String,
    #[serde(default)]
    pub(super) refresh_token: Option<String>,
    #[serde(default)]
    pub(super) expires_at: Option<DateTime<Utc>>,
}

impl From<&Session> for StoredSessionDto {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user_id().clone(),
            email: session.email().map(str::to_owned),
            access_token: session.access_token().to_owned(),
            refresh_token: session.refresh_token().map(str::to_owned),
            expires_at: session.expires_at(),
        }
    }
}

impl StoredSessionDto {
    pub(super) fn into_session(self) -> Session {
        Session::new(self.user_id, self.access_token)
            .with_email(self.email)
            .with_refresh_token(self.refresh_token)
            .with_expires_at(self.expires_at)
    }
}

#[derive(Serialize)]
pub(super) struct PasswordGrantDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Serialize)]
pub(super) struct RefreshGrantDto<'a> {
    pub(super) refresh_token: &'a str,
}

#[derive(Serialize)]
pub(super) struct SignUpRequestDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
    pub(super) data: &'a RegistrationMetadata,
}

#[derive(Serialize)]
pub(super) struct RecoverRequestDto<'a> {
    pub(super) email: &'a str,
}

#[derive(Serialize)]
pub(super) struct UpdatePasswordDto<'a> {
    pub(super) password: &'a str,
}
