//! Port error to domain error translation for bridge operations.

use tracing::warn;

use crate::domain::ports::{AuthGatewayError, ProfileRepositoryError};
use crate::domain::{AuthValidationError, DomainError};

pub(super) const LOGIN_FAILED: &str = "Login failed";
pub(super) const GOOGLE_LOGIN_FAILED: &str = "Google login failed";
pub(super) const REGISTRATION_FAILED: &str = "Registration failed";
pub(super) const LOGOUT_FAILED: &str = "Logout failed";
pub(super) const REFRESH_FAILED: &str = "Failed to refresh session";
pub(super) const PROFILE_FETCH_FAILED: &str = "Failed to load user profile";
pub(super) const PROFILE_CREATE_FAILED: &str = "Failed to create user profile";
pub(super) const PROFILE_UPDATE_FAILED: &str = "Profile update failed";
pub(super) const PASSWORD_UPDATE_FAILED: &str = "Password update failed";
pub(super) const PASSWORD_RESET_FAILED: &str = "Password reset failed";
pub(super) const OAUTH_CALLBACK_FAILED: &str = "Sign-in could not be completed";

pub(super) const NO_USER_LOGGED_IN: &str = "no user logged in";
pub(super) const PROFILE_NOT_FOUND: &str = "user profile not found";

/// Rejections keep the provider's wording; transport and decode failures
/// surface the operation fallback and are logged with their detail.
pub(super) fn auth_failure(error: AuthGatewayError, fallback: &str) -> DomainError {
    match error {
        AuthGatewayError::Rejected { message } => DomainError::backend_or(message, fallback),
        other => {
            warn!(error = %other, operation = fallback, "auth provider request failed");
            DomainError::backend(fallback)
        }
    }
}

/// A refused redirect means the user is not signed in; anything else is a
/// provider failure.
pub(super) fn callback_failure(error: AuthGatewayError) -> DomainError {
    match error {
        AuthGatewayError::Rejected { message } if message.trim().is_empty() => {
            DomainError::unauthorized(OAUTH_CALLBACK_FAILED)
        }
        AuthGatewayError::Rejected { message } => DomainError::unauthorized(message),
        other => auth_failure(other, OAUTH_CALLBACK_FAILED),
    }
}

pub(super) fn profile_failure(error: ProfileRepositoryError, fallback: &str) -> DomainError {
    match error {
        ProfileRepositoryError::Rejected { message } => DomainError::backend_or(message, fallback),
        other => {
            warn!(error = %other, operation = fallback, "profile store request failed");
            DomainError::backend(fallback)
        }
    }
}

pub(super) fn invalid_input(error: &AuthValidationError) -> DomainError {
    DomainError::invalid_request(error.to_string())
}
