//! User-initiated session operations.
//!
//! Each operation shows a notification and returns the outcome; failures
//! are never swallowed.

use tracing::info;
use url::Url;

use crate::domain::ports::{NEW_USER_STATUS, NEW_VENDOR_STATUS, NewUserRecord, NewVendorRecord};
use crate::domain::{
    Destination, DomainError, LoginCredentials, OAuthProvider, PASSWORD_MIN_LEN, ProfileUpdate,
    RawUserRecord, Registration, RegistrationForm, Role, User, UserId, dashboard_for,
    destination_for, map_profile,
};

use super::SessionBridge;
use super::errors::{
    GOOGLE_LOGIN_FAILED, LOGIN_FAILED, LOGOUT_FAILED, NO_USER_LOGGED_IN, OAUTH_CALLBACK_FAILED,
    PASSWORD_RESET_FAILED, PASSWORD_UPDATE_FAILED, PROFILE_CREATE_FAILED, PROFILE_FETCH_FAILED,
    PROFILE_NOT_FOUND, PROFILE_UPDATE_FAILED, REFRESH_FAILED, REGISTRATION_FAILED, auth_failure,
    callback_failure, invalid_input, profile_failure,
};

const CONFIRM_EMAIL_NOTICE: &str = "Check your email to confirm your account";

impl SessionBridge {
    /// Sign in with email and password, install the user and open their
    /// dashboard.
    ///
    /// # Errors
    ///
    /// Invalid input, provider rejections (with the provider's message) and
    /// missing profiles.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), DomainError> {
        let _loading = self.state().loading();
        let outcome = self.try_login(email, password).await;
        self.finish(outcome, "Logged in successfully")
    }

    async fn try_login(&self, email: &str, password: &str) -> Result<(), DomainError> {
        let credentials =
            LoginCredentials::try_from_parts(email, password).map_err(|err| invalid_input(&err))?;
        let session = self
            .ports()
            .auth
            .sign_in_with_password(&credentials)
            .await
            .map_err(|err| auth_failure(err, LOGIN_FAILED))?;
        let user = self.load_user(session.user_id()).await?;
        info!(user_id = %user.id(), "user logged in");
        self.install_and_open_dashboard(user);
        Ok(())
    }

    /// Hand off to Google's consent screen. No user is installed here; the
    /// provider redirects back to the callback surface.
    ///
    /// # Errors
    ///
    /// Provider failures building the authorisation URL.
    pub async fn login_with_google(&self) -> Result<(), DomainError> {
        let outcome = self
            .ports()
            .auth
            .sign_in_with_oauth(OAuthProvider::Google, &self.inner.oauth_redirect)
            .await
            .map_err(|err| auth_failure(err, GOOGLE_LOGIN_FAILED))
            .map(|url| self.ports().navigator.redirect_external(&url));
        self.finish(outcome, "Redirecting to Google")
    }

    /// Create an account.
    ///
    /// With an immediate session the profile rows are written, the user is
    /// installed and their dashboard opened. When the provider requires
    /// email confirmation nothing is installed and the login page opens.
    ///
    /// # Errors
    ///
    /// Invalid input, provider rejections and profile row failures.
    pub async fn register(&self, form: RegistrationForm) -> Result<(), DomainError> {
        let _loading = self.state().loading();
        let outcome = self.try_register(form).await;
        let notice = match &outcome {
            Ok(RegistrationResult::ConfirmationRequired) => {
                self.ports().navigator.navigate(Destination::Login);
                CONFIRM_EMAIL_NOTICE
            }
            Ok(RegistrationResult::SignedIn) | Err(_) => "Account created successfully",
        };
        self.finish(outcome.map(|_| ()), notice)
    }

    async fn try_register(&self, form: RegistrationForm) -> Result<RegistrationResult, DomainError> {
        let registration = Registration::try_from_form(form).map_err(|err| invalid_input(&err))?;
        let outcome = self
            .ports()
            .auth
            .sign_up(&registration, &self.inner.oauth_redirect)
            .await
            .map_err(|err| auth_failure(err, REGISTRATION_FAILED))?;

        if outcome.session.is_none() {
            info!(user_id = %outcome.user_id, "registration awaiting email confirmation");
            return Ok(RegistrationResult::ConfirmationRequired);
        }

        self.create_profile_rows(&outcome.user_id, &registration)
            .await?;
        let user = self.load_user(&outcome.user_id).await?;
        info!(user_id = %user.id(), role = %registration.role(), "user registered");
        self.install_and_open_dashboard(user);
        Ok(RegistrationResult::SignedIn)
    }

    async fn create_profile_rows(
        &self,
        user_id: &UserId,
        registration: &Registration,
    ) -> Result<(), DomainError> {
        let metadata = registration.metadata();
        let record = NewUserRecord {
            id: user_id.clone(),
            email: registration.credentials().email().to_owned(),
            first_name: non_blank(&metadata.first_name),
            last_name: non_blank(&metadata.last_name),
            role: registration.role(),
            status: NEW_USER_STATUS.to_owned(),
            phone: metadata.phone.clone(),
        };
        self.ports()
            .profiles
            .insert_user(&record)
            .await
            .map_err(|err| profile_failure(err, PROFILE_CREATE_FAILED))?;

        if let Some(shopname) = registration.shop_name() {
            let vendor = NewVendorRecord {
                user_id: user_id.clone(),
                shopname: shopname.to_owned(),
                status: NEW_VENDOR_STATUS.to_owned(),
            };
            self.ports()
                .profiles
                .insert_vendor(&vendor)
                .await
                .map_err(|err| profile_failure(err, PROFILE_CREATE_FAILED))?;
        }
        Ok(())
    }

    /// Sign out and return to the landing page.
    ///
    /// Local state is cleared even when the provider call fails, so the user
    /// never stays signed in locally after asking to leave; the provider
    /// failure is still reported.
    ///
    /// # Errors
    ///
    /// Provider failures signing out.
    pub async fn logout(&self) -> Result<(), DomainError> {
        let _loading = self.state().loading();
        let outcome = self
            .ports()
            .auth
            .sign_out()
            .await
            .map_err(|err| auth_failure(err, LOGOUT_FAILED));
        if outcome.is_err() {
            self.ports().auth.discard_local_session();
        }
        self.state().clear();
        self.ports().navigator.navigate(Destination::Landing);
        info!(confirmed = outcome.is_ok(), "user logged out");
        self.finish(outcome, "Logged out successfully")
    }

    /// Re-fetch the current user from the provider without navigating.
    ///
    /// # Errors
    ///
    /// Provider or profile store failures.
    pub async fn refresh_token(&self) -> Result<(), DomainError> {
        let outcome = self.try_refresh().await;
        if let Err(err) = &outcome {
            self.ports().notifier.error(err.message());
        }
        outcome
    }

    async fn try_refresh(&self) -> Result<(), DomainError> {
        let user_id = self
            .ports()
            .auth
            .current_user_id()
            .await
            .map_err(|err| auth_failure(err, REFRESH_FAILED))?;
        match user_id {
            Some(id) => {
                let user = self.load_user(&id).await?;
                self.state().install(user);
            }
            None => self.state().clear(),
        }
        Ok(())
    }

    /// Apply a partial profile update for the signed-in user.
    ///
    /// # Errors
    ///
    /// [`crate::domain::ErrorCode::Precondition`] without a signed-in user,
    /// raised before any network call; otherwise profile store failures.
    pub async fn update_profile(&self, updates: ProfileUpdate) -> Result<(), DomainError> {
        let Some(current) = self.current_user() else {
            let err = DomainError::precondition(NO_USER_LOGGED_IN);
            self.ports().notifier.error(err.message());
            return Err(err);
        };
        if updates.is_empty() {
            return Ok(());
        }
        let outcome = self.try_update_profile(&current, &updates).await;
        self.finish(outcome, "Profile updated successfully")
    }

    async fn try_update_profile(
        &self,
        current: &User,
        updates: &ProfileUpdate,
    ) -> Result<(), DomainError> {
        let row: RawUserRecord = self
            .ports()
            .profiles
            .update_user(current.id(), updates)
            .await
            .map_err(|err| profile_failure(err, PROFILE_UPDATE_FAILED))?
            .ok_or_else(|| DomainError::not_found(PROFILE_NOT_FOUND))?;
        let mut user = map_profile(&row).ok_or_else(|| DomainError::not_found(PROFILE_NOT_FOUND))?;
        if user.vendor().is_none() {
            user = user.with_vendor(current.vendor().cloned());
        }
        self.state().install(user);
        Ok(())
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Precondition failure without a signed-in user, short passwords, and
    /// provider rejections.
    pub async fn update_password(&self, new_password: &str) -> Result<(), DomainError> {
        let outcome = self.try_update_password(new_password).await;
        self.finish(outcome, "Password updated successfully")
    }

    async fn try_update_password(&self, new_password: &str) -> Result<(), DomainError> {
        if self.current_user().is_none() {
            return Err(DomainError::precondition(NO_USER_LOGGED_IN));
        }
        if new_password.chars().count() < PASSWORD_MIN_LEN {
            return Err(DomainError::invalid_request(format!(
                "password must be at least {PASSWORD_MIN_LEN} characters"
            )));
        }
        self.ports()
            .auth
            .update_password(new_password)
            .await
            .map_err(|err| auth_failure(err, PASSWORD_UPDATE_FAILED))
    }

    /// Send a password reset email. Local state is untouched.
    ///
    /// # Errors
    ///
    /// Blank email or provider failures.
    pub async fn reset_password(&self, email: &str) -> Result<(), DomainError> {
        let outcome = self.try_reset_password(email).await;
        self.finish(outcome, "Password reset email sent")
    }

    async fn try_reset_password(&self, email: &str) -> Result<(), DomainError> {
        let trimmed = email.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_request("email must not be empty"));
        }
        self.ports()
            .auth
            .reset_password_for_email(trimmed, &self.inner.oauth_redirect)
            .await
            .map_err(|err| auth_failure(err, PASSWORD_RESET_FAILED))
    }

    /// Open the dashboard for the signed-in user's role, or the landing page.
    pub fn redirect_to_dashboard(&self) {
        let destination = dashboard_for(self.snapshot().user());
        self.ports().navigator.navigate(destination);
    }

    /// Finish an OAuth or email-link round trip: adopt the session carried
    /// by `callback`, create a customer profile on first sign-in, install the
    /// user and open their dashboard.
    ///
    /// # Errors
    ///
    /// A callback without tokens (or carrying a provider error), or
    /// provider/profile store failures.
    pub async fn complete_oauth_callback(&self, callback: &Url) -> Result<(), DomainError> {
        let _loading = self.state().loading();
        let outcome = self.try_complete_oauth_callback(callback).await;
        self.finish(outcome, "Logged in successfully")
    }

    async fn try_complete_oauth_callback(&self, callback: &Url) -> Result<(), DomainError> {
        let session = self
            .ports()
            .auth
            .session_from_callback(callback)
            .await
            .map_err(callback_failure)?;
        let user_id = session.user_id();

        let existing = self
            .ports()
            .profiles
            .find_user(user_id)
            .await
            .map_err(|err| profile_failure(err, PROFILE_FETCH_FAILED))?;
        if existing.is_none() {
            let email = session
                .email()
                .ok_or_else(|| DomainError::backend(OAUTH_CALLBACK_FAILED))?;
            let record = NewUserRecord {
                id: user_id.clone(),
                email: email.to_owned(),
                first_name: None,
                last_name: None,
                role: Role::Customer,
                status: NEW_USER_STATUS.to_owned(),
                phone: None,
            };
            self.ports()
                .profiles
                .insert_user(&record)
                .await
                .map_err(|err| profile_failure(err, PROFILE_CREATE_FAILED))?;
            info!(user_id = %user_id, "created profile on first OAuth sign-in");
        }

        let user = self.load_user(user_id).await?;
        self.install_and_open_dashboard(user);
        Ok(())
    }

    fn install_and_open_dashboard(&self, user: User) {
        let destination = destination_for(user.role());
        self.state().install(user);
        self.ports().navigator.navigate(destination);
    }
}

enum RegistrationResult {
    SignedIn,
    ConfirmationRequired,
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}
