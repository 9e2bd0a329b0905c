//! Authentication inputs: credentials, registration and profile updates.
//!
//! Constructors validate raw strings before the session bridge talks to a
//! port, so precondition failures never cost a network round trip.

use std::fmt;

use serde::Serialize;
use zeroize::Zeroizing;

use super::Role;

/// Minimum password length accepted by the hosted provider.
pub const PASSWORD_MIN_LEN: usize = 6;

/// Domain error returned when authentication inputs are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthValidationError {
    /// Email was missing or blank once trimmed.
    EmptyEmail,
    /// Password was blank.
    EmptyPassword,
    /// Password is shorter than [`PASSWORD_MIN_LEN`].
    PasswordTooShort {
        /// Required minimum length.
        min: usize,
    },
    /// Vendor registrations must name a shop.
    MissingShopName,
}

impl fmt::Display for AuthValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
            Self::MissingShopName => write!(f, "vendors must provide a shop name"),
        }
    }
}

impl std::error::Error for AuthValidationError {}

fn normalise_email(email: &str) -> Result<String, AuthValidationError> {
    let normalised = email.trim();
    if normalised.is_empty() {
        return Err(AuthValidationError::EmptyEmail);
    }
    Ok(normalised.to_owned())
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is trimmed and must not be empty after trimming.
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use marketplace_client::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" a@b.com ", "password").unwrap();
/// assert_eq!(creds.email(), "a@b.com");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AuthValidationError> {
        let email = normalise_email(email)?;
        if password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }

        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Email used for the sign-in request.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Raw registration form values.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    /// Sign-in email.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Requested role; customers when absent.
    pub role: Option<Role>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Shop name, required for vendors.
    pub shop_name: Option<String>,
}

/// Validated account registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    credentials: LoginCredentials,
    metadata: RegistrationMetadata,
    shop_name: Option<String>,
}

/// Profile metadata attached to the provider sign-up request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationMetadata {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Requested role.
    pub role: Role,
    /// Contact phone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl Registration {
    /// Validate a registration form.
    pub fn try_from_form(form: RegistrationForm) -> Result<Self, AuthValidationError> {
        let RegistrationForm {
            email,
            password,
            first_name,
            last_name,
            role,
            phone,
            shop_name,
        } = form;

        let credentials = LoginCredentials::try_from_parts(&email, &password)?;
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(AuthValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LEN,
            });
        }

        let role = role.unwrap_or(Role::Customer);
        let shop_name = shop_name
            .map(|name| name.trim().to_owned())
            .filter(|name| !name.is_empty());
        if role == Role::Vendor && shop_name.is_none() {
            return Err(AuthValidationError::MissingShopName);
        }

        Ok(Self {
            credentials,
            metadata: RegistrationMetadata {
                first_name: first_name.trim().to_owned(),
                last_name: last_name.trim().to_owned(),
                role,
                phone: phone
                    .map(|value| value.trim().to_owned())
                    .filter(|value| !value.is_empty()),
            },
            shop_name: if role == Role::Vendor { shop_name } else { None },
        })
    }

    /// Sign-up credentials.
    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }

    /// Metadata sent alongside the sign-up request.
    pub fn metadata(&self) -> &RegistrationMetadata {
        &self.metadata
    }

    /// Requested role.
    pub fn role(&self) -> Role {
        self.metadata.role
    }

    /// Shop name; present only for vendor registrations.
    pub fn shop_name(&self) -> Option<&str> {
        self.shop_name.as_deref()
    }
}

/// Partial profile update. Unset fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    /// New given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// New family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// New phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// New avatar URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl ProfileUpdate {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone.is_none()
            && self.avatar.is_none()
    }
}

/// OAuth providers offered on the sign-in surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OAuthProvider {
    /// Google accounts.
    Google,
}

impl OAuthProvider {
    /// Provider name expected by the hosted platform.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn form(role: Option<Role>, shop_name: Option<&str>) -> RegistrationForm {
        RegistrationForm {
            email: "ana@example.com".to_owned(),
            password: "secret-pw".to_owned(),
            first_name: " Ana ".to_owned(),
            last_name: "Lee".to_owned(),
            role,
            phone: Some("  ".to_owned()),
            shop_name: shop_name.map(str::to_owned),
        }
    }

    #[rstest]
    #[case("", "pw", AuthValidationError::EmptyEmail)]
    #[case("   ", "pw", AuthValidationError::EmptyEmail)]
    #[case("a@b.com", "", AuthValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: AuthValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case("  a@b.com  ", "secret")]
    #[case("ana@example.com", " spaced password ")]
    fn valid_credentials_trim_email(#[case] email: &str, #[case] password: &str) {
        let creds = LoginCredentials::try_from_parts(email, password)
            .expect("valid inputs should succeed");
        assert_eq!(creds.email(), email.trim());
        assert_eq!(creds.password(), password);
    }

    #[rstest]
    fn registration_defaults_to_customer_and_drops_blank_phone() {
        let registration = Registration::try_from_form(form(None, Some("ignored")))
            .expect("customer registration");
        assert_eq!(registration.role(), Role::Customer);
        assert_eq!(registration.metadata().first_name, "Ana");
        assert!(registration.metadata().phone.is_none());
        assert!(registration.shop_name().is_none());
    }

    #[rstest]
    #[case(None)]
    #[case(Some("   "))]
    fn vendor_registration_requires_shop_name(#[case] shop_name: Option<&str>) {
        let err = Registration::try_from_form(form(Some(Role::Vendor), shop_name))
            .expect_err("vendor without shop must fail");
        assert_eq!(err, AuthValidationError::MissingShopName);
    }

    #[rstest]
    fn vendor_registration_keeps_trimmed_shop_name() {
        let registration = Registration::try_from_form(form(Some(Role::Vendor), Some(" Lee Co ")))
            .expect("vendor registration");
        assert_eq!(registration.shop_name(), Some("Lee Co"));
    }

    #[rstest]
    fn short_passwords_are_rejected() {
        let mut raw = form(None, None);
        raw.password = "12345".to_owned();
        let err = Registration::try_from_form(raw).expect_err("short password must fail");
        assert_eq!(
            err,
            AuthValidationError::PasswordTooShort {
                min: PASSWORD_MIN_LEN
            }
        );
    }

    #[rstest]
    fn metadata_serialises_role_in_wire_form() {
        let registration =
            Registration::try_from_form(form(Some(Role::Manager), None)).expect("registration");
        let value = serde_json::to_value(registration.metadata()).expect("serialise metadata");
        assert_eq!(value["role"], "MANAGER");
        assert!(value.get("phone").is_none());
    }

    #[rstest]
    fn empty_profile_update_is_detected() {
        assert!(ProfileUpdate::default().is_empty());
        let update = ProfileUpdate {
            phone: Some("555".to_owned()),
            ..ProfileUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
