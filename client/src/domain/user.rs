//! Canonical user model.
//!
//! The session bridge owns exactly one [`User`] at a time and hands out
//! clones; nothing outside the profile mapper assembles one from raw backend
//! rows.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// Identifier was empty.
    EmptyId,
    /// Identifier carried leading or trailing whitespace.
    InvalidId,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must not contain surrounding whitespace"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Opaque user identifier issued by the hosted auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// Marketplace role. Always one of four values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Platform administrator.
    Admin,
    /// Operations manager.
    Manager,
    /// Service vendor running a shop.
    Vendor,
    /// Customer booking services.
    Customer,
}

impl Role {
    /// Strict parse; unknown values return `None`.
    ///
    /// # Examples
    /// ```
    /// use marketplace_client::domain::Role;
    ///
    /// assert_eq!(Role::parse("vendor"), Some(Role::Vendor));
    /// assert_eq!(Role::parse("OWNER"), None);
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(Self::Admin),
            "MANAGER" => Some(Self::Manager),
            "VENDOR" => Some(Self::Vendor),
            "CUSTOMER" => Some(Self::Customer),
            _ => None,
        }
    }

    /// Lenient reading of a raw record's role column.
    ///
    /// Absent or blank stays absent; a present but unrecognised value reads
    /// as [`Role::Customer`], the least privileged role.
    #[must_use]
    pub fn from_raw(raw: Option<&str>) -> Option<Self> {
        let value = raw.map(str::trim).filter(|value| !value.is_empty())?;
        Some(Self::parse(value).unwrap_or(Self::Customer))
    }

    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Manager => "MANAGER",
            Self::Vendor => "VENDOR",
            Self::Customer => "CUSTOMER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vendor shop summary joined onto a vendor's user record.
///
/// The shop name is serialised as `shopname` and nothing else, and is left
/// out entirely when the join carried none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorSummary {
    /// Vendor row identifier.
    pub id: String,
    /// Public shop name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopname: Option<String>,
    /// Vendor approval status, when the backend reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Application user.
///
/// ## Invariants
/// - `name` is always `first_name` and `last_name` joined by a single space,
///   or whichever one is present.
/// - Replaced wholesale on every fetch; there are no setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vendor: Option<VendorSummary>,
    name: String,
}

/// Identity and naming parts used to build a [`User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserParts {
    /// Provider-issued identifier.
    pub id: UserId,
    /// Sign-in email.
    pub email: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Marketplace role.
    pub role: Option<Role>,
    /// Account status as reported by the backend.
    pub status: Option<String>,
}

impl User {
    /// Build a user from its identity parts; the display name is derived.
    pub fn new(parts: UserParts) -> Self {
        let UserParts {
            id,
            email,
            first_name,
            last_name,
            role,
            status,
        } = parts;
        let name = display_name(first_name.as_deref(), last_name.as_deref());
        Self {
            id,
            email,
            first_name,
            last_name,
            role,
            status,
            avatar: None,
            phone: None,
            vendor: None,
            name,
        }
    }

    /// Attach an avatar URL.
    #[must_use]
    pub fn with_avatar(mut self, avatar: Option<String>) -> Self {
        self.avatar = avatar;
        self
    }

    /// Attach a phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: Option<String>) -> Self {
        self.phone = phone;
        self
    }

    /// Attach the vendor summary.
    #[must_use]
    pub fn with_vendor(mut self, vendor: Option<VendorSummary>) -> Self {
        self.vendor = vendor;
        self
    }

    /// Provider-issued identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Sign-in email.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Given name.
    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    /// Family name.
    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    /// Derived display name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Marketplace role, absent when the record carries none.
    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// Account status.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Avatar URL.
    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    /// Phone number.
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Vendor summary for vendor accounts.
    pub fn vendor(&self) -> Option<&VendorSummary> {
        self.vendor.as_ref()
    }
}

fn display_name(first: Option<&str>, last: Option<&str>) -> String {
    [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
