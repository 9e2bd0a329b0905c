//! Driven port for the hosted `users` and `vendors` tables.
//!
//! Row-level security is enforced by the platform; adapters only translate
//! between rows and the types below.

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::{ProfileUpdate, RawUserRecord, Role, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile repository adapters.
    pub enum ProfileRepositoryError {
        /// The table API refused the request; `message` is its own wording.
        Rejected { message: String } => "{message}",
        /// The table API could not be reached.
        Transport { message: String } => "profile store unreachable: {message}",
        /// The table API answered with rows the adapter could not read.
        Decode { message: String } => "profile store response unreadable: {message}",
    }
}

/// Status given to newly created user rows.
pub const NEW_USER_STATUS: &str = "ACTIVE";
/// Status given to newly created vendor rows until an admin approves them.
pub const NEW_VENDOR_STATUS: &str = "PENDING";

/// Row inserted into `users` after sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewUserRecord {
    /// Provider-issued identifier; doubles as the primary key.
    pub id: UserId,
    /// Sign-in email.
    pub email: String,
    /// Given name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Marketplace role.
    pub role: Role,
    /// Initial account status.
    pub status: String,
    /// Contact phone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Row inserted into `vendors` for vendor sign-ups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewVendorRecord {
    /// Owning user.
    pub user_id: UserId,
    /// Shop name column.
    pub shopname: String,
    /// Initial approval status.
    pub status: String,
}

/// Port for profile rows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Fetch a user row with its vendor join.
    ///
    /// A missing row is `Ok(None)`, never an error.
    async fn find_user(&self, id: &UserId)
    -> Result<Option<RawUserRecord>, ProfileRepositoryError>;

    /// Insert a user row.
    async fn insert_user(&self, record: &NewUserRecord) -> Result<(), ProfileRepositoryError>;

    /// Apply a partial update and return the updated row, if it exists.
    async fn update_user(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<RawUserRecord>, ProfileRepositoryError>;

    /// Insert a vendor row.
    async fn insert_vendor(&self, record: &NewVendorRecord) -> Result<(), ProfileRepositoryError>;
}
