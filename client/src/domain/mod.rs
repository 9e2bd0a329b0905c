//! Domain primitives, ports and the session bridge.
//!
//! Purpose: define the marketplace's identity types and the rules that keep
//! the signed-in user consistent across bootstrap, provider push events and
//! explicit user operations. Nothing here performs I/O directly; adapters in
//! [`crate::outbound`] implement the [`ports`].
//!
//! Public surface:
//! - [`User`], [`Role`], [`VendorSummary`]: canonical user model.
//! - [`map_profile`]: raw `users` rows to [`User`].
//! - [`destination_for`], [`dashboard_for`]: role to landing surface.
//! - [`Envelope`]: success/failure result wrapper for presentation code.
//! - [`SessionBridge`]: the process-wide session context.

mod auth;
mod envelope;
pub mod error;
pub mod ports;
mod profile_mapper;
mod role_router;
mod session;
mod session_bridge;
mod user;

pub use self::auth::{
    AuthValidationError, LoginCredentials, OAuthProvider, PASSWORD_MIN_LEN, ProfileUpdate,
    Registration, RegistrationForm, RegistrationMetadata,
};
pub use self::envelope::Envelope;
pub use self::error::{DomainError, DomainErrorValidationError, ErrorCode};
pub use self::profile_mapper::{RawUserRecord, RawVendorRecord, VendorJoin, map_profile};
pub use self::role_router::{Destination, dashboard_for, destination_for};
pub use self::session::{Session, SessionEvent};
pub use self::session_bridge::{SessionBridge, SessionBridgePorts, SessionHandle, SessionState};
pub use self::user::{Role, User, UserId, UserParts, UserValidationError, VendorSummary};

/// Result alias for session operations.
///
/// # Examples
/// ```
/// use marketplace_client::domain::{DomainError, DomainResult};
///
/// fn guard(signed_in: bool) -> DomainResult<()> {
///     if signed_in {
///         Ok(())
///     } else {
///         Err(DomainError::precondition("no user logged in"))
///     }
/// }
/// assert!(guard(false).is_err());
/// ```
pub type DomainResult<T> = Result<T, DomainError>;
