//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_gateway;
mod navigator;
mod notifier;
mod profile_repository;

#[cfg(test)]
pub use auth_gateway::MockAuthGateway;
pub use auth_gateway::{AuthGateway, AuthGatewayError, AuthSubscription, SignUpOutcome};
#[cfg(test)]
pub use navigator::MockNavigator;
pub use navigator::Navigator;
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::Notifier;
#[cfg(test)]
pub use profile_repository::MockProfileRepository;
pub use profile_repository::{
    NEW_USER_STATUS, NEW_VENDOR_STATUS, NewUserRecord, NewVendorRecord, ProfileRepository,
    ProfileRepositoryError,
};
