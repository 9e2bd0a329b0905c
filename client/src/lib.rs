//! Session client for the service marketplace.
//!
//! Bridges a hosted auth provider's push events and the user's explicit
//! actions into one observable "current user + loading" state, and resolves
//! where each role lands after signing in.
//!
//! - [`domain`]: canonical user model, ports and the [`domain::SessionBridge`].
//! - [`outbound`]: adapters for the hosted platform and console surfaces.
//! - [`config`]: environment-driven settings with startup validation.

pub mod config;
pub mod domain;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
