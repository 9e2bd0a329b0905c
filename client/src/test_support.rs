//! Test utilities for the client crate.
//!
//! Deterministic in-memory doubles shared by unit tests (in `src/`) and
//! integration tests (in `tests/`). Compiled for tests and behind the
//! `test-support` feature.

pub mod platform;
pub mod surfaces;

pub use platform::{InMemoryAuthGateway, InMemoryProfileRepository, LookupGate};
pub use surfaces::{Notification, RecordingNavigator, RecordingNotifier};
