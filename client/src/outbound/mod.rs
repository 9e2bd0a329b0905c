//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **hosted**: reqwest-backed auth and table adapters for the hosted
//!   platform.
//! - **console**: tracing-backed navigation and notification surfaces used
//!   by the command-line entry point.
//!
//! Adapters are thin translators between domain types and wire
//! representations. They contain no session logic.

pub mod console;
pub mod hosted;
