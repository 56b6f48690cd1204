//! # hmdfleet-device - Device Session Boundary
//!
//! The transport-facing edge of the fleet coordinator. Defines the async
//! client trait a concrete management-protocol transport implements, the
//! session wrapper the registry owns, and scriptable test doubles.
//!
//! Depends on [`hmdfleet_core`] for domain types and error handling.
//!
//! ## Public API
//!
//! ### Transport Boundary (`client`)
//! - [`DeviceClient`] - Async operations against one connected device
//! - [`DeviceConnector`] - Factory opening authenticated sessions
//! - [`ConnectOptions`] - Address plus credentials for a connect attempt
//! - [`resolve_credentials()`] - Default-credential substitution rule
//!
//! ### Sessions (`session`)
//! - [`DeviceSession`] - Client plus last known state (connection,
//!   selection, installed apps); disposal is explicit and idempotent

pub mod client;
pub mod session;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_utils;

// Public API re-exports
pub use client::{resolve_credentials, ConnectOptions, DeviceClient, DeviceConnector};
pub use session::DeviceSession;
