//! # hmdfleet-core - Core Domain Types
//!
//! Foundation crate for the headset fleet coordinator. Provides domain
//! types, error handling, change-event definitions, and logging setup.
//!
//! This crate has **zero internal dependencies** -- it only depends on
//! external crates (serde, thiserror, tracing).
//!
//! ## Public API
//!
//! ### Domain Types (`types`)
//! - [`ConnectionState`] - Session lifecycle (Connecting, Connected, ...)
//! - [`Credentials`], [`ConnectionRecord`] - Auth material and persisted
//!   reconnect pointers
//! - [`Scope`], [`BulkCommand`] - What a bulk operation targets and does
//! - [`Outcome`], [`BulkReport`] - Per-device and aggregated results
//!
//! ### Events (`events`)
//! - [`FleetEvent`] - Typed change notifications emitted by the coordinator
//!
//! ### Error Handling (`error`)
//! - [`ConnectError`], [`OpError`], [`PreconditionError`] - Domain failures
//! - [`Error`] / [`Result`] - Crate-level error enum and alias
//!
//! ## Prelude
//!
//! Import commonly used types with:
//! ```rust
//! use hmdfleet_core::prelude::*;
//! ```

pub mod error;
pub mod events;
pub mod logging;
pub mod types;

/// Prelude for common imports used throughout all fleet coordinator crates
pub mod prelude {
    pub use super::error::{ConnectError, Error, OpError, PreconditionError, Result};
    pub use tracing::{debug, error, info, instrument, trace, warn};
}

// Re-export commonly used types at crate root for convenience
pub use error::{ConnectError, Error, OpError, PreconditionError, Result};
pub use events::FleetEvent;
pub use types::{
    BulkCommand, BulkReport, ConnectionRecord, ConnectionState, Credentials, Outcome, Scope,
};
