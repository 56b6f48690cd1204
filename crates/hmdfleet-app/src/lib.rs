//! hmdfleet-app - Fleet coordination and orchestration
//!
//! This crate ties the session registry, bulk dispatcher, common-apps
//! reconciler, reconnection manager, and persistence together behind the
//! [`FleetCoordinator`] facade. The device transport stays abstract: the
//! coordinator is generic over the `DeviceConnector` an embedding
//! application supplies.

pub mod apps;
pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod notify;
pub mod reconnect;
pub mod registry;
pub mod store;

// Re-export primary types
pub use apps::{CommonApps, ReconcileDelta};
pub use config::{config_dir, load_settings, save_settings, Settings};
pub use coordinator::FleetCoordinator;
pub use notify::{EventBus, SubscriptionId};
pub use reconnect::ReconnectGate;
pub use registry::FleetRegistry;
pub use store::ConnectionStore;
