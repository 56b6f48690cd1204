//! Device transport boundary
//!
//! The coordinator never speaks the management protocol itself; it drives
//! a [`DeviceClient`] per device and a [`DeviceConnector`] to open new
//! sessions. The wire protocol behind these traits is a transport concern.

use std::path::Path;

use hmdfleet_core::types::Credentials;
use hmdfleet_core::{ConnectError, OpError};

/// One authenticated connection to a device
///
/// Every operation may fail independently; failures are returned as
/// [`OpError`] and never panic. A disposed client reports `Unreachable`
/// for any further operation rather than hanging.
#[trait_variant::make(DeviceClient: Send)]
pub trait LocalDeviceClient {
    async fn reboot(&self) -> Result<(), OpError>;

    async fn shutdown(&self) -> Result<(), OpError>;

    /// Push and install an application package
    async fn install_app(&self, payload: &Path) -> Result<(), OpError>;

    /// Uninstall an application by package name
    async fn uninstall_app(&self, package: &str) -> Result<(), OpError>;

    /// List installed application package names, in device order
    async fn list_installed_apps(&self) -> Result<Vec<String>, OpError>;

    async fn start_recording(&self) -> Result<(), OpError>;

    async fn stop_recording(&self) -> Result<(), OpError>;

    /// Pull captured recordings into a local folder
    async fn save_recorded_files(&self, destination: &Path) -> Result<(), OpError>;

    /// Tear down the underlying transport; must be idempotent
    fn dispose(&self);
}

/// Factory for opening device sessions
#[trait_variant::make(DeviceConnector: Send)]
pub trait LocalDeviceConnector {
    type Client: DeviceClient;

    async fn connect(&self, options: &ConnectOptions) -> Result<Self::Client, ConnectError>;
}

/// Parameters for opening one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectOptions {
    pub address: String,
    pub credentials: Credentials,
}

impl ConnectOptions {
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            credentials: Credentials::new(username, password),
        }
    }
}

/// Resolve the credentials to use for a connect attempt
///
/// Empty fields are filled from the process-wide defaults. Returns the
/// effective credentials and whether the default password was substituted;
/// callers that persist connection records store an empty password in that
/// case so the default secret never lands on disk verbatim.
pub fn resolve_credentials(
    username: &str,
    password: &str,
    defaults: &Credentials,
) -> (Credentials, bool) {
    let substituted = password.is_empty();

    let username = if username.is_empty() {
        defaults.username.clone()
    } else {
        username.to_string()
    };
    let password = if substituted {
        defaults.password.clone()
    } else {
        password.to_string()
    };

    (Credentials { username, password }, substituted)
}
