//! Test doubles for the device transport boundary
//!
//! `FakeClient` and `FakeConnector` let coordinator tests script per-verb
//! failures, per-address refusals, and artificial latency without any real
//! transport. Enabled for unit tests and via the `test-helpers` feature.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use hmdfleet_core::{ConnectError, OpError};

use crate::client::{ConnectOptions, DeviceClient, DeviceConnector};

#[derive(Debug, Default)]
struct FakeClientInner {
    apps: Vec<String>,
    calls: Vec<String>,
    failures: HashMap<String, OpError>,
    disposed: bool,
    dispose_count: usize,
}

/// Scriptable in-memory device client
#[derive(Debug, Default)]
pub struct FakeClient {
    inner: Mutex<FakeClientInner>,
    delay: Option<Duration>,
}

impl FakeClient {
    /// Client whose device has the given apps installed
    pub fn with_apps(apps: &[&str]) -> Self {
        Self {
            inner: Mutex::new(FakeClientInner {
                apps: apps.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }),
            delay: None,
        }
    }

    /// Add artificial latency before every operation
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Script a failure for every future invocation of `verb`
    pub fn fail_on(&self, verb: &str, error: OpError) {
        self.inner
            .lock()
            .unwrap()
            .failures
            .insert(verb.to_string(), error);
    }

    /// Verbs invoked so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn dispose_count(&self) -> usize {
        self.inner.lock().unwrap().dispose_count
    }

    /// Record the call and apply any scripted failure
    async fn op(&self, verb: &str) -> Result<(), OpError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(verb.to_string());

        if inner.disposed {
            return Err(OpError::unreachable("client disposed"));
        }
        if let Some(error) = inner.failures.get(verb) {
            return Err(error.clone());
        }
        Ok(())
    }
}

impl DeviceClient for FakeClient {
    async fn reboot(&self) -> Result<(), OpError> {
        self.op("reboot").await
    }

    async fn shutdown(&self) -> Result<(), OpError> {
        self.op("shutdown").await
    }

    async fn install_app(&self, payload: &Path) -> Result<(), OpError> {
        self.op("install-app").await?;

        // Derive a package name from the payload file stem
        let package = payload
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let mut inner = self.inner.lock().unwrap();
        if !inner.apps.contains(&package) {
            inner.apps.push(package);
        }
        Ok(())
    }

    async fn uninstall_app(&self, package: &str) -> Result<(), OpError> {
        self.op("uninstall-app").await?;
        self.inner.lock().unwrap().apps.retain(|app| app != package);
        Ok(())
    }

    async fn list_installed_apps(&self) -> Result<Vec<String>, OpError> {
        self.op("list-apps").await?;
        Ok(self.inner.lock().unwrap().apps.clone())
    }

    async fn start_recording(&self) -> Result<(), OpError> {
        self.op("start-recording").await
    }

    async fn stop_recording(&self) -> Result<(), OpError> {
        self.op("stop-recording").await
    }

    async fn save_recorded_files(&self, _destination: &Path) -> Result<(), OpError> {
        self.op("save-recorded-files").await
    }

    fn dispose(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.disposed = true;
        inner.dispose_count += 1;
    }
}

#[derive(Debug, Default)]
struct FakeConnectorInner {
    attempts: Vec<ConnectOptions>,
}

/// Scriptable connector: per-address app inventories and refusals
#[derive(Debug, Default)]
pub struct FakeConnector {
    inner: Mutex<FakeConnectorInner>,
    apps_by_address: HashMap<String, Vec<String>>,
    refusals: HashMap<String, ConnectError>,
    required_password: Option<String>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a reachable device and the apps installed on it
    pub fn with_device(mut self, address: &str, apps: &[&str]) -> Self {
        self.apps_by_address.insert(
            address.to_string(),
            apps.iter().map(|s| s.to_string()).collect(),
        );
        self
    }

    /// Refuse connects to `address` with the given error
    pub fn refuse(mut self, address: &str, error: ConnectError) -> Self {
        self.refusals.insert(address.to_string(), error);
        self
    }

    /// Reject any connect whose password differs from `password`
    pub fn require_password(mut self, password: &str) -> Self {
        self.required_password = Some(password.to_string());
        self
    }

    /// Connect attempts observed so far, in order
    pub fn attempts(&self) -> Vec<ConnectOptions> {
        self.inner.lock().unwrap().attempts.clone()
    }
}

impl DeviceConnector for FakeConnector {
    type Client = FakeClient;

    async fn connect(&self, options: &ConnectOptions) -> Result<FakeClient, ConnectError> {
        self.inner.lock().unwrap().attempts.push(options.clone());

        if options.address.trim().is_empty() {
            return Err(ConnectError::invalid_address(&options.address));
        }
        if let Some(error) = self.refusals.get(&options.address) {
            return Err(error.clone());
        }
        if let Some(required) = &self.required_password {
            if &options.credentials.password != required {
                return Err(ConnectError::AuthFailure);
            }
        }

        let apps: Vec<&str> = self
            .apps_by_address
            .get(&options.address)
            .map(|apps| apps.iter().map(String::as_str).collect())
            .unwrap_or_default();

        Ok(FakeClient::with_apps(&apps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_client_records_calls() {
        let client = FakeClient::with_apps(&["com.example.alpha"]);

        client.reboot().await.unwrap();
        let apps = client.list_installed_apps().await.unwrap();

        assert_eq!(apps, vec!["com.example.alpha"]);
        assert_eq!(client.calls(), vec!["reboot", "list-apps"]);
    }

    #[tokio::test]
    async fn test_fake_client_scripted_failure() {
        let client = FakeClient::default();
        client.fail_on("shutdown", OpError::DeviceBusy);

        assert_eq!(client.shutdown().await, Err(OpError::DeviceBusy));
        assert!(client.reboot().await.is_ok());
    }

    #[tokio::test]
    async fn test_fake_client_install_uninstall() {
        let client = FakeClient::default();

        client.install_app(Path::new("/tmp/beta.apk")).await.unwrap();
        assert_eq!(client.list_installed_apps().await.unwrap(), vec!["beta"]);

        client.uninstall_app("beta").await.unwrap();
        assert!(client.list_installed_apps().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fake_connector_refusal_and_auth() {
        let connector = FakeConnector::new()
            .with_device("10.0.0.1:5555", &["com.example.alpha"])
            .refuse("10.0.0.9:5555", ConnectError::unreachable("no route"))
            .require_password("secret");

        let ok = connector
            .connect(&ConnectOptions::new("10.0.0.1:5555", "admin", "secret"))
            .await;
        assert!(ok.is_ok());

        let refused = connector
            .connect(&ConnectOptions::new("10.0.0.9:5555", "admin", "secret"))
            .await;
        assert!(matches!(refused, Err(ConnectError::Unreachable { .. })));

        let bad_auth = connector
            .connect(&ConnectOptions::new("10.0.0.1:5555", "admin", "wrong"))
            .await;
        assert_eq!(bad_auth.unwrap_err(), ConnectError::AuthFailure);

        assert_eq!(connector.attempts().len(), 3);
    }

    #[tokio::test]
    async fn test_fake_connector_empty_address() {
        let connector = FakeConnector::new();
        let result = connector
            .connect(&ConnectOptions::new("", "admin", "secret"))
            .await;
        assert!(matches!(result, Err(ConnectError::InvalidAddress { .. })));
    }
}
