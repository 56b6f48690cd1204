//! A registered device session and its observable state

use std::sync::Mutex;

use hmdfleet_core::prelude::*;
use hmdfleet_core::types::{BulkCommand, ConnectionState, Credentials};

use crate::client::DeviceClient;

/// Mutable session state behind the session's own lock
///
/// Critical sections are short; no guard is ever held across an await.
#[derive(Debug)]
struct SessionState {
    connection: ConnectionState,
    selected: bool,
    installed_apps: Vec<String>,
    disposed: bool,
}

/// One registered device: transport client plus last known state
///
/// Owned by the fleet registry through an `Arc`, so a snapshot taken for a
/// bulk operation stays valid while the registry is mutated underneath it.
#[derive(Debug)]
pub struct DeviceSession<C> {
    address: String,
    credentials: Credentials,
    client: C,
    state: Mutex<SessionState>,
}

impl<C> DeviceSession<C> {
    /// Wrap a freshly connected client
    pub fn new(address: impl Into<String>, credentials: Credentials, client: C) -> Self {
        Self {
            address: address.into(),
            credentials,
            client,
            state: Mutex::new(SessionState {
                connection: ConnectionState::Connected,
                selected: false,
                installed_apps: Vec::new(),
                disposed: false,
            }),
        }
    }

    /// Unique key within the registry
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Credentials the session was opened with
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.lock().unwrap().connection
    }

    pub fn set_connection_state(&self, connection: ConnectionState) {
        self.state.lock().unwrap().connection = connection;
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state() == ConnectionState::Connected
    }

    /// Whether this session participates in `Scope::Selected` operations
    pub fn is_selected(&self) -> bool {
        self.state.lock().unwrap().selected
    }

    pub fn set_selected(&self, selected: bool) {
        self.state.lock().unwrap().selected = selected;
    }

    /// Last known installed-app snapshot, refreshed on demand
    pub fn installed_apps(&self) -> Vec<String> {
        self.state.lock().unwrap().installed_apps.clone()
    }

    pub fn set_installed_apps(&self, apps: Vec<String>) {
        self.state.lock().unwrap().installed_apps = apps;
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().unwrap().disposed
    }
}

impl<C: DeviceClient> DeviceSession<C> {
    /// Access the underlying transport client
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run one bulk verb against this device
    ///
    /// Install/uninstall re-list the installed apps afterwards so the
    /// snapshot the reconciler reads reflects the mutation.
    pub async fn apply(&self, command: &BulkCommand) -> std::result::Result<(), OpError> {
        if self.is_disposed() {
            return Err(OpError::unreachable("session disposed"));
        }

        match command {
            BulkCommand::Reboot => self.client.reboot().await,
            BulkCommand::Shutdown => self.client.shutdown().await,
            BulkCommand::InstallApp(payload) => {
                self.client.install_app(payload).await?;
                self.refresh_apps().await
            }
            BulkCommand::UninstallApp(package) => {
                self.client.uninstall_app(package).await?;
                self.refresh_apps().await
            }
            BulkCommand::StartRecording => self.client.start_recording().await,
            BulkCommand::StopRecording => self.client.stop_recording().await,
            BulkCommand::SaveRecordedFiles(destination) => {
                self.client.save_recorded_files(destination).await
            }
            BulkCommand::RefreshApps => self.refresh_apps().await,
        }
    }

    /// Re-list installed apps and update the snapshot
    pub async fn refresh_apps(&self) -> std::result::Result<(), OpError> {
        let apps = self.client.list_installed_apps().await?;
        self.state.lock().unwrap().installed_apps = apps;
        Ok(())
    }

    /// Tear down the transport and mark the session dead
    ///
    /// Idempotent. An operation already in flight on the old client reports
    /// a failure on completion; it is never left hanging.
    pub fn dispose(&self) {
        let mut state = self.state.lock().unwrap();
        if state.disposed {
            return;
        }
        state.disposed = true;
        state.connection = ConnectionState::Disconnected;
        drop(state);

        debug!("Disposing session for {}", self.address);
        self.client.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeClient;

    fn test_session(apps: &[&str]) -> DeviceSession<FakeClient> {
        DeviceSession::new(
            "10.0.0.2:5555",
            Credentials::new("admin", "secret"),
            FakeClient::with_apps(apps),
        )
    }

    #[test]
    fn test_new_session_is_connected_and_unselected() {
        let session = test_session(&[]);
        assert_eq!(session.connection_state(), ConnectionState::Connected);
        assert!(!session.is_selected());
        assert!(session.installed_apps().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_apps_updates_snapshot() {
        let session = test_session(&["com.example.alpha", "com.example.beta"]);

        session.refresh_apps().await.unwrap();

        assert_eq!(
            session.installed_apps(),
            vec!["com.example.alpha", "com.example.beta"]
        );
    }

    #[tokio::test]
    async fn test_install_refreshes_snapshot() {
        let session = test_session(&["com.example.alpha"]);
        session.refresh_apps().await.unwrap();

        session
            .apply(&BulkCommand::InstallApp("gamma.apk".into()))
            .await
            .unwrap();

        assert!(session
            .installed_apps()
            .iter()
            .any(|app| app.contains("gamma")));
    }

    #[tokio::test]
    async fn test_apply_after_dispose_fails() {
        let session = test_session(&[]);
        session.dispose();

        let result = session.apply(&BulkCommand::Reboot).await;

        assert!(matches!(result, Err(OpError::Unreachable { .. })));
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let session = test_session(&[]);
        session.dispose();
        session.dispose();
        assert!(session.is_disposed());
        assert_eq!(session.client().dispose_count(), 1);
    }

    #[tokio::test]
    async fn test_scripted_failure_surfaces() {
        let session = test_session(&[]);
        session.client().fail_on("reboot", OpError::Timeout);

        let result = session.apply(&BulkCommand::Reboot).await;

        assert_eq!(result, Err(OpError::Timeout));
    }
}
