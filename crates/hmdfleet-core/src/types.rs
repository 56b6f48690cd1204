//! Domain types shared across all fleet coordinator crates

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────
// Connection State
// ─────────────────────────────────────────────────────────

/// Lifecycle state of a device session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Failed,
}

impl ConnectionState {
    /// A healthy session blocks re-registration of its address
    pub fn is_healthy(&self) -> bool {
        matches!(self, ConnectionState::Connecting | ConnectionState::Connected)
    }

    /// Short label for display and logs
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Failed => "failed",
        }
    }
}

// ─────────────────────────────────────────────────────────
// Credentials and Connection Records
// ─────────────────────────────────────────────────────────

/// Username/password pair used when opening a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Persisted pointer to a device we should reconnect to at startup
///
/// An empty password means "substitute the default credentials at connect
/// time"; the default secret itself is never written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionRecord {
    pub address: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,
}

impl ConnectionRecord {
    pub fn new(
        address: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Whether connecting from this record requires the default credentials
    pub fn uses_default_credentials(&self) -> bool {
        self.password.is_empty()
    }
}

// ─────────────────────────────────────────────────────────
// Bulk Operations
// ─────────────────────────────────────────────────────────

/// Which registered sessions a bulk operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every registered session
    All,
    /// Only sessions flagged as selected; zero selected is a valid no-op
    Selected,
}

/// A verb applied concurrently across a scope of sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkCommand {
    Reboot,
    Shutdown,
    InstallApp(PathBuf),
    UninstallApp(String),
    StartRecording,
    StopRecording,
    SaveRecordedFiles(PathBuf),
    RefreshApps,
}

impl BulkCommand {
    /// Verb name for logs and reports
    pub fn name(&self) -> &'static str {
        match self {
            BulkCommand::Reboot => "reboot",
            BulkCommand::Shutdown => "shutdown",
            BulkCommand::InstallApp(_) => "install-app",
            BulkCommand::UninstallApp(_) => "uninstall-app",
            BulkCommand::StartRecording => "start-recording",
            BulkCommand::StopRecording => "stop-recording",
            BulkCommand::SaveRecordedFiles(_) => "save-recorded-files",
            BulkCommand::RefreshApps => "refresh-apps",
        }
    }

    /// Whether completing this verb can change any installed-app snapshot
    pub fn mutates_apps(&self) -> bool {
        matches!(
            self,
            BulkCommand::InstallApp(_) | BulkCommand::UninstallApp(_) | BulkCommand::RefreshApps
        )
    }
}

/// Per-device result of one bulk invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// The failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Success => None,
            Outcome::Failure(reason) => Some(reason),
        }
    }
}

/// Aggregated result of a bulk operation
///
/// Outcomes are keyed by device address and ordered by the registry
/// snapshot the operation ran against, not by completion order, so a fixed
/// registry state always yields the same report shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkReport {
    outcomes: Vec<(String, Outcome)>,
}

impl BulkReport {
    pub fn new(outcomes: Vec<(String, Outcome)>) -> Self {
        Self { outcomes }
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of devices that completed successfully
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_success()).count()
    }

    /// Number of devices that reported a failure
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Every device in the scope succeeded (vacuously true when empty)
    pub fn fully_succeeded(&self) -> bool {
        self.failed() == 0
    }

    /// Every device in the scope failed
    pub fn fully_failed(&self) -> bool {
        !self.is_empty() && self.succeeded() == 0
    }

    /// Outcome for a specific device address
    pub fn get(&self, address: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(addr, _)| addr == address)
            .map(|(_, o)| o)
    }

    /// All outcomes in snapshot order
    pub fn outcomes(&self) -> &[(String, Outcome)] {
        &self.outcomes
    }

    /// Failing addresses with their human-readable reasons
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|(addr, o)| {
            o.reason().map(|reason| (addr.as_str(), reason))
        })
    }

    /// One-line summary for display, e.g. "3 of 5 succeeded"
    pub fn summary(&self) -> String {
        format!("{} of {} succeeded", self.succeeded(), self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_is_healthy() {
        assert!(ConnectionState::Connecting.is_healthy());
        assert!(ConnectionState::Connected.is_healthy());
        assert!(!ConnectionState::Disconnected.is_healthy());
        assert!(!ConnectionState::Failed.is_healthy());
    }

    #[test]
    fn test_record_uses_default_credentials() {
        let record = ConnectionRecord::new("10.0.0.1", "admin", "");
        assert!(record.uses_default_credentials());

        let record = ConnectionRecord::new("10.0.0.1", "admin", "hunter2");
        assert!(!record.uses_default_credentials());
    }

    #[test]
    fn test_record_missing_fields_default_empty() {
        let record: ConnectionRecord =
            serde_json::from_str(r#"{"address": "192.168.1.20"}"#).unwrap();
        assert_eq!(record.address, "192.168.1.20");
        assert!(record.username.is_empty());
        assert!(record.uses_default_credentials());
    }

    #[test]
    fn test_bulk_command_names() {
        assert_eq!(BulkCommand::Reboot.name(), "reboot");
        assert_eq!(
            BulkCommand::InstallApp(PathBuf::from("/tmp/app.apk")).name(),
            "install-app"
        );
        assert_eq!(BulkCommand::RefreshApps.name(), "refresh-apps");
    }

    #[test]
    fn test_bulk_command_mutates_apps() {
        assert!(BulkCommand::RefreshApps.mutates_apps());
        assert!(BulkCommand::InstallApp(PathBuf::from("a.apk")).mutates_apps());
        assert!(BulkCommand::UninstallApp("com.example".into()).mutates_apps());
        assert!(!BulkCommand::Reboot.mutates_apps());
        assert!(!BulkCommand::StartRecording.mutates_apps());
    }

    #[test]
    fn test_bulk_report_counts() {
        let report = BulkReport::new(vec![
            ("d1".into(), Outcome::Success),
            ("d2".into(), Outcome::Failure("Operation timed out".into())),
            ("d3".into(), Outcome::Success),
        ]);

        assert_eq!(report.len(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.fully_succeeded());
        assert!(!report.fully_failed());
        assert_eq!(report.summary(), "2 of 3 succeeded");
    }

    #[test]
    fn test_bulk_report_get_and_failures() {
        let report = BulkReport::new(vec![
            ("d1".into(), Outcome::Success),
            ("d2".into(), Outcome::Failure("Device is busy".into())),
        ]);

        assert_eq!(report.get("d1"), Some(&Outcome::Success));
        assert!(report.get("d9").is_none());

        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures, vec![("d2", "Device is busy")]);
    }

    #[test]
    fn test_bulk_report_empty_is_full_success() {
        // Selected scope with zero selected sessions yields an empty report
        let report = BulkReport::default();
        assert!(report.is_empty());
        assert!(report.fully_succeeded());
        assert!(!report.fully_failed());
    }
}
