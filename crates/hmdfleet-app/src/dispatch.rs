//! Concurrent fan-out of bulk operations across session snapshots

use std::sync::Arc;

use futures_util::future::join_all;

use hmdfleet_core::prelude::*;
use hmdfleet_core::types::{BulkCommand, BulkReport, Outcome, Scope};
use hmdfleet_device::{DeviceClient, DeviceSession};

use crate::registry::FleetRegistry;

/// Resolve a scope against the registry into a snapshot of targets
pub fn resolve_scope<C: DeviceClient>(
    registry: &FleetRegistry<C>,
    scope: Scope,
) -> Vec<Arc<DeviceSession<C>>> {
    match scope {
        Scope::All => registry.snapshot(),
        Scope::Selected => registry.selected(),
    }
}

/// Run one verb against every target concurrently and aggregate outcomes
///
/// Every per-device invocation runs independently; one failing device
/// never aborts the others, and every failure comes back as data. The
/// only suspension point is the join over the whole batch. Outcomes keep
/// the snapshot order regardless of completion order.
pub async fn run_on<C: DeviceClient>(
    targets: &[Arc<DeviceSession<C>>],
    command: &BulkCommand,
) -> BulkReport {
    if targets.is_empty() {
        return BulkReport::default();
    }

    debug!("Dispatching {} to {} devices", command.name(), targets.len());

    let invocations = targets.iter().map(|session| {
        let session = session.clone();
        async move {
            let outcome = match session.apply(command).await {
                Ok(()) => Outcome::Success,
                Err(e) => Outcome::Failure(e.to_string()),
            };
            (session.address().to_string(), outcome)
        }
    });

    let outcomes = join_all(invocations).await;
    let report = BulkReport::new(outcomes);

    info!(
        "Bulk {} finished: {}",
        command.name(),
        report.summary()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use hmdfleet_core::types::Credentials;
    use hmdfleet_core::OpError;
    use hmdfleet_device::test_utils::FakeClient;
    use std::time::Duration;

    fn registry_with(addresses: &[&str]) -> FleetRegistry<FakeClient> {
        let registry = FleetRegistry::new();
        for address in addresses {
            registry
                .add(DeviceSession::new(
                    *address,
                    Credentials::new("admin", "secret"),
                    FakeClient::default(),
                ))
                .unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn test_reboot_all_succeeds() {
        let registry = registry_with(&["d1", "d2", "d3"]);

        let targets = resolve_scope(&registry, Scope::All);
        let report = run_on(&targets, &BulkCommand::Reboot).await;

        assert_eq!(report.len(), 3);
        assert!(report.fully_succeeded());
    }

    #[tokio::test]
    async fn test_one_timeout_among_three() {
        let registry = registry_with(&["d1", "d2", "d3"]);
        registry
            .get("d2")
            .unwrap()
            .client()
            .fail_on("reboot", OpError::Timeout);

        let targets = resolve_scope(&registry, Scope::All);
        let report = run_on(&targets, &BulkCommand::Reboot).await;

        assert_eq!(report.get("d1"), Some(&Outcome::Success));
        assert_eq!(
            report.get("d2"),
            Some(&Outcome::Failure("Operation timed out".to_string()))
        );
        assert_eq!(report.get("d3"), Some(&Outcome::Success));
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn test_report_order_ignores_completion_order() {
        let registry = FleetRegistry::new();
        // First session is slow, second fast: completion order is d2, d1
        registry
            .add(DeviceSession::new(
                "d1",
                Credentials::default(),
                FakeClient::default().with_delay(Duration::from_millis(50)),
            ))
            .unwrap();
        registry
            .add(DeviceSession::new(
                "d2",
                Credentials::default(),
                FakeClient::default(),
            ))
            .unwrap();

        let targets = resolve_scope(&registry, Scope::All);
        let report = run_on(&targets, &BulkCommand::StartRecording).await;

        let addresses: Vec<_> = report
            .outcomes()
            .iter()
            .map(|(a, _)| a.as_str())
            .collect();
        assert_eq!(addresses, vec!["d1", "d2"]);
    }

    #[tokio::test]
    async fn test_selected_scope_with_no_selection_is_empty_report() {
        let registry = registry_with(&["d1", "d2"]);

        let targets = resolve_scope(&registry, Scope::Selected);
        let report = run_on(&targets, &BulkCommand::Shutdown).await;

        assert!(report.is_empty());
        assert!(report.fully_succeeded());
    }

    #[tokio::test]
    async fn test_selected_scope_targets_only_selected() {
        let registry = registry_with(&["d1", "d2", "d3"]);
        registry.get("d2").unwrap().set_selected(true);

        let targets = resolve_scope(&registry, Scope::Selected);
        let report = run_on(&targets, &BulkCommand::Shutdown).await;

        assert_eq!(report.len(), 1);
        assert_eq!(report.get("d2"), Some(&Outcome::Success));
        assert!(registry.get("d1").unwrap().client().calls().is_empty());
    }

    #[tokio::test]
    async fn test_dispose_during_flight_reports_failure() {
        let registry = FleetRegistry::new();
        let session = registry
            .add(DeviceSession::new(
                "d1",
                Credentials::default(),
                FakeClient::default().with_delay(Duration::from_millis(30)),
            ))
            .unwrap();

        let targets = resolve_scope(&registry, Scope::All);
        let dispatch = tokio::spawn({
            let targets = targets.clone();
            async move { run_on(&targets, &BulkCommand::Reboot).await }
        });

        // Tear the registry down while the operation is in flight
        tokio::time::sleep(Duration::from_millis(5)).await;
        registry.clear();
        assert!(session.is_disposed());

        // The in-flight operation completes with a failure, never hangs
        let report = dispatch.await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn test_refresh_apps_updates_snapshots() {
        let registry = FleetRegistry::new();
        registry
            .add(DeviceSession::new(
                "d1",
                Credentials::default(),
                FakeClient::with_apps(&["com.example.alpha"]),
            ))
            .unwrap();

        let targets = resolve_scope(&registry, Scope::All);
        let report = run_on(&targets, &BulkCommand::RefreshApps).await;

        assert!(report.fully_succeeded());
        assert_eq!(
            registry.get("d1").unwrap().installed_apps(),
            vec!["com.example.alpha"]
        );
    }
}
