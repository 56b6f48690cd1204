//! The fleet coordinator: one facade over registry, dispatch, and records
//!
//! Owns every live session for its whole lifetime; teardown is explicit
//! and synchronous (`shutdown`), never left to drop order.

use std::sync::Mutex;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

use hmdfleet_core::prelude::*;
use hmdfleet_core::types::{
    BulkCommand, BulkReport, ConnectionRecord, ConnectionState, Credentials, Outcome, Scope,
};
use hmdfleet_core::FleetEvent;
use hmdfleet_device::{resolve_credentials, ConnectOptions, DeviceConnector, DeviceSession};

use crate::apps::CommonApps;
use crate::config::Settings;
use crate::dispatch::{resolve_scope, run_on};
use crate::notify::{EventBus, SubscriptionId};
use crate::reconnect::ReconnectGate;
use crate::registry::FleetRegistry;
use crate::store::ConnectionStore;

/// Coordinates a fleet of headset sessions behind one connector
pub struct FleetCoordinator<T: DeviceConnector> {
    connector: T,
    registry: FleetRegistry<T::Client>,
    store: ConnectionStore,
    settings: Mutex<Settings>,
    common: Mutex<CommonApps>,
    bus: EventBus,
    gate: ReconnectGate,
}

impl<T: DeviceConnector> FleetCoordinator<T> {
    pub fn new(connector: T, store: ConnectionStore, settings: Settings) -> Self {
        Self {
            connector,
            registry: FleetRegistry::new(),
            store,
            settings: Mutex::new(settings),
            common: Mutex::new(CommonApps::new()),
            bus: EventBus::new(),
            gate: ReconnectGate::new(),
        }
    }

    // ─────────────────────────────────────────────────────────
    // Observation
    // ─────────────────────────────────────────────────────────

    /// The live session registry (read access for callers/UIs)
    pub fn registry(&self) -> &FleetRegistry<T::Client> {
        &self.registry
    }

    /// Persisted connection records, independent of live sessions
    pub fn records(&self) -> Vec<ConnectionRecord> {
        self.store.load_all()
    }

    pub fn subscribe(&self) -> (SubscriptionId, UnboundedReceiver<FleetEvent>) {
        self.bus.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.bus.unsubscribe(id)
    }

    /// Apps installed on every connected device
    pub fn common_apps(&self) -> Vec<String> {
        self.common.lock().unwrap().apps().to_vec()
    }

    pub fn selected_app(&self) -> Option<String> {
        self.common.lock().unwrap().selected().map(str::to_string)
    }

    pub fn can_manage_apps(&self) -> bool {
        self.common.lock().unwrap().can_manage()
    }

    /// Pick a common app; `false` when it is not in the common set
    pub fn select_app(&self, app: &str) -> bool {
        let (selected, changed) = {
            let mut common = self.common.lock().unwrap();
            let before = common.selected().map(str::to_string);
            let selected = common.select(app);
            (selected, selected && before.as_deref() != Some(app))
        };
        if changed {
            self.bus.emit(FleetEvent::SelectedAppChanged {
                app: Some(app.to_string()),
            });
        }
        selected
    }

    // ─────────────────────────────────────────────────────────
    // Settings
    // ─────────────────────────────────────────────────────────

    pub fn settings(&self) -> Settings {
        self.settings.lock().unwrap().clone()
    }

    pub fn default_credentials(&self) -> Credentials {
        self.settings.lock().unwrap().default_credentials()
    }

    /// Replace the process-wide default credentials
    ///
    /// Never rewrites previously saved records; they resolve against the
    /// new defaults at their next connect.
    pub fn set_default_credentials(&self, username: &str, password: &str) {
        self.settings
            .lock()
            .unwrap()
            .set_default_credentials(username, password);
    }

    // ─────────────────────────────────────────────────────────
    // Connection lifecycle
    // ─────────────────────────────────────────────────────────

    /// Connect one device, optionally saving a connection record
    ///
    /// Empty credential fields are filled from the defaults. A saved
    /// record stores an empty password when the default was substituted,
    /// so the secret itself stays out of the store.
    pub async fn connect_one(
        &self,
        address: &str,
        username: &str,
        password: &str,
        save: bool,
    ) -> Result<()> {
        self.attempt_connect(address, username, password).await?;

        if save {
            self.store
                .upsert(ConnectionRecord::new(address, username, password))?;
            self.bus.emit(FleetEvent::RecordsChanged);
        }
        Ok(())
    }

    /// One connect attempt: resolve credentials, dial, register, reconcile
    async fn attempt_connect(
        &self,
        address: &str,
        username: &str,
        password: &str,
    ) -> std::result::Result<(), ConnectError> {
        if self.registry.has_healthy(address) {
            return Err(ConnectError::already_registered(address));
        }

        let (credentials, _substituted) =
            resolve_credentials(username, password, &self.default_credentials());
        let options = ConnectOptions {
            address: address.to_string(),
            credentials: credentials.clone(),
        };
        let connect_timeout = Duration::from_secs(self.settings().connect_timeout_secs);

        self.bus.emit(FleetEvent::ConnectionStateChanged {
            address: address.to_string(),
            state: ConnectionState::Connecting,
        });
        info!("Connecting to {}", address);

        let connected = match timeout(connect_timeout, self.connector.connect(&options)).await {
            Ok(result) => result,
            Err(_) => Err(ConnectError::unreachable("connect timed out")),
        };

        let client = match connected {
            Ok(client) => client,
            Err(e) => {
                warn!("Connect to {} failed: {}", address, e);
                self.bus.emit(FleetEvent::ConnectionStateChanged {
                    address: address.to_string(),
                    state: ConnectionState::Failed,
                });
                return Err(e);
            }
        };

        let session = DeviceSession::new(address, credentials, client);
        if let Err(e) = session.refresh_apps().await {
            warn!("Initial app listing for {} failed: {}", address, e);
        }

        self.registry.add(session)?;
        self.bus.emit(FleetEvent::RegistryChanged);
        self.bus.emit(FleetEvent::ConnectionStateChanged {
            address: address.to_string(),
            state: ConnectionState::Connected,
        });
        self.reconcile();
        Ok(())
    }

    /// Reconnect every saved device without a live session
    ///
    /// `startup` runs are gated to once per coordinator lifetime; explicit
    /// runs always proceed (and set the gate). Attempts run concurrently;
    /// the report follows record order.
    pub async fn reconnect_all(&self, startup: bool) -> BulkReport {
        if startup {
            if !self.gate.claim_startup() {
                debug!("Startup reconnect already ran, skipping");
                return BulkReport::default();
            }
        } else {
            self.gate.mark_explicit();
        }

        let pending: Vec<ConnectionRecord> = self
            .store
            .load_all()
            .into_iter()
            .filter(|record| !self.registry.has_healthy(&record.address))
            .collect();

        if pending.is_empty() {
            return BulkReport::default();
        }
        info!("Reconnecting {} saved devices", pending.len());

        let attempts = pending.iter().map(|record| async move {
            let outcome = match self
                .attempt_connect(&record.address, &record.username, &record.password)
                .await
            {
                Ok(()) => Outcome::Success,
                Err(e) => Outcome::Failure(e.to_string()),
            };
            (record.address.clone(), outcome)
        });

        let report = BulkReport::new(join_all(attempts).await);
        info!("Reconnect finished: {}", report.summary());
        report
    }

    /// Dispose and drop one session; its record (if any) survives
    pub fn disconnect(&self, address: &str) -> bool {
        if !self.registry.remove(address) {
            return false;
        }
        self.bus.emit(FleetEvent::RegistryChanged);
        self.bus.emit(FleetEvent::ConnectionStateChanged {
            address: address.to_string(),
            state: ConnectionState::Disconnected,
        });
        self.reconcile();
        true
    }

    /// Drop every session and delete every saved record
    ///
    /// This discards recovery data, so it only ever happens explicitly.
    pub fn forget_all(&self) -> Result<()> {
        self.registry.clear();
        self.bus.emit(FleetEvent::RegistryChanged);
        self.store.delete_all()?;
        self.bus.emit(FleetEvent::RecordsChanged);
        self.reconcile();
        Ok(())
    }

    /// Synchronous teardown: dispose all owned sessions
    ///
    /// Safe to call with bulk operations in flight; they report failures
    /// against the disposed sessions instead of hanging.
    pub fn shutdown(&self) {
        if self.registry.is_empty() {
            return;
        }
        info!("Shutting down fleet coordinator");
        self.registry.clear();
        self.bus.emit(FleetEvent::RegistryChanged);
        self.reconcile();
    }

    // ─────────────────────────────────────────────────────────
    // Bulk operations
    // ─────────────────────────────────────────────────────────

    /// Fan one verb out over a scope and aggregate the outcomes
    pub async fn run_bulk(&self, scope: Scope, command: BulkCommand) -> BulkReport {
        let targets = resolve_scope(&self.registry, scope);
        let report = run_on(&targets, &command).await;

        if command.mutates_apps() {
            self.reconcile();
        }
        report
    }

    /// Uninstall the currently selected common app across a scope
    ///
    /// Precondition failures surface before any device is contacted.
    pub async fn uninstall_selected_app(&self, scope: Scope) -> Result<BulkReport> {
        let selected = {
            let common = self.common.lock().unwrap();
            if !common.can_manage() {
                return Err(PreconditionError::NoCommonApps.into());
            }
            common
                .selected()
                .map(str::to_string)
                .ok_or(PreconditionError::EmptySelection)?
        };

        Ok(self
            .run_bulk(scope, BulkCommand::UninstallApp(selected))
            .await)
    }

    // ─────────────────────────────────────────────────────────
    // Derived state
    // ─────────────────────────────────────────────────────────

    /// Recompute the common-app set from connected sessions and notify
    fn reconcile(&self) {
        let installed: Vec<Vec<String>> = self
            .registry
            .connected()
            .iter()
            .map(|session| session.installed_apps())
            .collect();

        let (delta, apps, selected) = {
            let mut common = self.common.lock().unwrap();
            let delta = common.recompute(&installed);
            (
                delta,
                common.apps().to_vec(),
                common.selected().map(str::to_string),
            )
        };

        if delta.apps_changed {
            self.bus.emit(FleetEvent::CommonAppsChanged { apps });
        }
        if delta.selection_changed {
            self.bus.emit(FleetEvent::SelectedAppChanged { app: selected });
        }
    }
}

impl<T: DeviceConnector> std::fmt::Debug for FleetCoordinator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetCoordinator")
            .field("sessions", &self.registry.len())
            .field("records", &self.store.path())
            .field("has_reconnected", &self.gate.has_reconnected())
            .finish()
    }
}
