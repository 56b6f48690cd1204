//! Manages the set of registered device sessions

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use hmdfleet_core::prelude::*;
use hmdfleet_core::types::ConnectionState;
use hmdfleet_device::{DeviceClient, DeviceSession};

#[derive(Debug)]
struct RegistryInner<C> {
    /// All sessions indexed by address
    sessions: HashMap<String, Arc<DeviceSession<C>>>,

    /// Insertion order of addresses (meaningful for display and reports)
    order: Vec<String>,
}

/// The in-memory ordered set of registered device sessions
///
/// All mutation happens under one short-lived lock, so concurrent bulk
/// completions can call back into the registry safely. Snapshots hand out
/// `Arc`s; a snapshot taken before a mutation stays intact.
#[derive(Debug)]
pub struct FleetRegistry<C> {
    inner: Mutex<RegistryInner<C>>,
}

impl<C: DeviceClient> Default for FleetRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: DeviceClient> FleetRegistry<C> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                sessions: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }

    /// Register a session under its address
    ///
    /// A healthy existing entry wins: the call fails with
    /// `AlreadyRegistered`. A dead entry (Disconnected/Failed) is disposed
    /// and replaced in place, keeping its position in the display order.
    pub fn add(
        &self,
        session: DeviceSession<C>,
    ) -> std::result::Result<Arc<DeviceSession<C>>, ConnectError> {
        let address = session.address().to_string();
        let mut inner = self.inner.lock().unwrap();

        if let Some(existing) = inner.sessions.get(&address) {
            if existing.connection_state().is_healthy() {
                // The offered session loses; tear its transport down
                session.dispose();
                return Err(ConnectError::already_registered(&address));
            }
            debug!("Replacing dead session for {}", address);
            existing.dispose();
        }

        let session = Arc::new(session);
        if inner.sessions.insert(address.clone(), session.clone()).is_none() {
            inner.order.push(address);
        }
        Ok(session)
    }

    /// Dispose and remove the session for `address`; no-op when absent
    pub fn remove(&self, address: &str) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner.sessions.remove(address) {
            Some(session) => {
                inner.order.retain(|a| a != address);
                session.dispose();
                true
            }
            None => false,
        }
    }

    /// Get a session by address
    pub fn get(&self, address: &str) -> Option<Arc<DeviceSession<C>>> {
        self.inner.lock().unwrap().sessions.get(address).cloned()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.inner.lock().unwrap().sessions.contains_key(address)
    }

    /// Whether a healthy session holds this address
    pub fn has_healthy(&self, address: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .sessions
            .get(address)
            .map(|s| s.connection_state().is_healthy())
            .unwrap_or(false)
    }

    /// Immutable copy of the member list, in insertion order
    pub fn snapshot(&self) -> Vec<Arc<DeviceSession<C>>> {
        let inner = self.inner.lock().unwrap();
        inner
            .order
            .iter()
            .filter_map(|address| inner.sessions.get(address).cloned())
            .collect()
    }

    /// Snapshot filtered to sessions flagged as selected
    pub fn selected(&self) -> Vec<Arc<DeviceSession<C>>> {
        self.snapshot()
            .into_iter()
            .filter(|s| s.is_selected())
            .collect()
    }

    /// Snapshot filtered to connected sessions
    pub fn connected(&self) -> Vec<Arc<DeviceSession<C>>> {
        self.snapshot()
            .into_iter()
            .filter(|s| s.connection_state() == ConnectionState::Connected)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().sessions.is_empty()
    }

    /// Dispose every session and empty the registry
    ///
    /// Idempotent; never waits for in-flight operations, which report
    /// their own failures against the disposed sessions.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        for session in inner.sessions.values() {
            session.dispose();
        }
        inner.sessions.clear();
        inner.order.clear();
    }
}
