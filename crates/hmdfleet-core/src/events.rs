//! Change notification definitions
//!
//! The coordinator emits a typed event whenever observable state changes;
//! consumers re-render whatever the event names. Delivery thread is the
//! consumer's concern.

use crate::types::ConnectionState;

/// A change to coordinator state that consumers may want to react to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FleetEvent {
    /// A session was added to or removed from the registry
    RegistryChanged,

    /// A session's connection state moved
    ConnectionStateChanged {
        address: String,
        state: ConnectionState,
    },

    /// The set of apps installed on every connected device changed
    CommonAppsChanged { apps: Vec<String> },

    /// The currently selected common app changed
    SelectedAppChanged { app: Option<String> },

    /// The persisted connection records changed
    RecordsChanged,
}

impl FleetEvent {
    /// Get a human-readable summary
    pub fn summary(&self) -> String {
        match self {
            FleetEvent::RegistryChanged => "Registry changed".to_string(),
            FleetEvent::ConnectionStateChanged { address, state } => {
                format!("{} is {}", address, state.label())
            }
            FleetEvent::CommonAppsChanged { apps } => {
                format!("{} apps installed everywhere", apps.len())
            }
            FleetEvent::SelectedAppChanged { app } => match app {
                Some(app) => format!("Selected app: {}", app),
                None => "No app selected".to_string(),
            },
            FleetEvent::RecordsChanged => "Saved connections changed".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_summaries() {
        let event = FleetEvent::ConnectionStateChanged {
            address: "10.0.0.5".to_string(),
            state: ConnectionState::Connected,
        };
        assert_eq!(event.summary(), "10.0.0.5 is connected");

        let event = FleetEvent::SelectedAppChanged { app: None };
        assert_eq!(event.summary(), "No app selected");

        let event = FleetEvent::CommonAppsChanged {
            apps: vec!["a".into(), "b".into()],
        };
        assert!(event.summary().contains('2'));
    }
}
