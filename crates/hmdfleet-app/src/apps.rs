//! Reconciles the set of apps installed on every connected device

/// Which derived values a recompute actually changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileDelta {
    pub apps_changed: bool,
    pub selection_changed: bool,
}

/// Derived common-app state: the intersection and the current pick
///
/// Never persisted; recomputed whenever registry membership or any
/// session's installed-app snapshot changes.
#[derive(Debug, Default)]
pub struct CommonApps {
    apps: Vec<String>,
    selected: Option<String>,
}

impl CommonApps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apps installed on every connected device, in first-seen order
    pub fn apps(&self) -> &[String] {
        &self.apps
    }

    /// The user's current pick among the common apps
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// App management requires at least one app common to the whole fleet
    pub fn can_manage(&self) -> bool {
        !self.apps.is_empty()
    }

    /// Recompute from the installed-app snapshots of connected sessions
    ///
    /// The intersection keeps the first device's ordering. The previous
    /// selection survives if still common; otherwise it falls back to the
    /// first entry, or clears when the intersection is empty.
    pub fn recompute(&mut self, installed: &[Vec<String>]) -> ReconcileDelta {
        let apps = intersect(installed);

        let selected = match &self.selected {
            Some(current) if apps.contains(current) => Some(current.clone()),
            _ => apps.first().cloned(),
        };

        let delta = ReconcileDelta {
            apps_changed: apps != self.apps,
            selection_changed: selected != self.selected,
        };

        self.apps = apps;
        self.selected = selected;
        delta
    }

    /// Pick a specific common app; `false` when it is not common
    pub fn select(&mut self, app: &str) -> bool {
        if self.apps.iter().any(|a| a == app) {
            self.selected = Some(app.to_string());
            true
        } else {
            false
        }
    }
}

/// Intersection of app sets, ordered by first appearance in the first set
fn intersect(installed: &[Vec<String>]) -> Vec<String> {
    let Some((first, rest)) = installed.split_first() else {
        return Vec::new();
    };

    first
        .iter()
        .filter(|app| rest.iter().all(|set| set.contains(app)))
        .cloned()
        .collect()
}
