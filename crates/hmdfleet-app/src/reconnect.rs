//! Reconnection bookkeeping: the one-shot startup gate

use std::sync::atomic::{AtomicBool, Ordering};

/// One-shot gate around the automatic startup reconnect
///
/// The startup path runs at most once per coordinator lifetime; explicit
/// user-driven reconnects bypass the gate (and set it, so a later startup
/// call stays a no-op). Both states are explicit rather than inferred
/// from timing.
#[derive(Debug, Default)]
pub struct ReconnectGate {
    has_reconnected: AtomicBool,
}

impl ReconnectGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the startup reconnect; `false` means it already ran
    pub fn claim_startup(&self) -> bool {
        !self.has_reconnected.swap(true, Ordering::SeqCst)
    }

    /// Record an explicit reconnect (always allowed)
    pub fn mark_explicit(&self) {
        self.has_reconnected.store(true, Ordering::SeqCst);
    }

    pub fn has_reconnected(&self) -> bool {
        self.has_reconnected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_claim_is_one_shot() {
        let gate = ReconnectGate::new();

        assert!(gate.claim_startup());
        assert!(!gate.claim_startup());
        assert!(gate.has_reconnected());
    }

    #[test]
    fn test_explicit_reconnect_sets_gate() {
        let gate = ReconnectGate::new();

        gate.mark_explicit();

        assert!(gate.has_reconnected());
        assert!(!gate.claim_startup());
    }

    #[test]
    fn test_explicit_allowed_after_startup() {
        let gate = ReconnectGate::new();
        assert!(gate.claim_startup());

        // Explicit requests are never gated; marking again is harmless
        gate.mark_explicit();
        assert!(gate.has_reconnected());
    }
}
