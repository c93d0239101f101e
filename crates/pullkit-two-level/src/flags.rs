//! Gate flags for the two-stage refresh.
//!
//! Two independent booleans, named instead of packed:
//!
//! - `disabled`: configuration-level switch; survives across gestures until
//!   the owner changes it.
//! - `triggered`: true only while a two-level refresh is in flight; the
//!   single source of truth for "is this completion two-level or ordinary".
//!
//! Disabling while triggered must also reset the running gesture; that
//! composition lives in the coordinator, which owns the collaborators a
//! reset has to reach.

use std::cell::Cell;

/// Named flag set gating the two-level refresh.
#[derive(Default)]
pub struct GateFlags {
    disabled: Cell<bool>,
    triggered: Cell<bool>,
}

impl GateFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether two-level refresh is disabled by configuration.
    pub fn is_disabled(&self) -> bool {
        self.disabled.get()
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
    }

    /// Whether a two-level refresh is currently in flight.
    pub fn is_triggered(&self) -> bool {
        self.triggered.get()
    }

    pub fn set_triggered(&self) {
        self.triggered.set(true);
    }

    pub fn clear_triggered(&self) {
        self.triggered.set(false);
    }

    /// Clears triggered and reports whether it had been set.
    pub fn take_triggered(&self) -> bool {
        self.triggered.replace(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_independent() {
        let flags = GateFlags::new();
        assert!(!flags.is_disabled());
        assert!(!flags.is_triggered());

        flags.set_triggered();
        flags.set_disabled(true);
        assert!(flags.is_disabled());
        assert!(flags.is_triggered());

        flags.set_disabled(false);
        assert!(flags.is_triggered());
    }

    #[test]
    fn take_triggered_clears_once() {
        let flags = GateFlags::new();
        flags.set_triggered();
        assert!(flags.take_triggered());
        assert!(!flags.take_triggered());
        assert!(!flags.is_triggered());
    }
}
