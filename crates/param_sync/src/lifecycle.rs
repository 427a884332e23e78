//! Start/enable/disable sequencing for one sync edge.
//!
//! Activation happens on the first of {start while enabled, enable after
//! start}; disable after start deactivates. Enable before start does
//! nothing, and start while disabled does nothing until a later enable.

/// What the host should do to the edge after a lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    Activate,
    Deactivate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleBinder {
    did_start: bool,
    enabled: bool,
}

impl Default for LifecycleBinder {
    fn default() -> Self {
        Self::new(true)
    }
}

impl LifecycleBinder {
    pub fn new(enabled: bool) -> Self {
        Self {
            did_start: false,
            enabled,
        }
    }

    /// One-time start; repeated calls are no-ops
    pub fn start(&mut self) -> Option<LifecycleAction> {
        if self.did_start {
            return None;
        }
        self.did_start = true;
        self.enabled.then_some(LifecycleAction::Activate)
    }

    pub fn enable(&mut self) -> Option<LifecycleAction> {
        if self.enabled {
            return None;
        }
        self.enabled = true;
        self.did_start.then_some(LifecycleAction::Activate)
    }

    pub fn disable(&mut self) -> Option<LifecycleAction> {
        if !self.enabled {
            return None;
        }
        self.enabled = false;
        self.did_start.then_some(LifecycleAction::Deactivate)
    }

    #[inline]
    pub fn is_started(&self) -> bool {
        self.did_start
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Started and enabled
    #[inline]
    pub fn is_live(&self) -> bool {
        self.did_start && self.enabled
    }
}
