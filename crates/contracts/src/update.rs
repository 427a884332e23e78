//! ParamUpdate / ParamSnapshotEntry
//!
//! Change-stream events and bootstrap snapshot entries.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{ParamName, ParamType, ParamValue};

/// Discriminant of a [`ParamUpdate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    Float,
    Int,
    Bool,
    TriggerSet,
    TriggerClear,
}

impl UpdateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateKind::Float => "float",
            UpdateKind::Int => "int",
            UpdateKind::Bool => "bool",
            UpdateKind::TriggerSet => "trigger_set",
            UpdateKind::TriggerClear => "trigger_clear",
        }
    }
}

/// One change broadcast by a store.
///
/// Emitted only when the stored value actually changed (unless the write
/// asked for `AlwaysNotify`) or when a trigger fires or clears.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamUpdate {
    Float { name: ParamName, value: f64 },
    Int { name: ParamName, value: i64 },
    Bool { name: ParamName, value: bool },
    TriggerSet { name: ParamName },
    TriggerClear { name: ParamName },
}

impl ParamUpdate {
    pub fn float(name: impl Into<ParamName>, value: f64) -> Self {
        Self::Float {
            name: name.into(),
            value,
        }
    }

    pub fn int(name: impl Into<ParamName>, value: i64) -> Self {
        Self::Int {
            name: name.into(),
            value,
        }
    }

    pub fn bool(name: impl Into<ParamName>, value: bool) -> Self {
        Self::Bool {
            name: name.into(),
            value,
        }
    }

    pub fn trigger_set(name: impl Into<ParamName>) -> Self {
        Self::TriggerSet { name: name.into() }
    }

    pub fn trigger_clear(name: impl Into<ParamName>) -> Self {
        Self::TriggerClear { name: name.into() }
    }

    /// Name of the parameter that changed
    pub fn name(&self) -> &ParamName {
        match self {
            ParamUpdate::Float { name, .. }
            | ParamUpdate::Int { name, .. }
            | ParamUpdate::Bool { name, .. }
            | ParamUpdate::TriggerSet { name }
            | ParamUpdate::TriggerClear { name } => name,
        }
    }

    pub fn kind(&self) -> UpdateKind {
        match self {
            ParamUpdate::Float { .. } => UpdateKind::Float,
            ParamUpdate::Int { .. } => UpdateKind::Int,
            ParamUpdate::Bool { .. } => UpdateKind::Bool,
            ParamUpdate::TriggerSet { .. } => UpdateKind::TriggerSet,
            ParamUpdate::TriggerClear { .. } => UpdateKind::TriggerClear,
        }
    }

    /// Carried value; trigger events carry none.
    pub fn value(&self) -> Option<ParamValue> {
        match self {
            ParamUpdate::Float { value, .. } => Some(ParamValue::Float(*value)),
            ParamUpdate::Int { value, .. } => Some(ParamValue::Int(*value)),
            ParamUpdate::Bool { value, .. } => Some(ParamValue::Bool(*value)),
            ParamUpdate::TriggerSet { .. } | ParamUpdate::TriggerClear { .. } => None,
        }
    }
}

impl fmt::Display for ParamUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(value) => write!(f, "{}({}={})", self.kind().as_str(), self.name(), value),
            None => write!(f, "{}({})", self.kind().as_str(), self.name()),
        }
    }
}

/// Steady-state view of one parameter, used only for bootstrap enumeration.
///
/// Unlike [`ParamUpdate`] it carries no transition: a trigger entry only
/// tells whether the trigger is currently set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSnapshotEntry {
    pub name: ParamName,
    pub param_type: ParamType,
    pub value: ParamValue,
}

impl ParamSnapshotEntry {
    pub fn new(name: impl Into<ParamName>, param_type: ParamType, value: ParamValue) -> Self {
        Self {
            name: name.into(),
            param_type,
            value,
        }
    }
}

impl fmt::Display for ParamSnapshotEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} = {}", self.name, self.param_type, self.value)
    }
}
