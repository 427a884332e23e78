//! ParameterStore trait - store boundary consumed by the sync engines
//!
//! Defines the abstract interface of a node-owned typed key-value store.

use serde::{Deserialize, Serialize};

use crate::{ContractError, ParamSnapshotEntry, ParamType, ParamUpdate};

/// Whether a write broadcasts when the value did not change
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    /// Broadcast on every write
    AlwaysNotify,
    /// Broadcast only if the stored value changed
    #[default]
    NotifyOnChange,
}

/// Whether a write may create the parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirePolicy {
    /// Fail with `MissingParam` if absent
    RequireExisting,
    /// Create the parameter with the written value if absent
    #[default]
    CreateIfAbsent,
}

/// Options carried by every store write
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteOptions {
    pub notify: NotifyPolicy,
    pub require: RequirePolicy,
}

impl WriteOptions {
    /// Policy used by the sync engines: send on change, don't require the param.
    pub const SYNC: Self = Self {
        notify: NotifyPolicy::NotifyOnChange,
        require: RequirePolicy::CreateIfAbsent,
    };

    pub const fn new(notify: NotifyPolicy, require: RequirePolicy) -> Self {
        Self { notify, require }
    }
}

/// Typed parameter store.
///
/// Writes return the change event they produced, if any; the caller (the
/// host) is responsible for delivering it to subscribers of this store.
/// Getters return `None` for absent names and for type-mismatched reads.
pub trait ParameterStore {
    /// Readiness predicate polled before bootstrap reconciliation
    fn is_ready(&self) -> bool;

    /// Declared type of `name`, if present
    fn param_type(&self, name: &str) -> Option<ParamType>;

    fn get_float(&self, name: &str) -> Option<f64>;

    fn get_int(&self, name: &str) -> Option<i64>;

    /// Reads `Bool` and `Trigger` entries alike
    fn get_bool(&self, name: &str) -> Option<bool>;

    /// Write a float
    ///
    /// # Errors
    /// `TypeMismatch` if `name` exists with another type,
    /// `MissingParam` if absent under `RequireExisting`
    fn set_float(
        &mut self,
        name: &str,
        value: f64,
        options: WriteOptions,
    ) -> Result<Option<ParamUpdate>, ContractError>;

    fn set_int(
        &mut self,
        name: &str,
        value: i64,
        options: WriteOptions,
    ) -> Result<Option<ParamUpdate>, ContractError>;

    /// Write a boolean. Accepted on `Trigger` entries too, in which case
    /// the emitted event is `TriggerSet` / `TriggerClear`.
    fn set_bool(
        &mut self,
        name: &str,
        value: bool,
        options: WriteOptions,
    ) -> Result<Option<ParamUpdate>, ContractError>;

    /// Set a trigger and broadcast `TriggerSet`
    fn fire_trigger(
        &mut self,
        name: &str,
        options: WriteOptions,
    ) -> Result<Option<ParamUpdate>, ContractError>;

    /// Reset a trigger (or boolean) to false. Creates a `Trigger` entry when
    /// absent under `CreateIfAbsent`.
    fn clear_trigger(
        &mut self,
        name: &str,
        options: WriteOptions,
    ) -> Result<Option<ParamUpdate>, ContractError>;

    /// Current value of every parameter
    fn snapshot(&self) -> Vec<ParamSnapshotEntry>;
}
