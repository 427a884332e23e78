//! In-memory parameter store.
//!
//! Entries are kept in a `BTreeMap` so snapshots enumerate in name order,
//! which keeps bootstrap passes deterministic.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{
    ContractError, NotifyPolicy, ParamName, ParamSnapshotEntry, ParamType, ParamUpdate,
    ParamValue, ParameterStore, RequirePolicy, WriteOptions,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Entry {
    param_type: ParamType,
    value: ParamValue,
}

impl Entry {
    fn event(&self, name: ParamName) -> ParamUpdate {
        match (self.param_type, self.value) {
            (ParamType::Trigger, ParamValue::Bool(true)) => ParamUpdate::TriggerSet { name },
            (ParamType::Trigger, _) => ParamUpdate::TriggerClear { name },
            (_, ParamValue::Float(value)) => ParamUpdate::Float { name, value },
            (_, ParamValue::Int(value)) => ParamUpdate::Int { name, value },
            (_, ParamValue::Bool(value)) => ParamUpdate::Bool { name, value },
        }
    }
}

/// Node-owned typed key-value store
pub struct MemoryStore {
    entries: BTreeMap<ParamName, Entry>,
    ready: bool,
    auto_clear_triggers: bool,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("len", &self.entries.len())
            .field("ready", &self.ready)
            .field("auto_clear_triggers", &self.auto_clear_triggers)
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty, ready store
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            ready: true,
            auto_clear_triggers: false,
        }
    }

    /// Create an empty store that reports not ready until `set_ready(true)`
    pub fn not_ready() -> Self {
        Self {
            ready: false,
            ..Self::new()
        }
    }

    /// Clear every set trigger at the end of each host tick
    pub fn with_auto_clear_triggers(mut self, enabled: bool) -> Self {
        self.auto_clear_triggers = enabled;
        self
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn auto_clear_triggers(&self) -> bool {
        self.auto_clear_triggers
    }

    /// Insert a parameter without broadcasting.
    ///
    /// Re-declaring with the same type overwrites the value; a different
    /// type is a `TypeMismatch`.
    pub fn declare(
        &mut self,
        name: impl Into<ParamName>,
        param_type: ParamType,
        value: ParamValue,
    ) -> Result<(), ContractError> {
        let name = name.into();
        if let Some(existing) = self.entries.get(&name) {
            if existing.param_type != param_type {
                return Err(ContractError::type_mismatch(
                    name.as_str(),
                    existing.param_type,
                    param_type,
                ));
            }
        }
        self.entries.insert(name, Entry { param_type, value });
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Triggers currently in the set state
    pub fn set_triggers(&self) -> Vec<ParamName> {
        self.entries
            .iter()
            .filter(|(_, e)| e.param_type == ParamType::Trigger && e.value == ParamValue::Bool(true))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Shared write path.
    ///
    /// `accepts` decides whether the stored type can take this write;
    /// `created_as` is the type given to the entry if it does not exist.
    fn write(
        &mut self,
        name: &str,
        written: ParamType,
        accepts: fn(ParamType) -> bool,
        created_as: ParamType,
        value: ParamValue,
        options: WriteOptions,
    ) -> Result<Option<ParamUpdate>, ContractError> {
        let key = self.entries.get_key_value(name).map(|(k, _)| k.clone());

        let Some(key) = key else {
            if options.require == RequirePolicy::RequireExisting {
                return Err(ContractError::missing_param(name));
            }
            let entry = Entry {
                param_type: created_as,
                value,
            };
            let name = ParamName::from(name);
            self.entries.insert(name.clone(), entry);
            return Ok(Some(entry.event(name)));
        };

        let entry = match self.entries.get_mut(name) {
            Some(entry) => entry,
            None => return Err(ContractError::missing_param(name)),
        };
        if !accepts(entry.param_type) {
            return Err(ContractError::type_mismatch(name, entry.param_type, written));
        }

        let changed = entry.value != value;
        entry.value = value;

        if changed || options.notify == NotifyPolicy::AlwaysNotify {
            Ok(Some(entry.event(key)))
        } else {
            Ok(None)
        }
    }

    fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }
}

impl ParameterStore for MemoryStore {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn param_type(&self, name: &str) -> Option<ParamType> {
        self.entry(name).map(|e| e.param_type)
    }

    fn get_float(&self, name: &str) -> Option<f64> {
        self.entry(name).and_then(|e| e.value.as_float())
    }

    fn get_int(&self, name: &str) -> Option<i64> {
        self.entry(name).and_then(|e| e.value.as_int())
    }

    fn get_bool(&self, name: &str) -> Option<bool> {
        self.entry(name).and_then(|e| e.value.as_bool())
    }

    fn set_float(
        &mut self,
        name: &str,
        value: f64,
        options: WriteOptions,
    ) -> Result<Option<ParamUpdate>, ContractError> {
        self.write(
            name,
            ParamType::Float,
            |t| t == ParamType::Float,
            ParamType::Float,
            ParamValue::Float(value),
            options,
        )
    }

    fn set_int(
        &mut self,
        name: &str,
        value: i64,
        options: WriteOptions,
    ) -> Result<Option<ParamUpdate>, ContractError> {
        self.write(
            name,
            ParamType::Int,
            |t| t == ParamType::Int,
            ParamType::Int,
            ParamValue::Int(value),
            options,
        )
    }

    fn set_bool(
        &mut self,
        name: &str,
        value: bool,
        options: WriteOptions,
    ) -> Result<Option<ParamUpdate>, ContractError> {
        self.write(
            name,
            ParamType::Bool,
            |t| t.is_boolean(),
            ParamType::Bool,
            ParamValue::Bool(value),
            options,
        )
    }

    fn fire_trigger(
        &mut self,
        name: &str,
        options: WriteOptions,
    ) -> Result<Option<ParamUpdate>, ContractError> {
        self.write(
            name,
            ParamType::Trigger,
            |t| t == ParamType::Trigger,
            ParamType::Trigger,
            ParamValue::Bool(true),
            options,
        )
    }

    fn clear_trigger(
        &mut self,
        name: &str,
        options: WriteOptions,
    ) -> Result<Option<ParamUpdate>, ContractError> {
        self.write(
            name,
            ParamType::Trigger,
            |t| t.is_boolean(),
            ParamType::Trigger,
            ParamValue::Bool(false),
            options,
        )
    }

    fn snapshot(&self) -> Vec<ParamSnapshotEntry> {
        self.entries
            .iter()
            .map(|(name, e)| ParamSnapshotEntry::new(name.clone(), e.param_type, e.value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALWAYS: WriteOptions =
        WriteOptions::new(NotifyPolicy::AlwaysNotify, RequirePolicy::CreateIfAbsent);
    const STRICT: WriteOptions =
        WriteOptions::new(NotifyPolicy::NotifyOnChange, RequirePolicy::RequireExisting);

    #[test]
    fn test_create_if_absent_emits() {
        let mut store = MemoryStore::new();
        let update = store.set_float("health", 1.0, WriteOptions::SYNC).unwrap();
        assert_eq!(update, Some(ParamUpdate::float("health", 1.0)));
        assert_eq!(store.get_float("health"), Some(1.0));
        assert_eq!(store.param_type("health"), Some(ParamType::Float));
    }

    #[test]
    fn test_same_value_is_silent_on_change_only() {
        let mut store = MemoryStore::new();
        store.set_int("ammo", 5, WriteOptions::SYNC).unwrap();
        assert_eq!(store.set_int("ammo", 5, WriteOptions::SYNC).unwrap(), None);
        assert_eq!(
            store.set_int("ammo", 5, ALWAYS).unwrap(),
            Some(ParamUpdate::int("ammo", 5))
        );
    }

    #[test]
    fn test_require_existing() {
        let mut store = MemoryStore::new();
        let err = store.set_bool("visible", true, STRICT).unwrap_err();
        assert!(matches!(err, ContractError::MissingParam { .. }));
        assert!(!store.contains("visible"));
    }

    #[test]
    fn test_type_mismatch_leaves_value() {
        let mut store = MemoryStore::new();
        store.declare("health", ParamType::Float, ParamValue::Float(0.3)).unwrap();
        let err = store.set_int("health", 1, WriteOptions::SYNC).unwrap_err();
        assert!(matches!(
            err,
            ContractError::TypeMismatch {
                stored: ParamType::Float,
                written: ParamType::Int,
                ..
            }
        ));
        assert_eq!(store.get_float("health"), Some(0.3));
    }

    #[test]
    fn test_trigger_fire_and_clear() {
        let mut store = MemoryStore::new();
        assert_eq!(
            store.fire_trigger("jump", WriteOptions::SYNC).unwrap(),
            Some(ParamUpdate::trigger_set("jump"))
        );
        assert_eq!(store.get_bool("jump"), Some(true));
        // already set: the sync write policy sends nothing
        assert_eq!(store.fire_trigger("jump", WriteOptions::SYNC).unwrap(), None);
        let always = WriteOptions::new(NotifyPolicy::AlwaysNotify, RequirePolicy::CreateIfAbsent);
        assert_eq!(
            store.fire_trigger("jump", always).unwrap(),
            Some(ParamUpdate::trigger_set("jump"))
        );
        assert_eq!(store.set_triggers(), vec![ParamName::from("jump")]);

        assert_eq!(
            store.clear_trigger("jump", WriteOptions::SYNC).unwrap(),
            Some(ParamUpdate::trigger_clear("jump"))
        );
        assert_eq!(store.get_bool("jump"), Some(false));
        assert!(store.set_triggers().is_empty());
    }

    #[test]
    fn test_set_bool_on_trigger_emits_trigger_events() {
        let mut store = MemoryStore::new();
        store.declare("jump", ParamType::Trigger, ParamValue::Bool(true)).unwrap();
        assert_eq!(
            store.set_bool("jump", false, WriteOptions::SYNC).unwrap(),
            Some(ParamUpdate::trigger_clear("jump"))
        );
        assert_eq!(store.param_type("jump"), Some(ParamType::Trigger));
    }

    #[test]
    fn test_clear_absent_creates_trigger() {
        let mut store = MemoryStore::new();
        store.clear_trigger("jump", WriteOptions::SYNC).unwrap();
        assert_eq!(store.param_type("jump"), Some(ParamType::Trigger));
        assert!(store.fire_trigger("jump", WriteOptions::SYNC).is_ok());
    }

    #[test]
    fn test_fire_on_bool_is_mismatch() {
        let mut store = MemoryStore::new();
        store.declare("visible", ParamType::Bool, ParamValue::Bool(false)).unwrap();
        assert!(store.fire_trigger("visible", WriteOptions::SYNC).is_err());
        // clearing a plain bool is a bool write
        store.set_bool("visible", true, WriteOptions::SYNC).unwrap();
        assert_eq!(
            store.clear_trigger("visible", WriteOptions::SYNC).unwrap(),
            Some(ParamUpdate::bool("visible", false))
        );
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let mut store = MemoryStore::new();
        store.set_int("b", 2, WriteOptions::SYNC).unwrap();
        store.set_float("a", 1.0, WriteOptions::SYNC).unwrap();
        let names: Vec<_> = store.snapshot().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec![ParamName::from("a"), ParamName::from("b")]);
    }

    #[test]
    fn test_declare_type_is_fixed() {
        let mut store = MemoryStore::not_ready();
        assert!(!store.is_ready());
        store.declare("x", ParamType::Int, ParamValue::Int(1)).unwrap();
        assert!(store.declare("x", ParamType::Float, ParamValue::Float(1.0)).is_err());
        store.set_ready(true);
        assert!(store.is_ready());
    }
}
