//! Typed dispatch of updates and snapshot entries onto a target store.
//!
//! This is the single place that matches on the update kind; adding a
//! parameter kind means touching `apply_update` and `snapshot_to_update`.

use contracts::{
    ContractError, ParamSnapshotEntry, ParamType, ParamUpdate, ParamValue, ParameterStore,
    UpdateKind, WriteOptions,
};

/// Apply one update to `target` with send-on-change, create-if-absent writes.
///
/// Returns the change event the target emitted, if the write changed it.
pub fn apply_update<S>(target: &mut S, update: &ParamUpdate) -> Result<Option<ParamUpdate>, ContractError>
where
    S: ParameterStore + ?Sized,
{
    let options = WriteOptions::SYNC;
    match update {
        ParamUpdate::Float { name, value } => target.set_float(name, *value, options),
        ParamUpdate::Int { name, value } => target.set_int(name, *value, options),
        ParamUpdate::Bool { name, value } => target.set_bool(name, *value, options),
        ParamUpdate::TriggerSet { name } => target.fire_trigger(name, options),
        ParamUpdate::TriggerClear { name } => target.clear_trigger(name, options),
    }
}

/// Translate a snapshot entry into the update that reproduces it.
///
/// A snapshot has no edge history, so a trigger maps to `TriggerSet` when
/// its stored boolean is currently true and to `TriggerClear` otherwise.
pub fn snapshot_to_update(entry: &ParamSnapshotEntry) -> ParamUpdate {
    let name = entry.name.clone();
    match (entry.param_type, entry.value) {
        (ParamType::Trigger, ParamValue::Bool(true)) => ParamUpdate::TriggerSet { name },
        (ParamType::Trigger, _) => ParamUpdate::TriggerClear { name },
        (_, ParamValue::Float(value)) => ParamUpdate::Float { name, value },
        (_, ParamValue::Int(value)) => ParamUpdate::Int { name, value },
        (_, ParamValue::Bool(value)) => ParamUpdate::Bool { name, value },
    }
}

pub fn apply_snapshot_entry<S>(
    target: &mut S,
    entry: &ParamSnapshotEntry,
) -> Result<Option<ParamUpdate>, ContractError>
where
    S: ParameterStore + ?Sized,
{
    apply_update(target, &snapshot_to_update(entry))
}

/// Whether the push direction forwards this kind of update.
///
/// Trigger clears stay local: only the set edge of a trigger goes upward.
#[inline]
pub fn forwards_upward(update: &ParamUpdate) -> bool {
    update.kind() != UpdateKind::TriggerClear
}
