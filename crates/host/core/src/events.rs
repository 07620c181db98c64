//! Lifecycle events delivered by the host.
//!
//! The host emits one event per document transition and delivers it to every
//! connected client. The pre-update/updated pair of one transaction shares a
//! single [`OptionBag`], which is how a pre-update handler leaves breadcrumbs
//! for the updated handler that follows it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::combat::{CombatChange, CombatSnapshot, CombatantSnapshot};
use crate::ids::{CombatId, UserId};

/// Document lifecycle events observed by the plugin.
#[derive(Clone, Debug)]
pub enum HostEvent {
    CombatCreated {
        combat: CombatId,
        user: UserId,
    },
    /// Fires before the host applies `change`; lookups through
    /// [`CombatSource`] still see the previous state.
    ///
    /// [`CombatSource`]: crate::traits::CombatSource
    CombatPreUpdate {
        combat: CombatId,
        change: CombatChange,
        options: OptionBag,
        user: UserId,
    },
    /// Fires after `change` has been applied, carrying the same option bag
    /// as the matching [`HostEvent::CombatPreUpdate`].
    CombatUpdated {
        combat: CombatId,
        change: CombatChange,
        options: OptionBag,
        user: UserId,
    },
    /// Carries the final snapshot; the document is already gone from the host.
    CombatDeleted {
        combat: CombatSnapshot,
        user: UserId,
    },
    CombatantCreated {
        combatant: CombatantSnapshot,
        user: UserId,
    },
    CombatantDeleted {
        combatant: CombatantSnapshot,
        user: UserId,
    },
}

impl HostEvent {
    /// Short event name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            HostEvent::CombatCreated { .. } => "combat-created",
            HostEvent::CombatPreUpdate { .. } => "combat-pre-update",
            HostEvent::CombatUpdated { .. } => "combat-updated",
            HostEvent::CombatDeleted { .. } => "combat-deleted",
            HostEvent::CombatantCreated { .. } => "combatant-created",
            HostEvent::CombatantDeleted { .. } => "combatant-deleted",
        }
    }
}

/// Transient key/value bag scoped to one host transaction.
///
/// Clones share the same underlying map, so a value written during
/// pre-update is visible to the updated handler holding the other clone.
/// The bag dies with the transaction; nothing in it is persisted.
#[derive(Clone, Debug, Default)]
pub struct OptionBag {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl OptionBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.values
            .lock()
            .expect("option bag lock poisoned")
            .insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values
            .lock()
            .expect("option bag lock poisoned")
            .get(key)
            .cloned()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }
}
