//! In-memory host for tests and embedding without a live tabletop runtime.
//!
//! One [`InMemoryHost`] implements every boundary trait, so a single
//! `Arc<InMemoryHost>` can be handed to a coordinator as its combat source,
//! flag store, settings store, authority check, and notifier at once. The
//! mutation helpers mirror what a real host does between the events a test
//! emits by hand.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::combat::{CombatSnapshot, CombatantSnapshot};
use crate::error::HostError;
use crate::ids::{ActorId, CombatId, CombatantId, DocumentRef};
use crate::traits::{Authority, CombatSource, FlagStore, Notifier, SettingsStore};

#[derive(Default)]
struct HostState {
    combats: HashMap<CombatId, CombatSnapshot>,
    flags: HashMap<(DocumentRef, String, String), Value>,
    toggles: HashMap<String, bool>,
    texts: HashMap<String, String>,
    authoritative: bool,
    notices: Vec<String>,
}

/// Host fixture backed by plain maps behind one lock.
#[derive(Default)]
pub struct InMemoryHost {
    state: Mutex<HostState>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host whose client already holds the authoritative role.
    pub fn authoritative() -> Self {
        let host = Self::default();
        host.set_authoritative(true);
        host
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state.lock().expect("host state lock poisoned")
    }

    pub fn insert_combat(&self, combat: CombatSnapshot) {
        self.lock().combats.insert(combat.id, combat);
    }

    pub fn remove_combat(&self, id: CombatId) -> Option<CombatSnapshot> {
        self.lock().combats.remove(&id)
    }

    pub fn set_started(&self, id: CombatId, started: bool) {
        if let Some(combat) = self.lock().combats.get_mut(&id) {
            combat.started = started;
        }
    }

    /// Adds the combatant to its combat, replacing any entry with the same id.
    pub fn upsert_combatant(&self, combatant: CombatantSnapshot) {
        if let Some(combat) = self.lock().combats.get_mut(&combatant.combat) {
            match combat.combatants.iter_mut().find(|c| c.id == combatant.id) {
                Some(existing) => *existing = combatant,
                None => combat.combatants.push(combatant),
            }
        }
    }

    /// Resolves a combatant's actor reference, as the host does once the
    /// actor document finishes loading.
    pub fn set_combatant_actor(&self, combat: CombatId, id: CombatantId, actor: Option<ActorId>) {
        if let Some(combat) = self.lock().combats.get_mut(&combat)
            && let Some(combatant) = combat.combatants.iter_mut().find(|c| c.id == id)
        {
            combatant.actor = actor;
        }
    }

    pub fn remove_combatant(&self, combat: CombatId, id: CombatantId) -> Option<CombatantSnapshot> {
        let mut state = self.lock();
        let combat = state.combats.get_mut(&combat)?;
        let index = combat.combatants.iter().position(|c| c.id == id)?;
        Some(combat.combatants.remove(index))
    }

    pub fn set_authoritative(&self, authoritative: bool) {
        self.lock().authoritative = authoritative;
    }

    pub fn set_enabled(&self, key: impl Into<String>, enabled: bool) {
        self.lock().toggles.insert(key.into(), enabled);
    }

    pub fn set_text(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().texts.insert(key.into(), value.into());
    }

    /// Synchronous flag peek for assertions.
    pub fn flag(&self, doc: DocumentRef, namespace: &str, key: &str) -> Option<Value> {
        self.lock()
            .flags
            .get(&(doc, namespace.to_owned(), key.to_owned()))
            .cloned()
    }

    /// Notifications shown so far, oldest first.
    pub fn notices(&self) -> Vec<String> {
        self.lock().notices.clone()
    }
}

impl CombatSource for InMemoryHost {
    fn combat(&self, id: CombatId) -> Option<CombatSnapshot> {
        self.lock().combats.get(&id).cloned()
    }
}

#[async_trait]
impl FlagStore for InMemoryHost {
    async fn get_flag(
        &self,
        doc: DocumentRef,
        namespace: &str,
        key: &str,
    ) -> Result<Option<Value>, HostError> {
        Ok(self.flag(doc, namespace, key))
    }

    async fn set_flag(
        &self,
        doc: DocumentRef,
        namespace: &str,
        key: &str,
        value: Value,
    ) -> Result<(), HostError> {
        self.lock()
            .flags
            .insert((doc, namespace.to_owned(), key.to_owned()), value);
        Ok(())
    }
}

impl SettingsStore for InMemoryHost {
    fn enabled(&self, key: &str) -> bool {
        self.lock().toggles.get(key).copied().unwrap_or(false)
    }

    fn text(&self, key: &str) -> Option<String> {
        self.lock().texts.get(key).cloned()
    }
}

impl Authority for InMemoryHost {
    fn is_authoritative(&self) -> bool {
        self.lock().authoritative
    }
}

impl Notifier for InMemoryHost {
    fn warn(&self, message: &str) {
        self.lock().notices.push(message.to_owned());
    }
}
