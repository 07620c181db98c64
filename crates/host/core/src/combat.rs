//! Snapshots of combat encounters and their combatants.
//!
//! The host owns the live documents; these types are point-in-time copies
//! delivered with lifecycle events or returned by [`CombatSource`] lookups.
//!
//! [`CombatSource`]: crate::traits::CombatSource

use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, CombatId, CombatantId};

/// Point-in-time copy of a combat encounter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSnapshot {
    pub id: CombatId,
    /// Flips true exactly once in a combat's life, when the encounter begins.
    pub started: bool,
    pub round: u32,
    /// Combatants in initiative order.
    pub combatants: Vec<CombatantSnapshot>,
}

impl CombatSnapshot {
    /// True once every combatant has resolved its actor reference.
    ///
    /// Combatants are inserted by the host before their actors finish
    /// loading; activation must wait for this to hold.
    pub fn all_ready(&self) -> bool {
        self.combatants.iter().all(CombatantSnapshot::is_ready)
    }

    pub fn combatant(&self, id: CombatantId) -> Option<&CombatantSnapshot> {
        self.combatants.iter().find(|c| c.id == id)
    }
}

/// Point-in-time copy of a combatant entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantSnapshot {
    pub id: CombatantId,
    /// The combat this combatant belongs to.
    pub combat: CombatId,
    /// Resolved actor reference; `None` while the host is still loading it.
    pub actor: Option<ActorId>,
    pub name: String,
}

impl CombatantSnapshot {
    pub fn is_ready(&self) -> bool {
        self.actor.is_some()
    }
}

/// Fields touched by a pending or applied combat update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatChange {
    pub started: Option<bool>,
    pub round: Option<u32>,
}

impl CombatChange {
    pub fn touches_started(&self) -> bool {
        self.started.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combatant(id: u64, actor: Option<u64>) -> CombatantSnapshot {
        CombatantSnapshot {
            id: CombatantId(id),
            combat: CombatId(1),
            actor: actor.map(ActorId),
            name: format!("combatant-{id}"),
        }
    }

    #[test]
    fn readiness_requires_every_actor_reference() {
        let mut combat = CombatSnapshot {
            id: CombatId(1),
            started: false,
            round: 0,
            combatants: vec![combatant(1, Some(10)), combatant(2, None)],
        };
        assert!(!combat.all_ready());

        combat.combatants[1].actor = Some(ActorId(11));
        assert!(combat.all_ready());
    }

    #[test]
    fn empty_combat_is_ready() {
        let combat = CombatSnapshot {
            id: CombatId(1),
            started: false,
            round: 0,
            combatants: Vec::new(),
        };
        assert!(combat.all_ready());
    }
}
