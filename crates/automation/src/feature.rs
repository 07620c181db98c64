//! Abstraction over the activation procedures the coordinator drives.
//!
//! A feature is an opaque per-combat capability (opportunity-attack
//! tracking, say) that the coordinator switches on and off at lifecycle
//! transitions. Implementations live outside this crate; the coordinator
//! only cares that each one names the setting gating it and accepts the
//! snapshots it is handed.

use std::fmt;

use async_trait::async_trait;

use host_core::{CombatSnapshot, CombatantSnapshot};

use crate::error::Result;

/// Why an activation or deactivation is running.
///
/// The creation path carries no reason; the other paths use the tags below.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActivationReason {
    /// The combat's `started` flag just flipped true.
    StartCombat,
    /// A combatant joined an already-started combat.
    EnterCombat,
    /// The combat was deleted.
    EndCombat,
    /// A combatant left a started combat.
    ExitCombat,
}

impl ActivationReason {
    pub fn tag(self) -> &'static str {
        match self {
            ActivationReason::StartCombat => "startCombat",
            ActivationReason::EnterCombat => "enterCombat",
            ActivationReason::EndCombat => "endCombat",
            ActivationReason::ExitCombat => "exitCombat",
        }
    }
}

impl fmt::Display for ActivationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A per-combat automation feature the coordinator can enable and disable.
///
/// Different implementations can handle:
/// - rule procedures shipped by this workspace (see the `rules` crate)
/// - recording fixtures in tests
#[async_trait]
pub trait CombatFeature: Send + Sync {
    /// Human-readable name used in logging.
    fn name(&self) -> &'static str;

    /// Settings key gating this feature; the coordinator skips the feature
    /// whenever the toggle reads disabled.
    fn setting(&self) -> &'static str;

    /// Enables the feature for the whole combat.
    async fn activate_combat(
        &self,
        combat: &CombatSnapshot,
        reason: Option<ActivationReason>,
    ) -> Result<()>;

    /// Disables the feature for the whole combat.
    async fn deactivate_combat(
        &self,
        combat: &CombatSnapshot,
        reason: Option<ActivationReason>,
    ) -> Result<()>;

    /// Enables the feature for a single combatant.
    async fn activate_combatant(
        &self,
        combat: &CombatSnapshot,
        combatant: &CombatantSnapshot,
        reason: Option<ActivationReason>,
    ) -> Result<()>;

    /// Disables the feature for a single combatant.
    async fn deactivate_combatant(
        &self,
        combat: &CombatSnapshot,
        combatant: &CombatantSnapshot,
        reason: Option<ActivationReason>,
    ) -> Result<()>;
}
