//! Opportunity-attack tracking.
//!
//! Tracking is a per-combatant capability: while enabled, downstream rule
//! checks treat the combatant as threatening its reach. The bookkeeping
//! here is a namespaced flag on the combatant document; the reach and
//! trigger rules reading it are host content, out of scope for this crate.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use automation::{ActivationReason, CombatFeature, Result};
use host_core::{CombatSnapshot, CombatantSnapshot, DocumentRef, FlagStore};

/// Settings toggle gating the feature.
pub const OPPORTUNITY_ATTACK_SETTING: &str = "enableOpportunityAttack";

/// Flag marking a combatant as tracked.
pub const TRACKED_FLAG: &str = "opportunityAttack";

/// [`CombatFeature`] that flags combatants for opportunity-attack tracking.
pub struct OpportunityAttack {
    namespace: String,
    flags: Arc<dyn FlagStore>,
}

impl OpportunityAttack {
    pub fn new(namespace: impl Into<String>, flags: Arc<dyn FlagStore>) -> Self {
        Self {
            namespace: namespace.into(),
            flags,
        }
    }

    async fn mark(&self, combatant: &CombatantSnapshot, tracked: bool) -> Result<()> {
        self.flags
            .set_flag(
                DocumentRef::Combatant(combatant.id),
                &self.namespace,
                TRACKED_FLAG,
                Value::Bool(tracked),
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CombatFeature for OpportunityAttack {
    fn name(&self) -> &'static str {
        "opportunity-attack"
    }

    fn setting(&self) -> &'static str {
        OPPORTUNITY_ATTACK_SETTING
    }

    async fn activate_combat(
        &self,
        combat: &CombatSnapshot,
        reason: Option<ActivationReason>,
    ) -> Result<()> {
        debug!(
            target: "rules::opportunity",
            combat = %combat.id,
            ?reason,
            "enabling opportunity attack tracking"
        );
        for combatant in &combat.combatants {
            // Unresolved combatants get their flag when their own
            // combatant-created activation fires.
            if combatant.is_ready() {
                self.mark(combatant, true).await?;
            }
        }
        Ok(())
    }

    async fn deactivate_combat(
        &self,
        combat: &CombatSnapshot,
        reason: Option<ActivationReason>,
    ) -> Result<()> {
        debug!(
            target: "rules::opportunity",
            combat = %combat.id,
            ?reason,
            "disabling opportunity attack tracking"
        );
        for combatant in &combat.combatants {
            self.mark(combatant, false).await?;
        }
        Ok(())
    }

    async fn activate_combatant(
        &self,
        combat: &CombatSnapshot,
        combatant: &CombatantSnapshot,
        reason: Option<ActivationReason>,
    ) -> Result<()> {
        if !combatant.is_ready() {
            debug!(
                target: "rules::opportunity",
                combat = %combat.id,
                combatant = %combatant.id,
                "combatant has no actor yet, skipping"
            );
            return Ok(());
        }
        debug!(
            target: "rules::opportunity",
            combat = %combat.id,
            combatant = %combatant.id,
            ?reason,
            "enabling opportunity attack tracking for combatant"
        );
        self.mark(combatant, true).await
    }

    async fn deactivate_combatant(
        &self,
        combat: &CombatSnapshot,
        combatant: &CombatantSnapshot,
        reason: Option<ActivationReason>,
    ) -> Result<()> {
        debug!(
            target: "rules::opportunity",
            combat = %combat.id,
            combatant = %combatant.id,
            ?reason,
            "disabling opportunity attack tracking for combatant"
        );
        self.mark(combatant, false).await
    }
}
