//! Relay procedures wrapping the opportunity-attack feature.
//!
//! Non-authoritative clients cannot call the feature directly; they execute
//! these named procedures through the relay, which lands them on the
//! authoritative client. Payloads are plain JSON objects, matching what the
//! companion messaging plugin carries.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use automation::{AutomationError, CombatFeature, Procedure, Result};
use host_core::{CombatId, CombatSource, DocumentRef, HostError};

use crate::opportunity::OpportunityAttack;

pub const ENABLE_OPPORTUNITY_ATTACK: &str = "enableOpportunityAttack";
pub const DISABLE_OPPORTUNITY_ATTACK: &str = "disableOpportunityAttack";

fn combat_from_payload(payload: &Value) -> Result<CombatId> {
    payload
        .get("combat")
        .and_then(Value::as_u64)
        .map(CombatId)
        .ok_or(AutomationError::MalformedPayload("combat"))
}

/// Enables opportunity-attack tracking for one combat.
pub struct EnableOpportunityAttack {
    source: Arc<dyn CombatSource>,
    feature: Arc<OpportunityAttack>,
}

impl EnableOpportunityAttack {
    pub fn new(source: Arc<dyn CombatSource>, feature: Arc<OpportunityAttack>) -> Self {
        Self { source, feature }
    }
}

#[async_trait]
impl Procedure for EnableOpportunityAttack {
    fn name(&self) -> &'static str {
        ENABLE_OPPORTUNITY_ATTACK
    }

    async fn run(&self, payload: Value) -> Result<Value> {
        let combat = combat_from_payload(&payload)?;
        let snapshot = self
            .source
            .combat(combat)
            .ok_or(HostError::DocumentNotFound(DocumentRef::Combat(combat)))?;
        self.feature.activate_combat(&snapshot, None).await?;
        Ok(Value::Null)
    }
}

/// Disables opportunity-attack tracking for one combat.
pub struct DisableOpportunityAttack {
    source: Arc<dyn CombatSource>,
    feature: Arc<OpportunityAttack>,
}

impl DisableOpportunityAttack {
    pub fn new(source: Arc<dyn CombatSource>, feature: Arc<OpportunityAttack>) -> Self {
        Self { source, feature }
    }
}

#[async_trait]
impl Procedure for DisableOpportunityAttack {
    fn name(&self) -> &'static str {
        DISABLE_OPPORTUNITY_ATTACK
    }

    async fn run(&self, payload: Value) -> Result<Value> {
        let combat = combat_from_payload(&payload)?;
        let snapshot = self
            .source
            .combat(combat)
            .ok_or(HostError::DocumentNotFound(DocumentRef::Combat(combat)))?;
        self.feature.deactivate_combat(&snapshot, None).await?;
        Ok(Value::Null)
    }
}
