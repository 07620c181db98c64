//! The activation coordinator.
//!
//! Every connected client observes the same combat lifecycle events; the
//! coordinator makes sure the activation and deactivation procedures behind
//! them run exactly once, and only on the authoritative client. Duplicate
//! start transitions are fenced by a flag persisted on the combat document;
//! duplicate creation events by a transient in-process set.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, error, trace};

use host_core::{
    Authority, CombatId, CombatSnapshot, CombatSource, CombatantSnapshot, DocumentRef, FlagStore,
    HostEvent, OptionBag, SettingsStore,
};

use crate::config::CoordinatorConfig;
use crate::error::{AutomationError, Result};
use crate::feature::{ActivationReason, CombatFeature};
use crate::readiness;

/// Option-bag key suffix holding a combat's pre-update `started` value.
const STARTED_OPTION: &str = "combatStarted";
/// Flag key prefix fencing duplicate start processing.
const START_PROCESSED: &str = "startProcessed";

struct Inner {
    config: CoordinatorConfig,
    source: Arc<dyn CombatSource>,
    flags: Arc<dyn FlagStore>,
    settings: Arc<dyn SettingsStore>,
    authority: Arc<dyn Authority>,
    features: Vec<Arc<dyn CombatFeature>>,
    /// Combats whose creation event has already been taken, so a
    /// re-delivered created event is a no-op. Start processing has its own
    /// persisted fence; this one only needs to outlive the combat instance.
    created: Mutex<HashSet<CombatId>>,
}

/// Cloneable façade over the coordinator state.
///
/// Clones share one instance, so the worker, spawned readiness waits, and
/// embedding code can all hold handles cheaply.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::new()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.inner.config
    }

    /// Dispatches one host lifecycle event.
    ///
    /// Never returns an error and never panics on handler failure: every
    /// failure is logged and swallowed so the host's event dispatch stays
    /// healthy. Non-authoritative clients no-op for every event.
    pub async fn handle_event(&self, event: HostEvent) {
        if !self.inner.authority.is_authoritative() {
            trace!(
                target: "automation::coordinator",
                event = event.kind(),
                "ignoring event on non-authoritative client"
            );
            return;
        }

        match event {
            HostEvent::CombatCreated { combat, .. } => {
                // The readiness wait can outlast any single event delivery,
                // so it runs detached from the pump.
                let coordinator = self.clone();
                tokio::spawn(async move {
                    let result = coordinator.on_combat_created(combat).await;
                    coordinator.contain("combat-created", combat, result);
                });
            }
            HostEvent::CombatPreUpdate {
                combat, options, ..
            } => {
                let result = self.on_combat_pre_update(combat, &options);
                self.contain("combat-pre-update", combat, result);
            }
            HostEvent::CombatUpdated {
                combat, options, ..
            } => {
                let result = self.on_combat_updated(combat, &options).await;
                self.contain("combat-updated", combat, result);
            }
            HostEvent::CombatDeleted { combat, .. } => {
                let id = combat.id;
                let result = self.on_combat_deleted(&combat).await;
                self.contain("combat-deleted", id, result);
            }
            HostEvent::CombatantCreated { combatant, .. } => {
                let combat = combatant.combat;
                let result = self.on_combatant_created(&combatant).await;
                self.contain("combatant-created", combat, result);
            }
            HostEvent::CombatantDeleted { combatant, .. } => {
                let combat = combatant.combat;
                let result = self.on_combatant_deleted(&combatant).await;
                self.contain("combatant-deleted", combat, result);
            }
        }
    }

    /// Waits for every combatant to initialize, then activates all enabled
    /// features for the combat. A combat already taken by a previous created
    /// event is skipped.
    async fn on_combat_created(&self, combat: CombatId) -> Result<()> {
        if !self.mark_created(combat) {
            debug!(
                target: "automation::coordinator",
                %combat,
                "creation already processed, skipping"
            );
            return Ok(());
        }

        let snapshot = match readiness::await_combatants(
            self.inner.source.as_ref(),
            combat,
            &self.inner.config,
        )
        .await
        {
            Ok(snapshot) => snapshot,
            Err(error) => {
                // Leave room for a retry if the host re-delivers creation.
                self.unmark_created(combat);
                return Err(error);
            }
        };

        self.activate_all(&snapshot, None).await;
        Ok(())
    }

    /// Captures the combat's current (soon to be previous) `started` value
    /// into the transaction's option bag.
    fn on_combat_pre_update(&self, combat: CombatId, options: &OptionBag) -> Result<()> {
        let Some(snapshot) = self.inner.source.combat(combat) else {
            debug!(
                target: "automation::coordinator",
                %combat,
                "pre-update for unknown combat"
            );
            return Ok(());
        };
        options.insert(self.started_option_key(), Value::Bool(snapshot.started));
        Ok(())
    }

    /// Detects a true start transition and runs start activation behind the
    /// persisted idempotency flag.
    async fn on_combat_updated(&self, combat: CombatId, options: &OptionBag) -> Result<()> {
        let Some(snapshot) = self.inner.source.combat(combat) else {
            debug!(
                target: "automation::coordinator",
                %combat,
                "update for unknown combat"
            );
            return Ok(());
        };

        let previously_started = options
            .get_bool(&self.started_option_key())
            .unwrap_or(false);
        let combat_started = snapshot.started && !previously_started;
        if !combat_started {
            return Ok(());
        }

        let doc = DocumentRef::Combat(combat);
        let flag_key = start_processed_key(combat);
        let already_processed = self
            .inner
            .flags
            .get_flag(doc, &self.inner.config.namespace, &flag_key)
            .await?
            .and_then(|value| value.as_bool())
            .unwrap_or(false);
        if already_processed {
            debug!(
                target: "automation::coordinator",
                %combat,
                "start transition already processed"
            );
            return Ok(());
        }

        let enabled = self.enabled_features();
        if enabled.is_empty() {
            return Ok(());
        }

        // Fence first: a re-delivered update must see the flag even if an
        // activation below fails.
        self.inner
            .flags
            .set_flag(doc, &self.inner.config.namespace, &flag_key, Value::Bool(true))
            .await?;

        for feature in enabled {
            if let Err(error) = feature
                .activate_combat(&snapshot, Some(ActivationReason::StartCombat))
                .await
            {
                self.log_feature_failure(feature.as_ref(), combat, &error);
            }
        }
        Ok(())
    }

    /// Runs participant-scoped activation for a combatant joining a combat
    /// that has already started.
    async fn on_combatant_created(&self, combatant: &CombatantSnapshot) -> Result<()> {
        let Some(snapshot) = self.inner.source.combat(combatant.combat) else {
            return Ok(());
        };
        if !snapshot.started {
            return Ok(());
        }

        for feature in self.enabled_features() {
            if let Err(error) = feature
                .activate_combatant(&snapshot, combatant, Some(ActivationReason::EnterCombat))
                .await
            {
                self.log_feature_failure(feature.as_ref(), combatant.combat, &error);
            }
        }
        Ok(())
    }

    /// Deactivates every enabled feature for the deleted combat. Deletion is
    /// terminal, so no idempotency flag is involved.
    async fn on_combat_deleted(&self, combat: &CombatSnapshot) -> Result<()> {
        self.unmark_created(combat.id);

        for feature in self.enabled_features() {
            if let Err(error) = feature
                .deactivate_combat(combat, Some(ActivationReason::EndCombat))
                .await
            {
                self.log_feature_failure(feature.as_ref(), combat.id, &error);
            }
        }
        Ok(())
    }

    /// Runs participant-scoped deactivation for a combatant leaving a
    /// started combat.
    async fn on_combatant_deleted(&self, combatant: &CombatantSnapshot) -> Result<()> {
        let Some(snapshot) = self.inner.source.combat(combatant.combat) else {
            return Ok(());
        };
        if !snapshot.started {
            return Ok(());
        }

        for feature in self.enabled_features() {
            if let Err(error) = feature
                .deactivate_combatant(&snapshot, combatant, Some(ActivationReason::ExitCombat))
                .await
            {
                self.log_feature_failure(feature.as_ref(), combatant.combat, &error);
            }
        }
        Ok(())
    }

    async fn activate_all(&self, snapshot: &CombatSnapshot, reason: Option<ActivationReason>) {
        for feature in self.enabled_features() {
            if let Err(error) = feature.activate_combat(snapshot, reason).await {
                self.log_feature_failure(feature.as_ref(), snapshot.id, &error);
            }
        }
    }

    /// Features whose gating toggle currently reads enabled.
    fn enabled_features(&self) -> Vec<Arc<dyn CombatFeature>> {
        self.inner
            .features
            .iter()
            .filter(|feature| self.inner.settings.enabled(feature.setting()))
            .cloned()
            .collect()
    }

    fn started_option_key(&self) -> String {
        format!("{}.{STARTED_OPTION}", self.inner.config.namespace)
    }

    fn mark_created(&self, combat: CombatId) -> bool {
        self.inner
            .created
            .lock()
            .expect("created set lock poisoned")
            .insert(combat)
    }

    fn unmark_created(&self, combat: CombatId) {
        self.inner
            .created
            .lock()
            .expect("created set lock poisoned")
            .remove(&combat);
    }

    /// Single containment point: lifecycle handler errors are logged, never
    /// propagated into the host's event dispatch.
    fn contain(&self, event: &'static str, combat: CombatId, result: Result<()>) {
        if let Err(error) = result {
            error!(
                target: "automation::coordinator",
                event,
                %combat,
                %error,
                "lifecycle handler failed"
            );
        }
    }

    /// A failing feature never stops the others; it is logged and skipped.
    fn log_feature_failure(
        &self,
        feature: &dyn CombatFeature,
        combat: CombatId,
        error: &AutomationError,
    ) {
        error!(
            target: "automation::coordinator",
            feature = feature.name(),
            %combat,
            %error,
            "feature procedure failed"
        );
    }
}

fn start_processed_key(combat: CombatId) -> String {
    format!("{START_PROCESSED}-{combat}")
}

/// Builder for [`Coordinator`] with injected collaborators.
pub struct CoordinatorBuilder {
    config: CoordinatorConfig,
    source: Option<Arc<dyn CombatSource>>,
    flags: Option<Arc<dyn FlagStore>>,
    settings: Option<Arc<dyn SettingsStore>>,
    authority: Option<Arc<dyn Authority>>,
    features: Vec<Arc<dyn CombatFeature>>,
}

impl CoordinatorBuilder {
    fn new() -> Self {
        Self {
            config: CoordinatorConfig::default(),
            source: None,
            flags: None,
            settings: None,
            authority: None,
            features: Vec::new(),
        }
    }

    /// Override coordinator configuration.
    pub fn config(mut self, config: CoordinatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn source(mut self, source: Arc<dyn CombatSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn flags(mut self, flags: Arc<dyn FlagStore>) -> Self {
        self.flags = Some(flags);
        self
    }

    pub fn settings(mut self, settings: Arc<dyn SettingsStore>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn authority(mut self, authority: Arc<dyn Authority>) -> Self {
        self.authority = Some(authority);
        self
    }

    /// Registers a feature for the coordinator to drive.
    pub fn feature(mut self, feature: Arc<dyn CombatFeature>) -> Self {
        self.features.push(feature);
        self
    }

    pub fn build(self) -> Result<Coordinator> {
        let source = self
            .source
            .ok_or(AutomationError::MissingCollaborator("combat source"))?;
        let flags = self
            .flags
            .ok_or(AutomationError::MissingCollaborator("flag store"))?;
        let settings = self
            .settings
            .ok_or(AutomationError::MissingCollaborator("settings store"))?;
        let authority = self
            .authority
            .ok_or(AutomationError::MissingCollaborator("authority check"))?;

        Ok(Coordinator {
            inner: Arc::new(Inner {
                config: self.config,
                source,
                flags,
                settings,
                authority,
                features: self.features,
                created: Mutex::new(HashSet::new()),
            }),
        })
    }
}
