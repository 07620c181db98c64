//! Lifecycle coordination scenarios driven through the in-memory host.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use automation::{
    ActivationReason, AutomationError, CombatFeature, Coordinator, CoordinatorConfig, EventBus,
    Result, Worker,
};
use host_core::{
    ActorId, CombatChange, CombatId, CombatSnapshot, CombatantId, CombatantSnapshot, DocumentRef,
    HostEvent, InMemoryHost, OptionBag, UserId,
};

const SETTING: &str = "enableTracking";
const GM: UserId = UserId(1);

#[derive(Clone, Debug, PartialEq, Eq)]
enum Call {
    ActivateCombat(CombatId, Option<ActivationReason>),
    DeactivateCombat(CombatId, Option<ActivationReason>),
    ActivateCombatant(CombatId, CombatantId, Option<ActivationReason>),
    DeactivateCombatant(CombatId, CombatantId, Option<ActivationReason>),
}

/// Feature fixture that records every invocation.
#[derive(Default)]
struct RecordingFeature {
    calls: Mutex<Vec<Call>>,
}

impl RecordingFeature {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    fn push(&self, call: Call) {
        self.calls.lock().expect("lock poisoned").push(call);
    }
}

#[async_trait]
impl CombatFeature for RecordingFeature {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn setting(&self) -> &'static str {
        SETTING
    }

    async fn activate_combat(
        &self,
        combat: &CombatSnapshot,
        reason: Option<ActivationReason>,
    ) -> Result<()> {
        self.push(Call::ActivateCombat(combat.id, reason));
        Ok(())
    }

    async fn deactivate_combat(
        &self,
        combat: &CombatSnapshot,
        reason: Option<ActivationReason>,
    ) -> Result<()> {
        self.push(Call::DeactivateCombat(combat.id, reason));
        Ok(())
    }

    async fn activate_combatant(
        &self,
        combat: &CombatSnapshot,
        combatant: &CombatantSnapshot,
        reason: Option<ActivationReason>,
    ) -> Result<()> {
        self.push(Call::ActivateCombatant(combat.id, combatant.id, reason));
        Ok(())
    }

    async fn deactivate_combatant(
        &self,
        combat: &CombatSnapshot,
        combatant: &CombatantSnapshot,
        reason: Option<ActivationReason>,
    ) -> Result<()> {
        self.push(Call::DeactivateCombatant(combat.id, combatant.id, reason));
        Ok(())
    }
}

struct Fixture {
    host: Arc<InMemoryHost>,
    feature: Arc<RecordingFeature>,
    coordinator: Coordinator,
}

fn fixture() -> Fixture {
    let host = Arc::new(InMemoryHost::authoritative());
    host.set_enabled(SETTING, true);

    let feature = Arc::new(RecordingFeature::default());
    let coordinator = Coordinator::builder()
        .config(CoordinatorConfig {
            poll_interval: Duration::from_millis(5),
            ready_timeout: Duration::from_millis(200),
            ..CoordinatorConfig::default()
        })
        .source(host.clone())
        .flags(host.clone())
        .settings(host.clone())
        .authority(host.clone())
        .feature(feature.clone())
        .build()
        .expect("all collaborators provided");

    Fixture {
        host,
        feature,
        coordinator,
    }
}

fn combatant(combat: CombatId, id: u64, actor: Option<u64>) -> CombatantSnapshot {
    CombatantSnapshot {
        id: CombatantId(id),
        combat,
        actor: actor.map(ActorId),
        name: format!("combatant-{id}"),
    }
}

fn combat(id: u64, started: bool, combatants: Vec<CombatantSnapshot>) -> CombatSnapshot {
    CombatSnapshot {
        id: CombatId(id),
        started,
        round: u32::from(started),
        combatants,
    }
}

/// Polls until `check` passes or a second elapses.
async fn eventually(check: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

/// Sends the pre-update/update pair of one start transition, mutating the
/// host in between like the real host does, and returns the shared bag.
async fn start_combat(fx: &Fixture, id: CombatId) -> OptionBag {
    let options = OptionBag::new();
    let change = CombatChange {
        started: Some(true),
        ..CombatChange::default()
    };
    fx.coordinator
        .handle_event(HostEvent::CombatPreUpdate {
            combat: id,
            change,
            options: options.clone(),
            user: GM,
        })
        .await;
    fx.host.set_started(id, true);
    fx.coordinator
        .handle_event(HostEvent::CombatUpdated {
            combat: id,
            change,
            options: options.clone(),
            user: GM,
        })
        .await;
    options
}

fn start_flag(fx: &Fixture, id: CombatId) -> Option<Value> {
    fx.host.flag(
        DocumentRef::Combat(id),
        CoordinatorConfig::DEFAULT_NAMESPACE,
        &format!("startProcessed-{}", id.0),
    )
}

#[tokio::test]
async fn creation_activates_once_after_all_combatants_ready() {
    let fx = fixture();
    let id = CombatId(1);
    fx.host.insert_combat(combat(
        1,
        false,
        vec![combatant(id, 1, Some(10)), combatant(id, 2, None)],
    ));

    fx.coordinator
        .handle_event(HostEvent::CombatCreated { combat: id, user: GM })
        .await;

    // Still waiting on combatant 2.
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(fx.feature.calls().is_empty());

    fx.host
        .set_combatant_actor(id, CombatantId(2), Some(ActorId(11)));
    eventually(|| !fx.feature.calls().is_empty()).await;
    assert_eq!(fx.feature.calls(), vec![Call::ActivateCombat(id, None)]);

    // A re-delivered created event must not fire activation again.
    fx.coordinator
        .handle_event(HostEvent::CombatCreated { combat: id, user: GM })
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fx.feature.calls(), vec![Call::ActivateCombat(id, None)]);
}

#[tokio::test]
async fn creation_activation_skipped_when_readiness_times_out() {
    let fx = fixture();
    let id = CombatId(1);
    fx.host
        .insert_combat(combat(1, false, vec![combatant(id, 1, None)]));

    fx.coordinator
        .handle_event(HostEvent::CombatCreated { combat: id, user: GM })
        .await;

    // Past the 200ms readiness timeout.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(fx.feature.calls().is_empty());
}

#[tokio::test]
async fn creation_activation_skipped_when_combat_vanishes() {
    let fx = fixture();
    let id = CombatId(1);
    fx.host
        .insert_combat(combat(1, false, vec![combatant(id, 1, None)]));

    fx.coordinator
        .handle_event(HostEvent::CombatCreated { combat: id, user: GM })
        .await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    fx.host.remove_combat(id);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(fx.feature.calls().is_empty());
}

#[tokio::test]
async fn start_transition_activates_once_and_sets_flag() {
    let fx = fixture();
    let id = CombatId(1);
    fx.host
        .insert_combat(combat(1, false, vec![combatant(id, 1, Some(10))]));

    let options = start_combat(&fx, id).await;

    assert_eq!(
        fx.feature.calls(),
        vec![Call::ActivateCombat(id, Some(ActivationReason::StartCombat))]
    );
    assert_eq!(start_flag(&fx, id), Some(Value::Bool(true)));

    // Same logical transition re-delivered: the flag fences it out.
    fx.coordinator
        .handle_event(HostEvent::CombatUpdated {
            combat: id,
            change: CombatChange {
                started: Some(true),
                ..CombatChange::default()
            },
            options,
            user: GM,
        })
        .await;
    assert_eq!(fx.feature.calls().len(), 1);
}

#[tokio::test]
async fn update_without_start_transition_triggers_nothing() {
    let fx = fixture();
    let id = CombatId(1);
    fx.host
        .insert_combat(combat(1, false, vec![combatant(id, 1, Some(10))]));

    let options = OptionBag::new();
    let change = CombatChange {
        round: Some(1),
        ..CombatChange::default()
    };
    fx.coordinator
        .handle_event(HostEvent::CombatPreUpdate {
            combat: id,
            change,
            options: options.clone(),
            user: GM,
        })
        .await;
    fx.coordinator
        .handle_event(HostEvent::CombatUpdated {
            combat: id,
            change,
            options,
            user: GM,
        })
        .await;

    assert!(fx.feature.calls().is_empty());
    assert_eq!(start_flag(&fx, id), None);
}

#[tokio::test]
async fn already_started_combat_does_not_reprocess_on_unrelated_update() {
    let fx = fixture();
    let id = CombatId(1);
    fx.host
        .insert_combat(combat(1, false, vec![combatant(id, 1, Some(10))]));
    start_combat(&fx, id).await;
    assert_eq!(fx.feature.calls().len(), 1);

    // Round advance on a started combat: pre-update captures started=true,
    // so no new start transition is seen even though the flag also fences.
    let options = OptionBag::new();
    let change = CombatChange {
        round: Some(2),
        ..CombatChange::default()
    };
    fx.coordinator
        .handle_event(HostEvent::CombatPreUpdate {
            combat: id,
            change,
            options: options.clone(),
            user: GM,
        })
        .await;
    fx.coordinator
        .handle_event(HostEvent::CombatUpdated {
            combat: id,
            change,
            options,
            user: GM,
        })
        .await;

    assert_eq!(fx.feature.calls().len(), 1);
}

#[tokio::test]
async fn non_authoritative_client_never_acts() {
    let fx = fixture();
    fx.host.set_authoritative(false);
    let id = CombatId(1);
    fx.host
        .insert_combat(combat(1, false, vec![combatant(id, 1, Some(10))]));

    fx.coordinator
        .handle_event(HostEvent::CombatCreated { combat: id, user: GM })
        .await;
    let options = start_combat(&fx, id).await;

    // Pre-update capture is also gated on authority.
    assert_eq!(
        options.get_bool(&format!(
            "{}.combatStarted",
            CoordinatorConfig::DEFAULT_NAMESPACE
        )),
        None
    );

    fx.coordinator
        .handle_event(HostEvent::CombatantCreated {
            combatant: combatant(id, 2, Some(11)),
            user: GM,
        })
        .await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(fx.feature.calls().is_empty());
    assert_eq!(start_flag(&fx, id), None);
}

#[tokio::test]
async fn disabled_feature_triggers_nothing() {
    let fx = fixture();
    fx.host.set_enabled(SETTING, false);
    let id = CombatId(1);
    fx.host
        .insert_combat(combat(1, false, vec![combatant(id, 1, Some(10))]));

    fx.coordinator
        .handle_event(HostEvent::CombatCreated { combat: id, user: GM })
        .await;
    start_combat(&fx, id).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(fx.feature.calls().is_empty());
    // With no feature to run, the start flag stays unset as well.
    assert_eq!(start_flag(&fx, id), None);
}

#[tokio::test]
async fn deletion_runs_deactivation_exactly_once() {
    let fx = fixture();
    let id = CombatId(1);
    fx.host
        .insert_combat(combat(1, false, vec![combatant(id, 1, Some(10))]));
    start_combat(&fx, id).await;

    let snapshot = fx.host.remove_combat(id).expect("combat existed");
    fx.coordinator
        .handle_event(HostEvent::CombatDeleted {
            combat: snapshot,
            user: GM,
        })
        .await;

    let calls = fx.feature.calls();
    assert_eq!(
        calls.last(),
        Some(&Call::DeactivateCombat(id, Some(ActivationReason::EndCombat)))
    );
    assert_eq!(
        calls
            .iter()
            .filter(|c| matches!(c, Call::DeactivateCombat(..)))
            .count(),
        1
    );
}

#[tokio::test]
async fn combatant_joining_started_combat_gets_scoped_activation() {
    let fx = fixture();
    let id = CombatId(1);
    fx.host
        .insert_combat(combat(1, true, vec![combatant(id, 1, Some(10))]));

    let joiner = combatant(id, 2, Some(11));
    fx.host.upsert_combatant(joiner.clone());
    fx.coordinator
        .handle_event(HostEvent::CombatantCreated {
            combatant: joiner,
            user: GM,
        })
        .await;

    assert_eq!(
        fx.feature.calls(),
        vec![Call::ActivateCombatant(
            id,
            CombatantId(2),
            Some(ActivationReason::EnterCombat)
        )]
    );
}

#[tokio::test]
async fn combatant_joining_unstarted_combat_triggers_nothing() {
    let fx = fixture();
    let id = CombatId(1);
    fx.host
        .insert_combat(combat(1, false, vec![combatant(id, 1, Some(10))]));

    let joiner = combatant(id, 2, Some(11));
    fx.host.upsert_combatant(joiner.clone());
    fx.coordinator
        .handle_event(HostEvent::CombatantCreated {
            combatant: joiner,
            user: GM,
        })
        .await;

    assert!(fx.feature.calls().is_empty());
}

#[tokio::test]
async fn combatant_leaving_started_combat_gets_scoped_deactivation() {
    let fx = fixture();
    let id = CombatId(1);
    fx.host.insert_combat(combat(
        1,
        true,
        vec![combatant(id, 1, Some(10)), combatant(id, 2, Some(11))],
    ));

    let leaver = fx
        .host
        .remove_combatant(id, CombatantId(2))
        .expect("combatant existed");
    fx.coordinator
        .handle_event(HostEvent::CombatantDeleted {
            combatant: leaver,
            user: GM,
        })
        .await;

    assert_eq!(
        fx.feature.calls(),
        vec![Call::DeactivateCombatant(
            id,
            CombatantId(2),
            Some(ActivationReason::ExitCombat)
        )]
    );
}

/// A feature whose activation fails must not poison the pump or stop other
/// lifecycle processing.
struct FailingFeature;

#[async_trait]
impl CombatFeature for FailingFeature {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn setting(&self) -> &'static str {
        SETTING
    }

    async fn activate_combat(
        &self,
        combat: &CombatSnapshot,
        _reason: Option<ActivationReason>,
    ) -> Result<()> {
        Err(AutomationError::CombatVanished(combat.id))
    }

    async fn deactivate_combat(
        &self,
        combat: &CombatSnapshot,
        _reason: Option<ActivationReason>,
    ) -> Result<()> {
        Err(AutomationError::CombatVanished(combat.id))
    }

    async fn activate_combatant(
        &self,
        combat: &CombatSnapshot,
        _combatant: &CombatantSnapshot,
        _reason: Option<ActivationReason>,
    ) -> Result<()> {
        Err(AutomationError::CombatVanished(combat.id))
    }

    async fn deactivate_combatant(
        &self,
        combat: &CombatSnapshot,
        _combatant: &CombatantSnapshot,
        _reason: Option<ActivationReason>,
    ) -> Result<()> {
        Err(AutomationError::CombatVanished(combat.id))
    }
}

#[tokio::test]
async fn feature_failure_is_contained_and_other_features_still_run() {
    let host = Arc::new(InMemoryHost::authoritative());
    host.set_enabled(SETTING, true);
    let recording = Arc::new(RecordingFeature::default());
    let coordinator = Coordinator::builder()
        .source(host.clone())
        .flags(host.clone())
        .settings(host.clone())
        .authority(host.clone())
        .feature(Arc::new(FailingFeature))
        .feature(recording.clone())
        .build()
        .expect("all collaborators provided");

    let id = CombatId(1);
    host.insert_combat(combat(1, false, vec![combatant(id, 1, Some(10))]));

    let options = OptionBag::new();
    let change = CombatChange {
        started: Some(true),
        ..CombatChange::default()
    };
    coordinator
        .handle_event(HostEvent::CombatPreUpdate {
            combat: id,
            change,
            options: options.clone(),
            user: GM,
        })
        .await;
    host.set_started(id, true);
    coordinator
        .handle_event(HostEvent::CombatUpdated {
            combat: id,
            change,
            options,
            user: GM,
        })
        .await;

    assert_eq!(
        recording.calls(),
        vec![Call::ActivateCombat(id, Some(ActivationReason::StartCombat))]
    );
}

#[tokio::test]
async fn worker_pumps_bus_events_into_coordinator() {
    let fx = fixture();
    let bus = EventBus::new();
    Worker::new(fx.coordinator.clone(), bus.subscribe()).spawn();

    let id = CombatId(1);
    fx.host
        .insert_combat(combat(1, false, vec![combatant(id, 1, Some(10))]));
    bus.publish(HostEvent::CombatCreated { combat: id, user: GM });

    eventually(|| fx.feature.calls() == vec![Call::ActivateCombat(id, None)]).await;
}
