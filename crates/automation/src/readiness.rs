//! Bounded wait for combatant initialization.

use tokio::time::{self, MissedTickBehavior};

use host_core::{CombatId, CombatSnapshot, CombatSource};

use crate::config::CoordinatorConfig;
use crate::error::{AutomationError, Result};

/// Polls the combat until every combatant has resolved its actor reference.
///
/// Returns the ready snapshot. Fails with [`AutomationError::ReadyTimeout`]
/// once `config.ready_timeout` elapses and with
/// [`AutomationError::CombatVanished`] if the combat is deleted mid-wait.
/// The poll timer is dropped on every exit path.
pub(crate) async fn await_combatants(
    source: &dyn CombatSource,
    combat: CombatId,
    config: &CoordinatorConfig,
) -> Result<CombatSnapshot> {
    let poll = async {
        let mut ticker = time::interval(config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            // First tick completes immediately, so an already-ready combat
            // resolves without waiting a full interval.
            ticker.tick().await;
            match source.combat(combat) {
                None => return Err(AutomationError::CombatVanished(combat)),
                Some(snapshot) if snapshot.all_ready() => return Ok(snapshot),
                Some(_) => {}
            }
        }
    };

    time::timeout(config.ready_timeout, poll)
        .await
        .map_err(|_| AutomationError::ReadyTimeout {
            combat,
            timeout: config.ready_timeout,
        })?
}
