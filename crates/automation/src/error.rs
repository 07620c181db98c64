//! Unified error types surfaced by the automation crate.

use std::time::Duration;

use thiserror::Error;

use host_core::{CombatId, HostError};

pub type Result<T> = std::result::Result<T, AutomationError>;

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("combat {0} vanished while awaiting combatant readiness")]
    CombatVanished(CombatId),

    #[error("combatants of combat {combat} not ready within {timeout:?}")]
    ReadyTimeout { combat: CombatId, timeout: Duration },

    #[error("coordinator requires a {0} collaborator before building")]
    MissingCollaborator(&'static str),

    #[error("no procedure registered under {0:?}")]
    UnknownProcedure(String),

    #[error("procedure payload missing field {0:?}")]
    MalformedPayload(&'static str),

    #[error(transparent)]
    Host(#[from] HostError),
}
