//! Capability traits the host (or a fixture standing in for it) provides.
//!
//! Everything the plugin needs from its surroundings is injected through
//! these objects at construction time; nothing reads ambient globals. Each
//! trait is deliberately narrow so tests can substitute a single concern.

use async_trait::async_trait;
use serde_json::Value;

use crate::combat::CombatSnapshot;
use crate::error::HostError;
use crate::ids::{CombatId, DocumentRef};

/// Fresh lookups of live combat documents.
///
/// Implementations return the current state on every call; callers that poll
/// (the readiness barrier) rely on not getting a stale snapshot back.
pub trait CombatSource: Send + Sync {
    /// Returns the combat's current snapshot, or `None` once deleted.
    fn combat(&self, id: CombatId) -> Option<CombatSnapshot>;
}

/// Namespaced key/value flags persisted on host documents.
///
/// Flags are the plugin's only persistence surface. Writes go through the
/// host and may suspend; reads may too, since the host can lazily load the
/// owning document.
#[async_trait]
pub trait FlagStore: Send + Sync {
    async fn get_flag(
        &self,
        doc: DocumentRef,
        namespace: &str,
        key: &str,
    ) -> Result<Option<Value>, HostError>;

    async fn set_flag(
        &self,
        doc: DocumentRef,
        namespace: &str,
        key: &str,
        value: Value,
    ) -> Result<(), HostError>;
}

/// Synchronous access to the host's configured plugin settings.
pub trait SettingsStore: Send + Sync {
    /// Boolean feature toggle; unset keys read as disabled.
    fn enabled(&self, key: &str) -> bool;

    /// Free-text setting, e.g. a configured user-facing message.
    fn text(&self, key: &str) -> Option<String>;
}

/// Whether this client is the authoritative actor.
///
/// Exactly one connected client (the game master's) holds the role at a
/// time; the host guarantees that, not this crate. The check is evaluated
/// fresh on every event, never cached.
pub trait Authority: Send + Sync {
    fn is_authoritative(&self) -> bool;
}

/// User-facing notifications.
pub trait Notifier: Send + Sync {
    fn warn(&self, message: &str);
}
