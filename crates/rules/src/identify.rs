//! Item-identification restriction.
//!
//! Players can try to flip an item's `identified` flag from their own
//! clients; when the restriction is enabled, only the authoritative client
//! may do so. The guard is consulted by the host adapter inside the item
//! pre-update hook, where returning a blocking verdict cancels the mutation.

use std::sync::Arc;

use tracing::debug;

use host_core::{Authority, ItemChange, ItemSnapshot, Notifier, SettingsStore, UserId};

/// Settings toggle gating the restriction.
pub const IDENTIFY_RESTRICTION_SETTING: &str = "restrictItemIdentification";

/// Settings key for the message shown on a blocked attempt.
pub const IDENTIFY_MESSAGE_SETTING: &str = "itemIdentificationMessage";

const DEFAULT_MESSAGE: &str = "Only the game master can identify items.";

/// Outcome of reviewing a pending item update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub enum UpdateVerdict {
    /// Let the host apply the mutation.
    Allow,
    /// Cancel the mutation; the user has already been notified.
    Block,
}

impl UpdateVerdict {
    pub fn is_blocked(self) -> bool {
        self == UpdateVerdict::Block
    }
}

/// Pre-update guard for the identification restriction.
pub struct IdentifyGuard {
    settings: Arc<dyn SettingsStore>,
    authority: Arc<dyn Authority>,
    notifier: Arc<dyn Notifier>,
}

impl IdentifyGuard {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        authority: Arc<dyn Authority>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            authority,
            notifier,
        }
    }

    /// Reviews a pending item update on the client that initiated it.
    ///
    /// Blocks only a fresh identification attempt from a non-authoritative
    /// client while the restriction is enabled; everything else passes
    /// through untouched. Blocking shows the configured message once.
    pub fn review(&self, item: &ItemSnapshot, change: &ItemChange, user: UserId) -> UpdateVerdict {
        if change.identified != Some(true) || item.identified {
            return UpdateVerdict::Allow;
        }
        if !self.settings.enabled(IDENTIFY_RESTRICTION_SETTING) {
            return UpdateVerdict::Allow;
        }
        if self.authority.is_authoritative() {
            return UpdateVerdict::Allow;
        }

        let message = self
            .settings
            .text(IDENTIFY_MESSAGE_SETTING)
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_owned());
        self.notifier.warn(&message);
        debug!(
            target: "rules::identify",
            item = %item.id,
            %user,
            "blocked identification attempt"
        );
        UpdateVerdict::Block
    }
}
