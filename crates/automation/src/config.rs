//! Coordinator configuration and tunable defaults.

use std::time::Duration;

/// Tunable parameters for the activation coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Namespace under which the plugin writes flags and option-bag keys.
    pub namespace: String,
    /// How often the readiness barrier re-checks combatant initialization.
    pub poll_interval: Duration,
    /// Upper bound on the readiness wait before it fails with a timeout.
    pub ready_timeout: Duration,
    /// Capacity of the host event channel.
    pub event_capacity: usize,
}

impl CoordinatorConfig {
    pub const DEFAULT_NAMESPACE: &'static str = "arbiter";
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
    pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_EVENT_CAPACITY: usize = 100;

    pub fn new() -> Self {
        Self {
            namespace: Self::DEFAULT_NAMESPACE.to_owned(),
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            ready_timeout: Self::DEFAULT_READY_TIMEOUT,
            event_capacity: Self::DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self::new()
    }
}
