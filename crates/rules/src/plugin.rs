//! Plugin assembly.
//!
//! Wires the host collaborators into a ready-to-run plugin: the
//! opportunity-attack feature behind its coordinator, the relay with its
//! registered procedures, and the identification guard. The host adapter
//! publishes lifecycle events on [`Plugin::bus`] and consults
//! [`Plugin::identify_guard`] from its item pre-update hook.

use std::sync::Arc;

use tokio::task::JoinHandle;

use automation::{
    AutomationError, Coordinator, CoordinatorConfig, EventBus, NullTransport, ProcedureRegistry,
    Relay, Result, Transport, Worker,
};
use host_core::{Authority, CombatSource, FlagStore, Notifier, SettingsStore};

use crate::identify::IdentifyGuard;
use crate::opportunity::OpportunityAttack;
use crate::procedures::{DisableOpportunityAttack, EnableOpportunityAttack};

/// Assembled plugin, ready to be attached to a host adapter.
pub struct Plugin {
    coordinator: Coordinator,
    bus: EventBus,
    relay: Arc<Relay>,
    identify_guard: IdentifyGuard,
}

impl Plugin {
    pub fn builder() -> PluginBuilder {
        PluginBuilder::new()
    }

    /// Event channel the host adapter publishes lifecycle events into.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }

    pub fn identify_guard(&self) -> &IdentifyGuard {
        &self.identify_guard
    }

    /// Spawns the event pump on the current tokio runtime.
    pub fn spawn_worker(&self) -> JoinHandle<()> {
        Worker::new(self.coordinator.clone(), self.bus.subscribe()).spawn()
    }
}

/// Builder collecting the host collaborators a [`Plugin`] needs.
pub struct PluginBuilder {
    config: CoordinatorConfig,
    source: Option<Arc<dyn CombatSource>>,
    flags: Option<Arc<dyn FlagStore>>,
    settings: Option<Arc<dyn SettingsStore>>,
    authority: Option<Arc<dyn Authority>>,
    notifier: Option<Arc<dyn Notifier>>,
    transport: Option<Arc<dyn Transport>>,
}

impl PluginBuilder {
    fn new() -> Self {
        Self {
            config: CoordinatorConfig::default(),
            source: None,
            flags: None,
            settings: None,
            authority: None,
            notifier: None,
            transport: None,
        }
    }

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

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Companion messaging transport; defaults to [`NullTransport`] when the
    /// host runs without one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<Plugin> {
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
        let notifier = self
            .notifier
            .ok_or(AutomationError::MissingCollaborator("notifier"))?;
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(NullTransport));

        let feature = Arc::new(OpportunityAttack::new(
            self.config.namespace.clone(),
            flags.clone(),
        ));

        let mut registry = ProcedureRegistry::new();
        registry.register(Arc::new(EnableOpportunityAttack::new(
            source.clone(),
            feature.clone(),
        )));
        registry.register(Arc::new(DisableOpportunityAttack::new(
            source.clone(),
            feature.clone(),
        )));
        let relay = Arc::new(Relay::new(authority.clone(), registry, transport));

        let coordinator = Coordinator::builder()
            .config(self.config.clone())
            .source(source)
            .flags(flags)
            .settings(settings.clone())
            .authority(authority.clone())
            .feature(feature)
            .build()?;

        let bus = EventBus::with_capacity(self.config.event_capacity);
        let identify_guard = IdentifyGuard::new(settings, authority, notifier);

        Ok(Plugin {
            coordinator,
            bus,
            relay,
            identify_guard,
        })
    }
}
