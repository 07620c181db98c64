//! Cross-client execution of named rule procedures.
//!
//! Rule procedures mutate shared state, so they must run on the
//! authoritative client regardless of where they were requested. A
//! [`Relay`] runs a procedure from its registry when the local client is
//! authoritative and otherwise hands the call to the companion messaging
//! [`Transport`], whose delivery guarantees are its own.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use host_core::{Authority, HostError};

use crate::error::{AutomationError, Result};

/// A named procedure executable through the relay.
#[async_trait]
pub trait Procedure: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, payload: Value) -> Result<Value>;
}

/// Lookup table of registered procedures.
#[derive(Default)]
pub struct ProcedureRegistry {
    table: HashMap<&'static str, Arc<dyn Procedure>>,
}

impl ProcedureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a procedure under its own name, replacing any previous
    /// registration of that name.
    pub fn register(&mut self, procedure: Arc<dyn Procedure>) {
        self.table.insert(procedure.name(), procedure);
    }

    pub fn find(&self, name: &str) -> Option<&Arc<dyn Procedure>> {
        self.table.get(name)
    }

    pub async fn run(&self, name: &str, payload: Value) -> Result<Value> {
        let procedure = self
            .find(name)
            .ok_or_else(|| AutomationError::UnknownProcedure(name.to_owned()))?;
        procedure.run(payload).await
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.keys().copied()
    }
}

/// Forwarding half of the companion peer-messaging plugin.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers the call to the authoritative client and awaits its result.
    async fn forward(&self, procedure: &str, payload: Value) -> std::result::Result<Value, HostError>;
}

/// Transport for hosts running without a companion messaging plugin.
///
/// Forwarding is impossible there, so every call fails loudly instead of
/// silently dropping the request.
pub struct NullTransport;

#[async_trait]
impl Transport for NullTransport {
    async fn forward(
        &self,
        procedure: &str,
        _payload: Value,
    ) -> std::result::Result<Value, HostError> {
        Err(HostError::Transport(format!(
            "no companion transport configured, cannot forward {procedure:?}"
        )))
    }
}

/// Executes procedures locally when authoritative, remotely otherwise.
pub struct Relay {
    authority: Arc<dyn Authority>,
    registry: ProcedureRegistry,
    transport: Arc<dyn Transport>,
}

impl Relay {
    pub fn new(
        authority: Arc<dyn Authority>,
        registry: ProcedureRegistry,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            authority,
            registry,
            transport,
        }
    }

    /// Runs the named procedure on whichever client holds authority.
    ///
    /// The authority check is evaluated fresh per call, matching the
    /// coordinator's per-event check.
    pub async fn execute(&self, procedure: &str, payload: Value) -> Result<Value> {
        if self.authority.is_authoritative() {
            self.registry.run(procedure, payload).await
        } else {
            debug!(
                target: "automation::relay",
                procedure,
                "forwarding to authoritative client"
            );
            Ok(self.transport.forward(procedure, payload).await?)
        }
    }
}
