//! Event-driven activation coordination for per-combat automation features.
//!
//! This crate turns host lifecycle events into exactly-once activation and
//! deactivation of combat features, delegated to the single authoritative
//! client among all connected observers. Consumers build a [`Coordinator`]
//! with their host collaborators, publish [`host_core::HostEvent`]s on an
//! [`EventBus`], and let a [`Worker`] pump them through.
//!
//! Modules are organized by responsibility:
//! - [`coordinator`] hosts the activation coordinator and its builder
//! - [`feature`] defines the trait activation procedures implement
//! - [`bus`] and [`worker`] move events from the host into the coordinator
//! - [`relay`] executes named procedures on the authoritative client
pub mod bus;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod feature;
pub mod relay;
pub mod worker;

mod readiness;

pub use bus::EventBus;
pub use config::CoordinatorConfig;
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use error::{AutomationError, Result};
pub use feature::{ActivationReason, CombatFeature};
pub use relay::{NullTransport, Procedure, ProcedureRegistry, Relay, Transport};
pub use worker::Worker;
