//! Rule procedures and plugin assembly.
//!
//! This crate supplies the concrete automations the coordinator drives
//! (opportunity-attack tracking and the item-identification restriction)
//! plus a [`Plugin`] builder that wires them to a host: declare settings,
//! register relay procedures, build the coordinator, and hand back the
//! event bus the host adapter publishes into.
pub mod identify;
pub mod opportunity;
pub mod plugin;
pub mod procedures;
pub mod settings;

pub use identify::{IdentifyGuard, UpdateVerdict};
pub use opportunity::OpportunityAttack;
pub use plugin::{Plugin, PluginBuilder};
pub use settings::{SETTINGS, SettingDescriptor, SettingKind};
