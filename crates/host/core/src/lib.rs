//! Boundary contracts between the automation plugin and its host application.
//!
//! `host-core` defines the snapshots, lifecycle events, and capability traits
//! through which the rest of the workspace observes and mutates host-owned
//! documents. The host (a virtual tabletop runtime) owns every combat, item,
//! and setting; this crate never constructs or destroys them, it only models
//! what crosses the boundary. The [`memory`] module ships an in-memory host
//! implementing every trait, reused by tests across the workspace.
pub mod combat;
pub mod error;
pub mod events;
pub mod ids;
pub mod item;
pub mod memory;
pub mod traits;

pub use combat::{CombatChange, CombatSnapshot, CombatantSnapshot};
pub use error::HostError;
pub use events::{HostEvent, OptionBag};
pub use ids::{ActorId, CombatId, CombatantId, DocumentRef, ItemId, UserId};
pub use item::{ItemChange, ItemSnapshot};
pub use memory::InMemoryHost;
pub use traits::{Authority, CombatSource, FlagStore, Notifier, SettingsStore};
