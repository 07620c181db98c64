//! Item snapshots for the identification restriction.

use serde::{Deserialize, Serialize};

use crate::ids::ItemId;

/// Point-in-time copy of an item document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub name: String,
    /// Whether the item's true nature has been revealed to players.
    pub identified: bool,
}

/// Fields a pending item update would touch.
///
/// Delivered to pre-update guards before the host applies the mutation, so a
/// guard can veto it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChange {
    pub identified: Option<bool>,
    pub name: Option<String>,
}
