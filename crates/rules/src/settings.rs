//! Settings this plugin asks the host to register.
//!
//! The host owns settings storage and rendering; the plugin only declares
//! what exists. A host adapter walks these descriptors during init and
//! registers each with its own settings API.

use crate::identify::{IDENTIFY_MESSAGE_SETTING, IDENTIFY_RESTRICTION_SETTING};
use crate::opportunity::OPPORTUNITY_ATTACK_SETTING;

/// One registrable plugin setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SettingDescriptor {
    pub key: &'static str,
    /// Human-readable label shown in the host's configuration UI.
    pub name: &'static str,
    pub hint: &'static str,
    pub kind: SettingKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingKind {
    /// Boolean feature switch with the given default.
    Toggle { default: bool },
    /// Free-text value with the given default.
    Text { default: &'static str },
}

pub const SETTINGS: &[SettingDescriptor] = &[
    SettingDescriptor {
        key: OPPORTUNITY_ATTACK_SETTING,
        name: "Enable Opportunity Attack",
        hint: "Automatically track opportunity attacks for combatants in active encounters.",
        kind: SettingKind::Toggle { default: false },
    },
    SettingDescriptor {
        key: IDENTIFY_RESTRICTION_SETTING,
        name: "Restrict Item Identification",
        hint: "Only the game master may mark items as identified.",
        kind: SettingKind::Toggle { default: false },
    },
    SettingDescriptor {
        key: IDENTIFY_MESSAGE_SETTING,
        name: "Identification Restriction Message",
        hint: "Shown to players whose identification attempt was blocked.",
        kind: SettingKind::Text {
            default: "Only the game master can identify items.",
        },
    },
];
