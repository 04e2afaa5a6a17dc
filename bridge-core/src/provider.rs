//! Narrow capabilities the host game exposes to the bridge.
//!
//! The host owns every object behind these traits; the bridge only reads
//! world state through [`EntityProvider`], issues ordinal game commands
//! through [`CommandSink`], and drives the pointer through [`InputDriver`].

use core::fmt;

use crate::geometry::{Position, ScreenPoint, ScreenRect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerState {
    pub position: Option<Position>,
    pub animation: i32,
    pub pose_animation: i32,
    pub health_ratio: i32,
    pub health_scale: i32,
}

/// Interaction verbs an entity offers, one per ordinal slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NpcComposition {
    pub actions: Vec<Option<String>>,
}

impl NpcComposition {
    pub fn with_actions<'a>(actions: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        Self {
            actions: actions
                .into_iter()
                .map(|action| action.map(str::to_string))
                .collect(),
        }
    }
}

/// Read-only view of one host entity at the moment it was enumerated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NpcView {
    /// Host slot, used to address ordinal commands.
    pub index: u32,
    /// Entity type id, reported in telemetry and matched by explicit requests.
    pub id: i32,
    pub name: Option<String>,
    pub position: Option<Position>,
    pub composition: Option<NpcComposition>,
    /// Overridden composition, preferred over `composition` when present.
    pub transformed: Option<NpcComposition>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NpcOption {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
}

impl NpcOption {
    /// Maps a verb slot to its ordinal command; slots past the last collapse
    /// onto `Fifth`.
    pub fn from_slot(slot: usize) -> Self {
        match slot {
            0 => Self::First,
            1 => Self::Second,
            2 => Self::Third,
            3 => Self::Fourth,
            _ => Self::Fifth,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::First => "npc_first_option",
            Self::Second => "npc_second_option",
            Self::Third => "npc_third_option",
            Self::Fourth => "npc_fourth_option",
            Self::Fifth => "npc_fifth_option",
        }
    }
}

impl fmt::Display for NpcOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuCommand {
    pub option: NpcOption,
    pub npc_index: u32,
    pub verb: String,
    pub target_name: String,
}

pub trait EntityProvider: Send + Sync {
    fn is_logged_in(&self) -> bool;

    fn tick_count(&self) -> u32;

    fn local_player(&self) -> Option<PlayerState>;

    fn npcs(&self) -> Vec<NpcView>;

    /// Bounds of the entity's on-screen hull, if the host can project it.
    fn npc_screen_bounds(&self, index: u32) -> Option<ScreenRect>;

    /// Screen location of the game canvas' top-left corner.
    fn canvas_origin(&self) -> Option<ScreenPoint>;
}

pub trait CommandSink: Send + Sync {
    fn menu_action(&self, command: MenuCommand);
}

/// A host that can be both queried and commanded.
pub trait GameHost: EntityProvider + CommandSink {}

impl<T: EntityProvider + CommandSink + ?Sized> GameHost for T {}

/// Synthetic pointer input, in screen coordinates.
pub trait InputDriver: Send + Sync {
    fn pointer_position(&self) -> Option<ScreenPoint>;

    fn move_pointer(&self, point: ScreenPoint);

    fn press_primary(&self);

    fn release_primary(&self);
}
