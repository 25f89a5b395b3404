use std::fmt;

use serde::{Serialize, Serializer};

// Header
pub const SIGNATURE: u32 = 0xAA55_AA55;
pub const HEADER_SIZE: usize = 16;
pub const FILE_SIZE_OFFSET: usize = 8;
pub const CHECKSUM_OFFSET: usize = 12;

// Known format versions
pub const VERSION_1_00: u32 = 0x47;
pub const VERSION_1_07: u32 = 0x57;
pub const VERSION_1_08: u32 = 0x59;
pub const VERSION_1_09: u32 = 0x5C;
pub const VERSION_1_10: u32 = 0x60;
pub const VERSION_RESURRECTED: u32 = 0x61;
pub const VERSION_RESURRECTED_2_4: u32 = 0x62;
pub const VERSION_RESURRECTED_2_5: u32 = 0x63;
pub const KNOWN_VERSIONS: [u32; 8] = [
    VERSION_1_00,
    VERSION_1_07,
    VERSION_1_08,
    VERSION_1_09,
    VERSION_1_10,
    VERSION_RESURRECTED,
    VERSION_RESURRECTED_2_4,
    VERSION_RESURRECTED_2_5,
];

// Fixed-width fields
pub const NAME_WIDTH: usize = 16;
pub const PREVIEW_NAME_WIDTH: usize = 64;
pub const ASSIGNED_SKILL_COUNT: usize = 16;
pub const APPEARANCE_SLOTS: usize = 16;
pub const DIFFICULTY_COUNT: usize = 3;
pub const QUEST_WORDS_PER_DIFFICULTY: usize = 48;
pub const WAYPOINT_BITS: u32 = 40;
pub const WAYPOINT_RESERVED_LEN: usize = 17;
pub const CLASS_SKILL_COUNT: usize = 30;

// Reserved runs written when a record was built rather than decoded
pub const DEFAULT_RESERVED_A: [u8; 2] = [0x00, 0x00];
pub const DEFAULT_RESERVED_B: [u8; 2] = [0x10, 0x1E];

// Section markers
pub const QUESTS_MARKER: &[u8] = b"Woo!";
pub const WAYPOINTS_MARKER: &[u8] = b"WS";
pub const NPC_MARKER: &[u8] = b"w4";
pub const ATTRIBUTES_MARKER: &[u8] = b"gf";
pub const CLASS_SKILLS_MARKER: &[u8] = b"if";
pub const ITEM_LIST_MARKER: &[u8] = b"JM";
pub const MERCENARY_MARKER: &[u8] = b"jf";
pub const GOLEM_MARKER: &[u8] = b"kf";

// Section sizes as recorded in their own headers
pub const QUESTS_VERSION: u32 = 6;
pub const QUESTS_SIZE: u16 = 298;
pub const WAYPOINTS_VERSION: u32 = 1;
pub const WAYPOINTS_SIZE: u16 = 80;
pub const WAYPOINT_DIFFICULTY_MARKER: u16 = 0x0102;
pub const NPC_SIZE: u16 = 52;

pub const DIFFICULTY_NAMES: [&str; DIFFICULTY_COUNT] = ["Normal", "Nightmare", "Hell"];

pub const APPEARANCE_SLOT_NAMES: [&str; APPEARANCE_SLOTS] = [
    "Head",
    "Torso",
    "Legs",
    "Right Arm",
    "Left Arm",
    "Right Hand",
    "Left Hand",
    "Shield",
    "Special 1",
    "Special 2",
    "Special 3",
    "Special 4",
    "Special 5",
    "Special 6",
    "Special 7",
    "Special 8",
];

/// Versions whose item lists this crate can delimit.
pub fn supports_item_lists(version: u32) -> bool {
    (VERSION_RESURRECTED..=VERSION_RESURRECTED_2_5).contains(&version)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CharacterClass {
    Amazon,
    Sorceress,
    Necromancer,
    Paladin,
    Barbarian,
    Druid,
    Assassin,
    Unknown(u8),
}

impl CharacterClass {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Amazon,
            1 => Self::Sorceress,
            2 => Self::Necromancer,
            3 => Self::Paladin,
            4 => Self::Barbarian,
            5 => Self::Druid,
            6 => Self::Assassin,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u8 {
        match *self {
            Self::Amazon => 0,
            Self::Sorceress => 1,
            Self::Necromancer => 2,
            Self::Paladin => 3,
            Self::Barbarian => 4,
            Self::Druid => 5,
            Self::Assassin => 6,
            Self::Unknown(other) => other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Amazon => "Amazon",
            Self::Sorceress => "Sorceress",
            Self::Necromancer => "Necromancer",
            Self::Paladin => "Paladin",
            Self::Barbarian => "Barbarian",
            Self::Druid => "Druid",
            Self::Assassin => "Assassin",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// Skill id of the first entry in this class's 30-skill tree.
    pub fn first_skill_id(&self) -> Option<u16> {
        match *self {
            Self::Amazon => Some(6),
            Self::Sorceress => Some(36),
            Self::Necromancer => Some(66),
            Self::Paladin => Some(96),
            Self::Barbarian => Some(126),
            Self::Druid => Some(221),
            Self::Assassin => Some(251),
            Self::Unknown(_) => None,
        }
    }

    /// Druid and Assassin only exist in expansion saves.
    pub fn requires_expansion(&self) -> bool {
        matches!(self, Self::Druid | Self::Assassin)
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Unknown(v) => write!(f, "Unknown ({})", v),
            _ => f.write_str(self.as_str()),
        }
    }
}

// serde only derives arrays up to 32 elements.
pub(crate) fn serialize_array<S, T, const N: usize>(
    values: &[T; N],
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    values.as_slice().serialize(serializer)
}

pub(crate) fn serialize_hex<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(bytes))
}
