use serde::Serialize;

use crate::bits::{BitReader, BitSet, BitWriter};
use crate::error::{Error, Result};

use super::types::{
    APPEARANCE_SLOT_NAMES, APPEARANCE_SLOTS, CLASS_SKILL_COUNT, CLASS_SKILLS_MARKER,
    CharacterClass, DIFFICULTY_COUNT, DIFFICULTY_NAMES, NPC_MARKER, NPC_SIZE,
    QUEST_WORDS_PER_DIFFICULTY, QUESTS_MARKER, QUESTS_SIZE, QUESTS_VERSION, WAYPOINT_BITS,
    WAYPOINT_DIFFICULTY_MARKER, WAYPOINT_RESERVED_LEN, WAYPOINTS_MARKER, WAYPOINTS_SIZE,
    WAYPOINTS_VERSION, serialize_array,
};

/// Consume a section marker, failing if the bytes differ.
pub(crate) fn expect_marker(
    r: &mut BitReader<'_>,
    section: &'static str,
    marker: &'static [u8],
) -> Result<()> {
    let found = r.read_bytes(marker.len())?;
    if found != marker {
        return Err(Error::InvalidSectionHeader {
            section,
            expected: marker,
            found,
        });
    }
    Ok(())
}

// --- Skills (0x38 assigned, 0x78 quick slots) ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Skill {
    pub id: u32,
}

impl Skill {
    /// Marker the game writes into an empty hotkey slot.
    pub const UNASSIGNED: u32 = 0xFFFF;

    pub fn read(r: &mut BitReader<'_>) -> Result<Self> {
        Ok(Self { id: r.read_u32()? })
    }

    pub fn write(&self, w: &mut BitWriter) {
        w.write_u32(self.id);
    }

    pub fn unassigned() -> Self {
        Self {
            id: Self::UNASSIGNED,
        }
    }
}

// --- Appearances (0x88, 32 bytes) ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Appearance {
    pub graphic: u8,
    pub tint: u8,
}

/// Character-menu look: all 16 graphic bytes come first, then the 16 tints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Appearances {
    pub slots: [Appearance; APPEARANCE_SLOTS],
}

impl Appearances {
    pub fn read(r: &mut BitReader<'_>) -> Result<Self> {
        let graphics = r.read_array::<APPEARANCE_SLOTS>()?;
        let tints = r.read_array::<APPEARANCE_SLOTS>()?;
        let mut slots = [Appearance::default(); APPEARANCE_SLOTS];
        for (i, slot) in slots.iter_mut().enumerate() {
            *slot = Appearance {
                graphic: graphics[i],
                tint: tints[i],
            };
        }
        Ok(Self { slots })
    }

    pub fn write(&self, w: &mut BitWriter) {
        for slot in &self.slots {
            w.write_u8(slot.graphic);
        }
        for slot in &self.slots {
            w.write_u8(slot.tint);
        }
    }

    pub fn named(&self) -> impl Iterator<Item = (&'static str, Appearance)> + '_ {
        APPEARANCE_SLOT_NAMES.iter().copied().zip(self.slots.iter().copied())
    }
}

// --- Location (0xA8, one byte per difficulty) ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Location(pub u8);

impl Location {
    pub fn is_active(&self) -> bool {
        self.0 & 0x80 != 0
    }

    /// Zero-based act index.
    pub fn act(&self) -> u8 {
        self.0 & 0x07
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Locations {
    pub normal: Location,
    pub nightmare: Location,
    pub hell: Location,
}

impl Locations {
    pub fn read(r: &mut BitReader<'_>) -> Result<Self> {
        Ok(Self {
            normal: Location(r.read_u8()?),
            nightmare: Location(r.read_u8()?),
            hell: Location(r.read_u8()?),
        })
    }

    pub fn write(&self, w: &mut BitWriter) {
        w.write_u8(self.normal.0);
        w.write_u8(self.nightmare.0);
        w.write_u8(self.hell.0);
    }

    /// Name of the difficulty the character was last playing, if any is flagged.
    pub fn active_difficulty(&self) -> Option<&'static str> {
        [self.normal, self.nightmare, self.hell]
            .iter()
            .position(Location::is_active)
            .map(|i| DIFFICULTY_NAMES[i])
    }
}

// --- Mercenary (0xAF, 16 bytes) ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Mercenary {
    pub reserved: u16,
    /// At 0xB1.
    pub is_dead: u16,
    pub id: u32,
    pub name_id: u16,
    pub type_id: u16,
    pub experience: u32,
}

impl Mercenary {
    pub fn read(r: &mut BitReader<'_>) -> Result<Self> {
        Ok(Self {
            reserved: r.read_u16()?,
            is_dead: r.read_u16()?,
            id: r.read_u32()?,
            name_id: r.read_u16()?,
            type_id: r.read_u16()?,
            experience: r.read_u32()?,
        })
    }

    pub fn write(&self, w: &mut BitWriter) {
        w.write_u16(self.reserved);
        w.write_u16(self.is_dead);
        w.write_u32(self.id);
        w.write_u16(self.name_id);
        w.write_u16(self.type_id);
        w.write_u32(self.experience);
    }

    pub fn is_hired(&self) -> bool {
        self.id != 0
    }
}

// --- Quests (0x14F, 298 bytes) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestDifficulty {
    #[serde(serialize_with = "serialize_array")]
    pub words: [u16; QUEST_WORDS_PER_DIFFICULTY],
}

impl Default for QuestDifficulty {
    fn default() -> Self {
        Self {
            words: [0; QUEST_WORDS_PER_DIFFICULTY],
        }
    }
}

impl QuestDifficulty {
    /// Bit 0 of a quest word marks the quest complete.
    pub fn is_completed(&self, word: usize) -> bool {
        self.words.get(word).is_some_and(|w| w & 1 != 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quests {
    pub version: u32,
    pub size: u16,
    pub difficulties: [QuestDifficulty; DIFFICULTY_COUNT],
}

impl Default for Quests {
    fn default() -> Self {
        Self {
            version: QUESTS_VERSION,
            size: QUESTS_SIZE,
            difficulties: Default::default(),
        }
    }
}

impl Quests {
    pub fn read(r: &mut BitReader<'_>) -> Result<Self> {
        expect_marker(r, "quests", QUESTS_MARKER)?;
        let version = r.read_u32()?;
        let size = r.read_u16()?;
        let mut difficulties = [QuestDifficulty::default(); DIFFICULTY_COUNT];
        for difficulty in &mut difficulties {
            for word in &mut difficulty.words {
                *word = r.read_u16()?;
            }
        }
        Ok(Self {
            version,
            size,
            difficulties,
        })
    }

    pub fn write(&self, w: &mut BitWriter) {
        w.write_bytes(QUESTS_MARKER);
        w.write_u32(self.version);
        w.write_u16(self.size);
        for difficulty in &self.difficulties {
            for &word in &difficulty.words {
                w.write_u16(word);
            }
        }
    }
}

// --- Waypoints (0x279, 80 bytes) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaypointDifficulty {
    pub marker: u16,
    pub activated: BitSet,
    #[serde(skip)]
    pub reserved: [u8; WAYPOINT_RESERVED_LEN],
}

impl Default for WaypointDifficulty {
    fn default() -> Self {
        Self {
            marker: WAYPOINT_DIFFICULTY_MARKER,
            activated: BitSet::new(WAYPOINT_BITS),
            reserved: [0; WAYPOINT_RESERVED_LEN],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Waypoints {
    pub version: u32,
    pub size: u16,
    pub difficulties: [WaypointDifficulty; DIFFICULTY_COUNT],
}

impl Default for Waypoints {
    fn default() -> Self {
        Self {
            version: WAYPOINTS_VERSION,
            size: WAYPOINTS_SIZE,
            difficulties: Default::default(),
        }
    }
}

impl Waypoints {
    pub fn read(r: &mut BitReader<'_>) -> Result<Self> {
        expect_marker(r, "waypoints", WAYPOINTS_MARKER)?;
        let version = r.read_u32()?;
        let size = r.read_u16()?;
        let mut difficulties = [WaypointDifficulty::default(); DIFFICULTY_COUNT];
        for difficulty in &mut difficulties {
            difficulty.marker = r.read_u16()?;
            difficulty.activated = r.read_bit_set(WAYPOINT_BITS)?;
            difficulty.reserved = r.read_array::<WAYPOINT_RESERVED_LEN>()?;
        }
        Ok(Self {
            version,
            size,
            difficulties,
        })
    }

    pub fn write(&self, w: &mut BitWriter) {
        w.write_bytes(WAYPOINTS_MARKER);
        w.write_u32(self.version);
        w.write_u16(self.size);
        for difficulty in &self.difficulties {
            w.write_u16(difficulty.marker);
            w.write_bit_set(&difficulty.activated);
            w.write_bytes(&difficulty.reserved);
        }
    }
}

// --- NPC dialog (0x2C9, 52 bytes) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NpcDialog {
    pub size: u16,
    pub introductions: [u64; DIFFICULTY_COUNT],
    pub congratulations: [u64; DIFFICULTY_COUNT],
}

impl Default for NpcDialog {
    fn default() -> Self {
        Self {
            size: NPC_SIZE,
            introductions: [0; DIFFICULTY_COUNT],
            congratulations: [0; DIFFICULTY_COUNT],
        }
    }
}

impl NpcDialog {
    pub fn read(r: &mut BitReader<'_>) -> Result<Self> {
        expect_marker(r, "npc dialog", NPC_MARKER)?;
        let size = r.read_u16()?;
        let mut introductions = [0u64; DIFFICULTY_COUNT];
        for flags in &mut introductions {
            *flags = r.read_u64()?;
        }
        let mut congratulations = [0u64; DIFFICULTY_COUNT];
        for flags in &mut congratulations {
            *flags = r.read_u64()?;
        }
        Ok(Self {
            size,
            introductions,
            congratulations,
        })
    }

    pub fn write(&self, w: &mut BitWriter) {
        w.write_bytes(NPC_MARKER);
        w.write_u16(self.size);
        for &flags in &self.introductions {
            w.write_u64(flags);
        }
        for &flags in &self.congratulations {
            w.write_u64(flags);
        }
    }
}

// --- Class skills (after attributes, 32 bytes) ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClassSkills {
    pub class: u8,
    pub levels: [u8; CLASS_SKILL_COUNT],
}

impl ClassSkills {
    pub fn new(class: CharacterClass) -> Self {
        Self {
            class: class.raw(),
            levels: [0; CLASS_SKILL_COUNT],
        }
    }

    /// The tree layout follows the class id decoded at 0x28.
    pub fn read(r: &mut BitReader<'_>, class_id: u8) -> Result<Self> {
        expect_marker(r, "class skills", CLASS_SKILLS_MARKER)?;
        Ok(Self {
            class: class_id,
            levels: r.read_array::<CLASS_SKILL_COUNT>()?,
        })
    }

    pub fn write(&self, w: &mut BitWriter) {
        w.write_bytes(CLASS_SKILLS_MARKER);
        w.write_bytes(&self.levels);
    }

    /// Global skill id of tree slot `index`, when the class is known.
    pub fn skill_id(&self, index: usize) -> Option<u16> {
        if index >= CLASS_SKILL_COUNT {
            return None;
        }
        CharacterClass::from_raw(self.class)
            .first_skill_id()
            .map(|first| first + index as u16)
    }

    /// Hard points in the skill with global id `skill_id`.
    pub fn level_of(&self, skill_id: u16) -> Option<u8> {
        let first = CharacterClass::from_raw(self.class).first_skill_id()?;
        let index = usize::from(skill_id.checked_sub(first)?);
        self.levels.get(index).copied()
    }
}
