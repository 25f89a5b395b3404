//! Bit-exact decoding and encoding of `.d2s` character saves.
//!
//! [`SaveRecord::decode`] walks the file in one pass and fails on the first
//! malformed section; [`SaveRecord::encode`] writes the same sections back
//! and patches the header's file size and checksum.

pub mod bits;
pub mod error;
pub mod layout;
pub mod options;
pub mod pool;
pub mod save;

pub use bits::{BitReader, BitSet, BitWriter};
pub use error::{Error, Result};
pub use layout::{BitRange, FileLayout, SectionId, SectionLayout};
pub use options::DecodeOptions;
pub use pool::{BufferPool, PooledBuffer};
pub use save::SaveRecord;
pub use save::attributes::{Attribute, Attributes};
pub use save::header::{Header, checksum};
pub use save::items::{Corpse, CorpseList, Golem, ItemList, MercenaryItemList};
pub use save::preview::{ItemQuality, PreviewData, PreviewItem};
pub use save::sections::{
    Appearance, Appearances, ClassSkills, Location, Locations, Mercenary, NpcDialog,
    QuestDifficulty, Quests, Skill, WaypointDifficulty, Waypoints,
};
pub use save::status::Status;
pub use save::types::CharacterClass;
