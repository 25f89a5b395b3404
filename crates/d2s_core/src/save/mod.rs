pub mod attributes;
pub mod header;
pub mod items;
pub mod preview;
pub mod sections;
pub mod status;
pub mod types;

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result};
use crate::layout::{BitRange, FileLayout, SectionId, SectionLayout};
use crate::options::DecodeOptions;
use crate::pool::{BufferPool, PooledBuffer};
use attributes::Attributes;
use header::Header;
use items::{Boundary, CorpseList, Golem, ItemContext, ItemList, MercenaryItemList};
use preview::PreviewData;
use sections::{
    Appearances, ClassSkills, Location, Locations, Mercenary, NpcDialog, Quests, Skill, Waypoints,
};
use status::Status;
use types::{
    ASSIGNED_SKILL_COUNT, CharacterClass, DEFAULT_RESERVED_A, DEFAULT_RESERVED_B, NAME_WIDTH,
};

/// Typical encoded size; pooled buffers start at least this large.
const ENCODE_CAPACITY_HINT: usize = 1024;

/// One decoded character save. Fields are in file order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveRecord {
    pub header: Header,
    pub active_weapon: u32,
    pub name: String,
    pub status: Status,
    pub progression: u8,
    /// Bytes at 0x26. `None` writes [`DEFAULT_RESERVED_A`].
    #[serde(skip)]
    pub reserved_a: Option<[u8; 2]>,
    pub class_id: u8,
    /// Bytes at 0x29. `None` writes [`DEFAULT_RESERVED_B`].
    #[serde(skip)]
    pub reserved_b: Option<[u8; 2]>,
    pub level: u8,
    pub created: u32,
    pub last_played: u32,
    pub play_time: u32,
    pub assigned_skills: [Skill; ASSIGNED_SKILL_COUNT],
    pub left_skill: Skill,
    pub right_skill: Skill,
    pub left_swap_skill: Skill,
    pub right_swap_skill: Skill,
    pub appearances: Appearances,
    pub location: Locations,
    pub map_id: u32,
    pub mercenary: Mercenary,
    pub preview: PreviewData,
    pub quests: Quests,
    pub waypoints: Waypoints,
    pub npc_dialog: NpcDialog,
    pub attributes: Attributes,
    pub class_skills: ClassSkills,
    pub player_items: ItemList,
    pub player_corpses: CorpseList,
    /// Present only in expansion saves.
    pub mercenary_items: Option<MercenaryItemList>,
    /// Present only in expansion saves.
    pub golem: Option<Golem>,
}

/// Reader plus the section ranges seen so far, when a layout was requested.
struct Capture<'a> {
    reader: BitReader<'a>,
    sections: Option<Vec<SectionLayout>>,
}

impl<'a> Capture<'a> {
    fn new(bytes: &'a [u8], record_layout: bool) -> Self {
        Self {
            reader: BitReader::new(bytes),
            sections: record_layout.then(Vec::new),
        }
    }

    fn record(&mut self, id: SectionId, start: usize, end: usize) {
        trace!(section = ?id, start, end, "section decoded");
        if let Some(sections) = &mut self.sections {
            sections.push(SectionLayout {
                id,
                range: BitRange { start, end },
            });
        }
    }

    fn step<T>(
        &mut self,
        id: SectionId,
        read: impl FnOnce(&mut BitReader<'a>) -> Result<T>,
    ) -> Result<T> {
        let start = self.reader.position();
        let value = read(&mut self.reader)?;
        let end = self.reader.position();
        self.record(id, start, end);
        Ok(value)
    }
}

impl SaveRecord {
    /// A fresh classic character as the game creates it, before its first save.
    pub fn new(name: &str, class: CharacterClass) -> Self {
        let mut location = Locations::default();
        location.normal = Location(0x80);
        let mut waypoints = Waypoints::default();
        waypoints.difficulties[0].activated.set(0, true);
        let preview = PreviewData {
            name: name.to_string(),
            ..PreviewData::default()
        };

        Self {
            header: Header::default(),
            active_weapon: 0,
            name: name.to_string(),
            status: Status::default(),
            progression: 0,
            reserved_a: None,
            class_id: class.raw(),
            reserved_b: None,
            level: 1,
            created: 0,
            last_played: 0,
            play_time: 0,
            assigned_skills: [Skill::unassigned(); ASSIGNED_SKILL_COUNT],
            left_skill: Skill::default(),
            right_skill: Skill::default(),
            left_swap_skill: Skill::default(),
            right_swap_skill: Skill::default(),
            appearances: Appearances::default(),
            location,
            map_id: 0,
            mercenary: Mercenary::default(),
            preview,
            quests: Quests::default(),
            waypoints,
            npc_dialog: NpcDialog::default(),
            attributes: Attributes::new(),
            class_skills: ClassSkills::new(class),
            player_items: ItemList::default(),
            player_corpses: CorpseList::default(),
            mercenary_items: None,
            golem: None,
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_with_options(bytes, &DecodeOptions::default())
    }

    pub fn decode_with_options(bytes: &[u8], options: &DecodeOptions) -> Result<Self> {
        decode_internal(bytes, options, false).map(|(record, _)| record)
    }

    /// Decode and also report where every section sat in `bytes`.
    pub fn decode_with_layout(
        bytes: &[u8],
        options: &DecodeOptions,
    ) -> Result<(Self, FileLayout)> {
        let (record, sections) = decode_internal(bytes, options, true)?;
        let layout = FileLayout {
            len_bits: bytes.len() * 8,
            sections: sections.unwrap_or_default(),
        };
        layout.validate()?;
        Ok((record, layout))
    }

    pub fn class(&self) -> CharacterClass {
        CharacterClass::from_raw(self.class_id)
    }

    /// Set the expansion flag and add the sections it requires.
    pub fn enable_expansion(&mut self) {
        self.status.set_expansion(true);
        let hired = self.mercenary.is_hired();
        let mercenary_items = self
            .mercenary_items
            .get_or_insert_with(MercenaryItemList::default);
        if hired && mercenary_items.items.is_none() {
            mercenary_items.items = Some(ItemList::default());
        }
        self.golem.get_or_insert_with(Golem::default);
    }

    /// Clear the expansion flag and drop the sections only it allows.
    pub fn disable_expansion(&mut self) {
        self.status.set_expansion(false);
        self.mercenary_items = None;
        self.golem = None;
    }

    /// Serialize every section in file order. The header is written as
    /// stored; [`SaveRecord::encode`] patches its size and checksum afterwards.
    pub fn write(&self, w: &mut BitWriter) -> Result<()> {
        self.header.write(w);
        w.write_u32(self.active_weapon);
        w.write_string(&self.name, NAME_WIDTH);
        self.status.write(w);
        w.write_u8(self.progression);
        w.write_bytes(&self.reserved_a.unwrap_or(DEFAULT_RESERVED_A));
        w.write_u8(self.class_id);
        w.write_bytes(&self.reserved_b.unwrap_or(DEFAULT_RESERVED_B));
        w.write_u8(self.level);
        w.write_u32(self.created);
        w.write_u32(self.last_played);
        w.write_u32(self.play_time);
        for skill in &self.assigned_skills {
            skill.write(w);
        }
        self.left_skill.write(w);
        self.right_skill.write(w);
        self.left_swap_skill.write(w);
        self.right_swap_skill.write(w);
        self.appearances.write(w);
        self.location.write(w);
        w.write_u32(self.map_id);
        self.mercenary.write(w);
        self.preview.write(w);
        self.quests.write(w);
        self.waypoints.write(w);
        self.npc_dialog.write(w);
        self.attributes.write(w)?;
        self.class_skills.write(w);
        self.player_items.write(w);
        self.player_corpses.write(w)?;

        if self.status.is_expansion() {
            let mercenary_items = self.mercenary_items.as_ref().ok_or(Error::MissingSection {
                section: "mercenary items",
            })?;
            let golem = self
                .golem
                .as_ref()
                .ok_or(Error::MissingSection { section: "golem" })?;
            mercenary_items.write(w, self.mercenary.is_hired())?;
            golem.write(w);
        }
        Ok(())
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut w = BitWriter::new();
        self.write(&mut w)?;
        let mut bytes = w.into_bytes();
        Header::fix(&mut bytes)?;
        debug!(version = self.header.version, len = bytes.len(), "encoded save");
        Ok(bytes)
    }

    /// Encode into a buffer borrowed from `pool`. The buffer goes back to the
    /// pool when the guard drops, including when encoding fails.
    pub fn encode_pooled<'p>(&self, pool: &'p BufferPool) -> Result<PooledBuffer<'p>> {
        let mut out = pool.acquire(ENCODE_CAPACITY_HINT);
        let mut w = BitWriter::with_buffer(out.take());
        let written = self.write(&mut w);
        let mut bytes = w.into_bytes();
        let fixed = written.and_then(|()| Header::fix(&mut bytes));
        out.restore(bytes);
        fixed?;
        debug!(version = self.header.version, len = out.len(), "encoded save into pooled buffer");
        Ok(out)
    }
}

fn decode_internal(
    bytes: &[u8],
    options: &DecodeOptions,
    record_layout: bool,
) -> Result<(SaveRecord, Option<Vec<SectionLayout>>)> {
    let mut c = Capture::new(bytes, record_layout);

    let header = c.step(SectionId::Header, Header::read)?;
    debug!(version = header.version, len = bytes.len(), "decoding save");
    if !header.is_known_version() {
        warn!(version = header.version, "unknown save version");
    }
    if options.verify_checksum {
        Header::verify(bytes)?;
    }

    let active_weapon = c.step(SectionId::ActiveWeapon, |r| r.read_u32())?;
    let name = c.step(SectionId::Name, |r| r.read_string(NAME_WIDTH))?;
    let status = c.step(SectionId::Status, |r| r.read_u8().map(Status::read))?;
    let progression = c.step(SectionId::Progression, |r| r.read_u8())?;
    let reserved_a = c.step(SectionId::ReservedA, |r| r.read_array::<2>())?;
    let class_id = c.step(SectionId::ClassId, |r| r.read_u8())?;
    let class = CharacterClass::from_raw(class_id);
    if class.requires_expansion() && !status.is_expansion() {
        warn!(%class, "expansion-only class in a classic save");
    }
    let reserved_b = c.step(SectionId::ReservedB, |r| r.read_array::<2>())?;
    let level = c.step(SectionId::Level, |r| r.read_u8())?;
    let created = c.step(SectionId::Created, |r| r.read_u32())?;
    let last_played = c.step(SectionId::LastPlayed, |r| r.read_u32())?;
    let play_time = c.step(SectionId::PlayTime, |r| r.read_u32())?;
    let assigned_skills = c.step(SectionId::AssignedSkills, |r| {
        let mut skills = [Skill::default(); ASSIGNED_SKILL_COUNT];
        for skill in &mut skills {
            *skill = Skill::read(r)?;
        }
        Ok(skills)
    })?;
    let [left_skill, right_skill, left_swap_skill, right_swap_skill] =
        c.step(SectionId::QuickSkills, |r| {
            Ok([
                Skill::read(r)?,
                Skill::read(r)?,
                Skill::read(r)?,
                Skill::read(r)?,
            ])
        })?;
    let appearances = c.step(SectionId::Appearances, Appearances::read)?;
    let location = c.step(SectionId::Location, Locations::read)?;
    let map_id = c.step(SectionId::MapId, |r| r.read_u32())?;
    let mercenary = c.step(SectionId::Mercenary, Mercenary::read)?;
    let preview = c.step(SectionId::Preview, PreviewData::read)?;
    let quests = c.step(SectionId::Quests, Quests::read)?;
    let waypoints = c.step(SectionId::Waypoints, Waypoints::read)?;
    let npc_dialog = c.step(SectionId::NpcDialog, NpcDialog::read)?;
    let attributes = c.step(SectionId::Attributes, Attributes::read)?;
    let class_skills = c.step(SectionId::ClassSkills, |r| ClassSkills::read(r, class_id))?;

    let ctx = ItemContext {
        version: header.version,
        expansion: status.is_expansion(),
        mercenary_hired: mercenary.is_hired(),
    };
    let player_items = c.step(SectionId::PlayerItems, |r| {
        ItemList::read(
            r,
            &ctx,
            Boundary::CorpseList {
                expansion: ctx.expansion,
            },
        )
    })?;
    let player_corpses = c.step(SectionId::PlayerCorpses, |r| CorpseList::read(r, &ctx))?;

    let (mercenary_items, golem) = if ctx.expansion {
        let mercenary_items =
            c.step(SectionId::MercenaryItems, |r| MercenaryItemList::read(r, &ctx))?;
        let golem = c.step(SectionId::Golem, |r| Golem::read(r, &ctx))?;
        (Some(mercenary_items), Some(golem))
    } else {
        (None, None)
    };

    let consumed_bits = c.reader.position();
    let total_bits = c.reader.len_bits();
    if consumed_bits != total_bits {
        if options.require_full_consumption {
            return Err(Error::LengthMismatch {
                consumed_bits,
                total_bits,
            });
        }
        warn!(consumed_bits, total_bits, "ignoring trailing bits after last section");
        c.record(SectionId::Trailing, consumed_bits, total_bits);
    }

    let record = SaveRecord {
        header,
        active_weapon,
        name,
        status,
        progression,
        reserved_a: Some(reserved_a),
        class_id,
        reserved_b: Some(reserved_b),
        level,
        created,
        last_played,
        play_time,
        assigned_skills,
        left_skill,
        right_skill,
        left_swap_skill,
        right_swap_skill,
        appearances,
        location,
        map_id,
        mercenary,
        preview,
        quests,
        waypoints,
        npc_dialog,
        attributes,
        class_skills,
        player_items,
        player_corpses,
        mercenary_items,
        golem,
    };
    debug!(
        name = %record.name,
        class = %record.class(),
        level = record.level,
        "decoded save"
    );
    Ok((record, c.sections))
}
