//! Bit-packed character attributes following the NPC dialog block.
//!
//! The section is a `"gf"` marker, then `(9-bit id, value)` pairs whose value
//! width depends on the id, then the all-ones id `0x1FF` and byte alignment.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result};

use super::sections::expect_marker;
use super::types::ATTRIBUTES_MARKER;

const ID_BITS: u32 = 9;
const TERMINATOR: u16 = 0x1FF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatInfo {
    pub id: u16,
    pub name: &'static str,
    pub bits: u32,
}

const fn stat(id: u16, name: &'static str, bits: u32) -> StatInfo {
    StatInfo { id, name, bits }
}

/// Life, mana and stamina are fixed point with 8 fractional bits.
pub const STATS: [StatInfo; 16] = [
    stat(0, "strength", 10),
    stat(1, "energy", 10),
    stat(2, "dexterity", 10),
    stat(3, "vitality", 10),
    stat(4, "statpts", 10),
    stat(5, "newskills", 8),
    stat(6, "hitpoints", 21),
    stat(7, "maxhp", 21),
    stat(8, "mana", 21),
    stat(9, "maxmana", 21),
    stat(10, "stamina", 21),
    stat(11, "maxstamina", 21),
    stat(12, "level", 7),
    stat(13, "experience", 32),
    stat(14, "gold", 25),
    stat(15, "goldbank", 25),
];

pub fn stat_info(id: u16) -> Option<&'static StatInfo> {
    STATS.get(usize::from(id))
}

pub fn stat_by_name(name: &str) -> Option<&'static StatInfo> {
    STATS.iter().find(|info| info.name == name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub id: u16,
    pub value: u32,
}

impl Attribute {
    pub fn name(&self) -> Option<&'static str> {
        stat_info(self.id).map(|info| info.name)
    }
}

/// Attribute entries in stream order. The game omits zero-valued stats, so
/// absence and zero are distinct here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<Attribute>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Attribute] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: u16) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.value)
    }

    pub fn get_by_name(&self, name: &str) -> Option<u32> {
        stat_by_name(name).and_then(|info| self.get(info.id))
    }

    /// Replace the value in place, or append a new entry at the end.
    pub fn set(&mut self, id: u16, value: u32) -> Result<()> {
        let info = stat_info(id).ok_or(Error::UnknownAttribute { id })?;
        check_width(info, value)?;
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => entry.value = value,
            None => self.entries.push(Attribute { id, value }),
        }
        Ok(())
    }

    pub fn remove(&mut self, id: u16) -> Option<u32> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(index).value)
    }

    pub fn read(r: &mut BitReader<'_>) -> Result<Self> {
        expect_marker(r, "attributes", ATTRIBUTES_MARKER)?;
        let mut entries = Vec::new();
        loop {
            let id = r.read_bits(ID_BITS)? as u16;
            if id == TERMINATOR {
                break;
            }
            let info = stat_info(id).ok_or(Error::UnknownAttribute { id })?;
            let value = r.read_bits(info.bits)? as u32;
            entries.push(Attribute { id, value });
        }
        r.align();
        Ok(Self { entries })
    }

    pub fn write(&self, w: &mut BitWriter) -> Result<()> {
        w.write_bytes(ATTRIBUTES_MARKER);
        for entry in &self.entries {
            let info = stat_info(entry.id).ok_or(Error::UnknownAttribute { id: entry.id })?;
            check_width(info, entry.value)?;
            w.write_bits(u64::from(entry.id), ID_BITS);
            w.write_bits(u64::from(entry.value), info.bits);
        }
        w.write_bits(u64::from(TERMINATOR), ID_BITS);
        w.align();
        Ok(())
    }
}

fn check_width(info: &StatInfo, value: u32) -> Result<()> {
    if info.bits < 32 && value >> info.bits != 0 {
        return Err(Error::ValueOutOfRange {
            field: info.name,
            value: u64::from(value),
            bits: info.bits,
        });
    }
    Ok(())
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(entry.name().unwrap_or("unknown"), &entry.value)?;
        }
        map.end()
    }
}
