use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    pub start: usize,
    pub end: usize,
}

impl BitRange {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Byte offset of the range start, if it sits on a byte boundary.
    pub fn byte_start(&self) -> Option<usize> {
        (self.start % 8 == 0).then_some(self.start / 8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionId {
    Header,
    ActiveWeapon,
    Name,
    Status,
    Progression,
    ReservedA,
    ClassId,
    ReservedB,
    Level,
    Created,
    LastPlayed,
    PlayTime,
    AssignedSkills,
    QuickSkills,
    Appearances,
    Location,
    MapId,
    Mercenary,
    Preview,
    Quests,
    Waypoints,
    NpcDialog,
    Attributes,
    ClassSkills,
    PlayerItems,
    PlayerCorpses,
    MercenaryItems,
    Golem,
    /// Bits left over after a lenient decode.
    Trailing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionLayout {
    pub id: SectionId,
    pub range: BitRange,
}

/// Where each section sat in a decoded buffer.
#[derive(Debug, Clone)]
pub struct FileLayout {
    pub len_bits: usize,
    pub sections: Vec<SectionLayout>,
}

impl FileLayout {
    pub fn section(&self, id: SectionId) -> Option<&SectionLayout> {
        self.sections.iter().find(|section| section.id == id)
    }

    /// Check the sections tile the buffer: no gaps, no overlaps, nothing left over.
    pub fn validate(&self) -> Result<()> {
        let Some(first) = self.sections.first() else {
            return Err(Error::invalid_section(
                "layout",
                "file layout must contain at least one section",
            ));
        };

        if first.range.start != 0 {
            return Err(Error::invalid_section("layout", "layout does not start at bit 0"));
        }

        let mut expected = 0usize;
        for section in &self.sections {
            if section.range.start != expected {
                return Err(Error::invalid_section(
                    "layout",
                    format!(
                        "gap/overlap around section {:?}: expected start {}, got {}",
                        section.id, expected, section.range.start
                    ),
                ));
            }
            if section.range.end < section.range.start {
                return Err(Error::invalid_section(
                    "layout",
                    format!(
                        "invalid section range {:?}: {}..{}",
                        section.id, section.range.start, section.range.end
                    ),
                ));
            }
            expected = section.range.end;
        }

        if expected != self.len_bits {
            return Err(Error::LengthMismatch {
                consumed_bits: expected,
                total_bits: self.len_bits,
            });
        }

        Ok(())
    }
}
