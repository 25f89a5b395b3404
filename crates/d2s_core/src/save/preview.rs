//! Character-select preview block at 0xBF.
//!
//! Everything here is fixed width: 12 bytes per item, 144 bytes in total.

use serde::Serialize;

use crate::bits::{BitReader, BitWriter};
use crate::error::Result;

use super::types::PREVIEW_NAME_WIDTH;

pub const PREVIEW_ITEM_SIZE: usize = 12;
pub const PREVIEW_DATA_SIZE: usize = 144;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum ItemQuality {
    #[default]
    None,
    Inferior,
    Normal,
    Superior,
    Magic,
    Set,
    Rare,
    Unique,
    Crafted,
    Tempered,
    Unknown(u8),
}

impl ItemQuality {
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::None,
            1 => Self::Inferior,
            2 => Self::Normal,
            3 => Self::Superior,
            4 => Self::Magic,
            5 => Self::Set,
            6 => Self::Rare,
            7 => Self::Unique,
            8 => Self::Crafted,
            9 => Self::Tempered,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u8 {
        match *self {
            Self::None => 0,
            Self::Inferior => 1,
            Self::Normal => 2,
            Self::Superior => 3,
            Self::Magic => 4,
            Self::Set => 5,
            Self::Rare => 6,
            Self::Unique => 7,
            Self::Crafted => 8,
            Self::Tempered => 9,
            Self::Unknown(other) => other,
        }
    }
}

/// Thumbnail of one equipped item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PreviewItem {
    /// Four ASCII bytes read as a little-endian word.
    pub code: u32,
    pub transform: u8,
    pub quality: ItemQuality,
    pub file_index: u16,
    pub flags: u32,
}

impl PreviewItem {
    pub fn with_code(code: &str) -> Self {
        let mut raw = [0u8; 4];
        for (dst, src) in raw.iter_mut().zip(code.bytes()) {
            *dst = src;
        }
        Self {
            code: u32::from_le_bytes(raw),
            ..Self::default()
        }
    }

    /// The item code as text, trailing NULs and spaces trimmed.
    pub fn code_string(&self) -> String {
        let raw = self.code.to_le_bytes();
        let text: String = raw.iter().map(|&b| char::from(b)).collect();
        text.trim_end_matches(['\0', ' ']).to_string()
    }

    pub fn read(r: &mut BitReader<'_>) -> Result<Self> {
        let code = r.read_u32()?;
        let transform = r.read_u8()?;
        let quality = ItemQuality::from_raw(r.read_u8()?);
        let file_index = r.read_u16()?;
        let flags = r.read_u32()?;
        Ok(Self {
            code,
            transform,
            quality,
            file_index,
            flags,
        })
    }

    pub fn write(&self, w: &mut BitWriter) {
        w.write_u32(self.code);
        w.write_u8(self.transform);
        w.write_u8(self.quality.raw());
        w.write_u16(self.file_index);
        w.write_u32(self.flags);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreviewData {
    pub expansion_save_time: u64,
    pub classic_save_time: u64,
    /// One byte of color stored in four; the upper bytes are kept as read.
    pub guild_emblem_color: u32,
    pub expansion_experience: u32,
    pub classic_experience: u32,
    pub left_hand: PreviewItem,
    pub right_hand: PreviewItem,
    pub torso: PreviewItem,
    pub head: PreviewItem,
    pub name: String,
    pub reserved: u32,
}

impl PreviewData {
    pub fn emblem_color(&self) -> u8 {
        self.guild_emblem_color.to_le_bytes()[0]
    }

    pub fn read(r: &mut BitReader<'_>) -> Result<Self> {
        Ok(Self {
            expansion_save_time: r.read_u64()?,
            classic_save_time: r.read_u64()?,
            guild_emblem_color: r.read_u32()?,
            expansion_experience: r.read_u32()?,
            classic_experience: r.read_u32()?,
            left_hand: PreviewItem::read(r)?,
            right_hand: PreviewItem::read(r)?,
            torso: PreviewItem::read(r)?,
            head: PreviewItem::read(r)?,
            name: r.read_string(PREVIEW_NAME_WIDTH)?,
            reserved: r.read_u32()?,
        })
    }

    pub fn write(&self, w: &mut BitWriter) {
        w.write_u64(self.expansion_save_time);
        w.write_u64(self.classic_save_time);
        w.write_u32(self.guild_emblem_color);
        w.write_u32(self.expansion_experience);
        w.write_u32(self.classic_experience);
        self.left_hand.write(w);
        self.right_hand.write(w);
        self.torso.write(w);
        self.head.write(w);
        w.write_string(&self.name, PREVIEW_NAME_WIDTH);
        w.write_u32(self.reserved);
    }
}
