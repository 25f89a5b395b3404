//! Item-bearing sections: player items, corpses, mercenary items and golem.
//!
//! Item bodies are kept as opaque bytes. Their length is not stored, so the
//! end of each payload is found by scanning forward for the header of the
//! section that must come next, checked with enough lookahead to reject
//! marker bytes that merely occur inside item data.

use serde::{Serialize, Serializer};

use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result};

use super::sections::expect_marker;
use super::types::{
    GOLEM_MARKER, ITEM_LIST_MARKER, MERCENARY_MARKER, serialize_hex, supports_item_lists,
};

const CORPSE_HEADER_LEN: usize = 12;
/// Golem header with no item, which can only sit at the very end.
const EMPTY_GOLEM: &[u8] = b"kf\x00";
/// Smallest corpse record: 12 header bytes plus an empty `"JM"` list.
const MIN_CORPSE_LEN: usize = CORPSE_HEADER_LEN + 4;

/// What decides how item payloads are delimited in one save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemContext {
    pub version: u32,
    pub expansion: bool,
    pub mercenary_hired: bool,
}

impl ItemContext {
    fn check_version(&self, section: &'static str) -> Result<()> {
        if !supports_item_lists(self.version) {
            return Err(Error::UnsupportedVersion {
                version: self.version,
                section,
            });
        }
        Ok(())
    }

    /// What follows the last corpse's items.
    fn after_corpses(&self) -> Boundary {
        if self.expansion {
            Boundary::MercenaryHeader {
                hired: self.mercenary_hired,
            }
        } else {
            Boundary::End
        }
    }
}

/// The section header that terminates an opaque payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Boundary {
    /// `"JM"` + count; then the next section (count 0) or a corpse record.
    CorpseList { expansion: bool },
    /// Another corpse: 12 header bytes, then its own `"JM"`.
    NextCorpse,
    /// `"jf"`, then either the mercenary's `"JM"` or the golem's `"kf"`.
    MercenaryHeader { hired: bool },
    /// `"kf"` + flag 0 at end of buffer, or flag 1 followed by an item.
    GolemHeader,
    End,
}

impl Boundary {
    fn matches(self, rest: &[u8]) -> bool {
        match self {
            Self::CorpseList { expansion } => {
                if rest.len() < 4 || !rest.starts_with(ITEM_LIST_MARKER) {
                    return false;
                }
                let count = u16::from_le_bytes([rest[2], rest[3]]);
                let after = &rest[4..];
                if count == 0 {
                    if expansion {
                        after.starts_with(MERCENARY_MARKER)
                    } else {
                        after.is_empty()
                    }
                } else {
                    after.get(CORPSE_HEADER_LEN..CORPSE_HEADER_LEN + 2) == Some(ITEM_LIST_MARKER)
                }
            }
            Self::NextCorpse => {
                rest.get(CORPSE_HEADER_LEN..CORPSE_HEADER_LEN + 2) == Some(ITEM_LIST_MARKER)
            }
            Self::MercenaryHeader { hired } => {
                let next = if hired { ITEM_LIST_MARKER } else { GOLEM_MARKER };
                rest.starts_with(MERCENARY_MARKER) && rest[2..].starts_with(next)
            }
            Self::GolemHeader => match rest {
                [b'k', b'f', 0] => true,
                [b'k', b'f', 1, _, ..] => true,
                _ => false,
            },
            Self::End => rest.is_empty(),
        }
    }

    /// Offset of the first position in `rest` where this boundary matches.
    ///
    /// An item-less golem is anchored to the end of the buffer, so it wins
    /// over any `"kf"` + 1 run inside the mercenary's items.
    pub(crate) fn scan(self, rest: &[u8]) -> Option<usize> {
        if self == Self::GolemHeader && rest.ends_with(EMPTY_GOLEM) {
            return Some(rest.len() - EMPTY_GOLEM.len());
        }
        (0..=rest.len()).find(|&offset| self.matches(&rest[offset..]))
    }
}

/// Read payload bytes up to `boundary`, leaving the cursor on it.
fn read_until(
    r: &mut BitReader<'_>,
    section: &'static str,
    boundary: Boundary,
) -> Result<Vec<u8>> {
    let rest = r.remaining_aligned().ok_or_else(|| {
        Error::invalid_section(section, "payload does not start on a byte boundary")
    })?;
    let len = boundary
        .scan(rest)
        .ok_or_else(|| Error::invalid_section(section, format!("no {boundary:?} after payload")))?;
    r.read_bytes(len)
}

fn count_u16(field: &'static str, count: usize) -> Result<u16> {
    u16::try_from(count).map_err(|_| Error::ValueOutOfRange {
        field,
        value: count as u64,
        bits: 16,
    })
}

/// `"JM"`, top-level item count, then the items themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemList {
    pub count: u16,
    #[serde(serialize_with = "serialize_hex")]
    pub payload: Vec<u8>,
}

impl ItemList {
    pub(crate) fn read(
        r: &mut BitReader<'_>,
        ctx: &ItemContext,
        boundary: Boundary,
    ) -> Result<Self> {
        ctx.check_version("item list")?;
        expect_marker(r, "item list", ITEM_LIST_MARKER)?;
        let count = r.read_u16()?;
        let payload = read_until(r, "item list", boundary)?;
        Ok(Self { count, payload })
    }

    pub fn write(&self, w: &mut BitWriter) {
        w.write_bytes(ITEM_LIST_MARKER);
        w.write_u16(self.count);
        w.write_bytes(&self.payload);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Corpse {
    pub reserved: u32,
    pub x: u32,
    pub y: u32,
    pub items: ItemList,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpseList {
    pub corpses: Vec<Corpse>,
}

impl CorpseList {
    pub(crate) fn read(r: &mut BitReader<'_>, ctx: &ItemContext) -> Result<Self> {
        ctx.check_version("corpse list")?;
        expect_marker(r, "corpse list", ITEM_LIST_MARKER)?;
        let count = usize::from(r.read_u16()?);
        let capacity = count.min(r.remaining_bits() / (8 * MIN_CORPSE_LEN));
        let mut corpses = Vec::with_capacity(capacity);
        for index in 0..count {
            let reserved = r.read_u32()?;
            let x = r.read_u32()?;
            let y = r.read_u32()?;
            let boundary = if index + 1 < count {
                Boundary::NextCorpse
            } else {
                ctx.after_corpses()
            };
            let items = ItemList::read(r, ctx, boundary)?;
            corpses.push(Corpse {
                reserved,
                x,
                y,
                items,
            });
        }
        Ok(Self { corpses })
    }

    pub fn write(&self, w: &mut BitWriter) -> Result<()> {
        w.write_bytes(ITEM_LIST_MARKER);
        w.write_u16(count_u16("corpse count", self.corpses.len())?);
        for corpse in &self.corpses {
            w.write_u32(corpse.reserved);
            w.write_u32(corpse.x);
            w.write_u32(corpse.y);
            corpse.items.write(w);
        }
        Ok(())
    }
}

/// `"jf"`, then the hired mercenary's items. Expansion saves only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MercenaryItemList {
    pub items: Option<ItemList>,
}

impl MercenaryItemList {
    pub(crate) fn read(r: &mut BitReader<'_>, ctx: &ItemContext) -> Result<Self> {
        expect_marker(r, "mercenary items", MERCENARY_MARKER)?;
        let items = if ctx.mercenary_hired {
            Some(ItemList::read(r, ctx, Boundary::GolemHeader)?)
        } else {
            None
        };
        Ok(Self { items })
    }

    /// The list is present exactly when a mercenary is hired.
    pub fn write(&self, w: &mut BitWriter, hired: bool) -> Result<()> {
        if hired != self.items.is_some() {
            return Err(Error::invalid_section(
                "mercenary items",
                if hired {
                    "hired mercenary has no item list"
                } else {
                    "item list present without a hired mercenary"
                },
            ));
        }
        w.write_bytes(MERCENARY_MARKER);
        if let Some(items) = &self.items {
            items.write(w);
        }
        Ok(())
    }
}

/// `"kf"` and the item an Iron Golem was made from, if one exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Golem {
    #[serde(serialize_with = "serialize_optional_hex")]
    pub item: Option<Vec<u8>>,
}

impl Golem {
    pub(crate) fn read(r: &mut BitReader<'_>, ctx: &ItemContext) -> Result<Self> {
        expect_marker(r, "golem", GOLEM_MARKER)?;
        let item = match r.read_u8()? {
            0 => None,
            1 => {
                ctx.check_version("golem")?;
                let item = read_until(r, "golem", Boundary::End)?;
                if item.is_empty() {
                    return Err(Error::invalid_section("golem", "flag set but no item follows"));
                }
                Some(item)
            }
            other => {
                return Err(Error::invalid_section(
                    "golem",
                    format!("presence flag must be 0 or 1, found {other}"),
                ));
            }
        };
        Ok(Self { item })
    }

    pub fn write(&self, w: &mut BitWriter) {
        w.write_bytes(GOLEM_MARKER);
        match &self.item {
            Some(item) => {
                w.write_u8(1);
                w.write_bytes(item);
            }
            None => w.write_u8(0),
        }
    }
}

fn serialize_optional_hex<S>(
    bytes: &Option<Vec<u8>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match bytes {
        Some(bytes) => serialize_hex(bytes, serializer),
        None => serializer.serialize_none(),
    }
}
