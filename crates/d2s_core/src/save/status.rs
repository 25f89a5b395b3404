use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::bits::BitWriter;

/// The character status byte at 0x24.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Status(u8);

impl Status {
    const NEWBIE: u8 = 1 << 0;
    const ERROR: u8 = 1 << 1;
    const HARDCORE: u8 = 1 << 2;
    const DEAD: u8 = 1 << 3;
    const SAVE_IN_PROGRESS: u8 = 1 << 4;
    const EXPANSION: u8 = 1 << 5;
    const LADDER: u8 = 1 << 6;
    const NEEDS_RENAMING: u8 = 1 << 7;

    pub fn read(raw: u8) -> Self {
        Self(raw)
    }

    pub fn write(&self, w: &mut BitWriter) {
        w.write_u8(self.0);
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    fn flag(&self, mask: u8) -> bool {
        self.0 & mask != 0
    }

    fn set_flag(&mut self, mask: u8, value: bool) {
        if value {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }

    pub fn is_newbie(&self) -> bool {
        self.flag(Self::NEWBIE)
    }

    pub fn is_error(&self) -> bool {
        self.flag(Self::ERROR)
    }

    pub fn is_hardcore(&self) -> bool {
        self.flag(Self::HARDCORE)
    }

    pub fn is_dead(&self) -> bool {
        self.flag(Self::DEAD)
    }

    pub fn is_save_in_progress(&self) -> bool {
        self.flag(Self::SAVE_IN_PROGRESS)
    }

    /// Gates the mercenary item list and golem sections.
    pub fn is_expansion(&self) -> bool {
        self.flag(Self::EXPANSION)
    }

    pub fn is_ladder(&self) -> bool {
        self.flag(Self::LADDER)
    }

    pub fn needs_renaming(&self) -> bool {
        self.flag(Self::NEEDS_RENAMING)
    }

    pub fn set_newbie(&mut self, value: bool) {
        self.set_flag(Self::NEWBIE, value);
    }

    pub fn set_error(&mut self, value: bool) {
        self.set_flag(Self::ERROR, value);
    }

    pub fn set_hardcore(&mut self, value: bool) {
        self.set_flag(Self::HARDCORE, value);
    }

    pub fn set_dead(&mut self, value: bool) {
        self.set_flag(Self::DEAD, value);
    }

    pub fn set_save_in_progress(&mut self, value: bool) {
        self.set_flag(Self::SAVE_IN_PROGRESS, value);
    }

    pub(crate) fn set_expansion(&mut self, value: bool) {
        self.set_flag(Self::EXPANSION, value);
    }

    pub fn set_ladder(&mut self, value: bool) {
        self.set_flag(Self::LADDER, value);
    }

    pub fn set_needs_renaming(&mut self, value: bool) {
        self.set_flag(Self::NEEDS_RENAMING, value);
    }
}

impl From<u8> for Status {
    fn from(raw: u8) -> Self {
        Self::read(raw)
    }
}

impl Serialize for Status {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Status", 8)?;
        s.serialize_field("newbie", &self.is_newbie())?;
        s.serialize_field("error", &self.is_error())?;
        s.serialize_field("hardcore", &self.is_hardcore())?;
        s.serialize_field("dead", &self.is_dead())?;
        s.serialize_field("save_in_progress", &self.is_save_in_progress())?;
        s.serialize_field("expansion", &self.is_expansion())?;
        s.serialize_field("ladder", &self.is_ladder())?;
        s.serialize_field("needs_renaming", &self.needs_renaming())?;
        s.end()
    }
}
