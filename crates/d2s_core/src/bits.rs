//! Bit-addressed cursor over a save buffer.
//!
//! Bits are consumed LSB-first within each byte, so byte-aligned fixed-width
//! reads come out as little-endian integers while sub-byte fields (attribute
//! ids, waypoint flags) pack tightly behind one another.

use serde::Serialize;

use crate::error::{Error, Result};

pub struct BitReader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    /// Current position in bits from the start of the buffer.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn len_bits(&self) -> usize {
        self.bytes.len() * 8
    }

    pub fn remaining_bits(&self) -> usize {
        self.len_bits() - self.position
    }

    pub fn is_aligned(&self) -> bool {
        self.position % 8 == 0
    }

    /// The unread bytes, available only while the cursor sits on a byte boundary.
    pub fn remaining_aligned(&self) -> Option<&'a [u8]> {
        self.is_aligned().then(|| &self.bytes[self.position / 8..])
    }

    fn ensure(&self, requested: usize) -> Result<()> {
        let available = self.remaining_bits();
        if requested > available {
            return Err(Error::BufferUnderrun {
                position: self.position,
                requested,
                available,
            });
        }
        Ok(())
    }

    /// Read `count` bits (at most 64), first stream bit in the least significant position.
    pub fn read_bits(&mut self, count: u32) -> Result<u64> {
        if count > 64 {
            return Err(Error::BitWidth { requested: count });
        }
        self.ensure(count as usize)?;

        let mut value = 0u64;
        let mut filled = 0u32;
        while filled < count {
            let byte = self.bytes[self.position / 8];
            let offset = (self.position % 8) as u32;
            let take = (8 - offset).min(count - filled);
            let chunk = (u64::from(byte) >> offset) & ((1u64 << take) - 1);
            value |= chunk << filled;
            filled += take;
            self.position += take as usize;
        }
        Ok(value)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.read_bits(16)? as u16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.read_bits(32)? as u32)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_bits(64)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        self.ensure(n * 8)?;
        if self.is_aligned() {
            let start = self.position / 8;
            self.position += n * 8;
            return Ok(self.bytes[start..start + n].to_vec());
        }
        (0..n).map(|_| self.read_u8()).collect()
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N * 8)?;
        let mut out = [0u8; N];
        for byte in &mut out {
            *byte = self.read_u8()?;
        }
        Ok(out)
    }

    /// Read a fixed-width text field. The whole width is consumed; the text
    /// ends at the first NUL.
    pub fn read_string(&mut self, width: usize) -> Result<String> {
        let bytes = self.read_bytes(width)?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(width);
        String::from_utf8(bytes[..end].to_vec()).map_err(|_| Error::InvalidText { width })
    }

    pub fn read_bit_set(&mut self, len: u32) -> Result<BitSet> {
        let bits = self.read_bits(len)?;
        Ok(BitSet::from_raw(bits, len))
    }

    /// Skip to the next byte boundary.
    pub fn align(&mut self) {
        self.position = self.position.next_multiple_of(8);
    }
}

/// Growable bit sink mirroring [`BitReader`].
#[derive(Debug, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    position: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write into an existing allocation, typically one borrowed from a
    /// [`BufferPool`](crate::pool::BufferPool). Previous contents are discarded.
    pub fn with_buffer(mut bytes: Vec<u8>) -> Self {
        bytes.clear();
        Self { bytes, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn write_bits(&mut self, value: u64, count: u32) {
        debug_assert!(count <= 64);
        let mut written = 0u32;
        while written < count {
            let offset = (self.position % 8) as u32;
            if offset == 0 {
                self.bytes.push(0);
            }
            let take = (8 - offset).min(count - written);
            let chunk = ((value >> written) & ((1u64 << take) - 1)) as u8;
            if let Some(last) = self.bytes.last_mut() {
                *last |= chunk << offset;
            }
            written += take;
            self.position += take as usize;
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.write_bits(u64::from(value), 8);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.write_bits(u64::from(value), 16);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.write_bits(u64::from(value), 32);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.write_bits(value, 64);
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        if self.position % 8 == 0 {
            self.bytes.extend_from_slice(bytes);
            self.position += bytes.len() * 8;
        } else {
            for &b in bytes {
                self.write_u8(b);
            }
        }
    }

    /// Write `text` into a `width`-byte field, NUL-padded. Text longer than the
    /// field is cut at the last char boundary that fits.
    pub fn write_string(&mut self, text: &str, width: usize) {
        let mut end = text.len().min(width);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        self.write_bytes(&text.as_bytes()[..end]);
        for _ in end..width {
            self.write_u8(0);
        }
    }

    pub fn write_bit_set(&mut self, set: &BitSet) {
        self.write_bits(set.raw(), set.len());
    }

    /// Pad with zero bits up to the next byte boundary.
    pub fn align(&mut self) {
        self.position = self.position.next_multiple_of(8);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Fixed-width run of flag bits, bit 0 first on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BitSet {
    bits: u64,
    len: u32,
}

impl BitSet {
    pub fn new(len: u32) -> Self {
        Self::from_raw(0, len)
    }

    /// Bits above `len` are dropped.
    pub fn from_raw(bits: u64, len: u32) -> Self {
        let len = len.min(64);
        let mask = if len == 64 { u64::MAX } else { (1u64 << len) - 1 };
        Self {
            bits: bits & mask,
            len,
        }
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn raw(&self) -> u64 {
        self.bits
    }

    pub fn get(&self, index: u32) -> bool {
        index < self.len && self.bits & (1 << index) != 0
    }

    pub fn set(&mut self, index: u32, value: bool) {
        if index >= self.len {
            return;
        }
        if value {
            self.bits |= 1 << index;
        } else {
            self.bits &= !(1 << index);
        }
    }

    pub fn count_ones(&self) -> u32 {
        self.bits.count_ones()
    }
}
