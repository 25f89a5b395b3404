use serde::Serialize;

use crate::bits::{BitReader, BitWriter};
use crate::error::{Error, Result};

use super::types::{
    CHECKSUM_OFFSET, FILE_SIZE_OFFSET, HEADER_SIZE, KNOWN_VERSIONS, SIGNATURE,
    VERSION_RESURRECTED_2_4,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Header {
    pub magic: u32,
    pub version: u32,
    pub file_size: u32,
    pub checksum: u32,
}

impl Header {
    /// Header for a record built in code. Size and checksum are filled in by [`Header::fix`].
    pub fn new(version: u32) -> Self {
        Self {
            magic: SIGNATURE,
            version,
            file_size: 0,
            checksum: 0,
        }
    }

    pub fn read(r: &mut BitReader<'_>) -> Result<Self> {
        let magic = r.read_u32()?;
        if magic != SIGNATURE {
            return Err(Error::InvalidSignature { found: magic });
        }

        let version = r.read_u32()?;
        let file_size = r.read_u32()?;
        let checksum = r.read_u32()?;

        Ok(Self {
            magic,
            version,
            file_size,
            checksum,
        })
    }

    pub fn write(&self, w: &mut BitWriter) {
        w.write_u32(self.magic);
        w.write_u32(self.version);
        w.write_u32(self.file_size);
        w.write_u32(self.checksum);
    }

    pub fn is_known_version(&self) -> bool {
        KNOWN_VERSIONS.contains(&self.version)
    }

    /// Patch file size and checksum into a fully serialized save.
    ///
    /// The checksum bytes are zeroed before summing, so applying this twice
    /// gives the same bytes as applying it once.
    pub fn fix(bytes: &mut [u8]) -> Result<()> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::BufferUnderrun {
                position: bytes.len() * 8,
                requested: HEADER_SIZE * 8,
                available: bytes.len() * 8,
            });
        }

        let size = u32::try_from(bytes.len()).map_err(|_| Error::ValueOutOfRange {
            field: "file size",
            value: bytes.len() as u64,
            bits: 32,
        })?;
        bytes[FILE_SIZE_OFFSET..FILE_SIZE_OFFSET + 4].copy_from_slice(&size.to_le_bytes());

        let sum = checksum(bytes);
        bytes[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].copy_from_slice(&sum.to_le_bytes());
        Ok(())
    }

    /// Compare the stored checksum against one recomputed over `bytes`.
    pub fn verify(bytes: &[u8]) -> Result<()> {
        let Some(stored) = bytes.get(CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4) else {
            return Err(Error::BufferUnderrun {
                position: 0,
                requested: HEADER_SIZE * 8,
                available: bytes.len() * 8,
            });
        };
        let stored = u32::from_le_bytes([stored[0], stored[1], stored[2], stored[3]]);
        let computed = checksum(bytes);
        if stored != computed {
            return Err(Error::ChecksumMismatch { stored, computed });
        }
        Ok(())
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new(VERSION_RESURRECTED_2_4)
    }
}

/// Rotate-and-add sum over the whole save with the checksum field read as zero.
pub fn checksum(bytes: &[u8]) -> u32 {
    let field = CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4;
    bytes.iter().enumerate().fold(0u32, |sum, (i, &b)| {
        let b = if field.contains(&i) { 0 } else { b };
        sum.rotate_left(1).wrapping_add(u32::from(b))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serialized(version: u32, body: &[u8]) -> Vec<u8> {
        let mut w = BitWriter::new();
        Header::new(version).write(&mut w);
        w.write_bytes(body);
        w.into_bytes()
    }

    #[test]
    fn read_rejects_bad_magic() {
        let bytes = [0u8; 16];
        let mut r = BitReader::new(&bytes);
        assert_eq!(
            Header::read(&mut r),
            Err(Error::InvalidSignature { found: 0 })
        );
    }

    #[test]
    fn read_does_not_check_checksum() {
        let mut bytes = serialized(0x61, b"body");
        bytes[12] = 0xEE;
        let mut r = BitReader::new(&bytes);
        let header = Header::read(&mut r).unwrap();
        assert_eq!(header.version, 0x61);
        assert_eq!(header.checksum, 0xEE);
        assert!(header.is_known_version());
    }

    #[test]
    fn fix_patches_size_and_checksum() {
        let mut bytes = serialized(0x62, &[1, 2, 3, 4, 5]);
        Header::fix(&mut bytes).unwrap();
        assert_eq!(u32::from_le_bytes(bytes[8..12].try_into().unwrap()), 21);
        Header::verify(&bytes).unwrap();

        let mut r = BitReader::new(&bytes);
        let header = Header::read(&mut r).unwrap();
        assert_eq!(header.file_size, 21);
        assert_eq!(header.checksum, checksum(&bytes));
    }

    #[test]
    fn fix_is_idempotent() {
        let mut once = serialized(0x62, b"some save body");
        Header::fix(&mut once).unwrap();
        let mut twice = once.clone();
        Header::fix(&mut twice).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn checksum_ignores_its_own_field() {
        let mut a = serialized(0x62, b"xyz");
        let mut b = a.clone();
        a[12..16].copy_from_slice(&[1, 2, 3, 4]);
        b[12..16].copy_from_slice(&[9, 9, 9, 9]);
        assert_eq!(checksum(&a), checksum(&b));
    }

    #[test]
    fn verify_detects_tampering() {
        let mut bytes = serialized(0x62, b"gold");
        Header::fix(&mut bytes).unwrap();
        bytes[17] ^= 0x01;
        assert!(matches!(
            Header::verify(&bytes),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn fix_rejects_short_buffers() {
        let mut bytes = [0u8; 8];
        assert!(Header::fix(&mut bytes).is_err());
        assert!(Header::verify(&bytes).is_err());
    }

    #[test]
    fn checksum_matches_signed_doubling_definition() {
        let bytes: Vec<u8> = (0..=255u8).cycle().take(700).collect();
        let mut expected: i32 = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let b = if (12..16).contains(&i) { 0 } else { b };
            let carry = i32::from(expected < 0);
            expected = i32::from(b)
                .wrapping_add(expected.wrapping_mul(2))
                .wrapping_add(carry);
        }
        assert_eq!(checksum(&bytes), expected as u32);
    }
}
