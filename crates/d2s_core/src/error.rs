use thiserror::Error;

/// Errors produced while decoding or encoding a character save.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A read needed more bits than the buffer had left.
    #[error("buffer underrun at bit {position}: requested {requested} bits, {available} available")]
    BufferUnderrun {
        position: usize,
        requested: usize,
        available: usize,
    },

    /// The full decode finished without consuming exactly the whole buffer.
    #[error("decode consumed {consumed_bits} of {total_bits} bits")]
    LengthMismatch {
        consumed_bits: usize,
        total_bits: usize,
    },

    #[error("unsupported save version 0x{version:02x} for {section}")]
    UnsupportedVersion { version: u32, section: &'static str },

    #[error("invalid save signature 0x{found:08x}")]
    InvalidSignature { found: u32 },

    #[error("checksum mismatch: stored 0x{stored:08x}, computed 0x{computed:08x}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("invalid {section} header: expected {expected:?}, found {found:?}")]
    InvalidSectionHeader {
        section: &'static str,
        expected: &'static [u8],
        found: Vec<u8>,
    },

    #[error("invalid {section}: {message}")]
    InvalidSection {
        section: &'static str,
        message: String,
    },

    #[error("invalid text in {width}-byte field")]
    InvalidText { width: usize },

    #[error("unknown attribute id {id}")]
    UnknownAttribute { id: u16 },

    #[error("value {value} for {field} does not fit in {bits} bits")]
    ValueOutOfRange {
        field: &'static str,
        value: u64,
        bits: u32,
    },

    /// The status flags require a section the record does not carry.
    #[error("missing {section} section")]
    MissingSection { section: &'static str },

    #[error("bit width {requested} exceeds 64")]
    BitWidth { requested: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn invalid_section(section: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidSection {
            section,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_section() {
        let err = Error::UnsupportedVersion {
            version: 0x60,
            section: "item list",
        };
        assert_eq!(err.to_string(), "unsupported save version 0x60 for item list");

        let err = Error::invalid_section("golem", "present flag 7");
        assert_eq!(err.to_string(), "invalid golem: present flag 7");
    }

    #[test]
    fn underrun_reports_position() {
        let err = Error::BufferUnderrun {
            position: 24,
            requested: 32,
            available: 8,
        };
        assert!(err.to_string().contains("bit 24"));
    }
}
