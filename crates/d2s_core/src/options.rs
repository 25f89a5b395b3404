//! Decoder options.

/// Knobs for [`SaveRecord::decode_with_options`](crate::SaveRecord::decode_with_options).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Recompute the header checksum over the input and reject a mismatch.
    /// Off by default: the game itself trusts the stored value.
    pub verify_checksum: bool,
    /// Fail when the decode does not end exactly on the last bit of the buffer.
    /// When off, leftover bits are logged and dropped.
    pub require_full_consumption: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            verify_checksum: false,
            require_full_consumption: true,
        }
    }
}

impl DecodeOptions {
    /// Every check on.
    pub fn strict() -> Self {
        Self {
            verify_checksum: true,
            require_full_consumption: true,
        }
    }

    /// Every check off.
    pub fn lenient() -> Self {
        Self {
            verify_checksum: false,
            require_full_consumption: false,
        }
    }

    #[must_use]
    pub fn with_checksum_verification(mut self, enabled: bool) -> Self {
        self.verify_checksum = enabled;
        self
    }

    #[must_use]
    pub fn with_full_consumption(mut self, required: bool) -> Self {
        self.require_full_consumption = required;
        self
    }
}
