// Copyright 2025-2026 CEMAXECUTER LLC

//! Radio framing configuration shared by the framer and the deframer.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Preamble byte (alternating 1010...)
pub const PREAMBLE_BYTE: u8 = 0xAA;
/// Longest preamble we accept in a configuration
pub const MAX_PREAMBLE_BYTES: u8 = 32;

/// Framing parameters. Must match on both ends of the link.
///
/// Defaults are the OpenLST ground station settings: 4 preamble bytes, sync
/// word `D3 91` sent twice, FEC and whitening enabled. Ground frames go out
/// with flags 0xC0; the receiver only accepts frames with bit 7 clear, so in
/// half-duplex it drops its own transmissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadioConfig {
    /// Preamble length in bytes
    pub preamble_bytes: u8,
    /// Minimum number of preamble bits that must match to start sync search
    pub preamble_quality: u16,
    /// First (most significant) sync byte, CC1110 SYNC1
    pub sync_byte1: u8,
    /// Second sync byte, CC1110 SYNC0
    pub sync_byte0: u8,
    /// Number of sync word repeats (1 or 2)
    pub sync_words: u8,
    /// Flags byte written on transmit
    pub flags: u8,
    /// Receive filter: a frame is delivered when `flags & flags_mask == rx_flags`
    pub rx_flags: u8,
    /// Flag bits examined by the receive filter
    pub flags_mask: u8,
    /// Rate 1/2 convolutional FEC with interleaving
    pub fec: bool,
    /// PN9 data whitening
    pub whitening: bool,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            preamble_bytes: 4,
            preamble_quality: 30,
            sync_byte1: 0xD3,
            sync_byte0: 0x91,
            sync_words: 2,
            flags: 0xC0,
            rx_flags: 0x00,
            flags_mask: 0x80,
            fec: true,
            whitening: true,
        }
    }
}

impl RadioConfig {
    /// Load and validate a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate a TOML configuration. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the framer or deframer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=2).contains(&self.sync_words) {
            return Err(ConfigError::SyncWords(self.sync_words));
        }
        if self.preamble_bytes == 0 || self.preamble_bytes > MAX_PREAMBLE_BYTES {
            return Err(ConfigError::PreambleBytes(self.preamble_bytes));
        }
        let max = self.preamble_bits() as u16;
        if self.preamble_quality == 0 || self.preamble_quality > max {
            return Err(ConfigError::PreambleQuality {
                quality: self.preamble_quality,
                max,
            });
        }
        Ok(())
    }

    /// Preamble as transmitted
    pub fn preamble(&self) -> Vec<u8> {
        vec![PREAMBLE_BYTE; self.preamble_bytes as usize]
    }

    pub fn preamble_bits(&self) -> usize {
        self.preamble_bytes as usize * 8
    }

    /// Full sync word: `[sync1, sync0]` repeated `sync_words` times
    pub fn sync_word(&self) -> Vec<u8> {
        [self.sync_byte1, self.sync_byte0].repeat(self.sync_words as usize)
    }

    pub fn sync_bits(&self) -> usize {
        self.sync_words as usize * 16
    }

    /// Receive-side flag filter
    #[inline]
    pub fn accepts_flags(&self, flags: u8) -> bool {
        flags & self.flags_mask == self.rx_flags
    }
}
