// Copyright 2025-2026 CEMAXECUTER LLC

//! Error types for the OpenLST codec.

use thiserror::Error;

/// Result alias for codec operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level codec error.
#[derive(Error, Debug)]
pub enum Error {
    #[error("FEC error: {0}")]
    Fec(#[from] FecError),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Checksum mismatch on a received data section.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("CRCError: expected {expected:04x} got {actual:04x}")]
pub struct CrcError {
    /// CRC computed over the received length byte and data section
    pub expected: u16,
    /// CRC carried in the last two bytes of the data section
    pub actual: u16,
}

/// FEC codec errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FecError {
    #[error("interleaving only works on 4 byte chunks, got {0} bytes")]
    ChunkLength(usize),
}

/// Framing and frame validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error(transparent)]
    Crc(#[from] CrcError),

    #[error("data section too short: {0} bytes (minimum 7)")]
    TooShort(usize),

    #[error("payload too long: {0} bytes (maximum 248)")]
    PayloadTooLong(usize),

    #[error("message too short: {0} bytes (need HWID and seqnum)")]
    MessageTooShort(usize),
}

/// Configuration rejected at construction or load time.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("sync_words must be 1 or 2, got {0}")]
    SyncWords(u8),

    #[error("preamble_bytes must be between 1 and 32, got {0}")]
    PreambleBytes(u8),

    #[error("preamble_quality must be between 1 and {max}, got {quality}")]
    PreambleQuality { quality: u16, max: u16 },

    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
