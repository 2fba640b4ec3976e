// Copyright 2025-2026 CEMAXECUTER LLC

pub mod file;

use crossbeam::channel::Sender;
use thiserror::Error;

pub use file::{BitFormat, FileSource};

/// A block of demodulated bits, one bit (0 or 1) per byte
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitBuf {
    pub bits: Vec<u8>,
}

impl BitBuf {
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("read error: {0}")]
    Read(#[from] std::io::Error),
}

/// Common trait for all bit stream sources
pub trait BitSource: Send {
    /// Start streaming bits into the channel.
    /// Runs until the input is exhausted, stop() is called, or the receiver
    /// goes away.
    fn start(&mut self, tx: Sender<BitBuf>) -> Result<(), SourceError>;

    /// Signal the source to stop streaming
    fn stop(&mut self);
}
