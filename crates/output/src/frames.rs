// Copyright 2025-2026 CEMAXECUTER LLC

use std::io::{self, Write};

use ol_protocol::unpack_bits;

/// How encoded frames are laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// Bytes as transmitted, MSB first
    Packed,
    /// One bit per byte, for feeding a GNU Radio modulator
    Unpacked,
}

/// Writes encoded frames for transmission or replay, separated by idle
/// (zero) bytes.
///
/// The idle gap also flushes the receiver's FEC decoder, so replaying the
/// output through the deframer yields every frame.
pub struct FrameWriter<W: Write> {
    writer: W,
    format: FrameFormat,
    idle_bytes: usize,
    frames: u64,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(writer: W, format: FrameFormat, idle_bytes: usize) -> Self {
        Self {
            writer,
            format,
            idle_bytes,
            frames: 0,
        }
    }

    /// Write one encoded frame followed by the idle gap.
    pub fn write_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        let mut bytes = Vec::with_capacity(frame.len() + self.idle_bytes);
        bytes.extend_from_slice(frame);
        bytes.resize(frame.len() + self.idle_bytes, 0);

        match self.format {
            FrameFormat::Packed => self.writer.write_all(&bytes)?,
            FrameFormat::Unpacked => self.writer.write_all(&unpack_bits(&bytes))?,
        }
        self.frames += 1;
        Ok(())
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
