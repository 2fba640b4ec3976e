// Copyright 2025-2026 CEMAXECUTER LLC

//! Streaming receive side: turns an unbounded stream of demodulated bits
//! into validated messages.
//!
//! Bits may arrive in chunks of any size. Each call to [`Deframer::feed`]
//! appends to an internal bit queue and then advances the state machine
//! until it runs out of input. A frame split across any number of calls
//! decodes the same as one delivered in a single call.

use std::collections::VecDeque;

use serde::Serialize;

use crate::bits::pack_iter;
use crate::config::RadioConfig;
use crate::error::ConfigError;
use crate::fec::{ViterbiDecoder, FEC_CHUNK, FEC_CHUNK_BITS};
use crate::frame::{parse_data_section, Message, MIN_DATA_SECTION};
use crate::whitening::{whiten_in_place, Pn9};

/// Where the receiver is within the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramerState {
    SeekingPreamble,
    SeekingSyncWord,
    AwaitingLength,
    AwaitingLengthFec,
    AwaitingData,
    AwaitingDataFec,
}

/// Receive counters, cumulative over the life of a [`Deframer`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeframerStats {
    /// Frames delivered
    pub frames_ok: u64,
    /// Frames dropped on checksum mismatch
    pub crc_errors: u64,
    /// Valid frames rejected by the flag filter
    pub filtered: u64,
    /// Frames whose length byte could not hold a data section
    pub short_frames: u64,
    /// Preamble matches not followed by the sync word
    pub sync_losses: u64,
}

/// Consumer of decoded messages.
pub trait MessageSink {
    fn deliver(&mut self, msg: Message);
}

impl MessageSink for Vec<Message> {
    fn deliver(&mut self, msg: Message) {
        self.push(msg);
    }
}

/// Streaming deframer. One per bit stream.
#[derive(Debug, Clone)]
pub struct Deframer {
    config: RadioConfig,
    /// Expected preamble, one bit per entry
    preamble: Vec<u8>,
    sync_word: Vec<u8>,
    bits: VecDeque<u8>,
    state: FramerState,
    /// Data section length from the current frame's length byte
    length: usize,
    /// Decoded (and dewhitened) data section bytes of the current FEC frame
    decoded: Vec<u8>,
    pn9: Pn9,
    viterbi: ViterbiDecoder,
    stats: DeframerStats,
}

impl Deframer {
    pub fn new(config: RadioConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let preamble = (0..config.preamble_bits())
            .map(|i| if i % 2 == 0 { 1 } else { 0 })
            .collect();
        let sync_word = config.sync_word();
        Ok(Self {
            config,
            preamble,
            sync_word,
            bits: VecDeque::new(),
            state: FramerState::SeekingPreamble,
            length: 0,
            decoded: Vec::new(),
            pn9: Pn9::new(),
            viterbi: ViterbiDecoder::new(),
            stats: DeframerStats::default(),
        })
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    pub fn state(&self) -> FramerState {
        self.state
    }

    /// Bits received and not yet consumed by the state machine
    pub fn buffered_bits(&self) -> usize {
        self.bits.len()
    }

    pub fn stats(&self) -> &DeframerStats {
        &self.stats
    }

    /// Drop any partial frame and buffered bits. Counters are kept.
    pub fn reset(&mut self) {
        self.bits.clear();
        self.decoded.clear();
        self.length = 0;
        self.enter(FramerState::SeekingPreamble);
    }

    /// Feed bits (one per byte, 0 or 1) and collect any completed messages.
    pub fn feed(&mut self, bits: &[u8]) -> Vec<Message> {
        let mut out = Vec::new();
        self.feed_into(bits, &mut out);
        out
    }

    /// Feed bits and hand completed messages to `sink`.
    pub fn feed_into<S: MessageSink + ?Sized>(&mut self, bits: &[u8], sink: &mut S) {
        self.bits.extend(bits.iter().map(|b| b & 1));
        while self.step(sink) {}
    }

    /// Advance the state machine by one transition. Returns false when more
    /// input is needed.
    fn step<S: MessageSink + ?Sized>(&mut self, sink: &mut S) -> bool {
        match self.state {
            FramerState::SeekingPreamble => self.seek_preamble(),
            FramerState::SeekingSyncWord => self.seek_sync_word(),
            FramerState::AwaitingLength => self.read_length(),
            FramerState::AwaitingLengthFec => self.read_length_fec(),
            FramerState::AwaitingData => self.read_data(sink),
            FramerState::AwaitingDataFec => self.read_data_fec(sink),
        }
    }

    fn seek_preamble(&mut self) -> bool {
        let window = self.preamble.len();
        if self.bits.len() < window {
            return false;
        }

        let matches = self
            .bits
            .iter()
            .zip(&self.preamble)
            .filter(|(rx, expected)| rx == expected)
            .count();

        // Frames start on a 1 bit; a shifted match would misalign the sync word
        if self.bits[0] == 1 && matches >= self.config.preamble_quality as usize {
            self.enter(FramerState::SeekingSyncWord);
        } else {
            self.bits.pop_front();
        }
        true
    }

    fn seek_sync_word(&mut self) -> bool {
        let start = self.preamble.len();
        let end = start + self.config.sync_bits();
        if self.bits.len() < end {
            return false;
        }

        let received = pack_iter(self.bits.range(start..end).copied());
        if received == self.sync_word {
            self.bits.drain(..end);
            self.enter(if self.config.fec {
                FramerState::AwaitingLengthFec
            } else {
                FramerState::AwaitingLength
            });
        } else {
            self.stats.sync_losses += 1;
            self.bits.pop_front();
            self.enter(FramerState::SeekingPreamble);
        }
        true
    }

    fn read_length(&mut self) -> bool {
        if self.bits.len() < 8 {
            return false;
        }

        let mut length = self.take_bytes(1);
        self.pn9 = Pn9::new();
        if self.config.whitening {
            whiten_in_place(&mut length, &mut self.pn9);
        }
        self.accept_length(length[0] as usize, FramerState::AwaitingData);
        true
    }

    fn read_length_fec(&mut self) -> bool {
        // The decoder needs two blocks before the first byte leaves traceback
        if self.bits.len() < 2 * FEC_CHUNK_BITS {
            return false;
        }

        self.viterbi.reset();
        self.pn9 = Pn9::new();
        self.decoded.clear();
        // A fresh session yields nothing for the first block and exactly
        // one byte, the length, for the second
        for _ in 0..2 {
            let decoded = self.decode_next_chunk();
            self.decoded.extend(decoded);
        }
        let length = self.decoded.remove(0) as usize;
        self.accept_length(length, FramerState::AwaitingDataFec);
        true
    }

    fn accept_length(&mut self, length: usize, next: FramerState) {
        if length < MIN_DATA_SECTION {
            log::debug!("dropping frame with length {}", length);
            self.stats.short_frames += 1;
            self.decoded.clear();
            self.enter(FramerState::SeekingPreamble);
            return;
        }
        self.length = length;
        self.enter(next);
    }

    fn read_data<S: MessageSink + ?Sized>(&mut self, sink: &mut S) -> bool {
        if self.bits.len() < self.length * 8 {
            return false;
        }

        let mut raw = self.take_bytes(self.length);
        if self.config.whitening {
            whiten_in_place(&mut raw, &mut self.pn9);
        }
        self.complete(&raw, sink);
        true
    }

    fn read_data_fec<S: MessageSink + ?Sized>(&mut self, sink: &mut S) -> bool {
        if self.decoded.len() >= self.length {
            let raw = std::mem::take(&mut self.decoded);
            self.complete(&raw[..self.length], sink);
            return true;
        }
        if self.bits.len() < FEC_CHUNK_BITS {
            return false;
        }

        let decoded = self.decode_next_chunk();
        self.decoded.extend(decoded);
        true
    }

    /// Viterbi decode the next 4 bytes of input, dewhitening the output if
    /// enabled.
    fn decode_next_chunk(&mut self) -> Vec<u8> {
        let mut block = [0u8; FEC_CHUNK];
        block.copy_from_slice(&self.take_bytes(FEC_CHUNK));
        let mut decoded = self.viterbi.decode_chunk(&block);
        if self.config.whitening {
            whiten_in_place(&mut decoded, &mut self.pn9);
        }
        decoded
    }

    fn take_bytes(&mut self, n: usize) -> Vec<u8> {
        pack_iter(self.bits.drain(..n * 8))
    }

    /// Validate a complete data section and deliver it if it passes.
    fn complete<S: MessageSink + ?Sized>(&mut self, raw: &[u8], sink: &mut S) {
        match parse_data_section(raw) {
            Ok((msg, flags)) => {
                if self.config.accepts_flags(flags) {
                    log::trace!(
                        "frame ok: hwid={:04x} seq={} len={}",
                        msg.hwid,
                        msg.seqnum,
                        msg.data.len()
                    );
                    self.stats.frames_ok += 1;
                    sink.deliver(msg);
                } else {
                    log::debug!("filtered frame with flags {:02x}", flags);
                    self.stats.filtered += 1;
                }
            }
            // Lengths below the minimum never get here, so this is a CRC failure
            Err(e) => {
                log::debug!("dropping frame: {}", e);
                self.stats.crc_errors += 1;
            }
        }
        self.length = 0;
        self.enter(FramerState::SeekingPreamble);
    }

    fn enter(&mut self, state: FramerState) {
        if state != self.state {
            log::trace!("{:?} -> {:?}", self.state, state);
        }
        self.state = state;
    }
}
