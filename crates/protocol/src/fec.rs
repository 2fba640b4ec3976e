// Copyright 2025-2026 CEMAXECUTER LLC

//! Forward error correction for the CC1110 packet engine (TI DN504).
//!
//! Convolutional code, rate 1/2, constraint length K=4 (3 memory bits,
//! 8 trellis states). The encoder output is grouped in 4-byte blocks and each
//! block is interleaved as a 4x4 grid of 2-bit symbols.
//!
//! The decoder is a streaming hard-decision Viterbi decoder: it takes one
//! 4-byte block at a time and emits decoded bytes with a fixed latency of
//! 32 symbols (4 bytes of traceback), always tracing back from state 0.

use crate::error::FecError;

/// Number of memory bits in the shift register.
const FEC_MEM: usize = 3;
/// Number of trellis states (2^FEC_MEM).
pub const FEC_STATES: usize = 1 << FEC_MEM;
/// Bytes per interleaver block
pub const FEC_CHUNK: usize = 4;
/// Bits per interleaver block
pub const FEC_CHUNK_BITS: usize = FEC_CHUNK * 8;
/// Appended to every encoded buffer to drive the trellis out of the data
pub const FEC_TERMINATOR: [u8; 2] = [0x0B, 0x0B];

/// Encoder output (2 bits) indexed by the top 4 bits of the 11-bit register.
const FEC_ENCODE_TABLE: [u8; 16] = [0, 3, 1, 2, 3, 0, 2, 1, 3, 0, 2, 1, 0, 3, 1, 2];

/// The two source states feeding each destination state.
const SOURCE_STATES: [(usize, usize); FEC_STATES] = [
    (0, 4), (0, 4), (1, 5), (1, 5), (2, 6), (2, 6), (3, 7), (3, 7),
];
/// Expected 2-bit output for the transition from each source state.
const TRANSITION_OUTPUT: [(u8, u8); FEC_STATES] = [
    (0, 3), (3, 0), (1, 2), (2, 1), (3, 0), (0, 3), (2, 1), (1, 2),
];
/// Input bit that leads into each destination state.
const TRANSITION_INPUT: [u32; FEC_STATES] = [0, 1, 0, 1, 0, 1, 0, 1];

/// Starting path cost for every state of a fresh session.
const INITIAL_COST: u32 = 100;
/// Traceback depth in symbols before the first byte is emitted.
const TRACEBACK_BITS: u32 = 32;

/// Interleave (or deinterleave) one 4-byte block.
///
/// The block is read as a little-endian 32-bit word, split MSB first into
/// sixteen 2-bit symbols laid out row by row in a 4x4 grid, and written back
/// column by column. Transposing twice is the identity, so the same function
/// serves both directions.
pub fn interleave(chunk: &[u8]) -> Result<[u8; FEC_CHUNK], FecError> {
    if chunk.len() != FEC_CHUNK {
        return Err(FecError::ChunkLength(chunk.len()));
    }
    let mut block = [0u8; FEC_CHUNK];
    block.copy_from_slice(chunk);
    Ok(interleave_block(&block))
}

fn interleave_block(block: &[u8; FEC_CHUNK]) -> [u8; FEC_CHUNK] {
    let word = u32::from_le_bytes(*block);

    let mut grid = [[0u32; 4]; 4];
    for (i, cell) in grid.iter_mut().flatten().enumerate() {
        *cell = (word >> (30 - 2 * i)) & 0x3;
    }

    let mut flipped: u32 = 0;
    for x in 0..4 {
        for row in &grid {
            flipped = (flipped << 2) | row[x];
        }
    }
    flipped.to_le_bytes()
}

/// Convolutional encode + interleave, as the CC1110 does on transmit.
///
/// Appends the two terminator bytes, produces two coded bytes per input
/// byte, and interleaves every 4 coded bytes. A trailing half block is
/// zero-padded.
pub fn encode_fec(data: &[u8]) -> Vec<u8> {
    let mut coded = Vec::with_capacity((data.len() + FEC_TERMINATOR.len()) * 2);
    let mut reg: u16 = 0; // 11-bit shift register

    for &byte in data.iter().chain(FEC_TERMINATOR.iter()) {
        reg = (reg & 0x700) | byte as u16;
        let mut output: u16 = 0;
        for _ in 0..8 {
            output = (output << 2) | FEC_ENCODE_TABLE[(reg >> 7) as usize] as u16;
            reg = (reg << 1) & 0x7FF;
        }
        coded.extend_from_slice(&output.to_be_bytes());
    }

    let mut out = Vec::with_capacity(coded.len().div_ceil(FEC_CHUNK) * FEC_CHUNK);
    let mut blocks = coded.chunks_exact(FEC_CHUNK);
    let mut block = [0u8; FEC_CHUNK];
    for chunk in &mut blocks {
        block.copy_from_slice(chunk);
        out.extend_from_slice(&interleave_block(&block));
    }

    match blocks.remainder() {
        [] => {}
        rem @ [_, _] => {
            block = [0u8; FEC_CHUNK];
            block[..2].copy_from_slice(rem);
            out.extend_from_slice(&interleave_block(&block));
        }
        rem => unreachable!("unexpected FEC chunk length {}", rem.len()),
    }

    out
}

/// Streaming Viterbi decoder: one decode session per frame.
///
/// Costs and traceback registers are double buffered; `last` selects the
/// previous generation. Each traceback register holds the 32 most recent
/// decisions of the survivor path ending in that state.
#[derive(Debug, Clone)]
pub struct ViterbiDecoder {
    cost: [[u32; FEC_STATES]; 2],
    path: [[u32; FEC_STATES]; 2],
    last: usize,
    path_bits: u32,
}

impl ViterbiDecoder {
    pub fn new() -> Self {
        Self {
            cost: [[INITIAL_COST; FEC_STATES], [0; FEC_STATES]],
            path: [[0; FEC_STATES]; 2],
            last: 0,
            path_bits: 0,
        }
    }

    /// Start a new session (new frame).
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Symbols accumulated and not yet emitted as bytes
    pub fn path_bits(&self) -> u32 {
        self.path_bits
    }

    /// Decode one received block. Returns the bytes that left the traceback
    /// window: none for the first block of a session, one for the second and
    /// two for every block after that.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<u8>, FecError> {
        if chunk.len() != FEC_CHUNK {
            return Err(FecError::ChunkLength(chunk.len()));
        }
        let mut block = [0u8; FEC_CHUNK];
        block.copy_from_slice(chunk);
        Ok(self.decode_chunk(&block))
    }

    /// Decode one received block; see [`ViterbiDecoder::feed`].
    pub fn decode_chunk(&mut self, chunk: &[u8; FEC_CHUNK]) -> Vec<u8> {
        let deinterleaved = interleave_block(chunk);
        let mut out = Vec::with_capacity(2);

        for byte in deinterleaved {
            for shift in [6, 4, 2, 0] {
                self.decode_symbol((byte >> shift) & 0x3, &mut out);
            }
        }

        out
    }

    fn decode_symbol(&mut self, symbol: u8, out: &mut Vec<u8>) {
        let last = self.last;
        let cur = last ^ 1;
        let mut min_cost: u32 = 0xFF;

        for dest in 0..FEC_STATES {
            let (src0, src1) = SOURCE_STATES[dest];
            let (out0, out1) = TRANSITION_OUTPUT[dest];
            let cost0 = self.cost[last][src0] + (symbol ^ out0).count_ones();
            let cost1 = self.cost[last][src1] + (symbol ^ out1).count_ones();

            let (cost, src) = if cost0 < cost1 { (cost0, src0) } else { (cost1, src1) };
            self.cost[cur][dest] = cost;
            min_cost = min_cost.min(cost);
            self.path[cur][dest] = (self.path[last][src] << 1) | TRANSITION_INPUT[dest];
        }

        self.path_bits += 1;
        if self.path_bits >= TRACEBACK_BITS {
            out.push((self.path[cur][0] >> 24) as u8);
            self.path_bits -= 8;
        }

        // Swap generations and renormalize so costs stay small
        self.last = cur;
        for c in self.cost[cur].iter_mut() {
            *c -= min_cost;
        }
    }
}

impl Default for ViterbiDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a whole FEC buffer with a fresh session.
///
/// Because of the traceback latency the output is `2 * blocks - 3` bytes
/// long; an encoded buffer whose last block was padded decodes to exactly
/// the original data.
pub fn decode_fec(encoded: &[u8]) -> Result<Vec<u8>, FecError> {
    let mut decoder = ViterbiDecoder::new();
    let mut out = Vec::with_capacity(encoded.len() / 2);
    for chunk in encoded.chunks(FEC_CHUNK) {
        out.extend(decoder.feed(chunk)?);
    }
    Ok(out)
}
