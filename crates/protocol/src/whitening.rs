// Copyright 2025-2026 CEMAXECUTER LLC

//! PN9 data whitening as done by the CC1110.
//!
//! 9-bit LFSR x^9 + x^5 + 1, seeded with all ones at the start of every
//! frame. Each output byte is the low 8 bits of the register, after which
//! the register is clocked 8 times. XOR with the sequence both whitens and
//! dewhitens.

/// Register seed at the start of every frame
pub const PN9_SEED: u16 = 0b1_1111_1111;

/// PN9 sequence generator. One per frame and direction; never reuse across
/// frame boundaries.
#[derive(Debug, Clone)]
pub struct Pn9 {
    state: u16,
}

impl Pn9 {
    pub fn new() -> Self {
        Self { state: PN9_SEED }
    }

    /// Current 9-bit register contents
    pub fn state(&self) -> u16 {
        self.state
    }

    /// Emit the next whitening byte and clock the register 8 times.
    #[inline]
    pub fn next_byte(&mut self) -> u8 {
        let out = (self.state & 0xFF) as u8;
        for _ in 0..8 {
            let feedback = ((self.state >> 5) & 1) ^ (self.state & 1);
            self.state = (self.state >> 1) | (feedback << 8);
        }
        out
    }
}

impl Default for Pn9 {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for Pn9 {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        Some(self.next_byte())
    }
}

/// Whiten (or dewhiten) `data`, advancing `pn9` once per byte.
pub fn whiten(data: &[u8], pn9: &mut Pn9) -> Vec<u8> {
    data.iter().map(|&b| b ^ pn9.next_byte()).collect()
}

/// In-place variant of [`whiten`].
pub fn whiten_in_place(data: &mut [u8], pn9: &mut Pn9) {
    for b in data.iter_mut() {
        *b ^= pn9.next_byte();
    }
}
