// Copyright 2025-2026 CEMAXECUTER LLC

/// Expand bytes into one bit per byte (0 or 1), MSB first.
pub fn unpack_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for shift in (0..8).rev() {
            bits.push((byte >> shift) & 1);
        }
    }
    bits
}

/// Pack one-bit-per-byte input into bytes, MSB first. Only the low bit of
/// each input byte is used; a trailing partial byte is zero-padded on the
/// right.
pub fn pack_bits(bits: &[u8]) -> Vec<u8> {
    pack_iter(bits.iter().copied())
}

pub(crate) fn pack_iter<I: IntoIterator<Item = u8>>(bits: I) -> Vec<u8> {
    let mut out = Vec::new();
    let mut acc: u8 = 0;
    let mut n = 0;
    for bit in bits {
        acc = (acc << 1) | (bit & 1);
        n += 1;
        if n == 8 {
            out.push(acc);
            acc = 0;
            n = 0;
        }
    }
    if n > 0 {
        out.push(acc << (8 - n));
    }
    out
}
