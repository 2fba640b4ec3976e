// Copyright 2025-2026 CEMAXECUTER LLC

/// CC1110 hardware CRC polynomial: x^16 + x^15 + x^2 + 1
pub const CRC16_POLY: u16 = 0x8005;
/// Register value at the start of every frame
pub const CRC16_INIT: u16 = 0xFFFF;

/// CRC-16 in the manner of the CC1110 packet handler.
/// Polynomial 0x8005, init 0xFFFF, MSB first, no reflection, no final XOR
/// (catalogued as CRC-16/CMS).
///
/// The radio computes it over the length byte and everything after it up to
/// (not including) the two CRC bytes.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = CRC16_INIT;

    for &byte in data {
        let mut b = byte;
        for _ in 0..8 {
            if ((crc & 0x8000) >> 8) as u8 ^ (b & 0x80) != 0 {
                crc = (crc << 1) ^ CRC16_POLY;
            } else {
                crc <<= 1;
            }
            b <<= 1;
        }
    }

    crc
}
