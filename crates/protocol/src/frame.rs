// Copyright 2025-2026 CEMAXECUTER LLC

use crate::config::RadioConfig;
use crate::crc::crc16;
use crate::error::{ConfigError, CrcError, FrameError};
use crate::fec::encode_fec;
use crate::whitening::{whiten_in_place, Pn9};

/// Smallest data section: flags(1) + seqnum(2) + HWID(2) + CRC(2)
pub const MIN_DATA_SECTION: usize = 7;
/// Largest application payload that keeps the length byte in range
pub const MAX_PAYLOAD: usize = u8::MAX as usize - MIN_DATA_SECTION;
/// Serialized message header: HWID(2) + seqnum(2)
pub const MESSAGE_HEADER: usize = 4;

/// Application message as exchanged with the host:
/// `| HWID (2) | Seqnum (2) | Data (N) |`, HWID and seqnum little-endian.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub hwid: u16,
    pub seqnum: u16,
    pub data: Vec<u8>,
}

impl Message {
    pub fn new(hwid: u16, seqnum: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            hwid,
            seqnum,
            data: data.into(),
        }
    }

    /// Parse the host byte form.
    pub fn from_bytes(raw: &[u8]) -> Result<Self, FrameError> {
        if raw.len() < MESSAGE_HEADER {
            return Err(FrameError::MessageTooShort(raw.len()));
        }
        Ok(Self {
            hwid: u16::from_le_bytes([raw[0], raw[1]]),
            seqnum: u16::from_le_bytes([raw[2], raw[3]]),
            data: raw[MESSAGE_HEADER..].to_vec(),
        })
    }

    /// Host byte form
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(MESSAGE_HEADER + self.data.len());
        raw.extend_from_slice(&self.hwid.to_le_bytes());
        raw.extend_from_slice(&self.seqnum.to_le_bytes());
        raw.extend_from_slice(&self.data);
        raw
    }

    /// Value of the length byte for this message on the wire
    pub fn rf_length(&self) -> usize {
        self.data.len() + MIN_DATA_SECTION
    }
}

/// Build the plain (unwhitened, unencoded) data section:
/// `| Length | Flags | Seqnum (2) | Data (N) | HWID (2) | CRC (2, LE) |`
///
/// The HWID moves from the front of the message to just before the CRC.
pub fn build_data_section(msg: &Message, flags: u8) -> Result<Vec<u8>, FrameError> {
    if msg.data.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLong(msg.data.len()));
    }

    let mut content = Vec::with_capacity(msg.rf_length() + 1);
    content.push(msg.rf_length() as u8);
    content.push(flags);
    content.extend_from_slice(&msg.seqnum.to_le_bytes());
    content.extend_from_slice(&msg.data);
    content.extend_from_slice(&msg.hwid.to_le_bytes());

    let checksum = crc16(&content);
    content.extend_from_slice(&checksum.to_le_bytes());
    Ok(content)
}

/// Validate a received data section (everything after the length byte) and
/// reframe it to host form. Returns the message and its flags byte.
pub fn parse_data_section(raw: &[u8]) -> Result<(Message, u8), FrameError> {
    let len = raw.len();
    if len < MIN_DATA_SECTION {
        return Err(FrameError::TooShort(len));
    }

    let actual = u16::from_le_bytes([raw[len - 2], raw[len - 1]]);
    // The CRC covers the length byte, which is not part of `raw`
    let mut covered = Vec::with_capacity(len - 1);
    covered.push(len as u8);
    covered.extend_from_slice(&raw[..len - 2]);
    let expected = crc16(&covered);
    if actual != expected {
        return Err(CrcError { expected, actual }.into());
    }

    let flags = raw[0];
    let msg = Message {
        hwid: u16::from_le_bytes([raw[len - 4], raw[len - 3]]),
        seqnum: u16::from_le_bytes([raw[1], raw[2]]),
        data: raw[3..len - 4].to_vec(),
    };
    Ok((msg, flags))
}

/// Encode direction: message in, ready-to-transmit bytes out.
#[derive(Debug, Clone)]
pub struct Framer {
    config: RadioConfig,
    header: Vec<u8>,
}

impl Framer {
    pub fn new(config: RadioConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut header = config.preamble();
        header.extend_from_slice(&config.sync_word());
        Ok(Self { config, header })
    }

    pub fn config(&self) -> &RadioConfig {
        &self.config
    }

    /// `| Preamble | Sync word(s) | Data section |`
    ///
    /// Per the CC1110 datasheet whitening is applied before FEC.
    pub fn encode(&self, msg: &Message) -> Result<Vec<u8>, FrameError> {
        let mut content = build_data_section(msg, self.config.flags)?;

        if self.config.whitening {
            whiten_in_place(&mut content, &mut Pn9::new());
        }
        if self.config.fec {
            content = encode_fec(&content);
        }

        let mut out = Vec::with_capacity(self.header.len() + content.len());
        out.extend_from_slice(&self.header);
        out.extend_from_slice(&content);
        log::trace!(
            "framed hwid={:04x} seq={} ({} bytes on air)",
            msg.hwid,
            msg.seqnum,
            out.len()
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello() -> Message {
        Message::new(0x1234, 1, b"hello".to_vec())
    }

    fn config(fec: bool, whitening: bool) -> RadioConfig {
        RadioConfig {
            fec,
            whitening,
            ..Default::default()
        }
    }

    #[test]
    fn test_message_bytes() {
        let msg = hello();
        let raw = msg.to_bytes();
        assert_eq!(raw, [0x34, 0x12, 0x01, 0x00, b'h', b'e', b'l', b'l', b'o']);
        assert_eq!(Message::from_bytes(&raw).unwrap(), msg);
        assert_eq!(Message::from_bytes(&raw[..3]), Err(FrameError::MessageTooShort(3)));
    }

    #[test]
    fn test_data_section_layout() {
        let section = build_data_section(&hello(), 0xC0).unwrap();
        assert_eq!(
            section,
            [0x0C, 0xC0, 0x01, 0x00, b'h', b'e', b'l', b'l', b'o', 0x34, 0x12, 0x46, 0x3C]
        );
        // Length counts every byte after itself
        assert_eq!(section[0] as usize, section.len() - 1);
    }

    #[test]
    fn test_parse_data_section() {
        let section = build_data_section(&hello(), 0xC0).unwrap();
        let (msg, flags) = parse_data_section(&section[1..]).unwrap();
        assert_eq!(msg, hello());
        assert_eq!(flags, 0xC0);
    }

    #[test]
    fn test_parse_empty_payload() {
        let msg = Message::new(0xBEEF, 0xFFFF, Vec::new());
        let section = build_data_section(&msg, 0x40).unwrap();
        assert_eq!(section[0], 7);
        assert_eq!(parse_data_section(&section[1..]).unwrap(), (msg, 0x40));
    }

    #[test]
    fn test_parse_crc_error() {
        let mut section = build_data_section(&hello(), 0xC0).unwrap();
        section[5] ^= 0x01;
        match parse_data_section(&section[1..]) {
            Err(FrameError::Crc(CrcError { expected, actual })) => {
                assert_eq!(actual, 0x3C46);
                assert_ne!(expected, actual);
            }
            other => panic!("expected CRC error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_too_short() {
        assert_eq!(parse_data_section(&[0xC0, 0, 0, 0, 0, 0]), Err(FrameError::TooShort(6)));
    }

    #[test]
    fn test_payload_limit() {
        let max = Message::new(1, 2, vec![0x55; MAX_PAYLOAD]);
        let section = build_data_section(&max, 0).unwrap();
        assert_eq!(section[0], 0xFF);

        let too_long = Message::new(1, 2, vec![0x55; MAX_PAYLOAD + 1]);
        assert_eq!(
            build_data_section(&too_long, 0),
            Err(FrameError::PayloadTooLong(MAX_PAYLOAD + 1))
        );
    }

    #[test]
    fn test_encode_plain() {
        let framer = Framer::new(config(false, false)).unwrap();
        let out = framer.encode(&hello()).unwrap();
        let expected = [
            0xAA, 0xAA, 0xAA, 0xAA, 0xD3, 0x91, 0xD3, 0x91, 0x0C, 0xC0, 0x01, 0x00, 0x68, 0x65,
            0x6C, 0x6C, 0x6F, 0x34, 0x12, 0x46, 0x3C,
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn test_encode_whitened() {
        let framer = Framer::new(config(false, true)).unwrap();
        let out = framer.encode(&hello()).unwrap();
        let expected = [
            0xAA, 0xAA, 0xAA, 0xAA, 0xD3, 0x91, 0xD3, 0x91, 0xF3, 0x21, 0x1C, 0x9A, 0x85, 0xE0,
            0x5F, 0x48, 0x85, 0x4E, 0xC0, 0x7F, 0x4C,
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn test_encode_fec() {
        let framer = Framer::new(config(true, false)).unwrap();
        let out = framer.encode(&hello()).unwrap();
        let expected = [
            0xAA, 0xAA, 0xAA, 0xAA, 0xD3, 0x91, 0xD3, 0x91, 0x00, 0x28, 0x28, 0xCC, 0x0C, 0x30,
            0x30, 0x10, 0x2E, 0x6E, 0x3B, 0x0C, 0x22, 0xA9, 0x74, 0xFE, 0xEA, 0x86, 0xC7, 0x9F,
            0xB7, 0x90, 0xCC, 0xF7, 0x42, 0x07, 0x4B, 0xF4, 0x04, 0x03, 0x04, 0x0E,
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn test_encode_fec_whitened() {
        let framer = Framer::new(RadioConfig::default()).unwrap();
        let out = framer.encode(&hello()).unwrap();
        let expected = [
            0xAA, 0xAA, 0xAA, 0xAA, 0xD3, 0x91, 0xD3, 0x91, 0xDA, 0x01, 0xC2, 0xE7, 0x83, 0xF7,
            0x97, 0x89, 0x13, 0x27, 0xDE, 0x10, 0xF8, 0xE9, 0x77, 0x14, 0x73, 0x67, 0x8D, 0x23,
            0x90, 0xA2, 0xB1, 0x8F, 0x43, 0x0A, 0x4B, 0xF1, 0x04, 0x03, 0x04, 0x0E,
        ];
        assert_eq!(out, expected);
    }

    #[test]
    fn test_framer_rejects_invalid_config() {
        let bad = RadioConfig {
            sync_words: 3,
            ..Default::default()
        };
        assert!(Framer::new(bad).is_err());
    }
}
