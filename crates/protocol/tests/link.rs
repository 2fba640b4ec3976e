// Copyright 2025-2026 CEMAXECUTER LLC

//! End-to-end framer -> bit stream -> deframer scenarios.

use ol_protocol::{unpack_bits, Deframer, Framer, Message, RadioConfig};

/// One FEC block of idle bits, enough to flush the decoder after an odd
/// length frame.
const IDLE: [u8; 4] = [0; 4];

fn all_modes() -> Vec<RadioConfig> {
    let mut configs = Vec::new();
    for fec in [true, false] {
        for whitening in [true, false] {
            configs.push(RadioConfig {
                fec,
                whitening,
                ..Default::default()
            });
        }
    }
    configs
}

fn encode_padded(config: &RadioConfig, msg: &Message) -> Vec<u8> {
    let mut bytes = Framer::new(config.clone()).unwrap().encode(msg).unwrap();
    bytes.extend_from_slice(&IDLE);
    bytes
}

/// Receiver configured to accept whatever `tx` sends.
fn receiver(tx: &RadioConfig) -> Deframer {
    Deframer::new(RadioConfig {
        rx_flags: tx.flags & tx.flags_mask,
        ..tx.clone()
    })
    .unwrap()
}

fn hello() -> Message {
    Message::new(0x1234, 1, b"hello".to_vec())
}

/// Deterministic noise bits
fn noise(n: usize) -> Vec<u8> {
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) & 1) as u8
        })
        .collect()
}

#[test]
fn test_roundtrip_every_length_every_mode() {
    for config in all_modes() {
        for len in 0..=248usize {
            let data: Vec<u8> = (0..len).map(|i| (i * 7 + len) as u8).collect();
            let msg = Message::new(0x1234, len as u16, data);
            let bits = unpack_bits(&encode_padded(&config, &msg));

            let mut deframer = receiver(&config);
            let out = deframer.feed(&bits);
            assert_eq!(
                out,
                vec![msg],
                "fec={} whitening={} len={}",
                config.fec,
                config.whitening,
                len
            );
        }
    }
}

#[test]
fn test_known_hello_frame() {
    let config = RadioConfig::default();
    let encoded = Framer::new(config.clone()).unwrap().encode(&hello()).unwrap();
    assert_eq!(
        hex::encode(&encoded),
        "aaaaaaaad391d391da01c2e783f797891327de10f8e9771473678d2390a2b18f430a4bf10403040e"
    );

    let mut deframer = receiver(&config);
    let mut bits = unpack_bits(&encoded);
    bits.extend(unpack_bits(&IDLE));
    assert_eq!(deframer.feed(&bits), vec![hello()]);
    assert_eq!(hello().to_bytes(), hex::decode("3412010068656c6c6f").unwrap());
}

#[test]
fn test_chunking_does_not_matter() {
    let config = RadioConfig::default();
    let expected: Vec<Message> = (0..10u16)
        .map(|i| Message::new(1, i, vec![i as u8; i as usize]))
        .collect();
    let stream: Vec<u8> = expected
        .iter()
        .flat_map(|msg| encode_padded(&config, msg))
        .collect();
    let bits = unpack_bits(&stream);

    for chunk_size in [1, 7, 333, bits.len()] {
        let mut deframer = receiver(&config);
        let mut out = Vec::new();
        for chunk in bits.chunks(chunk_size) {
            deframer.feed_into(chunk, &mut out);
        }
        assert_eq!(out, expected, "chunk size {}", chunk_size);
        assert_eq!(deframer.stats().frames_ok, 10);
    }
}

#[test]
fn test_back_to_back_frames() {
    let config = RadioConfig::default();
    let framer = Framer::new(config.clone()).unwrap();
    let first = Message::new(1, 1, b"abc".to_vec());
    let second = Message::new(2, 2, b"defg".to_vec());

    let mut stream = framer.encode(&first).unwrap();
    stream.extend(framer.encode(&second).unwrap());
    stream.extend_from_slice(&IDLE);

    let mut deframer = receiver(&config);
    assert_eq!(deframer.feed(&unpack_bits(&stream)), vec![first, second]);
}

#[test]
fn test_leading_noise() {
    let config = RadioConfig::default();
    let mut bits = noise(1000);
    bits.extend(unpack_bits(&encode_padded(&config, &hello())));

    let mut deframer = receiver(&config);
    assert_eq!(deframer.feed(&bits), vec![hello()]);
    assert_eq!(deframer.stats().crc_errors, 0);
}

#[test]
fn test_fec_corrects_single_bit_errors() {
    let config = RadioConfig::default();
    let msg = Message::new(0x1234, 7, (0..40u8).collect::<Vec<u8>>());
    let bits = unpack_bits(&encode_padded(&config, &msg));
    let header_bits = (config.preamble_bytes as usize + config.sync_word().len()) * 8;
    let frame_bits = bits.len() - IDLE.len() * 8;

    for i in header_bits..frame_bits {
        let mut rx = bits.clone();
        rx[i] ^= 1;
        let mut deframer = receiver(&config);
        assert_eq!(deframer.feed(&rx), vec![msg.clone()], "bit {} not corrected", i);
    }
}

#[test]
fn test_corrupted_fec_frame_fails_crc() {
    let config = RadioConfig::default();
    let msg = Message::new(0x1234, 7, (0..40u8).collect::<Vec<u8>>());
    let mut bytes = encode_padded(&config, &msg);
    for b in &mut bytes[20..28] {
        *b ^= 0xFF;
    }

    let mut deframer = receiver(&config);
    assert!(deframer.feed(&unpack_bits(&bytes)).is_empty());
    assert_eq!(deframer.stats().crc_errors, 1);
}

#[test]
fn test_corrupted_byte_fails_crc() {
    for config in [
        RadioConfig::default(),
        RadioConfig {
            fec: false,
            ..Default::default()
        },
    ] {
        let mut bytes = encode_padded(&config, &hello());
        bytes[14] ^= if config.fec { 0xFF } else { 0x01 };

        let mut deframer = receiver(&config);
        assert!(deframer.feed(&unpack_bits(&bytes)).is_empty(), "fec={}", config.fec);
        assert_eq!(deframer.stats().crc_errors, 1, "fec={}", config.fec);
    }
}

#[test]
fn test_flags_filtered_not_delivered() {
    let tx = RadioConfig {
        flags: 0x80,
        ..Default::default()
    };
    // Default receiver drops ground frames (bit 7 set)
    let mut deframer = Deframer::new(RadioConfig::default()).unwrap();
    assert!(deframer.feed(&unpack_bits(&encode_padded(&tx, &hello()))).is_empty());
    assert_eq!(deframer.stats().filtered, 1);
    assert_eq!(deframer.stats().crc_errors, 0);
    assert_eq!(deframer.stats().frames_ok, 0);
}

#[test]
fn test_single_sync_word_link() {
    let config = RadioConfig {
        sync_words: 1,
        preamble_bytes: 8,
        preamble_quality: 60,
        ..Default::default()
    };
    let mut deframer = receiver(&config);
    let bits = unpack_bits(&encode_padded(&config, &hello()));
    assert_eq!(deframer.feed(&bits), vec![hello()]);
}

#[test]
fn test_default_receiver_hears_radio_not_ground() {
    let radio = RadioConfig {
        flags: 0x00,
        ..Default::default()
    };
    let ground = RadioConfig::default();
    let reply = Message::new(0x0001, 9, b"ack".to_vec());

    let mut stream = encode_padded(&ground, &hello());
    stream.extend(encode_padded(&radio, &reply));
    stream.extend(encode_padded(&ground, &hello()));

    let mut deframer = Deframer::new(RadioConfig::default()).unwrap();
    assert_eq!(deframer.feed(&unpack_bits(&stream)), vec![reply]);
    assert_eq!(deframer.stats().filtered, 2);
}
