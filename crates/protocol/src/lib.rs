// Copyright 2025-2026 CEMAXECUTER LLC

//! OpenLST RF link layer for the TI CC1110: framing, PN9 whitening, CRC-16,
//! and rate 1/2 convolutional FEC with a streaming Viterbi decoder.

pub mod bits;
pub mod config;
pub mod crc;
pub mod deframer;
pub mod error;
pub mod fec;
pub mod frame;
pub mod whitening;

pub use bits::{pack_bits, unpack_bits};
pub use config::RadioConfig;
pub use crc::crc16;
pub use deframer::{Deframer, DeframerStats, FramerState, MessageSink};
pub use error::{ConfigError, CrcError, Error, FecError, FrameError, Result};
pub use fec::{decode_fec, encode_fec, interleave, ViterbiDecoder};
pub use frame::{build_data_section, parse_data_section, Framer, Message};
pub use whitening::{whiten, whiten_in_place, Pn9};
