// Copyright 2025-2026 CEMAXECUTER LLC

mod pipeline;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use ol_output::FrameFormat;
use ol_protocol::{Message, RadioConfig};
use ol_source::BitFormat;

#[derive(Parser, Debug)]
#[command(name = "openlst-codec")]
#[command(about = "Encode and decode OpenLST CC1110 radio frames")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Frame a message for transmission
    Encode(EncodeArgs),
    /// Recover messages from a demodulated bit capture
    Decode(DecodeArgs),
}

/// Radio settings shared by both directions
#[derive(Args, Debug)]
struct RadioArgs {
    /// TOML radio configuration (defaults to the OpenLST settings)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Disable forward error correction
    #[arg(long)]
    no_fec: bool,

    /// Disable PN9 whitening
    #[arg(long)]
    no_whitening: bool,

    /// Flags byte written on transmit
    #[arg(long, value_parser = parse_u8)]
    flags: Option<u8>,

    /// Receive filter value: deliver frames whose masked flags equal this
    #[arg(long, value_parser = parse_u8)]
    rx_flags: Option<u8>,

    /// Flag bits examined by the receive filter
    #[arg(long, value_parser = parse_u8)]
    flags_mask: Option<u8>,
}

impl RadioArgs {
    fn load(&self) -> anyhow::Result<RadioConfig> {
        let mut config = match &self.config {
            Some(path) => RadioConfig::load(path)?,
            None => RadioConfig::default(),
        };
        if self.no_fec {
            config.fec = false;
        }
        if self.no_whitening {
            config.whitening = false;
        }
        if let Some(flags) = self.flags {
            config.flags = flags;
        }
        if let Some(rx_flags) = self.rx_flags {
            config.rx_flags = rx_flags;
        }
        if let Some(mask) = self.flags_mask {
            config.flags_mask = mask;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
struct EncodeArgs {
    #[command(flatten)]
    radio: RadioArgs,

    /// Hardware ID (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_u16)]
    hwid: u16,

    /// Sequence number of the first frame
    #[arg(long, value_parser = parse_u16, default_value = "0")]
    seqnum: u16,

    /// Payload as a hex string
    #[arg(long, default_value = "")]
    data: String,

    /// Number of frames to emit, incrementing the sequence number
    #[arg(long, default_value = "1")]
    repeat: u32,

    /// Idle bytes written after every frame
    #[arg(long, default_value = "4")]
    idle: usize,

    /// Write one bit per byte instead of packed bytes
    #[arg(long)]
    unpacked: bool,

    /// Output file (stdout if omitted)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    #[command(flatten)]
    radio: RadioArgs,

    /// Bit capture to decode, `-` for stdin
    #[arg(short = 'f', long)]
    file: String,

    /// Input holds packed bytes instead of one bit per byte
    #[arg(long)]
    packed: bool,

    /// Input bytes per read
    #[arg(long, default_value = "8192")]
    block_size: usize,

    /// Print messages as JSON lines instead of hex
    #[arg(long)]
    json: bool,

    /// Print receive statistics
    #[arg(long)]
    stats: bool,
}

fn parse_u16(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => u16::from_str_radix(digits, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid value '{}': {}", s, e))
}

fn parse_u8(s: &str) -> Result<u8, String> {
    let value = parse_u16(s)?;
    u8::try_from(value).map_err(|_| format!("invalid value '{}': must fit in one byte", s))
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Encode(args) => {
            let config = args.radio.load()?;
            let data = hex::decode(&args.data).context("invalid --data hex")?;
            let messages: Vec<Message> = (0..args.repeat)
                .map(|i| Message::new(args.hwid, args.seqnum.wrapping_add(i as u16), data.clone()))
                .collect();
            let format = if args.unpacked {
                FrameFormat::Unpacked
            } else {
                FrameFormat::Packed
            };
            pipeline::run_encode(config, &messages, args.output.as_deref(), format, args.idle)
        }
        Command::Decode(args) => {
            let config = args.radio.load()?;
            let format = if args.packed {
                BitFormat::Packed
            } else {
                BitFormat::Unpacked
            };
            pipeline::run_decode(config, &args.file, format, args.block_size, args.json, args.stats)?;
            Ok(())
        }
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
