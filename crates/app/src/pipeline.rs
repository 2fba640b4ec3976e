// Copyright 2025-2026 CEMAXECUTER LLC

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{anyhow, Context};
use crossbeam::channel;

use ol_output::{ChannelSink, FrameFormat, FrameWriter, LineFormat, LineWriter};
use ol_protocol::{Deframer, DeframerStats, Framer, Message, RadioConfig};
use ol_source::file::{BitFormat, FileSource};
use ol_source::BitSource;

/// Frame `messages` and write them back to back, each followed by `idle`
/// zero bytes.
pub fn run_encode(
    config: RadioConfig,
    messages: &[Message],
    output: Option<&Path>,
    format: FrameFormat,
    idle: usize,
) -> anyhow::Result<()> {
    let framer = Framer::new(config)?;

    let sink: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    let mut writer = FrameWriter::new(sink, format, idle);

    for msg in messages {
        let frame = framer.encode(msg)?;
        log::debug!(
            "hwid={:04x} seq={} data={} -> {} bytes",
            msg.hwid,
            msg.seqnum,
            hex::encode(&msg.data),
            frame.len()
        );
        writer.write_frame(&frame)?;
    }
    writer.flush()?;

    log::info!("wrote {} frame(s) ({:?})", writer.frames(), format);
    Ok(())
}

/// Run the receive pipeline from a bit capture to message lines on stdout.
///
/// Three stages on three threads: file reader, deframer, line writer,
/// connected by bounded channels.
pub fn run_decode(
    config: RadioConfig,
    file_path: &str,
    format: BitFormat,
    block_size: usize,
    json: bool,
    print_stats: bool,
) -> anyhow::Result<DeframerStats> {
    let mut deframer = Deframer::new(config)?;
    log::info!(
        "decoding {} (fec={}, whitening={}, sync={})",
        file_path,
        deframer.config().fec,
        deframer.config().whitening,
        hex::encode(deframer.config().sync_word())
    );

    let mut source = FileSource::new(file_path, format);
    source.set_block_size(block_size);

    let (bit_tx, bit_rx) = channel::bounded(64);
    let (msg_tx, msg_rx) = channel::bounded::<Message>(256);

    // Start file reader in a separate thread
    let reader_thread = std::thread::spawn(move || source.start(bit_tx));

    let decode_thread = std::thread::spawn(move || {
        let mut sink = ChannelSink::new(msg_tx);
        let stats_start = Instant::now();
        let mut last_stats = Instant::now();

        for buf in bit_rx.iter() {
            deframer.feed_into(&buf.bits, &mut sink);

            // Print stats every 5 seconds
            if print_stats && last_stats.elapsed().as_secs() >= 5 {
                eprintln!(
                    "[{:.1}s] {}",
                    stats_start.elapsed().as_secs_f64(),
                    format_stats(deframer.stats())
                );
                last_stats = Instant::now();
            }
        }

        if sink.dropped() > 0 {
            log::warn!("{} message(s) not written", sink.dropped());
        }
        deframer.stats().clone()
    });

    let line_format = if json { LineFormat::Json } else { LineFormat::Hex };
    let mut writer = LineWriter::new(BufWriter::new(io::stdout().lock()), line_format);
    let started = Instant::now();
    let mut write_result = Ok(());
    for msg in msg_rx.iter() {
        if let Err(e) = writer.write_message(&msg) {
            write_result = Err(e);
            break;
        }
    }
    drop(msg_rx);
    let write_result = write_result.and_then(|_| writer.flush());

    let stats = decode_thread
        .join()
        .map_err(|_| anyhow!("decode thread panicked"))?;
    reader_thread
        .join()
        .map_err(|_| anyhow!("file reader thread panicked"))?
        .context("file reader error")?;
    write_result.context("failed to write output")?;

    if print_stats {
        eprintln!(
            "done ({:.1}s): {}",
            started.elapsed().as_secs_f64(),
            format_stats(&stats)
        );
    }
    Ok(stats)
}

fn format_stats(stats: &DeframerStats) -> String {
    format!(
        "frames: {} CRC errors: {} filtered: {} short: {} sync losses: {}",
        stats.frames_ok, stats.crc_errors, stats.filtered, stats.short_frames, stats.sync_losses
    )
}
