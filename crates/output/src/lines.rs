// Copyright 2025-2026 CEMAXECUTER LLC

use std::io::{self, Write};

use ol_protocol::{Message, MessageSink};
use serde::Serialize;

/// Text form of a decoded message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineFormat {
    /// Host byte form (`HWID | Seqnum | Data`) as one hex string
    Hex,
    /// One JSON object per line
    Json,
}

#[derive(Serialize)]
struct MessageRecord<'a> {
    hwid: String,
    seqnum: u16,
    len: usize,
    data: &'a str,
}

/// Writes one line per decoded message.
pub struct LineWriter<W: Write> {
    writer: W,
    format: LineFormat,
    written: u64,
    error: Option<io::Error>,
}

impl<W: Write> LineWriter<W> {
    pub fn new(writer: W, format: LineFormat) -> Self {
        Self {
            writer,
            format,
            written: 0,
            error: None,
        }
    }

    pub fn write_message(&mut self, msg: &Message) -> io::Result<()> {
        match self.format {
            LineFormat::Hex => writeln!(self.writer, "{}", hex::encode(msg.to_bytes()))?,
            LineFormat::Json => {
                let data = hex::encode(&msg.data);
                let record = MessageRecord {
                    hwid: format!("{:04x}", msg.hwid),
                    seqnum: msg.seqnum,
                    len: msg.data.len(),
                    data: &data,
                };
                serde_json::to_writer(&mut self.writer, &record)?;
                self.writer.write_all(b"\n")?;
            }
        }
        self.written += 1;
        Ok(())
    }

    /// Lines written so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// First write error hit while used as a [`MessageSink`]
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> MessageSink for LineWriter<W> {
    fn deliver(&mut self, msg: Message) {
        if let Err(e) = self.write_message(&msg) {
            log::error!("failed to write message: {}", e);
            self.error.get_or_insert(e);
        }
    }
}
