// Copyright 2025-2026 CEMAXECUTER LLC

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam::channel::Sender;
use ol_protocol::unpack_bits;

use crate::{BitBuf, BitSource, SourceError};

/// On-disk bit format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitFormat {
    /// One bit per byte (GNU Radio "unpacked" output); only the low bit counts
    Unpacked,
    /// Eight bits per byte, MSB first
    Packed,
}

/// Bit file reader: reads a capture and sends it as BitBuf blocks.
/// A path of `-` reads standard input.
pub struct FileSource {
    path: String,
    format: BitFormat,
    /// Number of input bytes per block
    block_size: usize,
    running: Arc<AtomicBool>,
}

impl FileSource {
    pub fn new(path: impl Into<String>, format: BitFormat) -> Self {
        Self {
            path: path.into(),
            format,
            block_size: 8192,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_block_size(&mut self, size: usize) {
        self.block_size = size.max(1);
    }

    /// Flag shared with the reading loop; clearing it from another thread
    /// stops the source after the current block.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    fn open(&self) -> Result<Box<dyn Read>, SourceError> {
        if self.path == "-" {
            return Ok(Box::new(io::stdin()));
        }
        let file = File::open(&self.path).map_err(|source| SourceError::Open {
            path: self.path.clone(),
            source,
        })?;
        Ok(Box::new(BufReader::with_capacity(1024 * 1024, file)))
    }

    /// Read one block and convert it to bits. `None` at end of input.
    fn read_block(&self, reader: &mut dyn Read) -> io::Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.block_size];
        let n = loop {
            match reader.read(&mut buf) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        if n == 0 {
            return Ok(None);
        }
        buf.truncate(n);

        let bits = match self.format {
            BitFormat::Unpacked => buf.into_iter().map(|b| b & 1).collect(),
            BitFormat::Packed => unpack_bits(&buf),
        };
        Ok(Some(bits))
    }
}

impl BitSource for FileSource {
    fn start(&mut self, tx: Sender<BitBuf>) -> Result<(), SourceError> {
        let mut reader = self.open()?;

        self.running.store(true, Ordering::SeqCst);
        log::info!("reading {:?} bits from {}", self.format, self.path);

        let mut total = 0usize;
        while self.running.load(Ordering::SeqCst) {
            match self.read_block(reader.as_mut())? {
                Some(bits) => {
                    total += bits.len();
                    if tx.send(BitBuf { bits }).is_err() {
                        break; // receiver dropped
                    }
                }
                None => {
                    log::info!("end of file: {} ({} bits)", self.path, total);
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
