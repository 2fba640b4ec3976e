// Copyright 2025-2026 CEMAXECUTER LLC

use crossbeam::channel::Sender;
use ol_protocol::{Message, MessageSink};

/// Forwards decoded messages to another thread.
pub struct ChannelSink {
    tx: Sender<Message>,
    dropped: u64,
}

impl ChannelSink {
    pub fn new(tx: Sender<Message>) -> Self {
        Self { tx, dropped: 0 }
    }

    /// Messages lost because the receiving side hung up
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl MessageSink for ChannelSink {
    fn deliver(&mut self, msg: Message) {
        if self.tx.send(msg).is_err() {
            if self.dropped == 0 {
                log::warn!("message receiver disconnected");
            }
            self.dropped += 1;
        }
    }
}
