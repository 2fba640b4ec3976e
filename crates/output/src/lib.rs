// Copyright 2025-2026 CEMAXECUTER LLC

pub mod channel;
pub mod frames;
pub mod lines;

pub use channel::ChannelSink;
pub use frames::{FrameFormat, FrameWriter};
pub use lines::{LineFormat, LineWriter};
