//! Tokio codec adapter for the TIC reassembler.
//!
//! `TicCodec` wraps the [`FrameReassembler`] behind
//! [`tokio_util::codec::Decoder`] so any `AsyncRead` byte source (a serial
//! bridge, a TCP tunnel, a capture file, stdin) can be driven with
//! `FramedRead` and yield [`StreamEvent`]s.
//!
//! The TIC stream is receive-only at this layer, so no `Encoder` is
//! provided.
//!
//! # Usage
//!
//! ```
//! use futures::StreamExt;
//! use teleinfo_protocol::{StreamEvent, TicCodec};
//! use tokio_util::codec::FramedRead;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let capture: &[u8] = b"\x02PTEC HCJB C\r\n\x03";
//! let mut framed = FramedRead::new(capture, TicCodec::new());
//!
//! let mut events = Vec::new();
//! while let Some(Ok(event)) = framed.next().await {
//!     events.push(event);
//! }
//! assert!(matches!(events.last(), Some(StreamEvent::FrameClosed(_))));
//! # }
//! ```

use crate::reassembler::{FrameReassembler, StreamEvent};
use bytes::BytesMut;
use teleinfo_core::LineDecoding;
use tokio_util::codec::Decoder;

/// Decoder turning raw TIC bytes into [`StreamEvent`]s.
#[derive(Debug, Default)]
pub struct TicCodec {
    reassembler: FrameReassembler,
}

impl TicCodec {
    /// Create a codec with the default (Latin-1) line decoding.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec with an explicit line decoding.
    pub fn with_decoding(decoding: LineDecoding) -> Self {
        Self {
            reassembler: FrameReassembler::with_decoding(decoding),
        }
    }
}

impl Decoder for TicCodec {
    type Item = StreamEvent;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if !src.is_empty() {
            let chunk = src.split_to(src.len());
            self.reassembler.feed(&chunk);
        }
        Ok(self.reassembler.next_event())
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // An in-progress frame is abandoned silently at end of stream; only
        // already-queued events are drained.
        self.decode(src)
    }
}
