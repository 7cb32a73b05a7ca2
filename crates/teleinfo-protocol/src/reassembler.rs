//! Byte-level frame reassembler for the TIC stream.
//!
//! This module provides a stateful reassembler consuming the raw serial byte
//! stream in arbitrarily sized chunks and delimiting line and frame
//! boundaries. Three control bytes are never treated as data:
//!
//! - STX (`0x02`) opens a frame,
//! - ETX (`0x03`) closes it,
//! - LF (`0x0A`) terminates a line.
//!
//! A carriage return, if present, travels as ordinary line content and is
//! stripped later during line trimming.
//!
//! # State Machine
//!
//! ```text
//!              data byte                STX
//! ┌──────┐ ───────────────> ┌────────┐ ────────────┐
//! │ Idle │                  │ InLine │             v
//! └──────┘ <─────────────── └────────┘        ┌─────────┐
//!    ^            LF                          │ InFrame │<──┐ data/LF
//!    │                                        └─────────┘───┘
//!    └──────────────── ETX (frame finalized) ──────┘
//! ```
//!
//! - STX, any state: clear the in-progress line and the accumulated frame
//!   lines, reset the invalid-line counter, enter `InFrame`. A second STX
//!   while already `InFrame` restarts accumulation from scratch, modelling
//!   recovery from a missed ETX.
//! - ETX, any state: emit a [`StreamEvent::FrameClosed`] with the pending
//!   lines and diagnostics, reset to `Idle`.
//! - LF: decode the line buffer; a non-empty line is emitted as
//!   [`StreamEvent::Line`] and, when `InFrame`, queued for tokenization at
//!   frame close; an empty or overflowed line counts as unreadable for the
//!   frame being built.
//!
//! The line buffer is capped at [`MAX_LINE_LENGTH`]: a malformed stream that
//! never emits LF would otherwise grow it without bound. An overflowing line
//! is discarded and counted as one invalid line.
//!
//! # Usage
//!
//! ```
//! use teleinfo_protocol::{FrameReassembler, StreamEvent};
//!
//! let mut reassembler = FrameReassembler::new();
//!
//! // Chunk boundaries are arbitrary.
//! reassembler.feed(&[0x02]);
//! reassembler.feed(b"PTEC HCJB C\r\n");
//! reassembler.feed(&[0x03]);
//!
//! let events: Vec<StreamEvent> = reassembler.drain_events().collect();
//! assert_eq!(events.len(), 2); // one Line, one FrameClosed
//! ```

use std::collections::VecDeque;
use teleinfo_core::LineDecoding;
use teleinfo_core::constants::{END_BYTE, LINE_FEED, MAX_LINE_LENGTH, START_BYTE};

/// Initial line buffer capacity. Historic TIC lines are short.
const INITIAL_LINE_CAPACITY: usize = 64;

/// Initial capacity for the pending-line list of one frame.
///
/// A historic TIC frame carries on the order of a dozen lines.
const INITIAL_FRAME_CAPACITY: usize = 16;

/// Reassembler states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassemblerState {
    /// Outside any frame, line buffer empty.
    Idle,

    /// Outside any frame, accumulating line bytes (stray lines are still
    /// mirrored as raw lines).
    InLine,

    /// Between STX and ETX, accumulating frame lines.
    InFrame,
}

/// Raw content of one closed frame, before tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Decoded lines collected between STX and ETX, in arrival order.
    pub lines: Vec<String>,

    /// Unreadable lines (empty after decode, or overflowed) seen while the
    /// frame was open.
    pub invalid_lines: u32,
}

/// Event produced by the reassembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// One non-empty decoded line, frame or no frame. Carries the line as
    /// decoded, trailing CR included when present.
    Line(String),

    /// A frame-end byte was observed; the accumulated frame is ready for
    /// aggregation.
    FrameClosed(RawFrame),
}

/// Stateful reassembler over the raw TIC byte stream.
///
/// Feed bytes in with [`feed()`], drain events with [`next_event()`] or
/// [`drain_events()`]. An in-progress frame is held internally and silently
/// abandoned if the reassembler is dropped or cleared before ETX arrives: no
/// partial frame is ever emitted.
///
/// [`feed()`]: FrameReassembler::feed
/// [`next_event()`]: FrameReassembler::next_event
/// [`drain_events()`]: FrameReassembler::drain_events
#[derive(Debug)]
pub struct FrameReassembler {
    /// Current state of the reassembler state machine.
    state: ReassemblerState,

    /// Bytes accumulated since the last delimiter.
    line: Vec<u8>,

    /// True when the current line exceeded [`MAX_LINE_LENGTH`] and is being
    /// discarded up to the next delimiter.
    line_overflow: bool,

    /// Decoded lines collected for the frame currently being built.
    frame_lines: Vec<String>,

    /// Unreadable-line count for the frame currently being built.
    invalid_lines: u32,

    /// Text decoding applied to each line buffer.
    decoding: LineDecoding,

    /// Queue of events ready for extraction.
    events: VecDeque<StreamEvent>,
}

impl FrameReassembler {
    /// Create a reassembler with the default (Latin-1) line decoding.
    pub fn new() -> Self {
        Self::with_decoding(LineDecoding::default())
    }

    /// Create a reassembler with an explicit line decoding.
    pub fn with_decoding(decoding: LineDecoding) -> Self {
        Self {
            state: ReassemblerState::Idle,
            line: Vec::with_capacity(INITIAL_LINE_CAPACITY),
            line_overflow: false,
            frame_lines: Vec::with_capacity(INITIAL_FRAME_CAPACITY),
            invalid_lines: 0,
            decoding,
            events: VecDeque::new(),
        }
    }

    /// Feed a chunk of bytes from the serial stream.
    ///
    /// Chunk boundaries carry no meaning; a chunk may contain partial lines,
    /// several complete frames, or garbage. All resulting events are queued
    /// before this method returns.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            match byte {
                START_BYTE => self.handle_frame_start(),
                END_BYTE => self.handle_frame_end(),
                LINE_FEED => self.handle_line_feed(),
                other => self.handle_data_byte(other),
            }
        }
    }

    /// Extract the next queued event, if any.
    pub fn next_event(&mut self) -> Option<StreamEvent> {
        self.events.pop_front()
    }

    /// Number of events ready for extraction.
    pub fn events_available(&self) -> usize {
        self.events.len()
    }

    /// Returns an iterator draining all currently queued events.
    ///
    /// The iterator does not process more input; call [`feed()`] first.
    ///
    /// [`feed()`]: FrameReassembler::feed
    pub fn drain_events(&mut self) -> DrainEvents<'_> {
        DrainEvents { reassembler: self }
    }

    /// Current state of the state machine.
    pub fn state(&self) -> ReassemblerState {
        self.state
    }

    /// Discard all internal state, abandoning any in-progress frame without
    /// emitting it.
    pub fn clear(&mut self) {
        self.state = ReassemblerState::Idle;
        self.line.clear();
        self.line_overflow = false;
        self.frame_lines.clear();
        self.invalid_lines = 0;
        self.events.clear();
    }

    /// STX: restart frame accumulation from scratch. The byte itself is not
    /// content.
    fn handle_frame_start(&mut self) {
        self.line.clear();
        self.line_overflow = false;
        self.frame_lines.clear();
        self.invalid_lines = 0;
        self.state = ReassemblerState::InFrame;
    }

    /// ETX: finalize the pending frame and reset to `Idle`.
    fn handle_frame_end(&mut self) {
        let raw = RawFrame {
            lines: std::mem::take(&mut self.frame_lines),
            invalid_lines: std::mem::take(&mut self.invalid_lines),
        };
        self.events.push_back(StreamEvent::FrameClosed(raw));
        self.line.clear();
        self.line_overflow = false;
        self.state = ReassemblerState::Idle;
    }

    /// LF: decode the line buffer and dispatch the line.
    fn handle_line_feed(&mut self) {
        let overflowed = std::mem::take(&mut self.line_overflow);
        let text = self.decoding.decode(&self.line);
        self.line.clear();

        let in_frame = self.state == ReassemblerState::InFrame;

        if overflowed || text.is_empty() {
            // Unreadable line: counted for the frame being built, if any.
            if in_frame {
                self.invalid_lines += 1;
            }
        } else {
            self.events.push_back(StreamEvent::Line(text.clone()));
            if in_frame {
                self.frame_lines.push(text);
            }
        }

        if self.state == ReassemblerState::InLine {
            self.state = ReassemblerState::Idle;
        }
    }

    /// Any other byte: accumulate into the line buffer, capped defensively.
    fn handle_data_byte(&mut self, byte: u8) {
        if self.line_overflow {
            return;
        }
        if self.line.len() >= MAX_LINE_LENGTH {
            self.line_overflow = true;
            self.line.clear();
            return;
        }
        self.line.push(byte);
        if self.state == ReassemblerState::Idle {
            self.state = ReassemblerState::InLine;
        }
    }
}

impl Default for FrameReassembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator that drains events from a [`FrameReassembler`].
pub struct DrainEvents<'a> {
    reassembler: &'a mut FrameReassembler,
}

impl Iterator for DrainEvents<'_> {
    type Item = StreamEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.reassembler.next_event()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.reassembler.events_available();
        (len, Some(len))
    }
}

impl ExactSizeIterator for DrainEvents<'_> {
    fn len(&self) -> usize {
        self.reassembler.events_available()
    }
}
