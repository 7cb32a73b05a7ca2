//! Event emission boundary.
//!
//! Every output of the decoder crosses this boundary as an [`Emission`]
//! handed to an [`EmissionSink`]. Sink calls are fire-and-forget: they must
//! not block, they may fail independently, and a failed publish never
//! propagates back into the decoder state machine. The session never waits
//! for an emission to complete before processing the next stream chunk.
//!
//! The MQTT-facing representation (topics, JSON payloads) is rendered by
//! [`mirror_messages`]; the broker client itself stays a collaborator
//! outside this crate.

use crate::config::MirrorConfig;
use crate::discovery::DiscoveryRequest;
use serde::Serialize;
use teleinfo_protocol::{Frame, InvalidLineReport, TariffPeriod};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One output of the decoder, handed to collaborators.
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    /// Decoded text of one line, frame or no frame, CR/LF trimmed.
    RawLine { text: String },

    /// One successfully tokenized label/value pair.
    Field { label: String, value: String },

    /// A tokenized line that failed checksum validation.
    InvalidLine(InvalidLineReport),

    /// The finalized frame mapping plus diagnostics, once per closed frame,
    /// for the outward JSON mirror.
    Frame(Frame),

    /// Derived tariff fields, once per closed frame.
    Derived {
        period: TariffPeriod,
        off_peak_active: bool,
    },

    /// One-time capability announcement request, at most once per session.
    DiscoveryRequest(DiscoveryRequest),

    /// The finalized frame for the host's internal event bus, independent
    /// of the mirroring emissions.
    FrameEvent(Frame),
}

/// One-way sink for emissions.
///
/// Implementations must be non-blocking; a publish that cannot be delivered
/// is dropped (and may be logged), never retried synchronously.
pub trait EmissionSink: Send + Sync {
    fn publish(&self, emission: Emission);
}

/// Sink backed by an unbounded channel, for hosts that consume emissions
/// asynchronously and for tests.
///
/// A closed receiver makes `publish` a logged no-op; the decoder keeps
/// running.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Emission>,
}

impl ChannelSink {
    /// Create a sink and the receiving half.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Emission>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EmissionSink for ChannelSink {
    fn publish(&self, emission: Emission) {
        if self.tx.send(emission).is_err() {
            debug!("emission receiver closed, dropping emission");
        }
    }
}

/// Sink that logs every emission through `tracing`, used by the CLI.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EmissionSink for TracingSink {
    fn publish(&self, emission: Emission) {
        match emission {
            Emission::RawLine { text } => debug!(line = %text, "raw line"),
            Emission::Field { label, value } => debug!(%label, %value, "field"),
            Emission::InvalidLine(report) => {
                warn!(label = %report.label, raw = %report.raw, "invalid line")
            }
            Emission::Frame(frame) => {
                info!(fields = frame.len(), invalid = frame.invalid_lines(), "frame")
            }
            Emission::Derived {
                period,
                off_peak_active,
            } => info!(tariff = %period.short, off_peak_active, "derived"),
            Emission::DiscoveryRequest(request) => {
                info!(device = %request.device_id, labels = request.present.len(), "discovery request")
            }
            Emission::FrameEvent(_) => {}
        }
    }
}

/// A topic/payload pair for the outward mirror collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorMessage {
    pub topic: String,
    pub payload: String,
    pub retain: bool,
}

impl MirrorMessage {
    fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            retain: false,
        }
    }
}

/// Render the mirror messages for one emission under the configured topics.
///
/// Returns an empty list when mirroring is disabled or the emission kind has
/// no outward mirror (the frame-event and discovery emissions are handled by
/// their own collaborators).
pub fn mirror_messages(mirror: &MirrorConfig, emission: &Emission) -> Vec<MirrorMessage> {
    if !mirror.enabled {
        return Vec::new();
    }

    match emission {
        Emission::RawLine { text } => {
            vec![MirrorMessage::new(mirror.topic_line.clone(), text.clone())]
        }
        Emission::Field { label, value } => vec![MirrorMessage::new(
            format!("{}/{label}", mirror.topic_fields),
            value.clone(),
        )],
        Emission::InvalidLine(report) => match serde_json::to_string(report) {
            Ok(payload) => vec![MirrorMessage::new(mirror.topic_invalid.clone(), payload)],
            Err(_) => Vec::new(),
        },
        Emission::Frame(frame) => match serde_json::to_string(frame) {
            Ok(payload) => vec![MirrorMessage::new(mirror.topic_json.clone(), payload)],
            Err(_) => Vec::new(),
        },
        Emission::Derived {
            period,
            off_peak_active,
        } => vec![
            MirrorMessage::new(
                format!("{}/ptec_friendly", mirror.topic_derived),
                period.friendly,
            ),
            MirrorMessage::new(format!("{}/ptec_short", mirror.topic_derived), period.short),
            MirrorMessage::new(
                format!("{}/hc_active", mirror.topic_derived),
                if *off_peak_active { "ON" } else { "OFF" },
            ),
        ],
        Emission::DiscoveryRequest(_) | Emission::FrameEvent(_) => Vec::new(),
    }
}
