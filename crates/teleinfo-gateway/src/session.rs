//! Per-connection TIC session.
//!
//! A [`TicSession`] owns one decoder pipeline (reassembler → tokenizer →
//! aggregator), the one-shot discovery flag, and the emission sink. All
//! state transitions for one delivered chunk run to completion before the
//! next chunk is processed; emissions are dispatched fire-and-forget through
//! the sink, so the decoder never blocks on a collaborator.
//!
//! Sessions are independent: one per configured serial connection, no
//! shared mutable state between them.

use crate::config::SessionConfig;
use crate::discovery::DiscoveryRequest;
use crate::emission::{Emission, EmissionSink};
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use teleinfo_core::constants::LABEL_ADCO;
use teleinfo_core::{Error, Result};
use teleinfo_protocol::{
    FrameAggregator, FrameReassembler, LineTokenizer, RawFrame, StreamEvent, TicCodec,
};
use tokio::io::AsyncRead;
use tokio::sync::watch;
use tokio_util::codec::FramedRead;
use tracing::{debug, info, trace, warn};

/// Snapshot of session counters, for host diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionDiagnostics {
    /// Frames finalized so far.
    pub frames: u64,

    /// Non-empty lines seen, frame or no frame.
    pub lines: u64,

    /// Total invalid lines across all finalized frames.
    pub invalid_lines: u64,

    /// Whether the one-time discovery request has been raised.
    pub discovery_done: bool,
}

/// Handle to request a session stop from outside the read loop.
#[derive(Debug, Clone)]
pub struct SessionShutdown {
    tx: watch::Sender<bool>,
}

impl SessionShutdown {
    /// Signal the session to stop accepting bytes. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// One decoding session over one byte stream.
pub struct TicSession {
    config: SessionConfig,
    reassembler: FrameReassembler,
    aggregator: FrameAggregator,
    sink: Arc<dyn EmissionSink>,
    discovery_done: bool,
    shutdown_tx: watch::Sender<bool>,
    frames: u64,
    lines: u64,
    invalid_lines: u64,
}

impl TicSession {
    /// Create a session from its configuration and emission sink.
    pub fn new(config: SessionConfig, sink: Arc<dyn EmissionSink>) -> Self {
        let reassembler = FrameReassembler::with_decoding(config.decoding);
        let aggregator =
            FrameAggregator::new(LineTokenizer::new(config.relaxed_labels.iter().cloned()));
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            reassembler,
            aggregator,
            sink,
            discovery_done: false,
            shutdown_tx,
            frames: 0,
            lines: 0,
            invalid_lines: 0,
        }
    }

    /// Handle for stopping a [`run()`] loop from another task.
    ///
    /// [`run()`]: TicSession::run
    pub fn shutdown_handle(&self) -> SessionShutdown {
        SessionShutdown {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Feed one chunk of raw bytes synchronously.
    ///
    /// All events produced by the chunk are dispatched before this method
    /// returns.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.reassembler.feed(bytes);
        while let Some(event) = self.reassembler.next_event() {
            self.dispatch(event);
        }
    }

    /// Drive the session from an async byte source until end of stream or
    /// shutdown.
    ///
    /// The source is framed with [`TicCodec`]; an in-progress frame at end
    /// of stream is abandoned silently. A read error is fatal to the
    /// session and surfaced to the caller, which owns the retry policy.
    pub async fn run<R: AsyncRead + Unpin>(&mut self, reader: R) -> Result<()> {
        let mut framed = FramedRead::new(reader, TicCodec::with_decoding(self.config.decoding));

        // A shutdown signalled before the loop starts would otherwise be
        // marked as seen by subscribe() and never observed.
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if *shutdown_rx.borrow_and_update() {
            info!("session shutdown requested");
            return Ok(());
        }

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("session shutdown requested");
                    return Ok(());
                }
                next = framed.next() => match next {
                    Some(Ok(event)) => self.dispatch(event),
                    Some(Err(e)) => return Err(Error::TransportRead(e.to_string())),
                    None => {
                        info!("byte stream ended");
                        return Ok(());
                    }
                },
            }
        }
    }

    /// Counters snapshot.
    pub fn diagnostics(&self) -> SessionDiagnostics {
        SessionDiagnostics {
            frames: self.frames,
            lines: self.lines,
            invalid_lines: self.invalid_lines,
            discovery_done: self.discovery_done,
        }
    }

    fn dispatch(&mut self, event: StreamEvent) {
        match event {
            StreamEvent::Line(text) => {
                self.lines += 1;
                trace!(line = %text, "line received");
                if self.config.mirror.enabled {
                    self.sink.publish(Emission::RawLine {
                        text: text.trim_matches(['\r', '\n']).to_string(),
                    });
                }
            }
            StreamEvent::FrameClosed(raw) => self.handle_frame(raw),
        }
    }

    fn handle_frame(&mut self, raw: RawFrame) {
        let finalized = self.aggregator.finalize(raw);
        self.frames += 1;
        self.invalid_lines += u64::from(finalized.frame.invalid_lines());

        debug!(
            fields = finalized.frame.len(),
            invalid = finalized.frame.invalid_lines(),
            "frame closed"
        );
        if !finalized.invalid_reports.is_empty() {
            warn!(
                count = finalized.invalid_reports.len(),
                "checksum failures in frame"
            );
        }

        if self.config.mirror.enabled {
            for (label, value) in &finalized.fields {
                self.sink.publish(Emission::Field {
                    label: label.clone(),
                    value: value.clone(),
                });
            }
            for report in &finalized.invalid_reports {
                self.sink.publish(Emission::InvalidLine(report.clone()));
            }
            self.sink.publish(Emission::Derived {
                period: finalized.derived,
                off_peak_active: finalized.off_peak_active(),
            });
        }

        // One-shot discovery, irreversibly latched for the session.
        if self.config.discovery.enabled && !self.discovery_done {
            if let Some(adco) = finalized.frame.get(LABEL_ADCO) {
                let request = DiscoveryRequest::new(
                    adco,
                    finalized.frame.labels().map(str::to_string),
                );
                info!(device = %request.device_id, "raising one-time discovery request");
                self.sink.publish(Emission::DiscoveryRequest(request));
                self.discovery_done = true;
            }
        }

        if self.config.mirror.enabled {
            self.sink.publish(Emission::Frame(finalized.frame.clone()));
        }

        // Host event bus gets the frame regardless of mirror settings.
        self.sink.publish(Emission::FrameEvent(finalized.frame));
    }
}
