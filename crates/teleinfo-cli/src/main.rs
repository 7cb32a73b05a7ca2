//! Command-line TIC decoder.
//!
//! Reads a Téléinformation Client byte stream from a serial port (or stdin
//! for captures and tests), decodes it, and prints one JSON object per
//! closed frame. Diagnostics go to stderr through `tracing`.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use teleinfo_core::LineDecoding;
use teleinfo_gateway::{
    ChannelSink, Emission, SessionConfig, TicSession, transport::SerialTransport,
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "teleinfo")]
#[command(version)]
#[command(
    about = "Decode a French utility meter's Téléinformation Client (TIC) stream.",
    after_help = "Examples:\n  teleinfo --port /dev/ttyUSB0\n  cat capture.bin | teleinfo --stdin --pretty"
)]
struct Cli {
    /// Serial device path
    #[arg(short, long, default_value_t = SessionConfig::default().serial.port)]
    port: String,

    /// Baud rate (the historic TIC runs at 1200)
    #[arg(short, long, default_value_t = SessionConfig::default().serial.baud)]
    baud: u32,

    /// Read bytes from stdin instead of a serial port
    #[arg(long, conflicts_with_all = ["port", "baud"])]
    stdin: bool,

    /// Comma-separated labels eligible for checksum recovery
    #[arg(long, value_delimiter = ',', default_value = "PTEC")]
    relaxed: Vec<String>,

    /// Line decoding: latin-1 or utf-8
    #[arg(long, default_value = "latin-1")]
    decoding: LineDecoding,

    /// Pretty-print frame JSON
    #[arg(long)]
    pretty: bool,

    /// Skip the one-shot discovery announcement
    #[arg(long)]
    no_discovery: bool,
}

impl Cli {
    fn session_config(&self) -> SessionConfig {
        let mut config = SessionConfig::default();
        config.serial.port = self.port.clone();
        config.serial.baud = self.baud;
        config.decoding = self.decoding;
        config.relaxed_labels = self.relaxed.iter().cloned().collect();
        config.discovery.enabled = !self.no_discovery;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.session_config();

    let (sink, rx) = ChannelSink::new();
    let mut session = TicSession::new(config.clone(), Arc::new(sink));
    let printer = tokio::spawn(print_emissions(rx, cli.pretty));

    if cli.stdin {
        session.run(tokio::io::stdin()).await?;
    } else {
        run_serial(&mut session, &config).await?;
    }

    let diagnostics = session.diagnostics();
    info!(
        frames = diagnostics.frames,
        lines = diagnostics.lines,
        invalid = diagnostics.invalid_lines,
        "session finished"
    );

    drop(session);
    printer.await.context("emission printer failed")?;
    Ok(())
}

async fn run_serial(session: &mut TicSession, config: &SessionConfig) -> Result<()> {
    let mut transport = SerialTransport::connect(&config.serial)
        .with_context(|| format!("cannot open {}", config.serial.port))?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted, closing session");
                return Ok(());
            }
            chunk = transport.recv() => match chunk {
                Some(bytes) => session.feed(&bytes),
                None => anyhow::bail!("serial reader stopped"),
            },
        }
    }
}

/// Print closed frames to stdout, route diagnostics to the log.
async fn print_emissions(mut rx: mpsc::UnboundedReceiver<Emission>, pretty: bool) {
    while let Some(emission) = rx.recv().await {
        match emission {
            Emission::Frame(frame) => {
                let json = if pretty {
                    serde_json::to_string_pretty(&frame)
                } else {
                    serde_json::to_string(&frame)
                };
                match json {
                    Ok(json) => println!("{json}"),
                    Err(e) => warn!(error = %e, "frame serialization failed"),
                }
            }
            Emission::InvalidLine(report) => {
                warn!(label = %report.label, raw = %report.raw, hex = %report.hex, "invalid line")
            }
            Emission::Derived {
                period,
                off_peak_active,
            } => info!(tariff = %period.short, off_peak_active, "tariff period"),
            Emission::DiscoveryRequest(request) => {
                info!(device = %request.device_id, labels = request.present.len(), "discovery")
            }
            Emission::RawLine { .. } | Emission::Field { .. } | Emission::FrameEvent(_) => {}
        }
    }
}
