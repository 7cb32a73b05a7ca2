//! Serial transport bridge.
//!
//! `serialport` reads are blocking, so the port is serviced on a dedicated
//! OS thread that forwards raw chunks into a bounded channel. The async
//! session side consumes the channel; a read timeout is not an error, it
//! only bounds how long the thread blocks between polls so it can notice a
//! dropped receiver and exit.

use crate::config::SerialConfig;
use std::io::Read;
use std::time::Duration;
use teleinfo_core::{DataBits, Error, Parity, Result, StopBits};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Chunk size for one blocking read. The historic TIC stream at 1200 baud
/// delivers well under this per timeout window.
const READ_CHUNK: usize = 256;

/// Bound on buffered chunks between the reader thread and the session.
const CHANNEL_CAPACITY: usize = 32;

/// A connected serial port with its reader thread.
pub struct SerialTransport {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl SerialTransport {
    /// Open the configured port and start the reader thread.
    pub fn connect(config: &SerialConfig) -> Result<Self> {
        let port = open_port(config)?;
        info!(
            port = %config.port,
            baud = config.baud,
            framing = %format!("{}{}{}", config.data_bits, config.parity, config.stop_bits),
            "serial port opened"
        );

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        std::thread::Builder::new()
            .name("tic-serial-reader".to_string())
            .spawn(move || read_loop(port, tx))
            .map_err(Error::Io)?;

        Ok(Self { rx })
    }

    /// Receive the next raw chunk. `None` means the reader thread has
    /// stopped (fatal read error or port disappearance).
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}

fn open_port(config: &SerialConfig) -> Result<Box<dyn serialport::SerialPort>> {
    serialport::new(&config.port, config.baud)
        .data_bits(map_data_bits(config.data_bits))
        .parity(map_parity(config.parity))
        .stop_bits(map_stop_bits(config.stop_bits))
        .timeout(Duration::from_millis(config.timeout_ms))
        .open()
        .map_err(|e| Error::TransportOpen {
            port: config.port.clone(),
            reason: e.to_string(),
        })
}

fn read_loop<R: Read>(mut port: R, tx: mpsc::Sender<Vec<u8>>) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match port.read(&mut buf) {
            // A zero-byte read is end of stream (unplugged adapter), not a
            // timeout; timeouts surface as TimedOut errors.
            Ok(0) => {
                info!("serial stream ended, stopping reader");
                return;
            }
            Ok(n) => {
                if tx.blocking_send(buf[..n].to_vec()).is_err() {
                    debug!("chunk receiver dropped, stopping serial reader");
                    return;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) => {
                error!(error = %e, "serial read failed, stopping reader");
                return;
            }
        }
    }
}

fn map_data_bits(bits: DataBits) -> serialport::DataBits {
    match bits {
        DataBits::Seven => serialport::DataBits::Seven,
        DataBits::Eight => serialport::DataBits::Eight,
    }
}

fn map_parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::Even => serialport::Parity::Even,
        Parity::None => serialport::Parity::None,
    }
}

fn map_stop_bits(bits: StopBits) -> serialport::StopBits {
    match bits {
        StopBits::One => serialport::StopBits::One,
        StopBits::Two => serialport::StopBits::Two,
    }
}
