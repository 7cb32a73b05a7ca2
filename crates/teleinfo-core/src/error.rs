use thiserror::Error;

/// Failures surfaced to callers.
///
/// Decode-level problems (checksum mismatches, malformed or oversized lines)
/// are deliberately not errors: the decoder degrades them to per-frame
/// diagnostics and keeps running. Only conditions that stop a session appear
/// here.
#[derive(Error, Debug)]
pub enum Error {
    // Transport errors
    #[error("Serial port open failed on {port}: {reason}")]
    TransportOpen { port: String, reason: String },

    #[error("Serial read failed: {0}")]
    TransportRead(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_open_names_the_port() {
        let err = Error::TransportOpen {
            port: "/dev/ttyUSB0".to_string(),
            reason: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Serial port open failed on /dev/ttyUSB0: permission denied"
        );
    }

    #[test]
    fn io_error_converts() {
        let err: Error = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert!(matches!(err, Error::Io(_)));
    }
}
