//! Session configuration.
//!
//! All settings are serde round-trippable so a host can persist and restore
//! them; defaults match the historic TIC line (1200 baud, 7E1, Latin-1) and
//! the conventional mirror topic layout.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use teleinfo_core::constants::*;
use teleinfo_core::{DataBits, LineDecoding, Parity, StopBits};

/// Serial line parameters for one TIC connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial device path, e.g. `/dev/ttyUSB0`.
    pub port: String,

    /// Baud rate. The historic TIC stream runs at 1200.
    pub baud: u32,

    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,

    /// Read timeout in milliseconds. A timed-out read is not an error, it
    /// only bounds how long the reader thread blocks between polls.
    pub timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud: DEFAULT_BAUD,
            data_bits: DataBits::default(),
            parity: Parity::default(),
            stop_bits: StopBits::default(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Mirror topics for the outward emissions.
///
/// The gateway itself never talks to a broker; it only renders
/// topic/payload pairs through [`crate::emission::mirror_messages`] for a
/// collaborator to publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Master switch for the mirroring emissions (raw-line, field,
    /// invalid-line, frame, derived). The frame-event emission to the host
    /// bus is not affected.
    pub enabled: bool,

    pub topic_line: String,
    pub topic_json: String,
    pub topic_fields: String,
    pub topic_invalid: String,
    pub topic_derived: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            topic_line: DEFAULT_TOPIC_LINE.to_string(),
            topic_json: DEFAULT_TOPIC_JSON.to_string(),
            topic_fields: DEFAULT_TOPIC_FIELDS.to_string(),
            topic_invalid: DEFAULT_TOPIC_INVALID.to_string(),
            topic_derived: DEFAULT_TOPIC_DERIVED.to_string(),
        }
    }
}

/// One-shot capability-announcement settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Whether a discovery request is raised on the first frame carrying a
    /// device identifier.
    pub enabled: bool,

    /// Announcement topic prefix.
    pub prefix: String,

    /// Optional device name override; empty means "derive from the meter
    /// address".
    pub device_name: String,

    /// Also announce raw Wh index sensors next to the kWh ones.
    pub include_wh: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: DEFAULT_DISCOVERY_PREFIX.to_string(),
            device_name: String::new(),
            include_wh: false,
        }
    }
}

/// Complete configuration for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub serial: SerialConfig,

    /// Text decoding applied to line buffers.
    pub decoding: LineDecoding,

    /// Labels for which checksum-recovery normalization is attempted.
    pub relaxed_labels: BTreeSet<String>,

    pub mirror: MirrorConfig,
    pub discovery: DiscoveryConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            decoding: LineDecoding::default(),
            relaxed_labels: DEFAULT_RELAXED_LABELS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            mirror: MirrorConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_historic_tic() {
        let config = SessionConfig::default();
        assert_eq!(config.serial.baud, 1200);
        assert_eq!(config.serial.data_bits, DataBits::Seven);
        assert_eq!(config.serial.parity, Parity::Even);
        assert_eq!(config.decoding, LineDecoding::Latin1);
        assert!(config.relaxed_labels.contains("PTEC"));
        assert!(config.mirror.enabled);
        assert!(config.discovery.enabled);
        assert!(!config.discovery.include_wh);
    }

    #[test]
    fn serde_round_trip() {
        let config = SessionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"serial":{"port":"/dev/ttyAMA0"}}"#).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyAMA0");
        assert_eq!(config.serial.baud, 1200);
        assert_eq!(config.mirror.topic_line, "teleinfo/line");
    }
}
