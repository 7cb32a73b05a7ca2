//! Core constants for the TIC (Téléinformation Client) historic protocol.
//!
//! This module defines all protocol-level constants used throughout the
//! Téléinfo gateway. These values are fixed by the Enedis "TIC historique"
//! specification as implemented by Linky and older electronic meters.
//!
//! # Protocol Structure
//!
//! A TIC frame is a sequence of lines bounded by control bytes:
//!
//! ```text
//! <STX>
//! <label> <value> <checksum><LF>
//! <label> <value> <checksum><LF>
//! ...
//! <ETX>
//! ```
//!
//! Where:
//! - `<STX>` - Start of frame marker (0x02)
//! - `<ETX>` - End of frame marker (0x03)
//! - `<LF>`  - Line terminator (0x0A)
//! - `<label>` - Short field identifier (e.g., `PTEC`, `PAPP`)
//! - `<checksum>` - Single printable character, see `teleinfo-protocol`
//!
//! A carriage return (0x0D), when present, is ordinary line content and is
//! stripped during line trimming, not at the byte level.
//!
//! # Serial Line
//!
//! The historic TIC stream is carried over a 1200 baud, 7 data bits, even
//! parity, 1 stop bit serial line. These defaults are captured here so every
//! layer (config, transport, CLI) agrees on them.

// ============================================================================
// Control Bytes
// ============================================================================

/// Start-of-frame marker (STX).
pub const START_BYTE: u8 = 0x02;

/// End-of-frame marker (ETX).
pub const END_BYTE: u8 = 0x03;

/// Line terminator (LF).
pub const LINE_FEED: u8 = 0x0A;

/// Carriage return. Retained as line content, stripped during trimming.
pub const CARRIAGE_RETURN: u8 = 0x0D;

// ============================================================================
// Checksum
// ============================================================================

/// Mask applied to the character sum before offsetting.
pub const CHECKSUM_MASK: u32 = 0x3F;

/// Offset added to the masked sum to land in the printable ASCII range.
pub const CHECKSUM_OFFSET: u32 = 0x20;

// ============================================================================
// Limits
// ============================================================================

/// Defensive cap on a single line between LF delimiters.
///
/// The protocol itself imposes no bound; a malformed stream that never emits
/// LF would otherwise grow the line buffer without limit. An overflowing
/// line is discarded and counted as invalid.
pub const MAX_LINE_LENGTH: usize = 1024;

// ============================================================================
// Well-Known Labels
// ============================================================================

/// Meter address (device identifier). Triggers one-shot discovery.
pub const LABEL_ADCO: &str = "ADCO";

/// Current tariff period code.
pub const LABEL_PTEC: &str = "PTEC";

/// Apparent power (VA).
pub const LABEL_PAPP: &str = "PAPP";

/// Instantaneous current (A).
pub const LABEL_IINST: &str = "IINST";

/// Maximum current reached (A).
pub const LABEL_IMAX: &str = "IMAX";

/// Subscribed current (A).
pub const LABEL_ISOUSC: &str = "ISOUSC";

/// Energy index, base tariff (Wh).
pub const LABEL_BASE: &str = "BASE";

/// Energy index, off-peak hours (Wh).
pub const LABEL_HCHC: &str = "HCHC";

/// Energy index, peak hours (Wh).
pub const LABEL_HCHP: &str = "HCHP";

/// Subscribed tariff option.
pub const LABEL_OPTARIF: &str = "OPTARIF";

/// Meter status word. Sent without checksum by some firmware revisions.
pub const LABEL_MOTDETAT: &str = "MOTDETAT";

/// Peak/off-peak schedule group.
pub const LABEL_HHPHC: &str = "HHPHC";

// ============================================================================
// Serial Defaults (TIC historique)
// ============================================================================

/// Default serial device path.
pub const DEFAULT_PORT: &str = "/dev/ttyUSB0";

/// Default baud rate.
pub const DEFAULT_BAUD: u32 = 1200;

/// Default serial read timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Labels for which checksum-recovery normalization is attempted by default.
pub const DEFAULT_RELAXED_LABELS: &[&str] = &[LABEL_PTEC];

// ============================================================================
// Mirror Topic Defaults
// ============================================================================

/// Default topic for the raw-line mirror.
pub const DEFAULT_TOPIC_LINE: &str = "teleinfo/line";

/// Default topic for the whole-frame JSON mirror.
pub const DEFAULT_TOPIC_JSON: &str = "teleinfo/json";

/// Default topic prefix for per-field mirrors (`<prefix>/<LABEL>`).
pub const DEFAULT_TOPIC_FIELDS: &str = "teleinfo/fields";

/// Default topic for invalid-line reports.
pub const DEFAULT_TOPIC_INVALID: &str = "teleinfo/invalid";

/// Default topic prefix for derived values.
pub const DEFAULT_TOPIC_DERIVED: &str = "teleinfo/derived";

/// Default discovery announcement prefix.
pub const DEFAULT_DISCOVERY_PREFIX: &str = "homeassistant";
