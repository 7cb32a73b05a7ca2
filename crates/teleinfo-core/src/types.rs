//! Shared domain types for the Téléinfo gateway.

use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text decoding applied to a line buffer before tokenization.
///
/// Decoding is total: every byte sequence produces a string, errors are
/// replaced rather than surfaced. The historic TIC stream is 7-bit ASCII on
/// the wire but gateways conventionally decode it as Latin-1 so that parity
/// glitches degrade to odd characters instead of decode failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineDecoding {
    /// ISO 8859-1: each byte maps to the code point of the same value.
    #[default]
    Latin1,

    /// UTF-8 with replacement characters for invalid sequences.
    Utf8Lossy,
}

impl LineDecoding {
    /// Decode a raw line buffer into text. Never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use teleinfo_core::LineDecoding;
    ///
    /// assert_eq!(LineDecoding::Latin1.decode(b"PAPP 00750 -"), "PAPP 00750 -");
    /// assert_eq!(LineDecoding::Latin1.decode(&[0xE9]), "é");
    /// ```
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            LineDecoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            LineDecoding::Utf8Lossy => String::from_utf8_lossy(bytes).into_owned(),
        }
    }
}

impl std::str::FromStr for LineDecoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "latin-1" | "latin1" | "iso-8859-1" => Ok(LineDecoding::Latin1),
            "utf-8" | "utf8" | "utf-8-lossy" => Ok(LineDecoding::Utf8Lossy),
            other => Err(Error::Config(format!("Unknown line decoding: {other}"))),
        }
    }
}

/// Serial data bits. The historic TIC line uses 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataBits {
    #[default]
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
}

/// Serial parity. The historic TIC line uses even parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Parity {
    #[default]
    #[serde(rename = "E")]
    Even,
    #[serde(rename = "N")]
    None,
}

/// Serial stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StopBits {
    #[default]
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
}

impl fmt::Display for DataBits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataBits::Seven => write!(f, "7"),
            DataBits::Eight => write!(f, "8"),
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Parity::Even => write!(f, "E"),
            Parity::None => write!(f, "N"),
        }
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StopBits::One => write!(f, "1"),
            StopBits::Two => write!(f, "2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn latin1_decode_is_total() {
        // Every possible byte decodes to exactly one char.
        let all: Vec<u8> = (0..=255).collect();
        let decoded = LineDecoding::Latin1.decode(&all);
        assert_eq!(decoded.chars().count(), 256);
        assert_eq!(decoded.chars().next(), Some('\0'));
        assert_eq!(decoded.chars().last(), Some('ÿ'));
    }

    #[test]
    fn utf8_lossy_replaces_invalid_sequences() {
        let decoded = LineDecoding::Utf8Lossy.decode(&[b'A', 0xFF, b'B']);
        assert_eq!(decoded, "A\u{FFFD}B");
    }

    #[rstest]
    #[case("latin-1", LineDecoding::Latin1)]
    #[case("LATIN1", LineDecoding::Latin1)]
    #[case("iso-8859-1", LineDecoding::Latin1)]
    #[case("utf-8", LineDecoding::Utf8Lossy)]
    fn decoding_from_str(#[case] input: &str, #[case] expected: LineDecoding) {
        assert_eq!(input.parse::<LineDecoding>().unwrap(), expected);
    }

    #[test]
    fn decoding_from_str_rejects_unknown() {
        assert!("ebcdic".parse::<LineDecoding>().is_err());
    }

    #[test]
    fn serial_defaults_are_7e1() {
        assert_eq!(DataBits::default(), DataBits::Seven);
        assert_eq!(Parity::default(), Parity::Even);
        assert_eq!(StopBits::default(), StopBits::One);
    }

    #[test]
    fn serial_params_serde_roundtrip() {
        let json = serde_json::to_string(&Parity::Even).unwrap();
        assert_eq!(json, "\"E\"");
        let back: Parity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Parity::Even);
    }
}
