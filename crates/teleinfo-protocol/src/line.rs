//! TIC line tokenizer with relaxed checksum recovery.
//!
//! A decoded line has the shape `<label> <value> <checksum>` where the value
//! may itself contain whitespace. The tokenizer splits the line, verifies the
//! checksum character, and for configured "relaxed" labels attempts a fixed
//! sequence of normalizations before declaring the line invalid.
//!
//! # Relaxed recovery
//!
//! Some meter firmware revisions stuff tab characters or duplicate spaces
//! into values, which corrupts the transmitted checksum relative to the
//! value a reader naively reconstructs. For labels configured as relaxed,
//! recovery is attempted in this fixed order, accepting the first variant
//! that validates:
//!
//! 1. remove embedded tab characters from the value,
//! 2. collapse all whitespace runs in the value to single spaces.
//!
//! Recovery is deliberately limited to a configured label set so that known
//! vendor deviations are tolerated without silently accepting arbitrary
//! corruption for untrusted labels.
//!
//! # Protocol variants
//!
//! A line with exactly two tokens (label + value, no checksum character) is
//! a legitimate variant for some labels (e.g. `MOTDETAT` on certain meters).
//! It is reported with `valid = false` and the value retained: without a
//! checksum character there is nothing to verify.
//!
//! # Examples
//!
//! ```
//! use teleinfo_protocol::{LineTokenizer, TokenizedLine};
//!
//! let tokenizer = LineTokenizer::with_default_relaxed();
//!
//! match tokenizer.tokenize("PTEC HCJB C\r\n") {
//!     TokenizedLine::Parsed(line) => {
//!         assert_eq!(line.label, "PTEC");
//!         assert_eq!(line.value, "HCJB");
//!         assert!(line.valid);
//!     }
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```

use crate::checksum;
use std::collections::BTreeSet;
use teleinfo_core::constants::DEFAULT_RELAXED_LABELS;

/// Result of tokenizing one decoded line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// Field identifier, first whitespace-separated token. Never empty.
    pub label: String,

    /// Field value. May contain embedded whitespace.
    pub value: String,

    /// Checksum character, present only if the candidate was exactly one
    /// character.
    pub checksum_char: Option<char>,

    /// True only if the checksum matched, possibly after relaxed recovery.
    pub valid: bool,
}

/// Tokenization outcome for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizedLine {
    /// Line was empty after trimming trailing CR/LF.
    Empty,

    /// Fewer than two whitespace-separated tokens: no label/value pair.
    Malformed,

    /// A recognizable label/value line, valid or not.
    Parsed(ParsedLine),
}

/// Tokenizer for decoded TIC lines.
///
/// Holds the set of labels for which checksum-recovery normalization is
/// attempted. The set is immutable for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct LineTokenizer {
    relaxed_labels: BTreeSet<String>,
}

impl LineTokenizer {
    /// Create a tokenizer with an explicit relaxed label set.
    pub fn new<I, S>(relaxed_labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            relaxed_labels: relaxed_labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a tokenizer with the default relaxed set (`PTEC`).
    pub fn with_default_relaxed() -> Self {
        Self::new(DEFAULT_RELAXED_LABELS.iter().copied())
    }

    /// Whether recovery is attempted for the given label.
    pub fn is_relaxed(&self, label: &str) -> bool {
        self.relaxed_labels.contains(label)
    }

    /// Tokenize one decoded line (frame delimiters already stripped).
    ///
    /// Trailing and leading carriage-return/linefeed characters are trimmed
    /// first; the line content itself is then split on whitespace runs to
    /// locate the label (first token) and the checksum candidate (last
    /// token). The value is the raw substring between them, so embedded tabs
    /// and duplicate spaces survive to the checksum check and the recovery
    /// normalizations can actually fire.
    pub fn tokenize(&self, line: &str) -> TokenizedLine {
        let s = line.trim_matches(['\r', '\n']).trim();
        if s.is_empty() {
            return TokenizedLine::Empty;
        }

        let tokens: Vec<&str> = s.split_whitespace().collect();
        if tokens.len() < 2 {
            return TokenizedLine::Malformed;
        }

        let label = tokens[0];

        if tokens.len() == 2 {
            // Checksum-less protocol variant: nothing to verify.
            return TokenizedLine::Parsed(ParsedLine {
                label: label.to_string(),
                value: tokens[1].to_string(),
                checksum_char: None,
                valid: false,
            });
        }

        // `s` is trimmed, so the label starts at 0 and the checksum
        // candidate ends at s.len().
        let candidate = tokens[tokens.len() - 1];
        let value_raw = s[label.len()..s.len() - candidate.len()].trim();

        let mut candidate_chars = candidate.chars();
        let checksum_char = match (candidate_chars.next(), candidate_chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        };

        if checksum_char.is_some() {
            if checksum::validate(label, value_raw, candidate) {
                return TokenizedLine::Parsed(ParsedLine {
                    label: label.to_string(),
                    value: value_raw.to_string(),
                    checksum_char,
                    valid: true,
                });
            }

            if self.is_relaxed(label) {
                if let Some(recovered) = self.recover(label, value_raw, candidate) {
                    return TokenizedLine::Parsed(ParsedLine {
                        label: label.to_string(),
                        value: recovered,
                        checksum_char,
                        valid: true,
                    });
                }
            }
        }

        // Invalid: keep the best-guess value, the whitespace-collapsed
        // remainder after the label (checksum candidate included).
        TokenizedLine::Parsed(ParsedLine {
            label: label.to_string(),
            value: tokens[1..].join(" "),
            checksum_char,
            valid: false,
        })
    }

    /// Attempt the fixed recovery sequence, returning the first value
    /// variant that validates.
    fn recover(&self, label: &str, value: &str, candidate: &str) -> Option<String> {
        let without_tabs = value.replace('\t', "");
        if checksum::validate(label, &without_tabs, candidate) {
            return Some(without_tabs);
        }

        let collapsed = value.split_whitespace().collect::<Vec<_>>().join(" ");
        if checksum::validate(label, &collapsed, candidate) {
            return Some(collapsed);
        }

        None
    }
}

impl Default for LineTokenizer {
    fn default() -> Self {
        Self::with_default_relaxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(outcome: TokenizedLine) -> ParsedLine {
        match outcome {
            TokenizedLine::Parsed(line) => line,
            other => panic!("expected Parsed, got {other:?}"),
        }
    }

    #[test]
    fn empty_line_after_trim() {
        let tokenizer = LineTokenizer::default();
        assert_eq!(tokenizer.tokenize(""), TokenizedLine::Empty);
        assert_eq!(tokenizer.tokenize("\r\n"), TokenizedLine::Empty);
    }

    #[test]
    fn single_token_is_malformed() {
        let tokenizer = LineTokenizer::default();
        assert_eq!(tokenizer.tokenize("PTEC"), TokenizedLine::Malformed);
        assert_eq!(tokenizer.tokenize("  PTEC \r\n"), TokenizedLine::Malformed);
    }

    #[test]
    fn valid_line_with_checksum() {
        let tokenizer = LineTokenizer::default();
        let line = parsed(tokenizer.tokenize("ADCO 012345678901 E\r"));
        assert_eq!(line.label, "ADCO");
        assert_eq!(line.value, "012345678901");
        assert_eq!(line.checksum_char, Some('E'));
        assert!(line.valid);
    }

    #[test]
    fn two_token_variant_is_retained_but_invalid() {
        let tokenizer = LineTokenizer::default();
        let line = parsed(tokenizer.tokenize("MOTDETAT 000000"));
        assert_eq!(line.label, "MOTDETAT");
        assert_eq!(line.value, "000000");
        assert_eq!(line.checksum_char, None);
        assert!(!line.valid);
    }

    #[test]
    fn checksum_mismatch_keeps_best_guess_value() {
        let tokenizer = LineTokenizer::default();
        let line = parsed(tokenizer.tokenize("IINST 008 X"));
        assert_eq!(line.label, "IINST");
        // On failure the whole remainder after the label is kept.
        assert_eq!(line.value, "008 X");
        assert_eq!(line.checksum_char, Some('X'));
        assert!(!line.valid);
    }

    #[test]
    fn multi_char_candidate_reports_empty_checksum_marker() {
        let tokenizer = LineTokenizer::default();
        let line = parsed(tokenizer.tokenize("IINST 008 XY"));
        assert_eq!(line.checksum_char, None);
        assert!(!line.valid);
        assert_eq!(line.value, "008 XY");
    }

    #[test]
    fn relaxed_recovery_strips_tabs() {
        // compute("PTEC", "HCJB") == 'C'; the tab corrupts the naive value.
        let tokenizer = LineTokenizer::default();
        let line = parsed(tokenizer.tokenize("PTEC HC\tJB C"));
        assert_eq!(line.label, "PTEC");
        assert_eq!(line.value, "HCJB");
        assert!(line.valid);
    }

    #[test]
    fn relaxed_recovery_collapses_whitespace_runs() {
        // compute("PTEC", "HC JB") == '#'
        let tokenizer = LineTokenizer::default();
        let line = parsed(tokenizer.tokenize("PTEC HC  JB #"));
        assert_eq!(line.value, "HC JB");
        assert!(line.valid);
    }

    #[test]
    fn recovery_not_attempted_for_untrusted_labels() {
        // Same tab corruption, but IMAX is not in the relaxed set.
        let chk = char::from(crate::checksum::compute("IMAX", "042")).to_string();
        let tokenizer = LineTokenizer::default();
        let line = parsed(tokenizer.tokenize(&format!("IMAX 04\t2 {chk}")));
        assert!(!line.valid);
    }

    #[test]
    fn recovery_failure_keeps_original_joined_value() {
        let tokenizer = LineTokenizer::default();
        let line = parsed(tokenizer.tokenize("PTEC HC\tJB Z"));
        assert!(!line.valid);
        assert_eq!(line.value, "HC JB Z");
    }

    #[test]
    fn value_with_embedded_space_validates_as_is() {
        // compute("PTEC", "HC JB") == '#': single interior spaces are part
        // of the checksummed value, no recovery involved.
        let tokenizer = LineTokenizer::new(Vec::<String>::new());
        let line = parsed(tokenizer.tokenize("PTEC HC JB #"));
        assert_eq!(line.value, "HC JB");
        assert!(line.valid);
    }

    #[test]
    fn custom_relaxed_set() {
        let tokenizer = LineTokenizer::new(["IMAX"]);
        assert!(tokenizer.is_relaxed("IMAX"));
        assert!(!tokenizer.is_relaxed("PTEC"));
    }
}
