//! Per-frame aggregation and derived-field computation.
//!
//! When the reassembler closes a frame, every pending raw line is run
//! through the [`LineTokenizer`]:
//!
//! - a line yielding a label and value updates the frame mapping
//!   (last-write-wins) and is recorded as a field emission;
//! - a line failing checksum validation is additionally reported with its
//!   raw content and a hexadecimal dump, but its label/value is still stored
//!   (corrupted but structurally recognizable data is not discarded);
//! - a line yielding no label/value pair only increments the invalid-line
//!   diagnostic.
//!
//! After all lines are processed the tariff-period triple is derived from
//! the `PTEC` field (see [`TariffPeriod`]). The finalized frame, its field
//! list, its invalid-line reports, and the derived triple form one atomic
//! unit for the emission boundary.

use crate::frame::Frame;
use crate::line::{LineTokenizer, TokenizedLine};
use crate::reassembler::RawFrame;
use crate::tariff::TariffPeriod;
use serde::Serialize;
use teleinfo_core::constants::LABEL_PTEC;

/// Report for one line that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvalidLineReport {
    /// Label of the offending line.
    pub label: String,

    /// Raw decoded line content, CR/LF trimmed.
    pub raw: String,

    /// Space-separated uppercase hex dump of the raw line's characters,
    /// untrimmed.
    pub hex: String,
}

/// One closed frame, finalized and ready for emission.
#[derive(Debug, Clone)]
pub struct FinalizedFrame {
    /// Label→value mapping with diagnostics.
    pub frame: Frame,

    /// (label, value) pairs in line order, duplicates included: one per
    /// successfully tokenized line, for per-field emission.
    pub fields: Vec<(String, String)>,

    /// Reports for lines that failed validation.
    pub invalid_reports: Vec<InvalidLineReport>,

    /// Tariff-period triple derived from `PTEC` (unknown when absent).
    pub derived: TariffPeriod,
}

impl FinalizedFrame {
    /// Whether the off-peak period is currently active.
    pub fn off_peak_active(&self) -> bool {
        self.derived.off_peak_active()
    }
}

/// Aggregator turning a [`RawFrame`] into a [`FinalizedFrame`].
#[derive(Debug, Clone, Default)]
pub struct FrameAggregator {
    tokenizer: LineTokenizer,
}

impl FrameAggregator {
    /// Create an aggregator around the given tokenizer.
    pub fn new(tokenizer: LineTokenizer) -> Self {
        Self { tokenizer }
    }

    /// Finalize one closed frame.
    ///
    /// The invalid-line diagnostic starts from the unreadable-line count the
    /// reassembler collected while the frame was open, then grows by one for
    /// every malformed or checksum-failed line found during tokenization.
    pub fn finalize(&self, raw: RawFrame) -> FinalizedFrame {
        let mut frame = Frame::new();
        let mut fields = Vec::new();
        let mut invalid_reports = Vec::new();
        let mut invalid_lines = raw.invalid_lines;

        for line in &raw.lines {
            match self.tokenizer.tokenize(line) {
                TokenizedLine::Empty | TokenizedLine::Malformed => {
                    invalid_lines += 1;
                }
                TokenizedLine::Parsed(parsed) => {
                    if !parsed.valid {
                        invalid_lines += 1;
                        invalid_reports.push(InvalidLineReport {
                            label: parsed.label.clone(),
                            raw: line.trim_matches(['\r', '\n']).to_string(),
                            hex: hex_dump(line),
                        });
                    }
                    frame.insert(parsed.label.clone(), parsed.value.clone());
                    fields.push((parsed.label, parsed.value));
                }
            }
        }

        frame.set_invalid_lines(invalid_lines);

        let derived = TariffPeriod::from_code(frame.get(LABEL_PTEC).unwrap_or(""));

        FinalizedFrame {
            frame,
            fields,
            invalid_reports,
            derived,
        }
    }
}

/// Space-separated uppercase hex representation of a line's characters.
fn hex_dump(line: &str) -> String {
    line.chars()
        .map(|c| format!("{:02X}", c as u32))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finalize(lines: &[&str], invalid: u32) -> FinalizedFrame {
        let aggregator = FrameAggregator::default();
        aggregator.finalize(RawFrame {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            invalid_lines: invalid,
        })
    }

    #[test]
    fn valid_lines_populate_the_frame() {
        let finalized = finalize(&["ADCO 012345678901 E\r", "PTEC HCJB C\r"], 0);

        assert_eq!(finalized.frame.get("ADCO"), Some("012345678901"));
        assert_eq!(finalized.frame.get("PTEC"), Some("HCJB"));
        assert_eq!(finalized.frame.invalid_lines(), 0);
        assert!(finalized.invalid_reports.is_empty());
        assert_eq!(finalized.fields.len(), 2);
    }

    #[test]
    fn derived_triple_from_ptec() {
        let finalized = finalize(&["PTEC HCJB C\r"], 0);
        assert_eq!(finalized.derived.friendly, "Heures Creuses (Tempo Bleu)");
        assert_eq!(finalized.derived.short, "HC_BLEU");
        assert!(finalized.off_peak_active());
    }

    #[test]
    fn derived_is_unknown_without_ptec() {
        let finalized = finalize(&["PAPP 00750 -\r"], 0);
        assert_eq!(finalized.derived, TariffPeriod::UNKNOWN);
        assert!(!finalized.off_peak_active());
    }

    #[test]
    fn checksum_failure_is_reported_and_retained() {
        let finalized = finalize(&["IINST 008 X\r"], 0);

        // Best-effort: the corrupted pair is still stored.
        assert_eq!(finalized.frame.get("IINST"), Some("008 X"));
        assert_eq!(finalized.frame.invalid_lines(), 1);

        assert_eq!(finalized.invalid_reports.len(), 1);
        let report = &finalized.invalid_reports[0];
        assert_eq!(report.label, "IINST");
        assert_eq!(report.raw, "IINST 008 X");
        // 'I' = 0x49, trailing '\r' = 0x0D is part of the dump.
        assert!(report.hex.starts_with("49 49 4E 53 54 20"));
        assert!(report.hex.ends_with("0D"));
    }

    #[test]
    fn malformed_lines_count_but_contribute_nothing() {
        let finalized = finalize(&["GARBAGE", "PTEC HCJB C\r"], 0);

        assert_eq!(finalized.frame.invalid_lines(), 1);
        assert_eq!(finalized.frame.len(), 1);
        assert!(finalized.invalid_reports.is_empty());
    }

    #[test]
    fn unreadable_count_from_reassembler_is_carried_over() {
        let finalized = finalize(&["PTEC HCJB C\r"], 2);
        assert_eq!(finalized.frame.invalid_lines(), 2);
    }

    #[test]
    fn duplicate_labels_last_occurrence_wins() {
        // compute("PAPP", "00750") == '-'
        let finalized = finalize(&["PAPP 00750 -\r", "PAPP 00999 X\r"], 0);
        // The second occurrence fails its checksum but still overwrites.
        assert_eq!(finalized.frame.get("PAPP"), Some("00999 X"));
        // Both occurrences appear in the field emission list.
        assert_eq!(finalized.fields.len(), 2);
    }

    #[test]
    fn relaxed_recovery_produces_no_invalid_report() {
        let finalized = finalize(&["PTEC HC\tJB C\r"], 0);
        assert!(finalized.invalid_reports.is_empty());
        assert_eq!(finalized.frame.get("PTEC"), Some("HCJB"));
        assert_eq!(finalized.frame.invalid_lines(), 0);
    }

    #[test]
    fn empty_frame_finalizes_cleanly() {
        let finalized = finalize(&[], 0);
        assert!(finalized.frame.is_empty());
        assert_eq!(finalized.derived, TariffPeriod::UNKNOWN);
    }
}
