//! End-to-end decoder scenarios: bytes in, finalized frames out.

use teleinfo_protocol::{
    FinalizedFrame, FrameAggregator, FrameReassembler, LineTokenizer, StreamEvent, TariffPeriod,
};

/// Run a byte stream through the reassembler + aggregator and collect the
/// mirrored lines and finalized frames.
fn decode(input: &[u8]) -> (Vec<String>, Vec<FinalizedFrame>) {
    let mut reassembler = FrameReassembler::new();
    let aggregator = FrameAggregator::new(LineTokenizer::with_default_relaxed());

    reassembler.feed(input);

    let mut lines = Vec::new();
    let mut frames = Vec::new();
    for event in reassembler.drain_events() {
        match event {
            StreamEvent::Line(text) => lines.push(text),
            StreamEvent::FrameClosed(raw) => frames.push(aggregator.finalize(raw)),
        }
    }
    (lines, frames)
}

#[test]
fn nominal_frame_with_derived_fields() {
    // STX, two checksummed lines, ETX.
    let input = b"\x02ADCO 012345678901 E\r\nPTEC HCJB C\r\n\x03";
    let (lines, frames) = decode(input);

    assert_eq!(lines.len(), 2);
    assert_eq!(frames.len(), 1);

    let finalized = &frames[0];
    assert_eq!(finalized.frame.get("ADCO"), Some("012345678901"));
    assert_eq!(finalized.frame.get("PTEC"), Some("HCJB"));
    assert_eq!(finalized.frame.invalid_lines(), 0);

    assert_eq!(finalized.derived.friendly, "Heures Creuses (Tempo Bleu)");
    assert!(finalized.off_peak_active());
}

#[test]
fn full_historic_frame() {
    let input = b"\x02\
ADCO 012345678901 E\r\n\
OPTARIF HC.. <\r\n\
ISOUSC 30 9\r\n\
HCHC 052890471 *\r\n\
HCHP 049126387 ;\r\n\
PTEC HCJB C\r\n\
IINST 008 _\r\n\
IMAX 042 E\r\n\
PAPP 00750 -\r\n\
MOTDETAT 000000 B\r\n\
\x03";
    let (_, frames) = decode(input);

    assert_eq!(frames.len(), 1);
    let finalized = &frames[0];
    assert_eq!(finalized.frame.len(), 10);
    assert_eq!(finalized.frame.invalid_lines(), 0);
    assert!(finalized.invalid_reports.is_empty());
    assert_eq!(finalized.frame.get("PAPP"), Some("00750"));
    assert_eq!(finalized.frame.get("HCHP"), Some("049126387"));
}

#[test]
fn checksum_mismatch_produces_one_report_and_one_count() {
    // 'X' is not the checksum of "IINST 008"; IINST is not relaxed.
    let input = b"\x02PTEC HCJB C\r\nIINST 008 X\r\n\x03";
    let (_, frames) = decode(input);

    let finalized = &frames[0];
    assert_eq!(finalized.frame.invalid_lines(), 1);
    assert_eq!(finalized.invalid_reports.len(), 1);

    let report = &finalized.invalid_reports[0];
    assert_eq!(report.label, "IINST");
    assert_eq!(report.raw, "IINST 008 X");
    let expected_hex: Vec<String> = "IINST 008 X\r"
        .chars()
        .map(|c| format!("{:02X}", c as u32))
        .collect();
    assert_eq!(report.hex, expected_hex.join(" "));
}

#[test]
fn relaxed_tab_corruption_recovers_without_report() {
    let input = b"\x02PTEC HC\tJB C\r\n\x03";
    let (_, frames) = decode(input);

    let finalized = &frames[0];
    assert_eq!(finalized.frame.get("PTEC"), Some("HCJB"));
    assert!(finalized.invalid_reports.is_empty());
    assert_eq!(finalized.frame.invalid_lines(), 0);
}

#[test]
fn double_frame_start_discards_first_accumulation() {
    // The PAPP line and the unreadable empty line belong to the first,
    // never-closed frame; the second STX resets both lines and diagnostics.
    let input = b"\x02PAPP 00750 -\r\n\n\x02PTEC HCJB C\r\n\x03";
    let (_, frames) = decode(input);

    assert_eq!(frames.len(), 1);
    let finalized = &frames[0];
    assert_eq!(finalized.frame.len(), 1);
    assert!(finalized.frame.contains("PTEC"));
    assert_eq!(finalized.frame.invalid_lines(), 0);
}

#[test]
fn lf_only_stream_never_emits_a_frame() {
    let mut input = Vec::new();
    for _ in 0..50 {
        input.extend_from_slice(b"PTEC HCJB C\r\n");
    }
    let (lines, frames) = decode(&input);

    assert_eq!(lines.len(), 50);
    assert!(frames.is_empty());
}

#[test]
fn duplicate_label_last_wins_across_the_frame() {
    let input = b"\x02PAPP 00750 -\r\nPTEC HCJB C\r\nPAPP 00750 -\r\n\x03";
    let (_, frames) = decode(input);

    let finalized = &frames[0];
    assert_eq!(finalized.frame.len(), 2);
    // Both PAPP occurrences still appear as individual field emissions.
    assert_eq!(finalized.fields.len(), 3);
    assert_eq!(finalized.fields[0].0, "PAPP");
    assert_eq!(finalized.fields[2].0, "PAPP");
}

#[test]
fn frame_json_mirror_shape() {
    let input = b"\x02ADCO 012345678901 E\r\nPTEC HCJB C\r\n\x03";
    let (_, frames) = decode(input);

    let json = serde_json::to_value(&frames[0].frame).unwrap();
    assert_eq!(json["_meta"]["invalid_lines"], 0);
    assert_eq!(json["ADCO"], "012345678901");
    assert_eq!(json["PTEC"], "HCJB");
}

#[test]
fn chunked_delivery_is_equivalent_to_single_feed() {
    let input: &[u8] = b"\x02ADCO 012345678901 E\r\nPTEC HCJB C\r\n\x03";

    let (_, single) = decode(input);

    let mut reassembler = FrameReassembler::new();
    let aggregator = FrameAggregator::new(LineTokenizer::with_default_relaxed());
    for chunk in input.chunks(3) {
        reassembler.feed(chunk);
    }
    let chunked: Vec<FinalizedFrame> = reassembler
        .drain_events()
        .filter_map(|event| match event {
            StreamEvent::FrameClosed(raw) => Some(aggregator.finalize(raw)),
            StreamEvent::Line(_) => None,
        })
        .collect();

    assert_eq!(single.len(), chunked.len());
    assert_eq!(single[0].frame, chunked[0].frame);
}

#[test]
fn derived_defaults_to_unknown_without_ptec() {
    let input = b"\x02PAPP 00750 -\r\n\x03";
    let (_, frames) = decode(input);

    assert_eq!(frames[0].derived, TariffPeriod::UNKNOWN);
    assert!(!frames[0].off_peak_active());
}
