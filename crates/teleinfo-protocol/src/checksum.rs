//! TIC historic checksum computation and verification.
//!
//! Each TIC line carries a single printable checksum character computed over
//! the label, a separating space, and the value:
//!
//! ```text
//! checksum = ((sum of code points of "<label> <value>") & 0x3F) + 0x20
//! ```
//!
//! The masked-and-offset sum always lands in the printable ASCII range
//! `0x20..=0x5F`, so the checksum character can travel on the 7-bit serial
//! line like any other payload character.
//!
//! Both functions are pure. [`validate`] has no failure mode beyond
//! returning `false`: a multi-character or empty checksum candidate simply
//! does not validate.
//!
//! # Examples
//!
//! ```
//! use teleinfo_protocol::checksum;
//!
//! let chk = checksum::compute("PTEC", "HCJB");
//! assert_eq!(chk, b'C');
//! assert!(checksum::validate("PTEC", "HCJB", "C"));
//! assert!(!checksum::validate("PTEC", "HCJB", "D"));
//! assert!(!checksum::validate("PTEC", "HCJB", "CC")); // not a single char
//! ```

use teleinfo_core::constants::{CHECKSUM_MASK, CHECKSUM_OFFSET};

/// Compute the checksum byte for a label/value pair.
///
/// Sums the code point of every character of `label + " " + value`, masks
/// the sum to its low 6 bits and adds 0x20.
pub fn compute(label: &str, value: &str) -> u8 {
    let mut total: u32 = 0;
    for ch in label.chars() {
        total = total.wrapping_add(ch as u32);
    }
    total = total.wrapping_add(' ' as u32);
    for ch in value.chars() {
        total = total.wrapping_add(ch as u32);
    }
    ((total & CHECKSUM_MASK) + CHECKSUM_OFFSET) as u8
}

/// Verify a checksum candidate against a label/value pair.
///
/// The candidate must be exactly one character whose code point equals
/// [`compute`]`(label, value)`.
pub fn validate(label: &str, value: &str, checksum_char: &str) -> bool {
    let mut chars = checksum_char.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c as u32 == u32::from(compute(label, value)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ADCO", "012345678901", b'E')]
    #[case("PTEC", "HCJB", b'C')]
    #[case("PAPP", "00750", b'-')]
    #[case("IINST", "008", b'_')]
    #[case("BASE", "012345678", b'/')]
    #[case("ISOUSC", "30", b'9')]
    #[case("OPTARIF", "HC..", b'<')]
    #[case("MOTDETAT", "000000", b'B')]
    fn compute_known_vectors(#[case] label: &str, #[case] value: &str, #[case] expected: u8) {
        assert_eq!(compute(label, value), expected);
    }

    #[test]
    fn compute_stays_printable() {
        for (label, value) in [("", ""), ("PTEC", "HCJB"), ("X", "ÿÿÿÿ"), ("A", "\t\t")] {
            let chk = compute(label, value);
            assert!((0x20..=0x5F).contains(&chk), "chk {chk:#04x} out of range");
        }
    }

    #[test]
    fn validate_round_trip() {
        let chk = compute("HCHC", "052890471");
        let chk_str = char::from(chk).to_string();
        assert!(validate("HCHC", "052890471", &chk_str));
    }

    #[test]
    fn validate_rejects_wrong_char() {
        assert!(!validate("IINST", "008", "X"));
    }

    #[test]
    fn validate_rejects_non_single_candidates() {
        assert!(!validate("PTEC", "HCJB", ""));
        assert!(!validate("PTEC", "HCJB", "C "));
    }

    #[test]
    fn whitespace_in_value_changes_checksum() {
        // Tabs and duplicate spaces participate in the sum, which is exactly
        // why relaxed recovery exists one layer up.
        assert_ne!(compute("PTEC", "HCJB"), compute("PTEC", "HC\tJB"));
    }
}
