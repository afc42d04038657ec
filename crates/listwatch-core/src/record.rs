//! Listed-item records and their fingerprints.
//!
//! A [`Record`] is one row of a listing page: a display name and an integer
//! price. Records are compared across samples and across polls by their
//! [`fingerprint`], an 8-character digest of `name + "_" + price`. The digest
//! is a dedup key, not a security boundary; collisions are tolerated.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Records with fewer characters than this in their name are discarded.
pub const MIN_NAME_CHARS: usize = 3;

/// Length of a fingerprint in hex characters.
const FINGERPRINT_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub price: u64,
}

impl Record {
    /// Builds a record from raw extracted text.
    ///
    /// Whitespace in the name is collapsed. Returns `None` when the cleaned
    /// name is shorter than [`MIN_NAME_CHARS`]. The price never causes a
    /// rejection: unparsable price text becomes `0`.
    #[must_use]
    pub fn from_raw(name: &str, price_text: &str) -> Option<Self> {
        let name = name.split_whitespace().collect::<Vec<_>>().join(" ");
        if name.chars().count() < MIN_NAME_CHARS {
            return None;
        }
        Some(Self {
            name,
            price: parse_price(price_text),
        })
    }

    #[must_use]
    pub fn fingerprint(&self) -> String {
        fingerprint(self)
    }
}

/// Deterministic 8-hex-character digest of `name + "_" + price`.
#[must_use]
pub fn fingerprint(record: &Record) -> String {
    let input = format!("{}_{}", record.name, record.price);
    let digest = format!("{:x}", Sha256::digest(input.as_bytes()));
    digest[..FINGERPRINT_LEN].to_string()
}

/// Parses currency-formatted text such as `"¥150,000"` or `"$1,299"`.
///
/// Every non-digit is dropped. Text with no digits, or digits that overflow
/// `u64`, yields `0`.
#[must_use]
pub fn parse_price(text: &str) -> u64 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u64>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, price: u64) -> Record {
        Record {
            name: name.to_string(),
            price,
        }
    }

    #[test]
    fn fingerprint_is_eight_hex_chars() {
        let fp = fingerprint(&record("Canon EOS R6", 150_000));
        assert_eq!(fp.len(), 8);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let r = record("Canon EOS R6", 150_000);
        assert_eq!(fingerprint(&r), fingerprint(&r));
        assert_eq!(fingerprint(&r), fingerprint(&r.clone()));
    }

    #[test]
    fn fingerprint_differs_on_name() {
        assert_ne!(
            fingerprint(&record("Canon EOS R6", 150_000)),
            fingerprint(&record("Canon EOS R5", 150_000))
        );
    }

    #[test]
    fn fingerprint_differs_on_price() {
        assert_ne!(
            fingerprint(&record("Canon EOS R6", 150_000)),
            fingerprint(&record("Canon EOS R6", 149_000))
        );
    }

    #[test]
    fn fingerprint_matches_sha256_prefix() {
        let expected = format!("{:x}", Sha256::digest(b"abc_1"));
        assert_eq!(fingerprint(&record("abc", 1)), expected[..8]);
    }

    #[test]
    fn parse_price_strips_currency_formatting() {
        assert_eq!(parse_price("¥150,000"), 150_000);
        assert_eq!(parse_price("$1,299"), 1_299);
        assert_eq!(parse_price(" 42 円 "), 42);
    }

    #[test]
    fn parse_price_defaults_to_zero() {
        assert_eq!(parse_price(""), 0);
        assert_eq!(parse_price("SOLD"), 0);
        assert_eq!(parse_price("99999999999999999999999"), 0);
    }

    #[test]
    fn from_raw_collapses_whitespace() {
        let r = Record::from_raw("  Canon\n  EOS   R6 ", "¥150,000").unwrap();
        assert_eq!(r, record("Canon EOS R6", 150_000));
    }

    #[test]
    fn from_raw_rejects_short_names() {
        assert!(Record::from_raw("ab", "100").is_none());
        assert!(Record::from_raw("   ", "100").is_none());
        assert!(Record::from_raw("abc", "100").is_some());
    }

    #[test]
    fn from_raw_counts_characters_not_bytes() {
        // Two CJK characters are six bytes but only two characters.
        assert!(Record::from_raw("カメ", "100").is_none());
        assert!(Record::from_raw("カメラ", "100").is_some());
    }

    #[test]
    fn from_raw_keeps_record_with_bad_price() {
        let r = Record::from_raw("Canon EOS R6", "price on request").unwrap();
        assert_eq!(r.price, 0);
    }
}
