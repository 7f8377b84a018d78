//! Identifier encodings for the credential table's primary key

use crate::ascii85;
use crate::error::RowError;
use serde::{Deserialize, Serialize};

/// How the key field of a line becomes the stored identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierEncoding {
    /// Lowercased hex text, stored as-is
    LowerHex,
    /// Hex decoded to bytes, then Ascii85 encoded (25 characters for SHA-1)
    Ascii85,
}

impl IdentifierEncoding {
    /// Encode one key field.
    ///
    /// `LowerHex` trusts the corpus to contain hex and does not validate it.
    pub fn encode(&self, key: &str) -> Result<String, RowError> {
        match self {
            IdentifierEncoding::LowerHex => Ok(key.to_lowercase()),
            IdentifierEncoding::Ascii85 => {
                let raw = hex::decode(key)?;
                let encoded = ascii85::encode(&raw);
                // A failure here skips the line
                if encoded.is_empty() || !encoded.bytes().all(|b| b.is_ascii_graphic()) {
                    return Err(RowError::NonTextIdentifier);
                }
                Ok(encoded)
            }
        }
    }

    /// Width of the stored identifier for a digest of `digest_len` bytes
    pub fn encoded_width(&self, digest_len: usize) -> usize {
        match self {
            IdentifierEncoding::LowerHex => digest_len * 2,
            IdentifierEncoding::Ascii85 => ascii85::max_encoded_len(digest_len),
        }
    }
}

impl std::fmt::Display for IdentifierEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierEncoding::LowerHex => f.write_str("lower-hex"),
            IdentifierEncoding::Ascii85 => f.write_str("ascii85"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SHA1_UPPER: &str = "5BAA61E4C9B93F3F0682250B6CF8331B7EE68FD8";

    #[test]
    fn test_lower_hex_folds_case_only() {
        let encoded = IdentifierEncoding::LowerHex.encode(SHA1_UPPER).unwrap();
        assert_eq!(encoded, SHA1_UPPER.to_lowercase());

        // Not validated in passthrough mode
        assert_eq!(IdentifierEncoding::LowerHex.encode("XYZ").unwrap(), "xyz");
    }

    #[test]
    fn test_ascii85_accepts_either_case() {
        let upper = IdentifierEncoding::Ascii85.encode(SHA1_UPPER).unwrap();
        let lower = IdentifierEncoding::Ascii85
            .encode(&SHA1_UPPER.to_lowercase())
            .unwrap();
        assert_eq!(upper, lower);
        assert_eq!(upper.len(), IdentifierEncoding::Ascii85.encoded_width(20));
    }

    #[test]
    fn test_ascii85_round_trips_to_digest() {
        let encoded = IdentifierEncoding::Ascii85.encode(SHA1_UPPER).unwrap();
        let raw = crate::ascii85::decode(&encoded).unwrap();
        assert_eq!(hex::encode_upper(raw), SHA1_UPPER);
    }

    #[test]
    fn test_ascii85_rejects_bad_hex() {
        assert_eq!(
            IdentifierEncoding::Ascii85.encode("abc"),
            Err(RowError::InvalidHex(hex::FromHexError::OddLength))
        );
        assert!(matches!(
            IdentifierEncoding::Ascii85.encode("zz00"),
            Err(RowError::InvalidHex(hex::FromHexError::InvalidHexCharacter { .. }))
        ));
    }

    #[test]
    fn test_widths() {
        assert_eq!(IdentifierEncoding::LowerHex.encoded_width(20), 40);
        assert_eq!(IdentifierEncoding::Ascii85.encoded_width(20), 25);
        assert_eq!(IdentifierEncoding::Ascii85.encoded_width(16), 20);
    }
}
