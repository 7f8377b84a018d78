//! Ascii85 (btoa / Adobe alphabet) codec without delimiters.
//!
//! Every 4 input bytes become 5 characters in `!`..=`u`. A full group of
//! four zero bytes is written as the single character `z`. A final group of
//! `n < 4` bytes is zero padded, encoded, and truncated to `n + 1`
//! characters. A 20-byte SHA-1 digest therefore encodes to 25 characters
//! instead of 40 hex characters.

use thiserror::Error;

const BASE: u32 = 85;
const OFFSET: u8 = b'!';
const ZERO_GROUP: u8 = b'z';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Ascii85Error {
    #[error("invalid character {byte:#04x} at offset {offset}")]
    InvalidByte { byte: u8, offset: usize },

    #[error("group ending at offset {offset} overflows 32 bits")]
    Overflow { offset: usize },

    #[error("'z' inside a group at offset {offset}")]
    MisplacedZero { offset: usize },

    #[error("trailing group of a single character")]
    TruncatedGroup,
}

/// Upper bound on the encoded length of `len` input bytes
pub fn max_encoded_len(len: usize) -> usize {
    len.div_ceil(4) * 5
}

/// Encode `src` into printable ASCII
pub fn encode(src: &[u8]) -> String {
    let mut out = String::with_capacity(max_encoded_len(src.len()));

    for chunk in src.chunks(4) {
        let mut group = [0u8; 4];
        group[..chunk.len()].copy_from_slice(chunk);
        let value = u32::from_be_bytes(group);

        if value == 0 && chunk.len() == 4 {
            out.push(ZERO_GROUP as char);
            continue;
        }

        let mut digits = [0u8; 5];
        let mut rest = value;
        for digit in digits.iter_mut().rev() {
            *digit = (rest % BASE) as u8 + OFFSET;
            rest /= BASE;
        }

        for &digit in &digits[..chunk.len() + 1] {
            out.push(digit as char);
        }
    }

    out
}

/// Decode text produced by [`encode`]. ASCII whitespace is ignored.
pub fn decode(src: &str) -> Result<Vec<u8>, Ascii85Error> {
    let mut out = Vec::with_capacity(src.len() / 5 * 4 + 4);
    let mut group = [0u8; 5];
    let mut filled = 0usize;

    for (offset, byte) in src.bytes().enumerate() {
        match byte {
            b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' => continue,
            ZERO_GROUP => {
                if filled != 0 {
                    return Err(Ascii85Error::MisplacedZero { offset });
                }
                out.extend_from_slice(&[0, 0, 0, 0]);
            }
            b'!'..=b'u' => {
                group[filled] = byte - OFFSET;
                filled += 1;
                if filled == 5 {
                    out.extend_from_slice(&decode_group(&group, offset)?);
                    filled = 0;
                }
            }
            _ => return Err(Ascii85Error::InvalidByte { byte, offset }),
        }
    }

    match filled {
        0 => {}
        1 => return Err(Ascii85Error::TruncatedGroup),
        n => {
            // Pad with the highest digit so truncation rounds back to the input
            for digit in group.iter_mut().skip(n) {
                *digit = (BASE - 1) as u8;
            }
            let bytes = decode_group(&group, src.len())?;
            out.extend_from_slice(&bytes[..n - 1]);
        }
    }

    Ok(out)
}

fn decode_group(digits: &[u8; 5], offset: usize) -> Result<[u8; 4], Ascii85Error> {
    let mut value: u64 = 0;
    for &digit in digits {
        value = value * u64::from(BASE) + u64::from(digit);
    }
    let value = u32::try_from(value).map_err(|_| Ascii85Error::Overflow { offset })?;
    Ok(value.to_be_bytes())
}
