//! Symbol key normalization
//!
//! Search widgets group and match entries by a normalized key: the lowercased
//! name where every byte that is not an ASCII letter or digit is written as
//! `_` followed by two lowercase hex digits.
//!
//! ```
//! use sidx::index::key::{escape_key, unescape_key};
//!
//! assert_eq!(escape_key("Linked_list.c"), "linked_5flist_2ec");
//! assert_eq!(unescape_key("list_5fpush").unwrap(), "list_push");
//! ```

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("character '{ch}' at byte {offset} must be escaped")]
    Unescaped { ch: char, offset: usize },
    #[error("truncated escape at byte {offset}")]
    TruncatedEscape { offset: usize },
    #[error("invalid escape '_{digits}' at byte {offset}")]
    InvalidEscape { digits: String, offset: usize },
    #[error("escaped bytes are not valid UTF-8")]
    InvalidUtf8,
}

/// Normalize a display name into its search key
pub fn escape_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            continue;
        }

        // Non-ASCII letters are lowercased before their bytes are escaped
        let mut buf = [0u8; 4];
        for lower in ch.to_lowercase() {
            for byte in lower.encode_utf8(&mut buf).bytes() {
                out.push('_');
                out.push(hex_digit(byte >> 4));
                out.push(hex_digit(byte & 0x0f));
            }
        }
    }
    out
}

/// Decode a search key back into the lowercased name it was built from
pub fn unescape_key(key: &str) -> Result<String, KeyError> {
    let bytes = key.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'_' {
            let Some(pair) = bytes.get(i + 1..i + 3) else {
                return Err(KeyError::TruncatedEscape { offset: i });
            };
            match (hex_value(pair[0]), hex_value(pair[1])) {
                (Some(hi), Some(lo)) => out.push(hi << 4 | lo),
                _ => {
                    return Err(KeyError::InvalidEscape {
                        digits: String::from_utf8_lossy(pair).into_owned(),
                        offset: i,
                    });
                }
            }
            i += 3;
        } else if b.is_ascii_lowercase() || b.is_ascii_digit() {
            out.push(b);
            i += 1;
        } else {
            let ch = key[i..].chars().next().unwrap_or('\u{fffd}');
            return Err(KeyError::Unescaped { ch, offset: i });
        }
    }

    String::from_utf8(out).map_err(|_| KeyError::InvalidUtf8)
}

/// Check that a key is well formed (decodes it and drops the result)
pub fn validate_key(key: &str) -> Result<(), KeyError> {
    unescape_key(key).map(|_| ())
}

fn hex_digit(nibble: u8) -> char {
    char::from_digit(nibble as u32, 16).unwrap_or('0')
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}
