//! `bytea` textual encoding.
//!
//! The `bytea` type supports two formats for input and output: “hex” format and
//! “escape” format. Since PostgreSQL 9.0 the server outputs hex format by default.
//!
//! Values received in [`Binary`][crate::postgres::PgFormat::Binary] format are already raw bytes
//! and must not be passed here.
//!
//! <https://www.postgresql.org/docs/current/datatype-binary.html>
use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

use crate::common::display_error;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Encode bytes in hex format, e.g. `\x00ff`.
///
/// The output can be used inside a string literal when `standard_conforming_strings` is on.
pub fn escape(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0xf) as usize] as char);
    }
    out
}

/// Encode bytes in the traditional escape format.
///
/// Printable ascii is kept as is, backslash is doubled, and every other byte
/// including the single quote is written as three digit octal, e.g. `\047`.
pub fn escape_legacy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\047"),
            0x20..=0x7e => out.push(b as char),
            _ => {
                out.push('\\');
                out.push((b'0' + (b >> 6)) as char);
                out.push((b'0' + ((b >> 3) & 7)) as char);
                out.push((b'0' + (b & 7)) as char);
            },
        }
    }
    out
}

/// Decode textual `bytea`, either hex or escape format, into raw bytes.
pub fn unescape(text: &[u8]) -> Result<Bytes, ByteaError> {
    match text {
        [b'\\', b'x', hex @ ..] => unescape_hex(hex),
        _ => unescape_escape(text),
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn unescape_hex(hex: &[u8]) -> Result<Bytes, ByteaError> {
    let mut out = BytesMut::with_capacity(hex.len() / 2);
    let mut high = None;

    for (i, &b) in hex.iter().enumerate() {
        // whitespace is allowed between digit pairs
        if b.is_ascii_whitespace() && high.is_none() {
            continue;
        }
        let Some(v) = hex_value(b) else {
            return Err(ByteaError::InvalidHexDigit { position: i + 2, byte: b });
        };
        match high.take() {
            None => high = Some(v),
            Some(h) => out.put_u8(h << 4 | v),
        }
    }

    match high {
        Some(_) => Err(ByteaError::OddHexLength),
        None => Ok(out.freeze()),
    }
}

fn unescape_escape(text: &[u8]) -> Result<Bytes, ByteaError> {
    let mut out = BytesMut::with_capacity(text.len());
    let mut i = 0;

    while i < text.len() {
        let b = text[i];
        if b != b'\\' {
            out.put_u8(b);
            i += 1;
            continue;
        }

        match text.get(i + 1..i + 4) {
            _ if text.get(i + 1) == Some(&b'\\') => {
                out.put_u8(b'\\');
                i += 2;
            },
            Some(&[d1 @ b'0'..=b'3', d2 @ b'0'..=b'7', d3 @ b'0'..=b'7']) => {
                out.put_u8((d1 - b'0') << 6 | (d2 - b'0') << 3 | (d3 - b'0'));
                i += 4;
            },
            _ => return Err(ByteaError::InvalidEscape { position: i }),
        }
    }

    Ok(out.freeze())
}

/// An error when decoding textual `bytea`.
pub enum ByteaError {
    /// Hex format contains an odd number of digits.
    OddHexLength,
    /// Hex format contains a non hex digit.
    InvalidHexDigit { position: usize, byte: u8 },
    /// Backslash not followed by another backslash or three octal digits.
    InvalidEscape { position: usize },
}

impl fmt::Display for ByteaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid bytea, ")?;
        match self {
            Self::OddHexLength => f.write_str("odd number of hex digits"),
            Self::InvalidHexDigit { position, byte } => {
                write!(f, "invalid hexadecimal digit {:?} at {position}", *byte as char)
            },
            Self::InvalidEscape { position } => write!(f, "invalid escape sequence at {position}"),
        }
    }
}

display_error!(ByteaError);
