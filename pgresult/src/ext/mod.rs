use bytes::{Buf, Bytes};

use crate::{common::ByteStr, postgres::ProtocolError};

/// Nul string operation in [`Bytes`]
pub trait BytesExt {
    /// Try to read nul terminated string.
    ///
    /// Using [`ByteStr`] avoid allocating [`Vec`] as it required for [`String::from_utf8`]
    fn get_nul_bytestr(&mut self) -> Result<ByteStr, ProtocolError>;

    /// Read a big endian `u16`, checking remaining length first.
    fn checked_get_u16(&mut self) -> Result<u16, ProtocolError>;

    /// Read a big endian `i16`, checking remaining length first.
    fn checked_get_i16(&mut self) -> Result<i16, ProtocolError>;

    /// Read a big endian `u32`, checking remaining length first.
    fn checked_get_u32(&mut self) -> Result<u32, ProtocolError>;

    /// Read a big endian `i32`, checking remaining length first.
    fn checked_get_i32(&mut self) -> Result<i32, ProtocolError>;
}

/// Helper trait to [`Display`][std::fmt::Display] bytes.
pub trait FmtExt {
    /// Lossy [`Display`][std::fmt::Display] bytes.
    fn lossy(&self) -> LossyFmt<'_>;
}

/// Lossy [`Display`][std::fmt::Display] implementation for bytes.
pub struct LossyFmt<'a>(pub &'a [u8]);

macro_rules! checked_get {
    ($name:ident, $get:ident, $ty:ty) => {
        fn $name(&mut self) -> Result<$ty, ProtocolError> {
            if self.remaining() < size_of::<$ty>() {
                return Err(ProtocolError::truncated(stringify!($ty)));
            }
            Ok(self.$get())
        }
    };
}

impl BytesExt for Bytes {
    fn get_nul_bytestr(&mut self) -> Result<ByteStr, ProtocolError> {
        let end = self
            .iter()
            .position(|e| matches!(e, b'\0'))
            .ok_or(ProtocolError::truncated("nul terminated string"))?;
        let me = self.split_to(end);
        Buf::advance(self, 1); // nul
        Ok(ByteStr::from_utf8(me)?)
    }

    checked_get!(checked_get_u16, get_u16, u16);
    checked_get!(checked_get_i16, get_i16, i16);
    checked_get!(checked_get_u32, get_u32, u32);
    checked_get!(checked_get_i32, get_i32, i32);
}

impl FmtExt for [u8] {
    fn lossy(&self) -> LossyFmt<'_> {
        LossyFmt(self)
    }
}

impl std::fmt::Display for LossyFmt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &b in self.0 {
            if b.is_ascii_graphic() || b.is_ascii_whitespace() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{b:02x}")?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for LossyFmt<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nul_string() {
        let mut bytes = Bytes::from_static(b"foo\0bar\0");
        assert_eq!(bytes.get_nul_bytestr().unwrap(), "foo");
        assert_eq!(bytes.get_nul_bytestr().unwrap(), "bar");
        assert!(bytes.is_empty());
    }

    #[test]
    fn nul_string_unterminated() {
        let mut bytes = Bytes::from_static(b"foo");
        assert!(bytes.get_nul_bytestr().is_err());
    }

    #[test]
    fn truncated_integer() {
        let mut bytes = Bytes::from_static(&[0, 0, 1]);
        assert!(bytes.checked_get_i32().is_err());
        assert_eq!(bytes.checked_get_u16().unwrap(), 0);
    }

    #[test]
    fn lossy_display() {
        assert_eq!(b"ab\x00\xff".lossy().to_string(), "ab\\x00\\xff");
    }
}
