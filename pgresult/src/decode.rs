//! Field value decoding.
//!
//! - [`Value`], raw field value tagged with its transmission format
//! - [`Field`], field value with its column metadata
//! - [`Decode`], explicit conversion into rust types
//! - [`DecodeError`]
//!
//! Decoding never coerces by itself, a [`Value`] is exactly the bytes the
//! server sent. Conversion happens only when requested through [`Decode`].
use bytes::Bytes;
use std::{fmt, str::Utf8Error, string::FromUtf8Error};

use crate::{
    bytea::{self, ByteaError},
    column::Column,
    common::{ByteStr, display_error, from},
    ext::FmtExt,
    postgres::{Oid, PgFormat, PgType},
};

/// Non NULL field value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Text format value, as the server sent it.
    Text(Bytes),
    /// Binary format value, byte for byte as the server sent it.
    Binary(Bytes),
}

impl Value {
    /// Returns the format of the value.
    pub fn format(&self) -> PgFormat {
        match self {
            Self::Text(_) => PgFormat::Text,
            Self::Binary(_) => PgFormat::Binary,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(b) | Self::Binary(b) => b,
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Text(b) | Self::Binary(b) => b,
        }
    }

    /// Returns text value as `str`.
    ///
    /// Returns `None` for binary value or non utf8 text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(b) => std::str::from_utf8(b).ok(),
            Self::Binary(_) => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(b) => write!(f, "Text(\"{}\")", b.lossy()),
            Self::Binary(b) => write!(f, "Binary(\"{}\")", b.lossy()),
        }
    }
}

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<[u8]> for Value {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl PartialEq<&[u8]> for Value {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_bytes() == *other
    }
}

/// Decode raw field into [`Value`].
///
/// NULL is `None` regardless of the column format or type. Binary value is
/// passed through unchanged, text value is not coerced.
pub fn decode_field(raw: Option<&Bytes>, column: &Column) -> Option<Value> {
    let raw = raw?.clone();
    Some(match column.format() {
        PgFormat::Text => Value::Text(raw),
        PgFormat::Binary => Value::Binary(raw),
    })
}

/// Field value with its column.
#[derive(Debug, Clone)]
pub struct Field<'a> {
    column: &'a Column,
    value: Option<Bytes>,
}

impl<'a> Field<'a> {
    pub fn new(column: &'a Column, value: Option<Bytes>) -> Field<'a> {
        Field { column, value }
    }

    pub fn column(&self) -> &'a Column {
        self.column
    }

    pub fn name(&self) -> &'a str {
        self.column.name()
    }

    pub fn oid(&self) -> Oid {
        self.column.oid()
    }

    pub fn format(&self) -> PgFormat {
        self.column.format()
    }

    /// Return `true` if value is NULL.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Returns `None` if value is NULL.
    pub fn as_slice(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    /// Returns the value tagged with the column format.
    pub fn value(&self) -> Option<Value> {
        decode_field(self.value.as_ref(), self.column)
    }

    pub fn into_bytes(self) -> Option<Bytes> {
        self.value
    }

    /// Return [`DecodeError::Null`] if value is NULL.
    pub fn try_into_bytes(self) -> Result<Bytes, DecodeError> {
        self.value.ok_or(DecodeError::Null)
    }

    /// Try decode type using [`Decode`] implementation.
    pub fn decode<D: Decode>(self) -> Result<D, DecodeError> {
        D::decode(self)
    }

    /// Check column type against [`PgType::accepts`].
    pub fn expect<T: PgType>(&self) -> Result<(), DecodeError> {
        match T::accepts(self.oid()) {
            true => Ok(()),
            false => Err(DecodeError::OidMismatch {
                expect: std::any::type_name::<T>(),
                found: self.oid(),
            }),
        }
    }
}

/// A type that can be constructed from [`Field`].
pub trait Decode: Sized {
    /// Try decode self from field.
    fn decode(field: Field<'_>) -> Result<Self, DecodeError>;
}

impl<T: Decode> Decode for Option<T> {
    fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
        match field.is_null() {
            true => Ok(None),
            false => field.decode().map(Some),
        }
    }
}

impl Decode for () {
    fn decode(_: Field<'_>) -> Result<Self, DecodeError> {
        Ok(())
    }
}

impl Decode for Value {
    fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
        field.value().ok_or(DecodeError::Null)
    }
}

impl Decode for bool {
    fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
        field.expect::<Self>()?;
        let format = field.format();
        let value = field.try_into_bytes()?;
        match (format, &value[..]) {
            (PgFormat::Binary, [b]) => Ok(*b != 0),
            (PgFormat::Binary, _) => Err(DecodeError::InvalidLength { expect: 1, found: value.len() }),
            (PgFormat::Text, b"t" | b"true") => Ok(true),
            (PgFormat::Text, b"f" | b"false") => Ok(false),
            (PgFormat::Text, _) => Err(DecodeError::Parse(format!("invalid boolean \"{}\"", value.lossy()))),
        }
    }
}

fn be_bytes<const N: usize>(value: &[u8]) -> Result<[u8; N], DecodeError> {
    value
        .try_into()
        .map_err(|_| DecodeError::InvalidLength { expect: N, found: value.len() })
}

fn parse<T>(value: &[u8]) -> Result<T, DecodeError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    std::str::from_utf8(value)?
        .parse()
        .map_err(|e: T::Err| DecodeError::Parse(e.to_string()))
}

macro_rules! decode_number {
    ($($ty:ty),*) => {$(
        impl Decode for $ty {
            fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
                field.expect::<Self>()?;
                let format = field.format();
                let value = field.try_into_bytes()?;
                match format {
                    PgFormat::Binary => Ok(<$ty>::from_be_bytes(be_bytes(&value)?)),
                    PgFormat::Text => parse(&value),
                }
            }
        }
    )*};
}

decode_number!(i16, i32, i64, f32, f64);

impl Decode for String {
    fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
        field.expect::<Self>()?;
        Ok(String::from_utf8(field.try_into_bytes()?.into())?)
    }
}

impl Decode for ByteStr {
    fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
        field.expect::<String>()?;
        Ok(ByteStr::from_utf8(field.try_into_bytes()?)?)
    }
}

impl Decode for Bytes {
    fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
        field.expect::<Self>()?;
        let format = field.format();
        let value = field.try_into_bytes()?;
        match format {
            PgFormat::Binary => Ok(value),
            PgFormat::Text => Ok(bytea::unescape(&value)?),
        }
    }
}

impl Decode for Vec<u8> {
    fn decode(field: Field<'_>) -> Result<Self, DecodeError> {
        field.expect::<Self>()?;
        Bytes::decode(field).map(Into::into)
    }
}

/// An error when decoding field value.
pub enum DecodeError {
    /// Value is NULL.
    Null,
    /// Column type is not accepted by the requested type.
    OidMismatch {
        expect: &'static str,
        found: Oid,
    },
    /// Binary value has unexpected length.
    InvalidLength {
        expect: usize,
        found: usize,
    },
    /// Postgres return non utf8 string.
    Utf8(Utf8Error),
    /// Text value cannot be parsed.
    Parse(String),
    /// Requested type does not support the column format.
    UnsupportedFormat(PgFormat),
    /// Text format bytea is malformed.
    Bytea(ByteaError),
    /// Failed to deserialize using `serde_json`.
    #[cfg(feature = "json")]
    Json(serde_json::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("failed to decode value, ")?;
        match self {
            Self::Null => f.write_str("unexpected NULL value"),
            Self::OidMismatch { expect, found } => {
                write!(f, "column type oid {found} cannot be decoded as `{expect}`")
            },
            Self::InvalidLength { expect, found } => {
                write!(f, "expected {expect} byte(s), found {found}")
            },
            Self::Utf8(e) => write!(f, "{e}"),
            Self::Parse(e) => f.write_str(e),
            Self::UnsupportedFormat(format) => write!(f, "{format:?} format is not supported"),
            Self::Bytea(e) => write!(f, "{e}"),
            #[cfg(feature = "json")]
            Self::Json(e) => write!(f, "{e}"),
        }
    }
}

from!(DecodeError: <Utf8Error>e => Self::Utf8(e));
from!(DecodeError: <FromUtf8Error>e => Self::Utf8(e.utf8_error()));
from!(DecodeError: <ByteaError>e => Self::Bytea(e));
#[cfg(feature = "json")]
from!(DecodeError: <serde_json::Error>e => Self::Json(e));

display_error!(DecodeError);

#[cfg(test)]
mod test {
    use super::*;
    use crate::postgres::oid;

    fn field<'a>(column: &'a Column, value: &'static [u8]) -> Field<'a> {
        Field::new(column, Some(Bytes::from_static(value)))
    }

    #[test]
    fn null_is_not_empty() {
        let text = Column::new("a", oid::TEXT);
        let binary = Column::new("b", oid::BYTEA).with_format(PgFormat::Binary);
        assert_eq!(decode_field(None, &text), None);
        assert_eq!(decode_field(None, &binary), None);

        let empty = Bytes::new();
        assert_eq!(decode_field(Some(&empty), &text), Some(Value::Text(Bytes::new())));
        assert_eq!(decode_field(Some(&empty), &binary), Some(Value::Binary(Bytes::new())));
    }

    #[test]
    fn binary_passthrough() {
        let col = Column::new("b", oid::BYTEA).with_format(PgFormat::Binary);
        let raw = Bytes::from_static(b"\0\x01\\x\xff\0");
        let value = decode_field(Some(&raw), &col).unwrap();
        assert!(value.is_binary());
        assert_eq!(value.as_bytes(), &raw[..]);
        assert_eq!(value.as_str(), None);
    }

    #[test]
    fn text_not_coerced() {
        let col = Column::new("a", oid::INT4);
        let value = field(&col, b"0042").value().unwrap();
        assert_eq!(value, "0042");
        assert_eq!(value.as_str(), Some("0042"));
    }

    #[test]
    fn decode_integers() {
        let text = Column::new("a", oid::INT4);
        assert_eq!(field(&text, b"-12").decode::<i32>().unwrap(), -12);

        let binary = Column::new("a", oid::INT8).with_format(PgFormat::Binary);
        assert_eq!(field(&binary, &[0, 0, 0, 0, 0, 0, 1, 0]).decode::<i64>().unwrap(), 256);
        assert!(matches!(
            field(&binary, &[0, 1]).decode::<i64>(),
            Err(DecodeError::InvalidLength { expect: 8, found: 2 })
        ));
        assert!(matches!(
            field(&binary, &[0; 8]).decode::<i32>(),
            Err(DecodeError::OidMismatch { found: oid::INT8, .. })
        ));
        assert!(matches!(
            field(&text, b"x").decode::<i32>(),
            Err(DecodeError::Parse(_))
        ));
    }

    #[test]
    fn decode_float_and_bool() {
        let col = Column::new("a", oid::FLOAT8);
        assert_eq!(field(&col, b"1.5").decode::<f64>().unwrap(), 1.5);
        assert!(field(&col, b"NaN").decode::<f64>().unwrap().is_nan());
        assert_eq!(field(&col, b"-Infinity").decode::<f64>().unwrap(), f64::NEG_INFINITY);

        let col = Column::new("a", oid::BOOL);
        assert!(field(&col, b"t").decode::<bool>().unwrap());
        assert!(!field(&col, b"f").decode::<bool>().unwrap());
        let col = col.with_format(PgFormat::Binary);
        assert!(field(&col, b"\x01").decode::<bool>().unwrap());
    }

    #[test]
    fn decode_option() {
        let col = Column::new("a", oid::TEXT);
        assert_eq!(Field::new(&col, None).decode::<Option<String>>().unwrap(), None);
        assert!(matches!(Field::new(&col, None).decode::<String>(), Err(DecodeError::Null)));
        assert_eq!(field(&col, b"").decode::<Option<String>>().unwrap(), Some(String::new()));
    }

    #[test]
    fn decode_bytea() {
        let text = Column::new("a", oid::BYTEA);
        assert_eq!(field(&text, b"\\x00ff").decode::<Vec<u8>>().unwrap(), vec![0, 0xff]);
        assert_eq!(field(&text, b"a\\000b").decode::<Vec<u8>>().unwrap(), b"a\0b".to_vec());
        assert!(matches!(field(&text, b"\\x0").decode::<Bytes>(), Err(DecodeError::Bytea(_))));

        let binary = text.clone().with_format(PgFormat::Binary);
        assert_eq!(&field(&binary, b"\\x00").decode::<Bytes>().unwrap()[..], b"\\x00");
    }
}
