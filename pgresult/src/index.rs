//! Row and column selection.
//!
//! - [`Position`], zero based row or column number
//! - [`ColumnIndex`], column number or name
//! - [`Selector`], column selector built at runtime
use crate::{Column, Value, error::{IndexError, TypeError}};

mod sealed {
    pub trait Sealed { }
}

/// Type that can be used as zero based row or column number.
///
/// Signed integers are accepted so that negative numbers are reported as an
/// error instead of wrapping around.
pub trait Position: Copy + sealed::Sealed {
    #[doc(hidden)]
    fn position(self) -> i64;
}

macro_rules! position {
    ($($ty:ty),*) => {$(
        impl sealed::Sealed for $ty { }

        impl Position for $ty {
            fn position(self) -> i64 {
                i64::try_from(self).unwrap_or(i64::MAX)
            }
        }

        impl ColumnIndex for $ty {
            fn column_of(&self, columns: &[Column]) -> Result<usize, IndexError> {
                resolve("column", *self, columns.len())
            }
        }
    )*};
}

position!(usize, u32, i32, i64, isize);

/// Resolve `pos` against `len`, negative and overflowing numbers are out of range.
pub(crate) fn resolve(what: &'static str, pos: impl Position, len: usize) -> Result<usize, IndexError> {
    let index = pos.position();
    match usize::try_from(index) {
        Ok(i) if i < len => Ok(i),
        _ => Err(IndexError::OutOfRange { what, index }),
    }
}

/// Type that can be used for selecting column.
///
/// Implemented for [`Position`] types, column name as `&str` or [`String`],
/// and [`Selector`].
pub trait ColumnIndex: sealed::Sealed {
    #[doc(hidden)]
    fn column_of(&self, columns: &[Column]) -> Result<usize, IndexError>;
}

fn column_named(name: &str, columns: &[Column]) -> Result<usize, IndexError> {
    if name.is_empty() {
        return Err(IndexError::ColumnNotFound(String::new()));
    }
    columns
        .iter()
        .position(|col| col.name() == name)
        .ok_or_else(|| IndexError::ColumnNotFound(name.to_owned()))
}

impl sealed::Sealed for &str { }

impl ColumnIndex for &str {
    fn column_of(&self, columns: &[Column]) -> Result<usize, IndexError> {
        column_named(self, columns)
    }
}

impl sealed::Sealed for String { }

impl ColumnIndex for String {
    fn column_of(&self, columns: &[Column]) -> Result<usize, IndexError> {
        column_named(self, columns)
    }
}

/// Column selector decided at runtime, e.g. from user input.
///
/// ```
/// use pgresult::{Selector, Value};
///
/// let value = Value::Text("x".into());
/// assert_eq!(Selector::try_from(&value).unwrap(), Selector::Name("x"));
///
/// let value = Value::Binary("x".into());
/// assert!(Selector::try_from(&value).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    Position(i64),
    Name(&'a str),
}

impl sealed::Sealed for Selector<'_> { }

impl ColumnIndex for Selector<'_> {
    fn column_of(&self, columns: &[Column]) -> Result<usize, IndexError> {
        match *self {
            Selector::Position(pos) => resolve("column", pos, columns.len()),
            Selector::Name(name) => column_named(name, columns),
        }
    }
}

impl<'a> From<&'a str> for Selector<'a> {
    fn from(value: &'a str) -> Self {
        Selector::Name(value)
    }
}

impl From<i64> for Selector<'_> {
    fn from(value: i64) -> Self {
        Selector::Position(value)
    }
}

/// Only text value can be used as column name.
impl<'a> TryFrom<&'a Value> for Selector<'a> {
    type Error = TypeError;

    fn try_from(value: &'a Value) -> Result<Self, Self::Error> {
        match value {
            Value::Text(_) => value.as_str().map(Selector::Name).ok_or(TypeError {
                found: "non utf8 text",
                expected: "column name",
            }),
            Value::Binary(_) => Err(TypeError { found: "binary value", expected: "column name" }),
        }
    }
}

/// NULL cannot be used as column name.
impl<'a> TryFrom<Option<&'a Value>> for Selector<'a> {
    type Error = TypeError;

    fn try_from(value: Option<&'a Value>) -> Result<Self, Self::Error> {
        match value {
            Some(value) => Selector::try_from(value),
            None => Err(TypeError { found: "NULL", expected: "column name" }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::postgres::oid;

    fn columns() -> Vec<Column> {
        vec![Column::new("a", oid::INT4), Column::new("b", oid::TEXT)]
    }

    #[test]
    fn resolve_position() {
        let columns = columns();
        assert_eq!(1usize.column_of(&columns).unwrap(), 1);
        assert_eq!(0i32.column_of(&columns).unwrap(), 0);
        assert_eq!((-1i32).column_of(&columns).unwrap_err().to_string(), "column -1 is out of range");
        assert_eq!(2i64.column_of(&columns).unwrap_err().to_string(), "column 2 is out of range");
        assert_eq!(resolve("row", usize::MAX, 3).unwrap_err().to_string(), format!("row {} is out of range", i64::MAX));
    }

    #[test]
    fn resolve_name() {
        let columns = columns();
        assert_eq!("b".column_of(&columns).unwrap(), 1);
        assert_eq!(String::from("a").column_of(&columns).unwrap(), 0);
        assert!(matches!("".column_of(&columns), Err(IndexError::ColumnNotFound(name)) if name.is_empty()));
        assert_eq!("c".column_of(&columns).unwrap_err().to_string(), "column not found: \"c\"");
    }

    #[test]
    fn selector() {
        let columns = columns();
        assert_eq!(Selector::from("b").column_of(&columns).unwrap(), 1);
        assert_eq!(Selector::from(0).column_of(&columns).unwrap(), 0);

        let name = Value::Text("a".into());
        assert_eq!(Selector::try_from(&name).unwrap().column_of(&columns).unwrap(), 0);

        let err = Selector::try_from(&Value::Binary("a".into())).unwrap_err();
        assert_eq!(err.to_string(), "no implicit conversion of binary value into column name");
        let err = Selector::try_from(None::<&Value>).unwrap_err();
        assert_eq!(err.to_string(), "no implicit conversion of NULL into column name");
    }
}
