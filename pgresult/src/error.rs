//! `pgresult` error types.
use std::{backtrace::Backtrace, fmt};

use crate::{
    PgResult,
    bytea::ByteaError,
    classify::DatabaseError,
    common::display_error,
    decode::DecodeError,
    postgres::ProtocolError,
};

/// A specialized [`Result`] type for `pgresult` operation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All possible error from `pgresult` library.
pub struct Error {
    context: String,
    backtrace: Backtrace,
    kind: ErrorKind,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_kind(self) -> ErrorKind {
        self.kind
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Prefix the error message with `context`.
    pub fn context(mut self, context: impl Into<String>) -> Error {
        self.context = context.into();
        self
    }

    /// Returns the classified server error, if this is one.
    pub fn as_database(&self) -> Option<&DatabaseError> {
        match &self.kind {
            ErrorKind::Database(db) => Some(db),
            _ => None,
        }
    }

    /// Returns the result attached to a server error.
    ///
    /// Returns `None` for every other error, and for failure that happened
    /// before any response was received.
    pub fn result(&self) -> Option<&PgResult> {
        self.as_database().and_then(DatabaseError::result)
    }
}

/// All possible error kind from `pgresult` library.
pub enum ErrorKind {
    Protocol(ProtocolError),
    Index(IndexError),
    Argument(ArgumentError),
    Type(TypeError),
    Decode(DecodeError),
    Bytea(ByteaError),
    Database(DatabaseError),
}

macro_rules! from {
    (<$ty:ty>$pat:pat => $body:expr) => {
        impl From<$ty> for Error {
            fn from($pat: $ty) -> Self {
                let backtrace = std::backtrace::Backtrace::capture();
                Self { context: String::new(), backtrace, kind: $body }
            }
        }
    };
}

from!(<ErrorKind>e => e);
from!(<ProtocolError>e => ErrorKind::Protocol(e));
from!(<IndexError>e => ErrorKind::Index(e));
from!(<ArgumentError>e => ErrorKind::Argument(e));
from!(<TypeError>e => ErrorKind::Type(e));
from!(<DecodeError>e => ErrorKind::Decode(e));
from!(<ByteaError>e => ErrorKind::Bytea(e));
from!(<DatabaseError>e => ErrorKind::Database(e));

impl std::error::Error for Error { }

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.context.is_empty() {
            write!(f, "{}: ", self.context)?;
        }

        fmt::Display::fmt(&self.kind, f)?;

        if let std::backtrace::BacktraceStatus::Captured = self.backtrace.status() {
            let mut backtrace = self.backtrace.to_string();
            write!(f, "\n\n")?;
            writeln!(f, "Stack backtrace:")?;
            backtrace.truncate(backtrace.trim_end().len());
            write!(f, "{}", backtrace)?;
        }

        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protocol(e) => fmt::Display::fmt(e, f),
            Self::Index(e) => fmt::Display::fmt(e, f),
            Self::Argument(e) => fmt::Display::fmt(e, f),
            Self::Type(e) => fmt::Display::fmt(e, f),
            Self::Decode(e) => fmt::Display::fmt(e, f),
            Self::Bytea(e) => fmt::Display::fmt(e, f),
            Self::Database(e) => fmt::Display::fmt(e, f),
        }
    }
}

display_error!(ErrorKind);

/// Row or column access outside of the result.
pub enum IndexError {
    /// Index requested is negative or not less than the count.
    OutOfRange {
        /// `"row"` or `"column"`
        what: &'static str,
        index: i64,
    },
    /// Column requested by name not found.
    ColumnNotFound(String),
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { what, index } => {
                write!(f, "{what} {} is out of range", itoa::Buffer::new().format(*index))
            },
            Self::ColumnNotFound(name) => write!(f, "column not found: {name:?}"),
        }
    }
}

display_error!(IndexError);

/// Invalid argument given to metadata accessor or registry.
pub enum ArgumentError {
    /// Column number is negative.
    NegativeColumn(i64),
    /// Column number is not less than column count.
    ColumnOutOfRange {
        index: i64,
        len: usize,
    },
    /// Parameter number is negative.
    NegativeParam(i64),
    /// Parameter number is not less than parameter count.
    ParamOutOfRange {
        index: i64,
        len: usize,
    },
    /// Diagnostic field code is not recognized.
    UnknownDiagField(u8),
    /// SQLSTATE key is neither a 5 character code nor a 2 character class.
    InvalidSqlState(String),
}

impl fmt::Display for ArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NegativeColumn(index) => write!(f, "invalid column number {index}"),
            Self::ColumnOutOfRange { index, len } => write!(
                f,
                "column number {index} is out of range, result has {len} column(s)"
            ),
            Self::NegativeParam(index) => write!(f, "invalid parameter number {index}"),
            Self::ParamOutOfRange { index, len } => write!(
                f,
                "parameter number {index} is out of range, result has {len} parameter(s)"
            ),
            Self::UnknownDiagField(code) => {
                write!(f, "unknown diagnostic field code {:?}", *code as char)
            },
            Self::InvalidSqlState(code) => {
                write!(f, "invalid SQLSTATE {code:?}, expected 5 character code or 2 character class")
            },
        }
    }
}

display_error!(ArgumentError);

/// Value of the wrong type used as column selector.
pub struct TypeError {
    pub(crate) found: &'static str,
    pub(crate) expected: &'static str,
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no implicit conversion of {} into {}", self.found, self.expected)
    }
}

display_error!(TypeError);

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn index_message() {
        let err = IndexError::OutOfRange { what: "row", index: -1 };
        assert_eq!(err.to_string(), "row -1 is out of range");
        let err = Error::from(err).context("value_at");
        assert!(err.to_string().starts_with("value_at: row -1 is out of range"));
        assert!(matches!(err.kind(), ErrorKind::Index(_)));
        assert!(err.result().is_none());
    }

    #[test]
    fn argument_message() {
        assert!(ArgumentError::NegativeColumn(-1).to_string().to_lowercase().contains("column number"));
        assert!(
            ArgumentError::ColumnOutOfRange { index: 18, len: 1 }
                .to_string()
                .contains("column number 18")
        );
    }
}
