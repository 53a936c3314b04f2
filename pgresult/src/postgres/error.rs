//! Protocol error
use std::{fmt, str::Utf8Error};

use super::BackendMessage;

/// An error when translating buffer from postgres
pub enum ProtocolError {
    Unexpected {
        expect: Option<u8>,
        found: u8,
        phase: Option<&'static str>,
    },
    /// Message body ended before the expected field.
    Truncated {
        field: &'static str,
    },
    /// Postgres returns non utf8 string.
    Utf8(Utf8Error),
    /// Unknown format code.
    UnknownFormat {
        code: i16,
    },
    /// `DataRow` length does not match `RowDescription` length.
    RowLength {
        expect: usize,
        found: usize,
    },
}

impl std::error::Error for ProtocolError { }

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ProtocolError::Unexpected { expect, found, phase } => {
                let found = BackendMessage::message_name(found);
                match expect {
                    Some(m) => {
                        write!(
                            f,
                            "Expected message `{}` found `{found}`",
                            BackendMessage::message_name(m),
                        )?
                    },
                    None => write!(f, "Unexpected message `{found}`")?,
                }
                if let Some(phase) = phase {
                    write!(f, " in `{phase}`")?
                }
                Ok(())
            },
            ProtocolError::Truncated { field } => write!(f, "Message truncated, missing `{field}`"),
            ProtocolError::Utf8(ref e) => write!(f, "Postgres returns non utf8 string: {e}"),
            ProtocolError::UnknownFormat { code } => write!(f, "Unknown format code `{code}`"),
            ProtocolError::RowLength { expect, found } => {
                write!(f, "RowDescription has {expect} field(s), DataRow has {found}")
            },
        }
    }
}

impl fmt::Debug for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<Utf8Error> for ProtocolError {
    fn from(value: Utf8Error) -> Self {
        Self::Utf8(value)
    }
}

impl ProtocolError {
    pub(crate) fn unknown(found: u8) -> ProtocolError {
        Self::Unexpected {
            expect: None,
            found,
            phase: None,
        }
    }

    pub(crate) fn unexpected(expect: u8, found: u8) -> ProtocolError {
        Self::Unexpected {
            expect: Some(expect),
            found,
            phase: None,
        }
    }

    pub(crate) fn unexpected_phase(found: u8, phase: &'static str) -> ProtocolError {
        Self::Unexpected {
            expect: None,
            found,
            phase: Some(phase),
        }
    }

    pub(crate) fn truncated(field: &'static str) -> ProtocolError {
        Self::Truncated { field }
    }
}
