//! Error and notice response fields.
//!
//! <https://www.postgresql.org/docs/current/protocol-error-fields.html>
use bytes::{Buf, Bytes};
use std::fmt;

use crate::{
    common::{ByteStr, verbose},
    error::ArgumentError,
    ext::BytesExt,
    postgres::ProtocolError,
};

macro_rules! diag_field {
    ($(
        $(#[$doc:meta])*
        $name:ident = $code:literal,
    )*) => {
        /// Identify a field in [`ErrorResponse`][1] or [`NoticeResponse`][2].
        ///
        /// [1]: crate::postgres::ErrorResponse
        /// [2]: crate::postgres::NoticeResponse
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum DiagField {
            $(
                $(#[$doc])*
                $name,
            )*
        }

        impl DiagField {
            /// All known fields, in declaration order.
            pub const ALL: &'static [DiagField] = &[$(DiagField::$name),*];

            /// Returns the field type code used in the protocol.
            pub const fn code(self) -> u8 {
                match self {
                    $(DiagField::$name => $code,)*
                }
            }

            /// Returns field from its protocol code, or `None` if unknown.
            pub const fn from_code(code: u8) -> Option<DiagField> {
                match code {
                    $($code => Some(DiagField::$name),)*
                    _ => None,
                }
            }
        }
    };
}

diag_field! {
    /// The field contents are `ERROR`, `FATAL`, or `PANIC` (in an error message),
    /// or `WARNING`, `NOTICE`, `DEBUG`, `INFO`, or `LOG` (in a notice message),
    /// or a localized translation of one of these. Always present.
    Severity = b'S',
    /// Same as [`DiagField::Severity`] except that the contents are never localized.
    /// Present only in messages generated by PostgreSQL versions 9.6 and later.
    SeverityNonlocalized = b'V',
    /// The SQLSTATE code for the error. Always present.
    SqlState = b'C',
    /// The primary human-readable error message. Always present.
    MessagePrimary = b'M',
    /// An optional secondary error message carrying more detail about the problem.
    MessageDetail = b'D',
    /// An optional suggestion what to do about the problem.
    MessageHint = b'H',
    /// Decimal ASCII integer, indicating an error cursor position as an index into the original query string.
    /// The first character has index 1, and positions are measured in characters not bytes.
    StatementPosition = b'P',
    /// Same as [`DiagField::StatementPosition`], but used when the cursor position refers to an internally
    /// generated command rather than the one submitted by the client.
    InternalPosition = b'p',
    /// The text of a failed internally-generated command.
    InternalQuery = b'q',
    /// An indication of the context in which the error occurred.
    Context = b'W',
    /// If the error was associated with a specific database object, the name of the schema containing that object.
    SchemaName = b's',
    /// If the error was associated with a specific table, the name of the table.
    TableName = b't',
    /// If the error was associated with a specific table column, the name of the column.
    ColumnName = b'c',
    /// If the error was associated with a specific data type, the name of the data type.
    DatatypeName = b'd',
    /// If the error was associated with a specific constraint, the name of the constraint.
    ConstraintName = b'n',
    /// The file name of the source-code location where the error was reported.
    SourceFile = b'F',
    /// The line number of the source-code location where the error was reported.
    SourceLine = b'L',
    /// The name of the source-code routine reporting the error.
    SourceFunction = b'R',
}

impl TryFrom<u8> for DiagField {
    type Error = ArgumentError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        DiagField::from_code(code).ok_or(ArgumentError::UnknownDiagField(code))
    }
}

const FIELD_LEN: usize = DiagField::ALL.len();

/// Parsed fields of an error or notice response.
///
/// Fields not sent by the server yield `None`.
#[derive(Clone, Default)]
pub struct Diagnostics {
    fields: [Option<ByteStr>; FIELD_LEN],
}

impl Diagnostics {
    /// Diagnostics without any field, used for successful results.
    pub fn empty() -> Diagnostics {
        Diagnostics::default()
    }

    /// Parse `ErrorResponse` or `NoticeResponse` message body.
    ///
    /// Fields of unrecognized type are ignored.
    pub fn parse(mut body: Bytes) -> Result<Diagnostics, ProtocolError> {
        let mut me = Diagnostics::default();

        loop {
            if !body.has_remaining() {
                return Err(ProtocolError::truncated("error field terminator"));
            }
            let code = body.get_u8();
            if code == b'\0' {
                break;
            }
            let value = body.get_nul_bytestr()?;
            match DiagField::from_code(code) {
                Some(field) => me.fields[field as usize] = Some(value),
                None => {
                    verbose!(code, "ignoring unknown error field");
                },
            }
        }

        Ok(me)
    }

    /// Set a field value.
    pub fn with(mut self, field: DiagField, value: impl Into<ByteStr>) -> Diagnostics {
        self.fields[field as usize] = Some(value.into());
        self
    }

    /// Returns the field value, or `None` if the server did not send it.
    pub fn field(&self, field: DiagField) -> Option<&str> {
        self.fields[field as usize].as_deref()
    }

    /// Returns `true` if no field is present.
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(Option::is_none)
    }

    /// The SQLSTATE code.
    pub fn sqlstate(&self) -> Option<&str> {
        self.field(DiagField::SqlState)
    }

    /// The primary human-readable message.
    pub fn message(&self) -> Option<&str> {
        self.field(DiagField::MessagePrimary)
    }

    /// Format the fields the way `libpq` does in default verbosity.
    ///
    /// ```text
    /// ERROR:  relation "foo" does not exist
    /// DETAIL:  ..
    /// HINT:  ..
    /// ```
    ///
    /// Returns empty string when neither severity nor message is present.
    pub fn error_message(&self) -> String {
        let mut out = String::new();
        let severity = self.field(DiagField::Severity);
        let message = self.field(DiagField::MessagePrimary);

        if severity.is_none() && message.is_none() {
            return out;
        }

        if let Some(severity) = severity {
            out.push_str(severity);
            out.push_str(":  ");
        }
        out.push_str(message.unwrap_or("missing error text"));
        out.push('\n');

        for (field, label) in [
            (DiagField::MessageDetail, "DETAIL"),
            (DiagField::MessageHint, "HINT"),
            (DiagField::Context, "CONTEXT"),
        ] {
            if let Some(value) = self.field(field) {
                out.push_str(label);
                out.push_str(":  ");
                out.push_str(value);
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_map();
        for &field in DiagField::ALL {
            if let Some(value) = self.field(field) {
                dbg.entry(&field, &value);
            }
        }
        dbg.finish()
    }
}

#[cfg(test)]
pub(crate) mod test {
    use bytes::BufMut;

    use super::*;

    pub(crate) fn error_body(fields: &[(u8, &str)]) -> Bytes {
        let mut body = Vec::new();
        for (code, value) in fields {
            body.put_u8(*code);
            body.put_slice(value.as_bytes());
            body.put_u8(b'\0');
        }
        body.put_u8(b'\0');
        body.into()
    }

    pub(crate) fn undefined_table() -> Bytes {
        error_body(&[
            (b'S', "ERROR"),
            (b'V', "ERROR"),
            (b'C', "42P01"),
            (b'M', "relation \"nonexistant_table\" does not exist"),
            (b'P', "15"),
            (b'F', "parse_relation.c"),
            (b'L', "1449"),
            (b'R', "parserOpenTable"),
        ])
    }

    #[test]
    fn parse_undefined_table() {
        let diag = Diagnostics::parse(undefined_table()).unwrap();
        assert_eq!(diag.field(DiagField::Severity), Some("ERROR"));
        assert_eq!(diag.field(DiagField::SqlState), Some("42P01"));
        assert_eq!(
            diag.field(DiagField::MessagePrimary),
            Some("relation \"nonexistant_table\" does not exist")
        );
        assert_eq!(diag.field(DiagField::MessageDetail), None);
        assert_eq!(diag.field(DiagField::MessageHint), None);
        assert_eq!(diag.field(DiagField::StatementPosition), Some("15"));
        assert_eq!(diag.field(DiagField::InternalPosition), None);
        assert_eq!(diag.field(DiagField::InternalQuery), None);
        assert_eq!(diag.field(DiagField::Context), None);
        assert!(diag.field(DiagField::SourceFile).unwrap().ends_with("parse_relation.c"));
        assert!(diag.field(DiagField::SourceLine).unwrap().bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(diag.field(DiagField::SourceFunction), Some("parserOpenTable"));
    }

    #[test]
    fn parse_constraint_fields() {
        let diag = Diagnostics::parse(error_body(&[
            (b'S', "ERROR"),
            (b'C', "23502"),
            (b'M', "null value in column \"id\" of relation \"integrity\" violates not-null constraint"),
            (b's', "public"),
            (b't', "integrity"),
            (b'c', "id"),
        ]))
        .unwrap();
        assert_eq!(diag.field(DiagField::SchemaName), Some("public"));
        assert_eq!(diag.field(DiagField::TableName), Some("integrity"));
        assert_eq!(diag.field(DiagField::ColumnName), Some("id"));
        assert_eq!(diag.field(DiagField::DatatypeName), None);
        assert_eq!(diag.field(DiagField::ConstraintName), None);
    }

    #[test]
    fn unknown_field_ignored() {
        let diag = Diagnostics::parse(error_body(&[(b'Z', "zzz"), (b'M', "boom")])).unwrap();
        assert_eq!(diag.message(), Some("boom"));
    }

    #[test]
    fn missing_terminator() {
        assert!(Diagnostics::parse(Bytes::from_static(b"Mboom\0")).is_err());
        assert!(Diagnostics::parse(Bytes::from_static(b"Mboom")).is_err());
    }

    #[test]
    fn unknown_tag_fails_fast() {
        let err = DiagField::try_from(b'Z').unwrap_err();
        assert!(err.to_string().contains("diagnostic field"));
        assert_eq!(DiagField::try_from(b'C').unwrap(), DiagField::SqlState);
        for &field in DiagField::ALL {
            assert_eq!(DiagField::from_code(field.code()), Some(field));
        }
    }

    #[test]
    fn libpq_message() {
        let diag = Diagnostics::empty()
            .with(DiagField::Severity, "ERROR")
            .with(DiagField::MessagePrimary, "division by zero")
            .with(DiagField::MessageHint, "do not");
        assert_eq!(diag.error_message(), "ERROR:  division by zero\nHINT:  do not\n");
        assert_eq!(Diagnostics::empty().error_message(), "");
        assert!(Diagnostics::empty().is_empty());
    }
}
