//! Postgres Backend Messages
//!
//! Only the messages that can appear while a query result is being received are decoded here,
//! startup and authentication belong to the transport.
use bytes::{Buf, Bytes};

use super::{Oid, PgFormat, ProtocolError};
use crate::{common::ByteStr, ext::BytesExt};

/// A type that can be decoded into postgres backend message
pub trait BackendProtocol: Sized {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self,ProtocolError>;
}

/// Postgres backend messages
#[derive(Debug)]
pub enum BackendMessage {
    CommandComplete(CommandComplete),
    CopyInResponse(CopyInResponse),
    CopyOutResponse(CopyOutResponse),
    CopyBothResponse(CopyBothResponse),
    DataRow(DataRow),
    EmptyQueryResponse(EmptyQueryResponse),
    ErrorResponse(ErrorResponse),
    NoData(NoData),
    NoticeResponse(NoticeResponse),
    ParameterDescription(ParameterDescription),
    RowDescription(RowDescription),
}

macro_rules! match_backend {
    ($($name:ident,)*) => {
        impl BackendMessage {
            pub fn msgtype(&self) -> u8 {
                match self {
                    $(Self::$name(_) => $name::MSGTYPE,)*
                }
            }

            /// Get message name from message type.
            ///
            /// Returns `"Unknown"` for unknown message type.
            pub fn message_name(msgtype: u8) -> &'static str {
                match msgtype {
                    $($name::MSGTYPE => stringify!($name),)*
                    _ => "Unknown",
                }
            }
        }
        impl BackendProtocol for BackendMessage {
            fn decode(msgtype: u8, body: Bytes) -> Result<Self, ProtocolError> {
                let message = match msgtype {
                    $($name::MSGTYPE => Self::$name(<$name as BackendProtocol>::decode(msgtype, body)?),)*
                    _ => return Err(ProtocolError::unknown(msgtype)),
                };
                Ok(message)
            }
        }
    };
}

match_backend! {
    CommandComplete,
    CopyInResponse,
    CopyOutResponse,
    CopyBothResponse,
    DataRow,
    EmptyQueryResponse,
    ErrorResponse,
    NoData,
    NoticeResponse,
    ParameterDescription,
    RowDescription,
}

macro_rules! assert_msgtype {
    ($typ:ident) => {
        if Self::MSGTYPE != $typ {
            return Err(ProtocolError::unexpected(Self::MSGTYPE,$typ))
        }
    };
}

/// Identifies the message as a command-completed response.
#[derive(Debug)]
pub struct CommandComplete {
    /// The command tag. This is usually a single word that identifies which SQL command was completed.
    ///
    /// For an `INSERT` command, the tag is `INSERT oid rows`.
    /// For a `SELECT` or `CREATE TABLE AS` command, the tag is `SELECT rows`.
    /// For `UPDATE`, `DELETE`, `MERGE`, `MOVE`, `FETCH` and `COPY` the tag is the command name and `rows`.
    pub tag: ByteStr,
}

impl CommandComplete {
    pub const MSGTYPE: u8 = b'C';
}

impl BackendProtocol for CommandComplete {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self,ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self { tag: body.get_nul_bytestr()? })
    }
}

/// Body shared by `CopyInResponse`, `CopyOutResponse` and `CopyBothResponse`.
#[derive(Debug)]
pub struct CopyResponse {
    /// Overall copy format.
    pub format: PgFormat,
    /// The format codes to be used for each column.
    ///
    /// Each must presently be zero (text) or one (binary).
    /// All must be zero if the overall copy format is textual.
    pub column_formats: Vec<PgFormat>,
}

impl CopyResponse {
    fn decode(mut body: Bytes) -> Result<Self, ProtocolError> {
        if !body.has_remaining() {
            return Err(ProtocolError::truncated("copy format"));
        }
        let code = i16::from(body.get_i8());
        let format = PgFormat::from_code(code).ok_or(ProtocolError::UnknownFormat { code })?;
        let len = body.checked_get_i16()?;
        let mut column_formats = Vec::with_capacity(len.max(0) as usize);
        for _ in 0..len {
            let code = body.checked_get_i16()?;
            column_formats.push(PgFormat::from_code(code).ok_or(ProtocolError::UnknownFormat { code })?);
        }
        Ok(Self { format, column_formats })
    }
}

macro_rules! copy_response {
    ($(#[$doc:meta])* $name:ident, $msgtype:literal) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name(pub CopyResponse);

        impl $name {
            pub const MSGTYPE: u8 = $msgtype;
        }

        impl BackendProtocol for $name {
            fn decode(msgtype: u8, body: Bytes) -> Result<Self,ProtocolError> {
                assert_msgtype!(msgtype);
                CopyResponse::decode(body).map(Self)
            }
        }
    };
}

copy_response! {
    /// Identifies the message as a Start Copy In response.
    ///
    /// The frontend must now send copy-in data.
    CopyInResponse, b'G'
}

copy_response! {
    /// Identifies the message as a Start Copy Out response.
    ///
    /// This message will be followed by copy-out data.
    CopyOutResponse, b'H'
}

copy_response! {
    /// Identifies the message as a Start Copy Both response.
    ///
    /// This message is used only for Streaming Replication.
    CopyBothResponse, b'W'
}

/// Identifies the message as a data row.
#[derive(Debug)]
pub struct DataRow {
    /// The number of column values that follow (possibly zero).
    pub column_len: u16,
    /// Undecoded column values.
    pub body: Bytes,
}

impl DataRow {
    pub const MSGTYPE: u8 = b'D';

    /// Split the message body into each column value.
    ///
    /// The length of the column value, in bytes (this count does not include itself).
    /// Can be zero. As a special case, -1 indicates a NULL column value.
    /// No value bytes follow in the NULL case.
    pub fn into_values(self) -> Result<Vec<Option<Bytes>>, ProtocolError> {
        let mut body = self.body;
        let mut values = Vec::with_capacity(self.column_len as usize);
        for _ in 0..self.column_len {
            let len = body.checked_get_i32()?;
            let value = match len {
                -1 => None,
                len if len < 0 || len as usize > body.remaining() => {
                    return Err(ProtocolError::truncated("column value"));
                },
                len => Some(body.split_to(len as usize)),
            };
            values.push(value);
        }
        Ok(values)
    }
}

impl BackendProtocol for DataRow {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self,ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self {
            column_len: body.checked_get_u16()?,
            body,
        })
    }
}

/// Identifies the message as a response to an empty query string.
///
/// This substitutes for `CommandComplete`.
#[derive(Debug)]
pub struct EmptyQueryResponse;

impl EmptyQueryResponse {
    pub const MSGTYPE: u8 = b'I';
}

impl BackendProtocol for EmptyQueryResponse {
    fn decode(msgtype: u8, _: Bytes) -> Result<Self,ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self)
    }
}

/// Identifies the message as an error
///
/// The message body consists of one or more identified fields, followed by a zero byte as a terminator.
/// Fields can appear in any order.
///
/// For each field there is the following:
///
/// `Byte1` A code identifying the field type; if zero, this is the message terminator and no string follows.
/// The presently defined field types are listed in Section 53.8.
/// Since more field types might be added in future,
/// frontends should silently ignore fields of unrecognized type.
///
/// `String` The field value.
///
/// See [`Diagnostics`][crate::Diagnostics] to read the fields.
#[derive(Debug)]
pub struct ErrorResponse {
    pub body: Bytes,
}

impl ErrorResponse {
    pub const MSGTYPE: u8 = b'E';
}

impl BackendProtocol for ErrorResponse {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self,ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self { body })
    }
}

/// Identifies the message as a no-data indicator.
///
/// Sent in place of `RowDescription` when the described statement returns no rows.
#[derive(Debug)]
pub struct NoData;

impl NoData {
    pub const MSGTYPE: u8 = b'n';
}

impl BackendProtocol for NoData {
    fn decode(msgtype: u8, _: Bytes) -> Result<Self,ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self)
    }
}

/// Identifies the message as a notice.
///
/// The message body has the same layout as [`ErrorResponse`].
#[derive(Debug)]
pub struct NoticeResponse {
    pub body: Bytes,
}

impl NoticeResponse {
    pub const MSGTYPE: u8 = b'N';
}

impl BackendProtocol for NoticeResponse {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self,ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self { body })
    }
}

/// Identifies the message as a parameter description.
///
/// Response to `Describe` of a prepared statement, followed by
/// `RowDescription` or `NoData`.
#[derive(Debug)]
pub struct ParameterDescription {
    /// Object ID of each parameter data type.
    pub oids: Vec<Oid>,
}

impl ParameterDescription {
    pub const MSGTYPE: u8 = b't';
}

impl BackendProtocol for ParameterDescription {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self,ProtocolError> {
        assert_msgtype!(msgtype);
        let len = body.checked_get_u16()?;
        let mut oids = Vec::with_capacity(len as usize);
        for _ in 0..len {
            oids.push(body.checked_get_u32()?);
        }
        Ok(Self { oids })
    }
}

/// Identifies the message as a row description
#[derive(Debug)]
pub struct RowDescription {
    /// Specifies the number of fields in a row (can be zero).
    pub field_len: u16,
    /// Undecoded response body.
    ///
    /// See [`Column`][crate::Column] for the decoded fields.
    pub body: Bytes,
}

impl RowDescription {
    pub const MSGTYPE: u8 = b'T';
}

impl BackendProtocol for RowDescription {
    fn decode(msgtype: u8, mut body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        Ok(Self {
            field_len: body.checked_get_u16()?,
            body,
        })
    }
}

#[cfg(test)]
mod test {
    use bytes::BufMut;

    use super::*;

    #[test]
    fn decode_data_row() {
        let mut body = Vec::new();
        body.put_u16(3);
        body.put_i32(2);
        body.put_slice(b"ab");
        body.put_i32(-1);
        body.put_i32(0);

        let msg = BackendMessage::decode(b'D', body.into()).unwrap();
        let BackendMessage::DataRow(row) = msg else {
            panic!("expected DataRow");
        };
        let values = row.into_values().unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values[0].as_deref(), Some(&b"ab"[..]));
        assert_eq!(values[1], None);
        assert_eq!(values[2].as_deref(), Some(&b""[..]));
    }

    #[test]
    fn data_row_truncated_value() {
        let mut body = Vec::new();
        body.put_u16(1);
        body.put_i32(10);
        body.put_slice(b"ab");
        let row = DataRow::decode(b'D', body.into()).unwrap();
        assert!(row.into_values().is_err());
    }

    #[test]
    fn decode_command_complete() {
        let msg = CommandComplete::decode(b'C', Bytes::from_static(b"SELECT 2\0")).unwrap();
        assert_eq!(msg.tag, "SELECT 2");
    }

    #[test]
    fn decode_copy_out() {
        let mut body = Vec::new();
        body.put_i8(1);
        body.put_i16(2);
        body.put_i16(1);
        body.put_i16(1);
        let msg = CopyOutResponse::decode(b'H', body.into()).unwrap();
        assert_eq!(msg.0.format, PgFormat::Binary);
        assert_eq!(msg.0.column_formats, [PgFormat::Binary, PgFormat::Binary]);
    }

    #[test]
    fn decode_parameter_description() {
        let body = Bytes::from_static(&[0, 2, 0, 0, 0, 19, 0, 0, 0, 25]);
        let msg = BackendMessage::decode(b't', body).unwrap();
        let BackendMessage::ParameterDescription(desc) = msg else {
            panic!("expected ParameterDescription");
        };
        assert_eq!(desc.oids, [19, 25]);

        let body = Bytes::from_static(&[0, 2, 0, 0, 0, 19]);
        assert!(ParameterDescription::decode(b't', body).is_err());
        assert!(matches!(BackendMessage::decode(b'n', Bytes::new()), Ok(BackendMessage::NoData(_))));
    }

    #[test]
    fn mismatch_msgtype() {
        let err = RowDescription::decode(b'D', Bytes::new()).unwrap_err();
        assert_eq!(err.to_string(), "Expected message `RowDescription` found `DataRow`");
    }

    #[test]
    fn unknown_msgtype() {
        let err = BackendMessage::decode(b'?', Bytes::new()).unwrap_err();
        assert_eq!(err.to_string(), "Unexpected message `Unknown`");
    }
}
