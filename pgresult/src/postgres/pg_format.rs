/// Format a field value is transmitted in.
///
/// The format of each result column is chosen by the client when the query
/// is bound, and reported back in `RowDescription`.
///
/// <https://www.postgresql.org/docs/current/protocol-overview.html#PROTOCOL-FORMAT-CODES>
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PgFormat {
    /// Format code `0`, the type output function result without trailing nul.
    #[default]
    Text,
    /// Format code `1`, type specific representation in network byte order.
    ///
    /// `bytea` in this format is the raw bytes.
    Binary,
}

impl PgFormat {
    /// Returns the protocol format code.
    pub fn format_code(&self) -> i16 {
        match self {
            PgFormat::Text => 0,
            PgFormat::Binary => 1,
        }
    }

    /// Returns `None` for unknown code.
    pub fn from_code(code: i16) -> Option<PgFormat> {
        match code {
            0 => Some(PgFormat::Text),
            1 => Some(PgFormat::Binary),
            _ => None,
        }
    }
}
