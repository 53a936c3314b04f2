//! Column descriptor.
use bytes::Bytes;

use crate::{
    common::ByteStr,
    ext::BytesExt,
    postgres::{INVALID_OID, Oid, PgFormat, ProtocolError, backend::RowDescription},
};

/// Postgres column metadata, one field of `RowDescription`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: ByteStr,
    table_oid: Oid,
    table_column: i16,
    oid: Oid,
    size: i16,
    type_modifier: i32,
    format: PgFormat,
}

impl Column {
    /// Create text format column without source table.
    ///
    /// ```
    /// use pgresult::{Column, PgFormat, oid};
    ///
    /// let col = Column::new("data", oid::BYTEA).with_format(PgFormat::Binary);
    /// assert_eq!(col.type_modifier(), -1);
    /// assert_eq!(col.table_oid(), 0);
    /// ```
    pub fn new(name: impl Into<ByteStr>, oid: Oid) -> Column {
        Column {
            name: name.into(),
            table_oid: INVALID_OID,
            table_column: 0,
            oid,
            size: -1,
            type_modifier: -1,
            format: PgFormat::Text,
        }
    }

    pub fn with_format(mut self, format: PgFormat) -> Column {
        self.format = format;
        self
    }

    pub fn with_type_modifier(mut self, type_modifier: i32) -> Column {
        self.type_modifier = type_modifier;
        self
    }

    /// Set the source table oid and its column attribute number.
    pub fn with_table(mut self, table_oid: Oid, table_column: i16) -> Column {
        self.table_oid = table_oid;
        self.table_column = table_column;
        self
    }

    pub fn with_size(mut self, size: i16) -> Column {
        self.size = size;
        self
    }

    /// Decode every field of `RowDescription` message.
    pub fn from_description(desc: RowDescription) -> Result<Vec<Column>, ProtocolError> {
        let RowDescription { field_len, mut body } = desc;
        let mut columns = Vec::with_capacity(field_len as usize);
        for _ in 0..field_len {
            columns.push(Column::decode(&mut body)?);
        }
        Ok(columns)
    }

    // <https://www.postgresql.org/docs/current/protocol-message-formats.html#PROTOCOL-MESSAGE-FORMATS-ROWDESCRIPTION>
    fn decode(body: &mut Bytes) -> Result<Column, ProtocolError> {
        let name = body.get_nul_bytestr()?;
        let table_oid = body.checked_get_u32()?;
        let table_column = body.checked_get_i16()?;
        let oid = body.checked_get_u32()?;
        let size = body.checked_get_i16()?;
        let type_modifier = body.checked_get_i32()?;
        let code = body.checked_get_i16()?;
        let format = PgFormat::from_code(code).ok_or(ProtocolError::UnknownFormat { code })?;
        Ok(Column { name, table_oid, table_column, oid, size, type_modifier, format })
    }

    /// Returns column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the data type [`Oid`].
    pub fn oid(&self) -> Oid {
        self.oid
    }

    /// Returns the format the value is transmitted in.
    pub fn format(&self) -> PgFormat {
        self.format
    }

    /// Returns the type modifier, `-1` if the type has none.
    ///
    /// For `varchar(n)` this is `n + 4`.
    pub fn type_modifier(&self) -> i32 {
        self.type_modifier
    }

    /// Returns the [`Oid`] of the source table, or [`INVALID_OID`] if the
    /// column is not a simple reference to a table column.
    pub fn table_oid(&self) -> Oid {
        self.table_oid
    }

    /// Returns the attribute number in the source table, or `0`.
    ///
    /// Attribute number starts from `1`.
    pub fn table_column(&self) -> i16 {
        self.table_column
    }

    /// Returns the data type size, negative for variable-width types.
    pub fn size(&self) -> i16 {
        self.size
    }
}

#[cfg(test)]
pub(crate) mod test {
    use bytes::BufMut;

    use super::*;
    use crate::postgres::oid;

    /// Encode columns as `RowDescription` body.
    pub(crate) fn description(columns: &[Column]) -> RowDescription {
        let mut body = Vec::new();
        for col in columns {
            body.put_slice(col.name().as_bytes());
            body.put_u8(b'\0');
            body.put_u32(col.table_oid());
            body.put_i16(col.table_column());
            body.put_u32(col.oid());
            body.put_i16(col.size());
            body.put_i32(col.type_modifier());
            body.put_i16(col.format().format_code());
        }
        RowDescription { field_len: columns.len() as u16, body: body.into() }
    }

    #[test]
    fn decode_description() {
        let columns = [
            Column::new("foo", oid::VARCHAR)
                .with_table(16384, 1)
                .with_type_modifier(37),
            Column::new("bar", oid::BYTEA)
                .with_table(16384, 2)
                .with_format(PgFormat::Binary),
            Column::new("?column?", oid::INT4).with_size(4),
        ];
        let decoded = Column::from_description(description(&columns)).unwrap();
        assert_eq!(decoded, columns);
        assert_eq!(decoded[0].type_modifier(), 37);
        assert_eq!(decoded[1].table_column(), 2);
        assert_eq!(decoded[2].table_oid(), INVALID_OID);
        assert_eq!(decoded[2].size(), 4);
    }

    #[test]
    fn unknown_format_code() {
        let mut desc = description(&[Column::new("foo", oid::TEXT)]);
        let mut body = desc.body.to_vec();
        let len = body.len();
        body[len - 1] = 7;
        desc.body = body.into();
        assert!(matches!(
            Column::from_description(desc),
            Err(ProtocolError::UnknownFormat { code: 7 })
        ));
    }

    #[test]
    fn truncated_description() {
        let desc = RowDescription { field_len: 2, body: description(&[Column::new("foo", oid::TEXT)]).body };
        assert!(matches!(
            Column::from_description(desc),
            Err(ProtocolError::Truncated { .. })
        ));
    }
}
