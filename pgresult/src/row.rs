//! Postgres row operation.
//!
//! - [`Row`]
//! - [`RowIter`]
//! - [`FromRow`]
use bytes::Bytes;
use std::fmt;

use crate::{
    Column, PgResult, Result, Value,
    decode::{Decode, Field, decode_field},
    ext::FmtExt,
    index::{ColumnIndex, Position},
};

/// Borrowed view of one row of [`PgResult`].
#[derive(Clone, Copy)]
pub struct Row<'a> {
    result: &'a PgResult,
    index: usize,
}

impl<'a> Row<'a> {
    pub(crate) fn new(result: &'a PgResult, index: usize) -> Row<'a> {
        Row { result, index }
    }

    /// Returns the row number.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns `true` if row contains no columns.
    pub fn is_empty(&self) -> bool {
        self.raw().is_empty()
    }

    /// Returns the number of fields/column.
    pub fn len(&self) -> usize {
        self.raw().len()
    }

    pub fn columns(&self) -> &'a [Column] {
        self.result.columns()
    }

    fn raw(&self) -> &'a [Option<Bytes>] {
        self.result.raw_row(self.index)
    }

    /// Get value by column number.
    pub fn get(&self, col: impl Position) -> Result<Option<Value>> {
        self.value(crate::index::resolve("column", col, self.len())?)
    }

    /// Get value by column name.
    pub fn get_by_name(&self, name: &str) -> Result<Option<Value>> {
        self.value(name)
    }

    /// Get value by column number or name.
    pub fn value(&self, idx: impl ColumnIndex) -> Result<Option<Value>> {
        Ok(self.field(idx)?.value())
    }

    /// Get field by column number or name.
    pub fn field(&self, idx: impl ColumnIndex) -> Result<Field<'a>> {
        let columns = self.columns();
        let i = idx.column_of(columns)?;
        Ok(Field::new(&columns[i], self.raw()[i].clone()))
    }

    /// Try get and decode column.
    pub fn try_get<D: Decode>(&self, idx: impl ColumnIndex) -> Result<D> {
        Ok(self.field(idx)?.decode()?)
    }

    /// Returns every value of the row.
    pub fn values(&self) -> Vec<Option<Value>> {
        self.raw()
            .iter()
            .zip(self.columns())
            .map(|(raw, col)| decode_field(raw.as_ref(), col))
            .collect()
    }

    /// Iterate every field of the row.
    pub fn fields(self) -> impl ExactSizeIterator<Item = Field<'a>> {
        let raw = self.raw();
        self.columns()
            .iter()
            .zip(raw)
            .map(|(col, raw)| Field::new(col, raw.clone()))
    }

    /// Try decode type using [`FromRow`] implementation.
    pub fn decode<D: FromRow>(self) -> Result<D> {
        D::from_row(self)
    }
}

impl fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_map();
        for field in self.fields() {
            dbg.key(&field.name());
            match field.as_slice() {
                None => dbg.value(&format_args!("NULL")),
                Some(value) => dbg.value(&value.lossy()),
            };
        }
        dbg.finish()
    }
}

/// Iterator over rows of [`PgResult`].
///
/// Created with [`PgResult::rows`], calling it again restarts from the first row.
#[derive(Debug, Clone)]
pub struct RowIter<'a> {
    result: &'a PgResult,
    front: usize,
    back: usize,
}

impl<'a> RowIter<'a> {
    pub(crate) fn new(result: &'a PgResult) -> RowIter<'a> {
        RowIter { result, front: 0, back: result.ntuples() }
    }
}

impl<'a> Iterator for RowIter<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let row = Row::new(self.result, self.front);
        self.front += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl DoubleEndedIterator for RowIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(Row::new(self.result, self.back))
    }
}

impl ExactSizeIterator for RowIter<'_> { }

impl<'a> IntoIterator for &'a PgResult {
    type Item = Row<'a>;

    type IntoIter = RowIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows()
    }
}

/// Type that can be constructed from a row.
pub trait FromRow: Sized {
    /// Construct self from row.
    fn from_row(row: Row<'_>) -> Result<Self>;
}

impl FromRow for () {
    fn from_row(_: Row<'_>) -> Result<Self> {
        Ok(())
    }
}

impl FromRow for Vec<Option<Value>> {
    fn from_row(row: Row<'_>) -> Result<Self> {
        Ok(row.values())
    }
}

macro_rules! from_row_tuple {
    ($($t:ident $i:literal),*) => {
        impl<$($t),*> FromRow for ($($t),*,)
        where
            $($t: Decode),*
        {
            fn from_row(row: Row<'_>) -> Result<Self> {
                Ok((
                    $(row.try_get::<$t>($i as usize)?),*,
                ))
            }
        }
    };
}

from_row_tuple!(T0 0);
from_row_tuple!(T0 0, T1 1);
from_row_tuple!(T0 0, T1 1, T2 2);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3, T4 4);
from_row_tuple!(T0 0, T1 1, T2 2, T3 3, T4 4, T5 5);

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ErrorKind, ExecStatus, Response,
        postgres::{PgFormat, oid},
    };

    fn result() -> PgResult {
        let response = Response {
            columns: vec![
                Column::new("id", oid::INT4),
                Column::new("name", oid::TEXT),
                Column::new("data", oid::BYTEA).with_format(PgFormat::Binary),
            ],
            rows: vec![
                vec![Some("1".into()), Some("foo".into()), Some(Bytes::from_static(b"\0\xff"))],
                vec![Some("2".into()), None, Some(Bytes::new())],
            ],
            ..Response::new(ExecStatus::TuplesOk)
        };
        PgResult::new(response).unwrap()
    }

    #[test]
    fn row_access() {
        let res = result();
        let row = res.row(0).unwrap();
        assert_eq!(row.len(), 3);
        assert_eq!(row.get(0).unwrap().unwrap(), "1");
        assert_eq!(row.get_by_name("name").unwrap().unwrap(), "foo");
        assert_eq!(row.value(crate::Selector::Name("data")).unwrap(), Some(Value::Binary(Bytes::from_static(b"\0\xff"))));
        assert_eq!(row.try_get::<i32>("id").unwrap(), 1);

        let row = res.row(1).unwrap();
        assert_eq!(row.get_by_name("name").unwrap(), None);
        assert_eq!(row.try_get::<Option<String>>(1).unwrap(), None);
        assert_eq!(row.get(2).unwrap(), Some(Value::Binary(Bytes::new())));

        let err = row.get(-1).unwrap_err();
        assert_eq!(err.to_string().lines().next(), Some("column -1 is out of range"));
        assert!(matches!(row.get_by_name("nope").unwrap_err().kind(), ErrorKind::Index(_)));
    }

    #[test]
    fn iterate_rows() {
        let res = result();
        let ids = res.rows().map(|row| row.try_get::<i32>(0).unwrap()).collect::<Vec<_>>();
        assert_eq!(ids, [1, 2]);

        // restartable
        assert_eq!(res.rows().count(), 2);
        assert_eq!(res.rows().rev().next().unwrap().index(), 1);
        assert_eq!((&res).into_iter().len(), 2);

        for (i, row) in res.rows().enumerate() {
            assert_eq!(row.values(), res.values()[i]);
        }
    }

    #[test]
    fn decode_tuple() {
        let res = result();
        let (id, name, data) = res.row(0).unwrap().decode::<(i32, Option<String>, Vec<u8>)>().unwrap();
        assert_eq!(id, 1);
        assert_eq!(name.as_deref(), Some("foo"));
        assert_eq!(data, [0, 0xff]);

        let err = res.row(1).unwrap().decode::<(i32, String)>().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Decode(_)));
    }

    #[test]
    fn debug_row() {
        let res = result();
        let dbg = format!("{:?}", res.row(1).unwrap());
        assert!(dbg.contains("\"name\": NULL"));
    }
}
