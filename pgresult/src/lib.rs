//! Postgres query result decoding and error classification.
//!
//! The transport hands over the messages of one query cycle, or an already
//! assembled [`Response`], and reads values and typed errors back from
//! [`PgResult`].
//!
//! # Examples
//!
//! ```
//! use pgresult::{Column, ErrorClassTable, ExecStatus, PgResult, Response, oid};
//!
//! # fn app() -> pgresult::Result<()> {
//! let res = PgResult::new(Response {
//!     columns: vec![Column::new("id", oid::INT4), Column::new("name", oid::TEXT)],
//!     rows: vec![
//!         vec![Some("1".into()), Some("foo".into())],
//!         vec![Some("2".into()), None],
//!     ],
//!     ..Response::new(ExecStatus::TuplesOk)
//! })?;
//!
//! res.check(&ErrorClassTable::new())?;
//!
//! for row in res.rows() {
//!     let (id, name) = row.decode::<(i32, Option<String>)>()?;
//!     println!("{id}: {name:?}");
//! }
//!
//! assert_eq!(res.value_at(0, 1)?.unwrap(), "foo");
//! assert_eq!(res.value_at(1, 1)?, None);
//! # Ok(())
//! # }
//! # app().unwrap();
//! ```
//!
//! Failed query:
//!
//! ```
//! use pgresult::{DiagField, Diagnostics, ErrorClass, ErrorClassTable, ExecStatus, PgResult, Response, SqlState};
//!
//! let res = PgResult::new(Response {
//!     diagnostics: Diagnostics::empty()
//!         .with(DiagField::Severity, "ERROR")
//!         .with(DiagField::SqlState, "42P01")
//!         .with(DiagField::MessagePrimary, "relation \"foo\" does not exist"),
//!     ..Response::new(ExecStatus::FatalError)
//! }).unwrap();
//!
//! let err = res.check(&ErrorClassTable::new()).unwrap_err();
//! assert_eq!(err.class(), ErrorClass::Sql(SqlState::UndefinedTable));
//! assert_eq!(err.message(), "relation \"foo\" does not exist");
//! assert_eq!(err.result().unwrap().error_field(DiagField::SqlState), Some("42P01"));
//! ```

pub mod common;
mod ext;

// Protocol
pub mod postgres;

// Decoding
pub mod bytea;
mod column;
mod decode;
mod index;
pub mod row;
mod result;
pub mod types;

// Error
mod diagnostic;
mod errcode;
mod classify;
mod error;

pub use postgres::{INVALID_OID, Oid, PgFormat, PgType, oid};
pub use column::Column;
pub use decode::{Decode, DecodeError, Field, Value, decode_field};
pub use index::{ColumnIndex, Position, Selector};
pub use row::{FromRow, Row, RowIter};
pub use result::{ExecStatus, PgResult, Response};
pub use diagnostic::{DiagField, Diagnostics};
pub use errcode::SqlState;
pub use classify::{DatabaseError, ErrorClass, ErrorClassTable};
pub use error::{ArgumentError, Error, ErrorKind, IndexError, Result, TypeError};

#[cfg(feature = "json")]
pub use types::Json;
