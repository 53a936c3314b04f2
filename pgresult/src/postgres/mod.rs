//! Postgres backend messages of the query result phase.
//!
//! After the client sends a query, the server answers with:
//!
//! ```text
//! RowDescription?  DataRow*  CommandComplete
//!                            EmptyQueryResponse
//!                            ErrorResponse
//!                            Copy{In,Out,Both}Response
//! ```
//!
//! `NoticeResponse` may appear anywhere in between. The transport frames the
//! stream and hands message type and body to [`BackendProtocol::decode`], the
//! length prefix is not part of the body.
//!
//! Type [`Oid`]s of the built in types are in [`oid`], value format is
//! [`PgFormat`].
//!
//! <https://www.postgresql.org/docs/current/protocol-flow.html#PROTOCOL-FLOW-EXT-QUERY>

mod pg_type;
mod pg_format;

pub mod backend;

mod error;

pub use pg_type::{INVALID_OID, Oid, PgType, oid};
pub use pg_format::PgFormat;

pub use backend::{BackendMessage, BackendProtocol, ErrorResponse, NoticeResponse};
pub use error::ProtocolError;
