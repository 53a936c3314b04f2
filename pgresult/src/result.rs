//! Query result container.
//!
//! - [`ExecStatus`]
//! - [`Response`]
//! - [`PgResult`]
use bytes::Bytes;
use std::{fmt, mem, sync::Arc};

use crate::{
    Column, DiagField, Diagnostics, Result, Value,
    bytea,
    classify::{DatabaseError, ErrorClassTable},
    common::{ByteStr, span, verbose},
    decode::{Decode, decode_field},
    error::ArgumentError,
    index::{self, ColumnIndex, Position},
    postgres::{BackendMessage, NoticeResponse, Oid, PgFormat, ProtocolError, backend::CopyResponse},
    row::{Row, RowIter},
};

/// Result status of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecStatus {
    /// The string sent to the server was empty.
    EmptyQuery,
    /// Successful completion of a command returning no data.
    CommandOk,
    /// Successful completion of a command returning data.
    TuplesOk,
    /// Copy Out (from server) data transfer started.
    CopyOut,
    /// Copy In (to server) data transfer started.
    CopyIn,
    /// Copy In/Out data transfer started, used only for streaming replication.
    CopyBoth,
    /// The server's response was not understood.
    BadResponse,
    /// A nonfatal error (a notice or warning) occurred.
    NonfatalError,
    /// A fatal error occurred.
    FatalError,
    /// Single row of the result in single row mode.
    SingleTuple,
    /// Synchronization point in pipeline mode.
    PipelineSync,
    /// Pipeline is in aborted state.
    PipelineAborted,
}

impl ExecStatus {
    /// Returns the status name, e.g. `"PGRES_TUPLES_OK"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyQuery => "PGRES_EMPTY_QUERY",
            Self::CommandOk => "PGRES_COMMAND_OK",
            Self::TuplesOk => "PGRES_TUPLES_OK",
            Self::CopyOut => "PGRES_COPY_OUT",
            Self::CopyIn => "PGRES_COPY_IN",
            Self::CopyBoth => "PGRES_COPY_BOTH",
            Self::BadResponse => "PGRES_BAD_RESPONSE",
            Self::NonfatalError => "PGRES_NONFATAL_ERROR",
            Self::FatalError => "PGRES_FATAL_ERROR",
            Self::SingleTuple => "PGRES_SINGLE_TUPLE",
            Self::PipelineSync => "PGRES_PIPELINE_SYNC",
            Self::PipelineAborted => "PGRES_PIPELINE_ABORTED",
        }
    }

    /// Returns `true` for status that [`PgResult::check`] reports as error.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::BadResponse | Self::NonfatalError | Self::FatalError | Self::PipelineAborted
        )
    }
}

impl fmt::Display for ExecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completed response of one query, as received by the transport.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: ExecStatus,
    pub columns: Vec<Column>,
    /// Each row must have exactly one value per column, `None` is NULL.
    pub rows: Vec<Vec<Option<Bytes>>>,
    /// Error or notice fields, empty for successful response.
    pub diagnostics: Diagnostics,
    /// `CommandComplete` tag, e.g. `INSERT 0 1`.
    pub command_tag: Option<ByteStr>,
    /// Parameter types of a described prepared statement.
    pub params: Vec<Oid>,
}

impl Response {
    /// Create response without columns, rows and diagnostics.
    pub fn new(status: ExecStatus) -> Response {
        Response {
            status,
            columns: vec![],
            rows: vec![],
            diagnostics: Diagnostics::empty(),
            command_tag: None,
            params: vec![],
        }
    }

    /// Assemble response from backend messages of one query cycle.
    ///
    /// Messages are expected up to and including the one that completes the
    /// query: `CommandComplete`, `EmptyQueryResponse`, `ErrorResponse`, or one
    /// of the copy responses. `NoticeResponse` is skipped anywhere.
    ///
    /// Describing a prepared statement answers with `ParameterDescription`
    /// followed by `RowDescription` or `NoData`, which completes the response.
    ///
    /// Rows received before an `ErrorResponse` are discarded.
    pub fn from_messages<I>(messages: I) -> Result<Response, ProtocolError>
    where
        I: IntoIterator<Item = BackendMessage>,
    {
        const PHASE: &str = "Response";
        span!("from_messages");

        let mut params = None::<Vec<Oid>>;
        let mut columns = None::<Vec<Column>>;
        let mut rows = vec![];
        let mut done = None::<Response>;

        for message in messages {
            if let BackendMessage::NoticeResponse(notice) = message {
                notice_received(notice);
                continue;
            }
            if done.is_some() {
                return Err(ProtocolError::unexpected_phase(message.msgtype(), PHASE));
            }
            let msgtype = message.msgtype();
            match message {
                BackendMessage::ParameterDescription(desc) => {
                    if params.is_some() || columns.is_some() {
                        return Err(ProtocolError::unexpected_phase(msgtype, PHASE));
                    }
                    params = Some(desc.oids);
                },
                BackendMessage::RowDescription(desc) => {
                    if columns.is_some() {
                        return Err(ProtocolError::unexpected_phase(msgtype, PHASE));
                    }
                    let described = Column::from_description(desc)?;
                    match params.take() {
                        Some(params) => done = Some(Response::described(params, described)),
                        None => columns = Some(described),
                    }
                },
                BackendMessage::NoData(_) => {
                    if columns.is_some() {
                        return Err(ProtocolError::unexpected_phase(msgtype, PHASE));
                    }
                    if let Some(params) = params.take() {
                        done = Some(Response::described(params, vec![]));
                    }
                },
                BackendMessage::DataRow(row) => {
                    if columns.is_none() {
                        return Err(ProtocolError::unexpected_phase(msgtype, PHASE));
                    }
                    rows.push(row.into_values()?);
                },
                BackendMessage::CommandComplete(cmd) => {
                    if params.is_some() {
                        return Err(ProtocolError::unexpected_phase(msgtype, PHASE));
                    }
                    verbose!(tag = %cmd.tag, rows = rows.len(), "command complete");
                    let status = match columns {
                        Some(_) => ExecStatus::TuplesOk,
                        None => ExecStatus::CommandOk,
                    };
                    done = Some(Response {
                        columns: columns.take().unwrap_or_default(),
                        rows: mem::take(&mut rows),
                        command_tag: Some(cmd.tag),
                        ..Response::new(status)
                    });
                },
                BackendMessage::EmptyQueryResponse(_) => {
                    if columns.is_some() {
                        return Err(ProtocolError::unexpected_phase(msgtype, PHASE));
                    }
                    done = Some(Response::new(ExecStatus::EmptyQuery));
                },
                BackendMessage::ErrorResponse(err) => {
                    let diagnostics = Diagnostics::parse(err.body)?;
                    verbose!(sqlstate = ?diagnostics.sqlstate(), "error response");
                    done = Some(Response {
                        diagnostics,
                        ..Response::new(ExecStatus::FatalError)
                    });
                },
                BackendMessage::CopyInResponse(copy) => {
                    done = Some(Response::copy(ExecStatus::CopyIn, copy.0));
                },
                BackendMessage::CopyOutResponse(copy) => {
                    done = Some(Response::copy(ExecStatus::CopyOut, copy.0));
                },
                BackendMessage::CopyBothResponse(copy) => {
                    done = Some(Response::copy(ExecStatus::CopyBoth, copy.0));
                },
                BackendMessage::NoticeResponse(_) => { },
            }
        }

        done.ok_or(ProtocolError::truncated("CommandComplete"))
    }

    fn described(params: Vec<Oid>, columns: Vec<Column>) -> Response {
        verbose!(params = params.len(), columns = columns.len(), "statement described");
        Response {
            columns,
            params,
            ..Response::new(ExecStatus::CommandOk)
        }
    }

    /// Copy response has one unnamed column per copied column.
    fn copy(status: ExecStatus, copy: CopyResponse) -> Response {
        Response {
            columns: copy
                .column_formats
                .into_iter()
                .map(|format| Column::new("", crate::INVALID_OID).with_format(format))
                .collect(),
            ..Response::new(status)
        }
    }
}

fn notice_received(_notice: NoticeResponse) {
    verbose!("notice skipped");
    #[cfg(feature = "log")]
    match Diagnostics::parse(_notice.body) {
        Ok(notice) => log::info!("{}", notice.error_message().trim_end()),
        Err(err) => log::warn!("malformed notice: {err}"),
    };
}

/// Result of a query.
///
/// The result is immutable, clones share the same data.
///
/// # Examples
///
/// ```
/// use pgresult::{Column, ExecStatus, PgResult, Response, oid};
///
/// # fn app() -> pgresult::Result<()> {
/// let res = PgResult::new(Response {
///     columns: vec![Column::new("a", oid::INT4)],
///     rows: vec![vec![Some("1".into())], vec![None]],
///     ..Response::new(ExecStatus::TuplesOk)
/// })?;
///
/// assert_eq!(res.value_at(0, 0)?.unwrap(), "1");
/// assert_eq!(res.value_at(1, 0)?, None);
/// assert_eq!(res.get::<i32>(0, "a")?, 1);
/// # Ok(())
/// # }
/// # app().unwrap();
/// ```
#[derive(Clone)]
pub struct PgResult {
    inner: Arc<Inner>,
}

struct Inner {
    status: ExecStatus,
    columns: Box<[Column]>,
    rows: Box<[Box<[Option<Bytes>]>]>,
    diagnostics: Diagnostics,
    command_tag: Option<ByteStr>,
    params: Box<[Oid]>,
}

impl PgResult {
    /// Wrap a completed response.
    ///
    /// Returns [`ProtocolError::RowLength`] if any row length differs from
    /// the column count.
    pub fn new(response: Response) -> Result<PgResult, ProtocolError> {
        let Response { status, columns, rows, diagnostics, command_tag, params } = response;

        let rows = rows
            .into_iter()
            .map(|row| match row.len() == columns.len() {
                true => Ok(row.into_boxed_slice()),
                false => Err(ProtocolError::RowLength { expect: columns.len(), found: row.len() }),
            })
            .collect::<Result<Box<[_]>, _>>()?;

        Ok(PgResult {
            inner: Arc::new(Inner {
                status,
                columns: columns.into_boxed_slice(),
                rows,
                diagnostics,
                command_tag,
                params: params.into_boxed_slice(),
            }),
        })
    }

    /// Assemble result from backend messages of one query cycle.
    ///
    /// See [`Response::from_messages`].
    pub fn from_messages<I>(messages: I) -> Result<PgResult, ProtocolError>
    where
        I: IntoIterator<Item = BackendMessage>,
    {
        PgResult::new(Response::from_messages(messages)?)
    }

    pub fn status(&self) -> ExecStatus {
        self.inner.status
    }

    /// Returns the number of rows.
    pub fn ntuples(&self) -> usize {
        self.inner.rows.len()
    }

    /// Returns the number of columns.
    pub fn nfields(&self) -> usize {
        self.inner.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.inner.columns
    }

    pub(crate) fn raw_row(&self, row: usize) -> &[Option<Bytes>] {
        &self.inner.rows[row]
    }

    fn raw(&self, row: impl Position, col: impl ColumnIndex) -> Result<(usize, usize)> {
        let row = index::resolve("row", row, self.ntuples())?;
        let col = col.column_of(self.columns())?;
        Ok((row, col))
    }

    // ===== Data =====

    /// Returns the value of a field.
    ///
    /// Negative or out of range row or column is an [`IndexError`][crate::IndexError].
    pub fn value_at(&self, row: impl Position, col: impl Position) -> Result<Option<Value>> {
        let row = index::resolve("row", row, self.ntuples())?;
        let col = index::resolve("column", col, self.nfields())?;
        Ok(decode_field(self.inner.rows[row][col].as_ref(), &self.inner.columns[col]))
    }

    /// Alias of [`value_at`][PgResult::value_at].
    pub fn cell(&self, row: impl Position, col: impl Position) -> Result<Option<Value>> {
        self.value_at(row, col)
    }

    /// Decode a field using [`Decode`] implementation.
    pub fn get<T: Decode>(&self, row: impl Position, col: impl ColumnIndex) -> Result<T> {
        let (row, col) = self.raw(row, col)?;
        Row::new(self, row).try_get::<T>(col)
    }

    /// Returns raw bytes of a `bytea` field.
    ///
    /// Binary format value is returned as is, text format value is unescaped.
    pub fn bytea_value(&self, row: impl Position, col: impl ColumnIndex) -> Result<Option<Bytes>> {
        let (row, col) = self.raw(row, col)?;
        let Some(raw) = &self.inner.rows[row][col] else {
            return Ok(None);
        };
        match self.inner.columns[col].format() {
            PgFormat::Binary => Ok(Some(raw.clone())),
            PgFormat::Text => Ok(Some(bytea::unescape(raw)?)),
        }
    }

    /// Iterate rows, each call starts from the first row.
    pub fn rows(&self) -> RowIter<'_> {
        RowIter::new(self)
    }

    /// Returns one row.
    pub fn row(&self, row: impl Position) -> Result<Row<'_>> {
        let row = index::resolve("row", row, self.ntuples())?;
        Ok(Row::new(self, row))
    }

    /// Returns every value of a column by column number.
    pub fn column_values(&self, col: impl Position) -> Result<Vec<Option<Value>>> {
        let col = index::resolve("column", col, self.nfields())?;
        Ok(self.collect_column(col))
    }

    /// Returns every value of a column by column name or number.
    pub fn field_values(&self, col: impl ColumnIndex) -> Result<Vec<Option<Value>>> {
        let col = col.column_of(self.columns())?;
        Ok(self.collect_column(col))
    }

    fn collect_column(&self, col: usize) -> Vec<Option<Value>> {
        let column = &self.inner.columns[col];
        self.inner
            .rows
            .iter()
            .map(|row| decode_field(row[col].as_ref(), column))
            .collect()
    }

    /// Returns every value, row by row.
    pub fn values(&self) -> Vec<Vec<Option<Value>>> {
        self.rows().map(|row| row.values()).collect()
    }

    // ===== Metadata =====

    fn column_meta(&self, col: impl Position) -> Result<&Column, ArgumentError> {
        let index = col.position();
        if index < 0 {
            return Err(ArgumentError::NegativeColumn(index));
        }
        usize::try_from(index)
            .ok()
            .and_then(|i| self.inner.columns.get(i))
            .ok_or(ArgumentError::ColumnOutOfRange { index, len: self.nfields() })
    }

    /// Returns the format of a column.
    pub fn column_format(&self, col: impl Position) -> Result<PgFormat> {
        Ok(self.column_meta(col)?.format())
    }

    /// Returns the type modifier of a column, `-1` if none.
    pub fn type_modifier(&self, col: impl Position) -> Result<i32> {
        Ok(self.column_meta(col)?.type_modifier())
    }

    /// Returns the source table of a column, [`INVALID_OID`][crate::INVALID_OID] if none.
    pub fn source_table(&self, col: impl Position) -> Result<Oid> {
        Ok(self.column_meta(col)?.table_oid())
    }

    /// Returns the column number in the source table, `0` if none.
    pub fn source_column(&self, col: impl Position) -> Result<i16> {
        Ok(self.column_meta(col)?.table_column())
    }

    pub fn column_name(&self, col: impl Position) -> Result<&str> {
        Ok(self.column_meta(col)?.name())
    }

    /// Returns the data type [`Oid`] of a column.
    pub fn column_type(&self, col: impl Position) -> Result<Oid> {
        Ok(self.column_meta(col)?.oid())
    }

    pub fn column_size(&self, col: impl Position) -> Result<i16> {
        Ok(self.column_meta(col)?.size())
    }

    /// Returns the number of parameters of a described prepared statement.
    pub fn nparams(&self) -> usize {
        self.inner.params.len()
    }

    /// Returns the data type [`Oid`] of a prepared statement parameter.
    pub fn param_type(&self, param: impl Position) -> Result<Oid> {
        let index = param.position();
        if index < 0 {
            return Err(ArgumentError::NegativeParam(index).into());
        }
        usize::try_from(index)
            .ok()
            .and_then(|i| self.inner.params.get(i).copied())
            .ok_or_else(|| ArgumentError::ParamOutOfRange { index, len: self.nparams() }.into())
    }

    /// Returns the column number of a column name.
    pub fn column_number(&self, name: &str) -> Option<usize> {
        name.column_of(self.columns()).ok()
    }

    // ===== Command =====

    /// Returns the command tag, e.g. `INSERT 0 1`.
    pub fn cmd_status(&self) -> Option<&str> {
        self.inner.command_tag.as_deref()
    }

    /// Returns the number of rows affected by the command.
    ///
    /// Returns `None` for command that does not report it.
    pub fn cmd_tuples(&self) -> Option<u64> {
        let mut whs = self.cmd_status()?.split_whitespace();
        let tag = whs.next()?;
        let rows = whs.next()?;
        match tag {
            // `INSERT oid rows`
            "INSERT" => whs.next()?,
            "SELECT" | "UPDATE" | "DELETE" | "MERGE" | "FETCH" | "MOVE" | "COPY" => rows,
            _ => return None,
        }
        .parse()
        .ok()
    }

    // ===== Error =====

    /// Returns an error field, `None` if the server did not send it.
    pub fn error_field(&self, field: DiagField) -> Option<&str> {
        self.inner.diagnostics.field(field)
    }

    /// Returns the error message formatted the way `libpq` does.
    ///
    /// Returns empty string for successful result.
    pub fn error_message(&self) -> String {
        self.inner.diagnostics.error_message()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.inner.diagnostics
    }

    /// Returns classified error if the status is a failure.
    ///
    /// ```
    /// use pgresult::{ErrorClassTable, ExecStatus, PgResult, Response};
    ///
    /// let res = PgResult::new(Response::new(ExecStatus::CommandOk)).unwrap();
    /// assert!(res.check(&ErrorClassTable::new()).is_ok());
    /// ```
    pub fn check(&self, table: &ErrorClassTable) -> Result<(), DatabaseError> {
        match self.status().is_failure() {
            true => Err(table.classify(self)),
            false => Ok(()),
        }
    }
}

impl fmt::Debug for PgResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("PgResult");
        dbg.field("status", &self.status())
            .field("ntuples", &self.ntuples())
            .field("nfields", &self.nfields());
        if let Some(tag) = self.cmd_status() {
            dbg.field("cmd_status", &tag);
        }
        if !self.inner.diagnostics.is_empty() {
            dbg.field("diagnostics", &self.inner.diagnostics);
        }
        dbg.finish()
    }
}
