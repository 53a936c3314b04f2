//! Mapping of SQLSTATE codes into typed errors.
//!
//! - [`ErrorClassTable`]
//! - [`ErrorClass`]
//! - [`DatabaseError`]
use parking_lot::RwLock;
use std::{borrow::Cow, collections::HashMap, fmt, sync::Arc};

use crate::{
    DiagField, PgResult, SqlState,
    common::{display_error, verbose},
    error::ArgumentError,
};

type Table = HashMap<Cow<'static, str>, SqlState>;

/// Registry of SQLSTATE code or class into [`SqlState`].
///
/// Keys are either 5 character codes (`"42P01"`) or 2 character classes
/// (`"42"`). The default table contains every known code and class.
///
/// The table is a shared handle, clones see the same entries and
/// modification is visible to the next [`classify`][ErrorClassTable::classify].
///
/// # Examples
///
/// ```
/// use pgresult::{ErrorClass, ErrorClassTable, SqlState};
///
/// let table = ErrorClassTable::new();
/// assert_eq!(table.lookup(Some("42P01")), ErrorClass::Sql(SqlState::UndefinedTable));
///
/// table.remove("42P01");
/// assert_eq!(table.lookup(Some("42P01")), ErrorClass::Sql(SqlState::SyntaxErrorOrAccessRuleViolation));
///
/// table.remove("42");
/// assert_eq!(table.lookup(Some("42P01")), ErrorClass::Server);
/// ```
#[derive(Clone)]
pub struct ErrorClassTable {
    table: Arc<RwLock<Table>>,
}

impl ErrorClassTable {
    /// Create table with every known code and class.
    pub fn new() -> ErrorClassTable {
        let mut table = Table::with_capacity(SqlState::CODES.len() + SqlState::CLASSES.len());
        for &(code, state) in SqlState::CODES.iter().chain(SqlState::CLASSES) {
            table.insert(Cow::Borrowed(code), state);
        }
        ErrorClassTable { table: Arc::new(RwLock::new(table)) }
    }

    /// Create table without any entry, every error is classified as [`ErrorClass::Server`].
    pub fn empty() -> ErrorClassTable {
        ErrorClassTable { table: Arc::default() }
    }

    /// Register a code or class, returns the previous entry.
    ///
    /// Returns [`ArgumentError::InvalidSqlState`] if the key is not
    /// 5 or 2 ascii alphanumeric characters.
    pub fn insert(
        &self,
        sqlstate: impl Into<Cow<'static, str>>,
        state: SqlState,
    ) -> Result<Option<SqlState>, ArgumentError> {
        let sqlstate = sqlstate.into();
        if !matches!(sqlstate.len(), 2 | 5) || !sqlstate.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(ArgumentError::InvalidSqlState(sqlstate.into_owned()));
        }
        verbose!(%sqlstate, ?state, "register sqlstate");
        Ok(self.table.write().insert(sqlstate, state))
    }

    /// Remove a code or class, returns the removed entry.
    pub fn remove(&self, sqlstate: &str) -> Option<SqlState> {
        verbose!(sqlstate, "unregister sqlstate");
        self.table.write().remove(sqlstate)
    }

    /// Returns the entry registered exactly for `sqlstate`.
    pub fn get(&self, sqlstate: &str) -> Option<SqlState> {
        self.table.read().get(sqlstate).copied()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    /// Returns `true` if table contains no entry.
    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// Resolve the error class of a SQLSTATE.
    ///
    /// The exact code is tried first, then its 2 character class, then
    /// [`ErrorClass::Server`]. Missing SQLSTATE is [`ErrorClass::Connection`].
    pub fn lookup(&self, sqlstate: Option<&str>) -> ErrorClass {
        let Some(sqlstate) = sqlstate else {
            return ErrorClass::Connection;
        };
        let table = self.table.read();
        if let Some(state) = table.get(sqlstate) {
            return ErrorClass::Sql(*state);
        }
        match sqlstate.get(..2).and_then(|class| table.get(class)) {
            Some(state) => ErrorClass::Sql(*state),
            None => ErrorClass::Server,
        }
    }

    /// Classify the error of a failed result.
    ///
    /// The result is attached to the returned error, except when the
    /// failure carries no SQLSTATE, which is reported as a connection error.
    pub fn classify(&self, result: &PgResult) -> DatabaseError {
        let sqlstate = result.error_field(DiagField::SqlState);
        let class = self.lookup(sqlstate);
        verbose!(?sqlstate, ?class, "classify error");

        let message = result
            .error_field(DiagField::MessagePrimary)
            .unwrap_or(class.generic_message())
            .to_owned();

        let result = match class {
            ErrorClass::Connection => None,
            _ => Some(result.clone()),
        };

        DatabaseError { class, message, result }
    }
}

impl Default for ErrorClassTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ErrorClassTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorClassTable").field("len", &self.len()).finish()
    }
}

/// Kind of a [`DatabaseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Server error with registered SQLSTATE code or class.
    Sql(SqlState),
    /// Server error with unregistered SQLSTATE.
    Server,
    /// Failure without SQLSTATE, e.g. connection lost.
    Connection,
    /// Query could not be sent to the server.
    UnableToSend,
}

impl ErrorClass {
    /// Returns the error name, e.g. `"UndefinedTable"` or `"ServerError"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sql(state) => state.name(),
            Self::Server => "ServerError",
            Self::Connection => "ConnectionError",
            Self::UnableToSend => "UnableToSend",
        }
    }

    /// Returns the [`SqlState`], if any.
    pub fn sqlstate(&self) -> Option<SqlState> {
        match self {
            Self::Sql(state) => Some(*state),
            _ => None,
        }
    }

    fn generic_message(&self) -> &'static str {
        match self {
            Self::Sql(_) | Self::Server => "server returned an error without message",
            Self::Connection => "connection failed without error message",
            Self::UnableToSend => "unable to send query",
        }
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An error returned by the database server, or a failure to reach it.
#[derive(Clone)]
pub struct DatabaseError {
    class: ErrorClass,
    message: String,
    result: Option<PgResult>,
}

impl DatabaseError {
    /// Failure before any response, e.g. transport failed to write the query.
    ///
    /// No result is attached.
    pub fn unable_to_send(message: impl Into<String>) -> DatabaseError {
        DatabaseError {
            class: ErrorClass::UnableToSend,
            message: message.into(),
            result: None,
        }
    }

    /// Connection level failure without SQLSTATE.
    pub fn connection(message: impl Into<String>) -> DatabaseError {
        DatabaseError {
            class: ErrorClass::Connection,
            message: message.into(),
            result: None,
        }
    }

    pub fn class(&self) -> ErrorClass {
        self.class
    }

    /// Returns the registered [`SqlState`] the error is classified as.
    pub fn sqlstate(&self) -> Option<SqlState> {
        self.class.sqlstate()
    }

    /// Returns the SQLSTATE as sent by the server.
    ///
    /// This may differ from [`sqlstate`][DatabaseError::sqlstate] when only
    /// the class is registered.
    pub fn code(&self) -> Option<&str> {
        self.field(DiagField::SqlState)
    }

    /// Returns the result of the failed query.
    pub fn result(&self) -> Option<&PgResult> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<PgResult> {
        self.result
    }

    /// Returns the server primary message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns a diagnostic field of the attached result.
    pub fn field(&self, field: DiagField) -> Option<&str> {
        self.result.as_ref()?.error_field(field)
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

display_error!(DatabaseError);

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        Diagnostics, ExecStatus, Response,
        diagnostic::test::{error_body, undefined_table},
    };

    fn failed(body: bytes::Bytes) -> PgResult {
        let response = Response {
            diagnostics: Diagnostics::parse(body).unwrap(),
            ..Response::new(ExecStatus::FatalError)
        };
        PgResult::new(response).unwrap()
    }

    #[test]
    fn three_tiers() {
        let table = ErrorClassTable::new();
        let result = failed(undefined_table());

        let err = table.classify(&result);
        assert_eq!(err.class(), ErrorClass::Sql(SqlState::UndefinedTable));
        assert_eq!(err.message(), "relation \"nonexistant_table\" does not exist");
        assert_eq!(err.code(), Some("42P01"));
        assert!(err.result().is_some());

        assert_eq!(table.remove("42P01"), Some(SqlState::UndefinedTable));
        let err = table.classify(&result);
        assert_eq!(err.class(), ErrorClass::Sql(SqlState::SyntaxErrorOrAccessRuleViolation));
        assert_eq!(err.code(), Some("42P01"));
        assert_eq!(err.message(), "relation \"nonexistant_table\" does not exist");

        table.remove("42");
        let err = table.classify(&result);
        assert_eq!(err.class(), ErrorClass::Server);
        assert_eq!(err.class().name(), "ServerError");
        assert_eq!(err.message(), "relation \"nonexistant_table\" does not exist");

        table.insert("42P01", SqlState::UndefinedTable).unwrap();
        assert_eq!(table.classify(&result).class(), ErrorClass::Sql(SqlState::UndefinedTable));
    }

    #[test]
    fn division_by_zero() {
        let result = failed(error_body(&[
            (b'S', "ERROR"),
            (b'C', "22012"),
            (b'M', "division by zero"),
        ]));
        let err = ErrorClassTable::new().classify(&result);
        assert_eq!(err.sqlstate(), Some(SqlState::DivisionByZero));
        assert_eq!(err.to_string(), "division by zero");
    }

    #[test]
    fn clones_share_entries() {
        let table = ErrorClassTable::new();
        let other = table.clone();
        other.remove("3F000");
        assert_eq!(table.get("3F000"), None);
        assert_eq!(table.lookup(Some("3F000")), ErrorClass::Sql(SqlState::InvalidSchemaName));
        other.remove("3F");
        assert_eq!(table.lookup(Some("3F000")), ErrorClass::Server);
    }

    #[test]
    fn custom_class() {
        let table = ErrorClassTable::empty();
        assert!(table.is_empty());
        assert_eq!(table.lookup(Some("22012")), ErrorClass::Server);
        table.insert("22", SqlState::DataException).unwrap();
        assert_eq!(table.lookup(Some("22012")), ErrorClass::Sql(SqlState::DataException));
        assert!(table.insert("2201", SqlState::DataException).is_err());
        assert!(table.insert("22-12", SqlState::DataException).is_err());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn missing_sqlstate() {
        let result = failed(error_body(&[(b'S', "FATAL"), (b'M', "terminating connection")]));
        let err = ErrorClassTable::new().classify(&result);
        assert_eq!(err.class(), ErrorClass::Connection);
        assert!(err.result().is_none());
        assert_eq!(err.message(), "terminating connection");

        let result = failed(error_body(&[]));
        let err = ErrorClassTable::new().classify(&result);
        assert_eq!(err.message(), "connection failed without error message");
    }

    #[test]
    fn missing_message() {
        let result = failed(error_body(&[(b'S', "ERROR"), (b'C', "42P01")]));
        let err = ErrorClassTable::new().classify(&result);
        assert_eq!(err.class(), ErrorClass::Sql(SqlState::UndefinedTable));
        assert_eq!(err.message(), "server returned an error without message");
        assert!(err.result().is_some());
    }

    #[test]
    fn unable_to_send() {
        let err = DatabaseError::unable_to_send("broken pipe");
        assert_eq!(err.class(), ErrorClass::UnableToSend);
        assert!(err.result().is_none());
        assert!(err.field(DiagField::SqlState).is_none());
        let err = crate::Error::from(err);
        assert!(err.result().is_none());
        assert_eq!(err.to_string().lines().next(), Some("broken pipe"));
    }
}
