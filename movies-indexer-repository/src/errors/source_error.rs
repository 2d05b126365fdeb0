//! Relational source error types.

use thiserror::Error;

/// Errors from reading the relational catalog.
///
/// `sqlx` errors are classified on conversion: anything that looks like a lost
/// or refused connection becomes [`SourceError::Connection`], everything else
/// points at the query or the schema and needs an operator.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The database could not be reached or dropped the connection.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The database rejected the query (missing table, syntax, permissions).
    #[error("Query error: {0}")]
    Query(String),

    /// A result row did not have the expected shape.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl SourceError {
    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Whether retrying the same query may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// SQLSTATE codes that indicate a temporary condition.
///
/// Class 08 is connection exceptions, class 53 insufficient resources,
/// 57P0x operator intervention (shutdown, crash recovery), 40001/40P01
/// serialization failure and deadlock.
fn is_transient_sqlstate(code: &str) -> bool {
    code.starts_with("08")
        || code.starts_with("53")
        || code.starts_with("57P")
        || code == "40001"
        || code == "40P01"
}

impl From<sqlx::Error> for SourceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::connection(err.to_string()),
            sqlx::Error::Database(db_err) => {
                let transient = db_err
                    .code()
                    .map(|code| is_transient_sqlstate(&code))
                    .unwrap_or(false);
                if transient {
                    Self::connection(err.to_string())
                } else {
                    Self::query(err.to_string())
                }
            }
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. } => Self::decode(err.to_string()),
            _ => Self::query(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failures_are_transient() {
        let refused = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(SourceError::from(sqlx::Error::Io(refused)).is_transient());
        assert!(SourceError::from(sqlx::Error::PoolTimedOut).is_transient());
        assert!(SourceError::from(sqlx::Error::PoolClosed).is_transient());
    }

    #[test]
    fn test_shape_failures_are_not_transient() {
        let err = SourceError::from(sqlx::Error::ColumnNotFound("persons".to_string()));
        assert!(matches!(err, SourceError::Decode(_)));
        assert!(!err.is_transient());

        let err = SourceError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, SourceError::Query(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_sqlstate_classes() {
        assert!(is_transient_sqlstate("08006"));
        assert!(is_transient_sqlstate("53300"));
        assert!(is_transient_sqlstate("57P01"));
        assert!(is_transient_sqlstate("40001"));
        assert!(!is_transient_sqlstate("42P01"));
        assert!(!is_transient_sqlstate("42601"));
    }
}
