use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

/// Errors raised by the persistence gateway. Forwarded untouched to the service.
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error("constraint violation: {0}")]
    ConstraintViolation(#[source] SqlxError),

    #[error("database connectivity failure: {0}")]
    ConnectivityFailure(#[source] SqlxError),

    #[error("database query error: {0}")]
    Query(#[source] SqlxError),
}

impl From<SqlxError> for StoreError {
    fn from(e: SqlxError) -> Self {
        match &e {
            SqlxError::Database(db) if db.is_unique_violation() => {
                StoreError::ConstraintViolation(e)
            }
            SqlxError::Database(db) if db.code().is_some_and(|c| is_unreachable_code(&c)) => {
                StoreError::ConnectivityFailure(e)
            }
            SqlxError::Io(_)
            | SqlxError::Tls(_)
            | SqlxError::PoolTimedOut
            | SqlxError::PoolClosed
            | SqlxError::WorkerCrashed => StoreError::ConnectivityFailure(e),
            _ => StoreError::Query(e),
        }
    }
}

// SQLite primary result codes for a store that cannot be reached or used:
// BUSY, LOCKED, IOERR, CANTOPEN. Extended codes carry the primary one in the
// low byte.
const SQLITE_UNREACHABLE_CODES: [i64; 4] = [5, 6, 10, 14];

fn is_unreachable_code(code: &str) -> bool {
    code.parse::<i64>()
        .is_ok_and(|c| SQLITE_UNREACHABLE_CODES.contains(&(c & 0xff)))
}

impl StoreError {
    /// The connection settings themselves are unusable; retrying cannot help.
    pub fn is_misconfiguration(&self) -> bool {
        matches!(self, StoreError::Query(SqlxError::Configuration(_)))
    }
}

/// Business-level failures of the user service.
#[derive(Debug, ThisError)]
pub enum UserError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("user with email '{0}' already exists")]
    DuplicateUser(String),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(#[source] StoreError),

    #[error("unexpected error: {0}")]
    Unexpected(String),
}

/// Fatal startup and listener failures. Any of these ends the process.
#[derive(Debug, ThisError)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("invalid CORS origin {0:?}")]
    InvalidOrigin(String),

    #[error("invalid database configuration: {0}")]
    Database(#[source] StoreError),

    #[error("database unreachable after {attempts} attempts: {source}")]
    Failed {
        attempts: u32,
        #[source]
        source: StoreError,
    },

    #[error("schema initialization failed: {0}")]
    Schema(#[source] StoreError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("listener error: {0}")]
    Serve(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_errors_are_connectivity_failures() {
        assert!(matches!(
            StoreError::from(SqlxError::PoolTimedOut),
            StoreError::ConnectivityFailure(_)
        ));
        assert!(matches!(
            StoreError::from(SqlxError::PoolClosed),
            StoreError::ConnectivityFailure(_)
        ));
    }

    #[test]
    fn other_driver_errors_are_query_errors() {
        assert!(matches!(
            StoreError::from(SqlxError::RowNotFound),
            StoreError::Query(_)
        ));
    }

    #[test]
    fn sqlite_open_and_lock_codes_mean_unreachable() {
        // CANTOPEN, BUSY, LOCKED, IOERR
        for code in ["14", "5", "6", "10"] {
            assert!(is_unreachable_code(code), "{code}");
        }
        // SQLITE_BUSY_SNAPSHOT, SQLITE_IOERR_READ, SQLITE_CANTOPEN_ISDIR
        for code in ["517", "266", "526"] {
            assert!(is_unreachable_code(code), "{code}");
        }
        // CONSTRAINT_UNIQUE, ERROR, READONLY, not a number
        for code in ["2067", "1", "8", "HY000"] {
            assert!(!is_unreachable_code(code), "{code}");
        }
    }

    #[tokio::test]
    async fn unopenable_sqlite_file_is_a_connectivity_failure() {
        let err = sqlx::sqlite::SqlitePoolOptions::new()
            .connect("sqlite:///nonexistent-dir-for-tender-errors/db.sqlite")
            .await
            .expect_err("opening a file in a missing directory must fail");
        assert!(matches!(err, SqlxError::Database(_)), "{err:?}");
        assert!(matches!(
            StoreError::from(err),
            StoreError::ConnectivityFailure(_)
        ));
    }

    #[test]
    fn configuration_errors_are_misconfiguration() {
        let err = StoreError::from(SqlxError::Configuration("bad mode".into()));
        assert!(err.is_misconfiguration());
        assert!(!StoreError::from(SqlxError::PoolTimedOut).is_misconfiguration());
    }

    #[test]
    fn failed_bootstrap_reports_last_error() {
        let err = BootstrapError::Failed {
            attempts: 3,
            source: StoreError::ConnectivityFailure(SqlxError::PoolTimedOut),
        };
        let msg = err.to_string();
        assert!(msg.contains("after 3 attempts"));
        assert!(msg.contains("pool timed out"));
    }
}
