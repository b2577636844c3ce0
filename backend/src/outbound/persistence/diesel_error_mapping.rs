//! Translation of pool and Diesel failures into port errors.
//!
//! Every field operations port error has a `connection` and a `query`
//! variant. Connection-class failures (checkout timeouts, dropped
//! connections) become `connection`, which the domain reports as
//! `service_unavailable`; everything else becomes `query`.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map a pool failure through the port's `connection` constructor.
pub(crate) fn map_pool_error<E>(error: &PoolError, connection: impl FnOnce(String) -> E) -> E {
    debug!(error = %error, "connection checkout failed");
    connection(error.message().to_owned())
}

/// Map a Diesel failure through the port's `query` or `connection`
/// constructor.
pub(crate) fn map_diesel_error<E>(
    error: &DieselError,
    query: impl FnOnce(String) -> E,
    connection: impl FnOnce(String) -> E,
) -> E {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        other => debug!(error = %other, "diesel operation failed"),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            connection("database connection closed".to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            query("unique constraint violated".to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            query("referenced record missing".to_owned())
        }
        DieselError::NotFound => query("record not found".to_owned()),
        DieselError::DeserializationError(err) => query(format!("row decode failed: {err}")),
        DieselError::QueryBuilderError(_) => query("database query error".to_owned()),
        _ => query("database error".to_owned()),
    }
}
