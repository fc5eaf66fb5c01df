//! # Error Handling
//!
//! This module provides the unified error taxonomy for the billing core.
//! Store-level unique-constraint violations are translated into
//! [`Error::AlreadyExists`] so callers can distinguish duplicates from
//! generic database failures.

use thiserror::Error;

/// Errors produced by the billing core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Input failed shape or range validation; no state was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A unique constraint (name, username, email, membership pair) was hit.
    #[error("{entity} already exists")]
    AlreadyExists { entity: &'static str },

    /// The referenced row does not exist.
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// A required precondition (membership, key still active) did not hold.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Underlying store failure; the enclosing transaction was rolled back.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Unexpected failure with no cleaner classification.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<crate::keys::KeyError> for Error {
    fn from(error: crate::keys::KeyError) -> Self {
        match error {
            crate::keys::KeyError::InvalidOrganizationId(_) => {
                Error::Validation(error.to_string())
            }
            crate::keys::KeyError::Signing(_) => Error::Internal(error.to_string()),
        }
    }
}

impl Error {
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation(message.into())
    }

    pub fn not_found(entity: &'static str) -> Self {
        Error::NotFound { entity }
    }

    pub fn precondition<S: Into<String>>(message: S) -> Self {
        Error::PreconditionFailed(message.into())
    }

    /// Translate a store error from an insert of `entity`, mapping
    /// unique-constraint violations to [`Error::AlreadyExists`].
    pub fn on_insert(entity: &'static str, error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            tracing::debug!(?error, entity, "Unique constraint violation detected");
            return Error::AlreadyExists { entity };
        }
        Error::Database(error)
    }

    /// True when the error is a unique-constraint violation, regardless of
    /// which entity produced it.
    pub fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
        is_unique_violation(error)
    }
}

fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    if let Some(code) = db_error.code() {
        let code_str = code.as_ref();
        return code_str == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code_str);
    }

    false
}
