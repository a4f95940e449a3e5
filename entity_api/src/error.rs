//! Error types for entity API
use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;

use sea_orm::error::DbErr;

/// Errors while executing operations related to entities.
/// The intent is to categorize errors into two major types:
///  * Errors related to the data or the request for it. Ex an unparsable time bound
///  * Errors related to interactions with the database itself. Ex DbErr::Conn
#[derive(Debug, PartialEq)]
pub struct Error {
    // Underlying error emitted from seaORM internals
    pub source: Option<DbErr>,
    // Enum representing which category of error
    pub error_kind: EntityApiErrorKind,
}

#[derive(Debug, PartialEq, Serialize)]
pub enum EntityApiErrorKind {
    // Invalid search term, such as a malformed time range bound
    InvalidQueryTerm,
    // Record not found
    RecordNotFound,
    // Errors related to interactions with the database itself. Ex DbErr::Conn
    SystemError,
    // Input rejected before reaching the database
    ValidationError,
}

impl Error {
    pub(crate) fn invalid_query_term() -> Self {
        Error {
            source: None,
            error_kind: EntityApiErrorKind::InvalidQueryTerm,
        }
    }

    pub(crate) fn validation() -> Self {
        Error {
            source: None,
            error_kind: EntityApiErrorKind::ValidationError,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Entity API Error: {:?}", self)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn StdError + 'static))
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        let error_kind = match err {
            DbErr::RecordNotFound(_) => EntityApiErrorKind::RecordNotFound,
            _ => EntityApiErrorKind::SystemError,
        };

        Error {
            source: Some(err),
            error_kind,
        }
    }
}
