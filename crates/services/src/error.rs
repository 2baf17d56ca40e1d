//! Shared error types for the services crate.

use std::io;

use thiserror::Error;

use quiz_core::model::{QuestionError, QuestionId, UserError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Coarse classification every service error maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied an unusable value (e.g. an empty user name).
    InvalidInput,
    /// A named entity does not exist.
    NotFound,
    /// Operation not valid in the session's current state.
    InvalidState,
    /// A question file is missing or malformed.
    DataError,
    /// Disk or connection failure.
    Storage,
}

fn storage_kind(err: &StorageError) -> ErrorKind {
    match err {
        StorageError::NotFound => ErrorKind::NotFound,
        _ => ErrorKind::Storage,
    }
}

/// Errors emitted by `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserServiceError {
    #[error(transparent)]
    InvalidName(#[from] UserError),
    #[error("unknown user: {name}")]
    NotFound { name: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UserServiceError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName(_) => ErrorKind::InvalidInput,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Storage(e) => storage_kind(e),
        }
    }
}

/// Errors emitted by `QuestionBank`. Every data variant names the file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error("cannot list questions directory {dir}: {source}")]
    Directory {
        dir: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid question file name: {file}")]
    InvalidFileName { file: String },
    #[error("question file not found: {file}")]
    Missing { file: String },
    #[error("cannot read question file {file}: {source}")]
    Unreadable {
        file: String,
        #[source]
        source: io::Error,
    },
    #[error("malformed question file {file}: {source}")]
    Malformed {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid question in {file}: {source}")]
    InvalidQuestion {
        file: String,
        #[source]
        source: QuestionError,
    },
    #[error("question id {id} appears more than once in {file}")]
    DuplicateId { file: String, id: QuestionId },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl QuestionBankError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Storage(e) => storage_kind(e),
            _ => ErrorKind::DataError,
        }
    }

    /// The question file this error is about, when there is one.
    #[must_use]
    pub fn file(&self) -> Option<&str> {
        match self {
            Self::InvalidFileName { file }
            | Self::Missing { file }
            | Self::Unreadable { file, .. }
            | Self::Malformed { file, .. }
            | Self::InvalidQuestion { file, .. }
            | Self::DuplicateId { file, .. } => Some(file),
            Self::Directory { .. } | Self::Storage(_) => None,
        }
    }
}

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    State(#[from] quiz_core::model::SessionError),
    #[error(transparent)]
    Questions(#[from] QuestionBankError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SessionError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::State(_) => ErrorKind::InvalidState,
            Self::Questions(e) => e.kind(),
            Self::Storage(e) => storage_kind(e),
        }
    }
}

/// Errors emitted by `StatsService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    User(#[from] UserServiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StatsError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::User(e) => e.kind(),
            Self::Storage(e) => storage_kind(e),
        }
    }
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AppServicesError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Sqlite(_) => ErrorKind::Storage,
            Self::Storage(e) => storage_kind(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_error_layer() {
        let empty = UserServiceError::from(UserError::EmptyName);
        assert_eq!(empty.kind(), ErrorKind::InvalidInput);

        let state = SessionError::from(quiz_core::model::SessionError::Completed);
        assert_eq!(state.kind(), ErrorKind::InvalidState);

        let missing = QuestionBankError::Missing {
            file: "a.json".into(),
        };
        assert_eq!(missing.file(), Some("a.json"));
        assert_eq!(SessionError::from(missing).kind(), ErrorKind::DataError);

        let down = StatsError::from(StorageError::Connection("closed".into()));
        assert_eq!(down.kind(), ErrorKind::Storage);
    }
}
