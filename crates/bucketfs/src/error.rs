// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for bucket filesystem operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur in filesystem operations
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed relative path, detected before any network call
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// The object (or the container holding it) does not exist
    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    /// A bounded directory read found the listing already exhausted
    #[error("End of directory")]
    EndOfDirectory,

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// Any other backing store failure (auth, quota, network), unchanged
    #[error("Object store error: {0}")]
    ObjectStore(#[source] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl Error {
    pub fn invalid_path<S: AsRef<str>>(path: S) -> Self {
        Error::InvalidPath(path.as_ref().to_string())
    }

    pub fn not_found<S: AsRef<str>>(path: S) -> Self {
        Error::NotFound(path.as_ref().to_string())
    }

    pub fn not_a_directory<S: AsRef<str>>(path: S) -> Self {
        Error::NotADirectory(path.as_ref().to_string())
    }

    pub fn is_a_directory<S: AsRef<str>>(path: S) -> Self {
        Error::IsADirectory(path.as_ref().to_string())
    }

    /// Translate a backing store error for `key`.
    ///
    /// Only the not-found condition is normalized; everything else passes
    /// through verbatim.
    pub fn from_store<S: AsRef<str>>(err: object_store::Error, key: S) -> Self {
        match err {
            object_store::Error::NotFound { .. } => Error::not_found(key),
            other => Error::ObjectStore(other),
        }
    }

    /// True for the "path not found" class: missing objects and paths that
    /// could never name one.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::InvalidPath(_))
    }

    /// True when a caller-supplied cancellation or deadline interrupted the call
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        // Byte streams carry our own errors through io::Error; unwrap them.
        if !err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            return Error::Io(err);
        }
        match err.into_inner().map(|inner| inner.downcast::<Error>()) {
            Some(Ok(ours)) => *ours,
            Some(Err(inner)) => Error::Io(std::io::Error::other(inner)),
            None => Error::Io(std::io::Error::other("stream error")),
        }
    }
}

impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;

        let kind = match err {
            Error::Io(inner) => return inner,
            Error::InvalidPath(_) => ErrorKind::InvalidInput,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::NotADirectory(_) => ErrorKind::NotADirectory,
            Error::IsADirectory(_) => ErrorKind::IsADirectory,
            Error::EndOfDirectory => ErrorKind::UnexpectedEof,
            Error::Cancelled => ErrorKind::Interrupted,
            Error::DeadlineExceeded => ErrorKind::TimedOut,
            Error::ObjectStore(_) => ErrorKind::Other,
        };
        std::io::Error::new(kind, err)
    }
}
