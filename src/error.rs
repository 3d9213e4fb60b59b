//! Error types for path parsing, store access, interception and resolution.

use std::path::PathBuf;

use thiserror::Error;

/// A dotted name that cannot be turned into a [`SymbolicPath`](crate::models::SymbolicPath).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path")]
    Empty,

    #[error("invalid segment '{segment}' in path '{path}'")]
    InvalidSegment { path: String, segment: String },
}

/// Package store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse package descriptor {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by the I/O redirection table.
#[derive(Debug, Error)]
pub enum InterceptError {
    #[error("no I/O module named '{0}'")]
    UnknownModule(String),

    #[error("module '{module}' has no function '{function}'")]
    UnknownFunction { module: String, function: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolution errors.
///
/// "Not found" is never an error: the dispatcher reports it as
/// [`Resolution::NotApplicable`](crate::resolve::Resolution::NotApplicable).
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid root prefix: {0}")]
    InvalidRoot(#[from] PathError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("interception setup failed: {0}")]
    Intercept(#[from] InterceptError),

    /// The descriptor contains a node kind outside the expected set, or a
    /// known kind in a position it cannot occupy.
    #[error("unexpected {kind} node at '{path}' in package {package}")]
    UnexpectedNode {
        package: String,
        path: String,
        kind: String,
    },

    #[error("package {package} has no member '{name}'")]
    MemberNotFound { package: String, name: String },
}
