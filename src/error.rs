// src/error.rs

use thiserror::Error;

/// Errors raised while building or querying a blame index.
#[derive(Error, Debug)]
pub enum Error {
    /// The log stream could not be understood
    #[error("parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    NotFound(#[from] Missing),

    /// A commit's hunks do not fit the file as it stood before that commit
    #[error("malformed history for {path} at {commit}: {source}")]
    MalformedHistory {
        path: String,
        commit: String,
        #[source]
        source: StepError,
    },

    #[error("git: {0}")]
    ExternalTool(#[from] git2::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// True for failures caused by the request rather than by the index.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }
}

/// The thing a query asked for that does not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    #[error("commit does not exist: {0}")]
    Commit(String),

    #[error("no such file at that commit: {path} at {commit}")]
    File { commit: String, path: String },

    #[error("commit {commit} never touched {path}")]
    History { commit: String, path: String },

    #[error("repository not configured for blame: {0}")]
    Repository(String),
}

/// Why one commit could not be applied to the previous attribution state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StepError {
    #[error("hunk {index} changes no lines")]
    EmptyHunk { index: usize },

    #[error("hunk {index} is anchored at line {anchor}, before line {cursor} already consumed")]
    Backwards { index: usize, anchor: usize, cursor: usize },

    #[error("needed {wanted} lines at line {at} but the file ends at line {available}")]
    PastEnd { wanted: usize, at: usize, available: usize },

    #[error("hunks describe a file of {actual} lines where {expected} were indexed")]
    Mismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
