use std::io;

use thiserror::Error;

/// The error returned by [`AvlTree::select`](crate::AvlTree::select).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum SelectError {
    #[error("rank {rank} out of range for a tree of {len} keys")]
    OutOfRange { rank: usize, len: usize },
}

/// An error encountered while running the [`harness`](crate::harness).
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("missing command count")]
    MissingCount,
    #[error("command #{command}: missing {what}")]
    MissingToken { command: usize, what: &'static str },
    #[error("invalid token `{token}`")]
    InvalidToken { token: String },
    #[error("command #{command}: {source}")]
    Select {
        command: usize,
        #[source]
        source: SelectError,
    },
}
