//! The engine's public error taxonomy.
//!
//! Component errors are folded into four kinds: `InvalidArgument`, `Closed`,
//! `Corruption`, and `Io`. A `get` of an absent or tombstoned key is *not*
//! an error — it returns `Ok(None)`.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The caller passed something the API rejects, e.g. an empty key.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation on a closed database.
    #[error("database is closed")]
    Closed,

    /// On-disk state failed to decode: torn WAL frame mid-file, malformed
    /// block, bad footer, unreadable manifest.
    #[error("corruption: {0}")]
    Corruption(String),

    /// An underlying filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Re-creates an equivalent error for fan-out: a failed batch notifies
    /// every requester, and `io::Error` is not `Clone`.
    pub(crate) fn duplicate(&self) -> Error {
        match self {
            Error::InvalidArgument(s) => Error::InvalidArgument(s.clone()),
            Error::Closed => Error::Closed,
            Error::Corruption(s) => Error::Corruption(s.clone()),
            Error::Io(e) => Error::Io(io::Error::new(e.kind(), e.to_string())),
        }
    }
}

impl From<wal::WalError> for Error {
    fn from(e: wal::WalError) -> Self {
        match e {
            wal::WalError::Io(io) => Error::Io(io),
            wal::WalError::Codec(codec::CodecError::Io(io)) => Error::Io(io),
            wal::WalError::Codec(c) => Error::Corruption(c.to_string()),
            wal::WalError::Closed(_) => Error::Closed,
        }
    }
}

impl From<sstable::TableError> for Error {
    fn from(e: sstable::TableError) -> Self {
        match e {
            sstable::TableError::Io(io) => Error::Io(io),
            sstable::TableError::Corruption(msg) => Error::Corruption(msg),
            sstable::TableError::OutOfOrder { key } => {
                Error::Corruption(format!("table writer fed misordered key {key:?}"))
            }
        }
    }
}
