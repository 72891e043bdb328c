use std::{io, path::PathBuf, string::FromUtf8Error};

use thiserror::Error;

/// Errors returned by index building, index lookup and line extraction.
///
/// A line number beyond the end of the file is not an error. Lookups report it as `Ok(None)`.
#[derive(Debug, Error)]
pub enum Error {
    /// The source file or its index is missing
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Malformed UTF-8 sequence while scanning the source
    #[error("invalid UTF-8 sequence at byte offset {offset}")]
    Decode { offset: u64 },

    /// The bytes of an extracted line are not valid UTF-8
    #[error("line is not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// Offset does not fit into a 6 byte index record
    #[error("byte offset {0} does not fit into 48 bits")]
    OffsetOutOfRange(u64),

    #[error("line {line} is {length} bytes long, which exceeds the maximum line length")]
    LineTooLong { line: usize, length: u64 },

    /// Index is not built properly
    #[error("malformed index: {reason}")]
    MalformedIndex { reason: String },
}

impl Error {
    /// Maps `io::ErrorKind::NotFound` to `Error::NotFound` for `path`, keeping every other io
    /// error as it is.
    pub(crate) fn from_io_at(err: io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound { path: path.into() }
        } else {
            Self::Io(err)
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedIndex {
            reason: reason.into(),
        }
    }
}
