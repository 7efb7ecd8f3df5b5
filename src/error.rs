//! Error taxonomy for the metering pipeline
//!
//! Errors fall into four families, mirroring where they can occur:
//!
//! - **Configuration**: invalid time range or window size, detected
//!   synchronously at iterator construction and never retried
//! - **Storage**: backend list/get failures, fatal to the current run
//! - **Decode/Encode**: malformed JSON or unexpected array structure on the
//!   read side, serialization failure on the write side; decode errors are
//!   kept distinct from the reader's exhausted sentinel (`Ok(None)`) so
//!   callers never mistake "no more data" for "corrupt data"
//! - **Validation**: an event with a mismatched metric name or missing tags,
//!   fatal to the enclosing reader
//!
//! All errors propagate synchronously through the call chain. Concurrent
//! fetch errors are captured by the first failing worker; siblings are
//! cancelled and only the first error is reported.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("aggregation window must be at least one hour")]
    WindowTooShort,

    #[error("time range must span at least one hour after truncation")]
    RangeTooShort,

    #[error("invalid time range: end must be strictly after start")]
    InvalidRange,

    #[error("no windows remain")]
    NoMoreWindows,

    #[error("{backend}: {op} failed: {message}")]
    Storage {
        backend: &'static str,
        op: &'static str,
        message: String,
    },

    #[error("decode: {0}")]
    Decode(String),

    #[error("encode: {0}")]
    Encode(String),

    #[error("invalid usage event: {0}")]
    Validation(String),

    #[error("event reader is closed")]
    ReaderClosed,

    #[error("collection cancelled")]
    Cancelled,

    #[error("worker task failed: {0}")]
    Task(String),

    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a backend I/O error with enough context to identify the
    /// failing call.
    pub fn storage(backend: &'static str, op: &'static str, message: impl Into<String>) -> Self {
        Error::Storage {
            backend,
            op,
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Error::Decode(message.into())
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Error::Encode(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}
