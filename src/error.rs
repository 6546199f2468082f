use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors. Either tool aborts with one of these.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad or missing directory, bad flag combination.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A file or directory could not be read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Configuration(_) => 2,
            Error::Io { .. } | Error::Bind { .. } => 1,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors local to a single request. They become an error response and
/// never reach the accept loop.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientRequestError {
    #[error("malformed request line: {0:?}")]
    MalformedRequest(String),

    #[error("undecodable request path: {0:?}")]
    BadPath(String),

    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    #[error("request head too large")]
    HeadTooLarge,
}

impl ClientRequestError {
    pub fn status(&self) -> u16 {
        match self {
            ClientRequestError::MalformedRequest(_)
            | ClientRequestError::BadPath(_)
            | ClientRequestError::HeadTooLarge => 400,
            ClientRequestError::UnsupportedMethod(_) => 501,
        }
    }
}
