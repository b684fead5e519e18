use std::fmt::{self, Debug, Display, Formatter};
use std::io;

/// A set of errors that can occur while decoding request parameters.
///
/// Every variant aborts the decode call that raised it; no partially
/// populated [`Params`](crate::Params) is ever handed back.
#[non_exhaustive]
pub enum Error {
    /// The body does not have the shape of a `multipart/form-data` stream,
    /// e.g. the opening boundary line is missing or a part's header block
    /// never terminates.
    MalformedBody { reason: &'static str },

    /// The stream ended while the declared content length still promised
    /// more bytes, or before the current part was terminated.
    UnexpectedEof,

    /// The declared content length exceeds the configured maximum.
    TooLarge { content_length: u64, limit: u64 },

    /// The body carries more parts than the configured maximum.
    TooManyParts { limit: usize },

    /// A single part exceeded the per-field size limit.
    FieldSizeExceeded { limit: u64, field_name: Option<String> },

    /// A plain text value is not well-formed in the accepted charset and no
    /// error callback was configured.
    InvalidEncoding { field_name: String, charset: &'static str },

    /// A body sink could not be created, written, sealed or read.
    StorageError(io::Error),

    /// Reading from the input stream failed.
    StreamReadFailed(io::Error),

    /// The `Content-Type` header is not `multipart/form-data`.
    NoMultipart,

    /// No boundary found in `Content-Type` header.
    NoBoundary,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedBody { reason } => write!(f, "malformed multipart body: {}", reason),
            Error::UnexpectedEof => write!(f, "unexpected end of multipart stream"),
            Error::TooLarge { content_length, limit } => write!(
                f,
                "content length {} exceeds the maximum multipart length: {} bytes",
                content_length, limit
            ),
            Error::TooManyParts { limit } => write!(f, "too many parts: limit is {}", limit),
            Error::FieldSizeExceeded { limit, field_name } => write!(
                f,
                "field '{}' exceeded the maximum size limit: {} bytes",
                field_name.as_deref().unwrap_or("<unknown>"),
                limit
            ),
            Error::InvalidEncoding { field_name, charset } => {
                write!(f, "field '{}' is not valid {} text", field_name, charset)
            }
            Error::StorageError(err) => write!(f, "body storage failed: {}", err),
            Error::StreamReadFailed(err) => write!(f, "stream read failed: {}", err),
            Error::NoMultipart => write!(f, "Content-Type is not multipart/form-data"),
            Error::NoBoundary => write!(f, "multipart boundary not found in Content-Type"),
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(self, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::StorageError(err) | Error::StreamReadFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string().eq(&other.to_string())
    }
}

impl Eq for Error {}
