//! Error taxonomy for message reading.
//!
//! Clean end-of-stream is deliberately not represented here: the framed
//! stream simply finishes. Everything below except [`ParseError::Io`] is a
//! per-message diagnostic; the consumption loop reports it to the sink and
//! resynchronizes on the next line instead of tearing the connection down.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    /// Start line missing its required delimiters. Carries the raw line.
    #[error("malformed start line: {line:?}")]
    MalformedStartLine { line: String },

    /// Status-code field is not a three-digit base-10 integer. Carries the
    /// offending field text.
    #[error("malformed status code: {field:?}")]
    MalformedStatusCode { field: String },

    #[error("invalid header field: {reason}")]
    InvalidHeader { reason: String },

    #[error("header section too large, current: {current_size} exceed the limit {max_size}")]
    TooLargeHeader { current_size: usize, max_size: usize },

    #[error("header field number exceed the limit {max_num}")]
    TooManyFields { max_num: usize },

    /// Stream closed in the middle of a message. Reported exactly once per
    /// truncated stream, after which the connection task terminates.
    #[error("stream ended in the middle of a message")]
    UnexpectedEof,

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl ParseError {
    pub fn malformed_start_line<S: ToString>(line: S) -> Self {
        Self::MalformedStartLine { line: line.to_string() }
    }

    pub fn malformed_status_code<S: ToString>(field: S) -> Self {
        Self::MalformedStatusCode { field: field.to_string() }
    }

    pub fn invalid_header<S: ToString>(reason: S) -> Self {
        Self::InvalidHeader { reason: reason.to_string() }
    }

    pub fn too_large_header(current_size: usize, max_size: usize) -> Self {
        Self::TooLargeHeader { current_size, max_size }
    }

    pub fn too_many_fields(max_num: usize) -> Self {
        Self::TooManyFields { max_num }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }

    /// True for failures that end the connection task instead of being
    /// reported and skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_io_is_fatal() {
        assert!(ParseError::io(io::Error::from(io::ErrorKind::ConnectionReset)).is_fatal());

        assert!(!ParseError::malformed_start_line("garbage").is_fatal());
        assert!(!ParseError::malformed_status_code("20x").is_fatal());
        assert!(!ParseError::invalid_header("no colon").is_fatal());
        assert!(!ParseError::UnexpectedEof.is_fatal());
        assert!(!ParseError::too_large_header(9000, 8192).is_fatal());
    }

    #[test]
    fn start_line_error_carries_raw_text() {
        let error = ParseError::malformed_start_line("MSRP only-one-space");
        assert!(error.to_string().contains("MSRP only-one-space"));
    }
}
