//! Error types for realign.

use thiserror::Error;

/// Result alias for realign operations.
pub type Result<T> = std::result::Result<T, RealignError>;

/// Errors that can occur while extracting, matching or estimating alignment.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RealignError {
    /// The payload is not valid base64 or its pixel data is corrupt.
    #[error("failed to decode image: {reason}")]
    Decode { reason: String },
    /// The container is unknown, not compiled in, or holds no pixels.
    #[error("unsupported image format: {reason}")]
    UnsupportedFormat { reason: String },
    /// An output image could not be encoded.
    #[error("failed to encode image: {reason}")]
    Encode { reason: String },
    /// No usable correspondences survived matching.
    #[error("not enough matches to estimate motion")]
    InsufficientMatches,
    /// No reference has been registered under the given session id.
    #[error("unknown session: {id}")]
    UnknownSession { id: String },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// An index referenced past the end of a collection.
    #[error("{context} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
}
