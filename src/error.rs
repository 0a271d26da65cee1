//! Crate-wide error types
//!
//! Per the error-handling design, the core only ever reports errors for
//! malformed *external input* — cartridge bytes, PNG bytes, persisted
//! memory blobs. Anything that happens while a cartridge is already
//! running (out-of-range indices, invalid channel numbers, bad bank
//! numbers) clamps or no-ops silently and is documented API behavior,
//! not an error. See `cart_codec` and `persist` for the two fallible
//! entry points.

use thiserror::Error;

/// Errors that can occur while parsing a cartridge binary stream.
#[derive(Error, Debug)]
pub enum CartError {
    #[error("truncated chunk header")]
    TruncatedHeader,

    #[error("chunk payload shorter than declared size")]
    TruncatedPayload,

    #[error("PNG signature present but no caRt chunk found")]
    MissingPngPayload,

    #[error("deflate stream in code-zip/PNG chunk could not be inflated: {0}")]
    Inflate(String),

    #[error("bank index {0} out of range (0..8)")]
    BankOutOfRange(u8),
}

/// Errors that can occur while loading or saving persistent memory.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("persisted blob has wrong size: expected {expected} bytes, got {got}")]
    WrongSize { expected: usize, got: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
