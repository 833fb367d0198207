//! # Error Types
//!
//! Every fallible operation in the library returns [`Result<T>`], which carries a
//! [`StegoError`]. The binary wraps these in `anyhow` at the edge.

use thiserror::Error;

/// Message used for every decryption failure. Wrong passwords and corrupted
/// ciphertext are deliberately indistinguishable.
pub const CRYPTO_FAILURE: &str = "incorrect password or corrupted data";

/// The error type for hide and extract operations.
#[derive(Error, Debug)]
pub enum StegoError {
    /// The carrier image cannot hold the payload plus its 4-byte length prefix.
    #[error("The selected image is too small to hide all the data (need {needed} bytes, image holds {available})")]
    Capacity { needed: usize, available: usize },

    /// A hide or extract request names a missing image, file or directory.
    #[error("{0}")]
    InvalidRequest(String),

    /// Missing envelope marker, malformed metadata, or an otherwise unreadable layout.
    #[error("{0}")]
    Format(String),

    /// Decryption failed because of padding; always reported as [`CRYPTO_FAILURE`].
    #[error("{0}")]
    Crypto(String),

    /// The hidden payload is encrypted but the caller supplied no password.
    #[error("This image contains encrypted data. Please provide a password.")]
    PasswordRequired,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Metadata error: {0}")]
    Json(#[from] serde_json::Error),

    /// The background task died before reporting an outcome.
    #[error("Task error: {0}")]
    Task(String),
}

impl StegoError {
    pub fn format(msg: impl Into<String>) -> Self {
        StegoError::Format(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        StegoError::InvalidRequest(msg.into())
    }

    pub fn crypto() -> Self {
        StegoError::Crypto(CRYPTO_FAILURE.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StegoError>;
