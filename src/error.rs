use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the encryption pipeline and the image codec.
///
/// Every cryptographic failure on the decrypt path collapses into
/// [`Error::Decryption`] so that a wrong PIN, a wrong key image and a
/// tampered ciphertext look the same to the caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("cover image too small: {required} pixels required, {available} available")]
    Capacity { required: usize, available: usize },

    #[error("image carries no valid embedded key: {0}")]
    Format(String),

    #[error("decryption failed: wrong PIN, wrong key image, or corrupted data")]
    Decryption,

    #[error("encryption failed")]
    Encryption,

    #[error("operation cancelled")]
    Cancelled,

    #[error("OS random generator unavailable")]
    Random,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
