//! # stegkey
//!
//! Encrypts a file under a key derived from a six digit PIN and hides that
//! key inside a cover image, so the only artifacts are the ciphertext and an
//! ordinary looking PNG.
//!
//! ```rust,ignore
//! use stegkey::{PixelBuffer, decrypt_file, encrypt_file};
//!
//! let result = encrypt_file(b"report", "123456")?;
//! let mut cover = PixelBuffer::filled(64, 64, [0, 0, 0, 255])?;
//! result.embed_into(&mut cover)?;
//!
//! let plaintext = decrypt_file(result.ciphertext(), &cover, "123456")?;
//! assert_eq!(&plaintext[..], b"report");
//! ```
//!
//! The key image stores the raw derived key next to its salt. Whoever holds
//! the image can decrypt without the PIN; the PIN only protects the file as
//! long as the image stays private.

pub mod crypto;
mod error;
pub mod payload;
mod pipeline;
pub mod pixels;
pub mod progress;
pub mod stego;
mod storage;

pub use crate::crypto::{KdfParams, Pin};
pub use crate::error::{Error, Result};
pub use crate::payload::EmbeddedPayload;
pub use crate::pipeline::{EncryptionResult, Pipeline, decrypt_file, encrypt_file};
pub use crate::pixels::{Channel, PixelBuffer};
pub use crate::progress::{CancelToken, Progress, Stage};
pub use crate::storage::Storage;
