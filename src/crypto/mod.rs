//! Cryptographic primitives for the pipeline.
//!
//! Provides PIN-based key derivation, authenticated encryption and the
//! independent integrity MAC over the ciphertext.

pub mod aead;
pub mod kdf;
pub mod mac;

use crate::error::{Error, Result};
use getrandom::fill;

pub use aead::{decrypt, encrypt, generate_nonce, generate_salt};
pub use kdf::{DerivedKey, KdfParams, Pin, derive_key};

/// Length of the salt (16 bytes).
pub const SALT_LEN: usize = 16;
/// Length of the nonce (12 bytes for AES-GCM).
pub const NONCE_LEN: usize = 12;
/// Length of the encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the HMAC-SHA256 digest (32 bytes).
pub const MAC_LEN: usize = 32;
/// Length of the AES-GCM authentication tag (16 bytes).
pub const TAG_LEN: usize = 16;

/// Fill buffer with cryptographically secure random bytes
pub(crate) fn secure_random(buf: &mut [u8]) -> Result<()> {
    fill(buf).map_err(|_| Error::Random)
}
