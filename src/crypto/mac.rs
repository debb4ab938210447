//! Integrity MAC over the ciphertext.
//!
//! HMAC-SHA256 keyed with the derived key. It is checked before the AEAD pass
//! so corrupted input is rejected without running the cipher.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::{DerivedKey, MAC_LEN};
use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

fn keyed(key: &DerivedKey) -> Result<HmacSha256> {
    let mac_key = key.export_raw();
    HmacSha256::new_from_slice(&mac_key[..])
        .map_err(|_| Error::Validation("invalid MAC key length".into()))
}

/// Compute the MAC of `ciphertext` (never the plaintext).
pub fn compute(key: &DerivedKey, ciphertext: &[u8]) -> Result<[u8; MAC_LEN]> {
    let mut mac = keyed(key)?;
    mac.update(ciphertext);

    let mut out = [0u8; MAC_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

/// Recompute the MAC and compare it to `expected` in constant time.
pub fn verify(key: &DerivedKey, ciphertext: &[u8], expected: &[u8; MAC_LEN]) -> Result<bool> {
    let actual = compute(key, ciphertext)?;
    Ok(actual[..].ct_eq(&expected[..]).into())
}
