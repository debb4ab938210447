use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use zeroize::Zeroizing;

use super::{DerivedKey, NONCE_LEN, SALT_LEN, secure_random};
use crate::error::{Error, Result};

/// Generate salt
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    secure_random(&mut salt)?;
    Ok(salt)
}

/// Generate a fresh AES-GCM nonce
pub fn generate_nonce() -> Result<[u8; NONCE_LEN]> {
    let mut nonce = [0u8; NONCE_LEN];
    secure_random(&mut nonce)?;
    Ok(nonce)
}

fn cipher(key: &DerivedKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Encrypt plaintext with AES-256-GCM.
///
/// Returns `ciphertext || tag`, the tag being the trailing 16 bytes.
pub fn encrypt(key: &DerivedKey, nonce: &[u8; NONCE_LEN], plaintext: &[u8]) -> Result<Vec<u8>> {
    cipher(key)
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|_| Error::Encryption)
}

/// Decrypt `ciphertext || tag`.
///
/// A wrong key and a modified ciphertext both end in [`Error::Decryption`].
pub fn decrypt(
    key: &DerivedKey,
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let plaintext = cipher(key)
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::Decryption)?;
    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{KEY_LEN, TAG_LEN};

    fn key(byte: u8) -> DerivedKey {
        DerivedKey::from_bytes(&[byte; KEY_LEN])
    }

    #[test]
    fn encrypt_decrypt_roundtrip() {
        let nonce = generate_nonce().unwrap();
        let ct = encrypt(&key(1), &nonce, b"secret data").unwrap();
        let pt = decrypt(&key(1), &nonce, &ct).unwrap();
        assert_eq!(&pt[..], b"secret data");
    }

    #[test]
    fn ciphertext_carries_tag() {
        let nonce = [0u8; NONCE_LEN];
        let ct = encrypt(&key(1), &nonce, b"abc").unwrap();
        assert_eq!(ct.len(), 3 + TAG_LEN);

        let empty = encrypt(&key(1), &nonce, b"").unwrap();
        assert_eq!(empty.len(), TAG_LEN);
    }

    #[test]
    fn wrong_key_fails() {
        let nonce = generate_nonce().unwrap();
        let ct = encrypt(&key(1), &nonce, b"secret").unwrap();
        assert!(matches!(decrypt(&key(2), &nonce, &ct), Err(Error::Decryption)));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let nonce = generate_nonce().unwrap();
        let mut ct = encrypt(&key(1), &nonce, b"secret").unwrap();
        ct[0] ^= 0x01;
        assert!(matches!(decrypt(&key(1), &nonce, &ct), Err(Error::Decryption)));
    }

    #[test]
    fn truncated_ciphertext_fails() {
        let nonce = generate_nonce().unwrap();
        let ct = encrypt(&key(1), &nonce, b"secret").unwrap();
        assert!(matches!(decrypt(&key(1), &nonce, &ct[..TAG_LEN - 1]), Err(Error::Decryption)));
    }

    #[test]
    fn salts_and_nonces_are_fresh() {
        assert_ne!(generate_salt().unwrap(), generate_salt().unwrap());
        assert_ne!(generate_nonce().unwrap(), generate_nonce().unwrap());
    }
}
