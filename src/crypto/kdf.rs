use std::fmt;

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{KEY_LEN, SALT_LEN};
use crate::error::{Error, Result};

/// Number of decimal digits in a PIN.
pub const PIN_LEN: usize = 6;

/// A validated six digit PIN.
///
/// Construction is the validation step: holding a `Pin` means the input was
/// exactly six ASCII decimal digits. The digits are wiped on drop.
pub struct Pin(Zeroizing<[u8; PIN_LEN]>);

impl Pin {
    pub fn parse(input: &str) -> Result<Self> {
        let bytes = input.as_bytes();
        if bytes.len() != PIN_LEN || !bytes.iter().all(u8::is_ascii_digit) {
            return Err(Error::Validation(format!(
                "PIN must be exactly {PIN_LEN} decimal digits"
            )));
        }

        let mut digits = Zeroizing::new([0u8; PIN_LEN]);
        digits.copy_from_slice(bytes);
        Ok(Self(digits))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..]
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pin(******)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    rounds: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            // PBKDF2-HMAC-SHA256 rounds; the embedded payload does not record this
            rounds: 100_000,
        }
    }
}

impl KdfParams {
    pub fn new(rounds: u32) -> Result<Self> {
        let params = Self { rounds };
        params.validate()?;
        Ok(params)
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn validate(&self) -> Result<()> {
        if self.rounds < 1 {
            return Err(Error::Validation("PBKDF2 rounds must be >= 1".into()));
        }
        Ok(())
    }
}

/// A 256-bit key derived from a PIN and salt.
///
/// The bytes live in a [`Zeroizing`] buffer and are wiped when the key is
/// dropped, whichever way the owning stage exits.
pub struct DerivedKey(Zeroizing<[u8; KEY_LEN]>);

impl DerivedKey {
    #[cfg(test)]
    pub(crate) fn from_bytes(bytes: &[u8; KEY_LEN]) -> Self {
        Self(Zeroizing::new(*bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Copies the raw key bytes out for embedding.
    pub fn export_raw(&self) -> Zeroizing<[u8; KEY_LEN]> {
        Zeroizing::new(*self.0)
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DerivedKey(..)")
    }
}

/// Derive the encryption key from a PIN and salt with PBKDF2-HMAC-SHA256.
pub fn derive_key(pin: &Pin, salt: &[u8; SALT_LEN], kdf: KdfParams) -> Result<DerivedKey> {
    kdf.validate()?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(pin.as_bytes(), salt, kdf.rounds, &mut key[..]);

    Ok(DerivedKey(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_accepts_six_digits() {
        assert!(Pin::parse("000000").is_ok());
        assert!(Pin::parse("987654").is_ok());
    }

    #[test]
    fn pin_rejects_malformed_input() {
        for bad in ["", "12345", "1234567", "12a456", " 12345", "12345\n", "１２３４５６"] {
            match Pin::parse(bad) {
                Err(Error::Validation(_)) => {}
                other => panic!("expected Validation for {bad:?}, got: {other:?}"),
            }
        }
    }

    #[test]
    fn pin_debug_is_redacted() {
        let pin = Pin::parse("123456").unwrap();
        assert!(!format!("{pin:?}").contains("123456"));
    }

    #[test]
    fn kdf_golden_vector() {
        let pin = Pin::parse("111111").unwrap();
        let key = derive_key(&pin, &[0u8; SALT_LEN], KdfParams::default()).unwrap();

        let expected =
            hex::decode("32092dcfc31925664d39e597fe2c68a2712c747b5ff7a8a7470e33464fbe04f4")
                .unwrap();
        assert_eq!(&key.as_bytes()[..], &expected[..]);
    }

    #[test]
    fn kdf_is_deterministic() {
        let pin = Pin::parse("424242").unwrap();
        let salt = [42u8; SALT_LEN];
        let kdf = KdfParams::new(1_000).unwrap();

        let k1 = derive_key(&pin, &salt, kdf).unwrap();
        let k2 = derive_key(&pin, &salt, kdf).unwrap();

        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn kdf_salt_and_rounds_affect_output() {
        let pin = Pin::parse("424242").unwrap();
        let kdf = KdfParams::new(1_000).unwrap();

        let base = derive_key(&pin, &[7u8; SALT_LEN], kdf).unwrap();
        let other_salt = derive_key(&pin, &[8u8; SALT_LEN], kdf).unwrap();
        let other_rounds = derive_key(&pin, &[7u8; SALT_LEN], KdfParams::new(1_001).unwrap()).unwrap();

        assert_ne!(base.as_bytes(), other_salt.as_bytes());
        assert_ne!(base.as_bytes(), other_rounds.as_bytes());
    }

    #[test]
    fn kdf_default_is_100k_rounds() {
        assert_eq!(KdfParams::default().rounds(), 100_000);
    }

    #[test]
    fn kdf_invalid_params_fail_gracefully() {
        assert!(KdfParams::new(0).is_err());
    }

    #[test]
    fn export_raw_matches_key() {
        let key = DerivedKey::from_bytes(&[9u8; KEY_LEN]);
        assert_eq!(*key.export_raw(), [9u8; KEY_LEN]);
    }
}
