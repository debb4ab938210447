//! Encrypt and decrypt orchestration.
//!
//! Encryption: fresh salt and nonce, PBKDF2 key, AES-256-GCM over the file,
//! HMAC over the ciphertext, then the [`EmbeddedPayload`] is assembled. The
//! caller embeds it into a cover image of its choosing.
//!
//! Decryption: the payload is pulled from the key image, the key re-derived
//! from the PIN and the extracted salt, the MAC checked, and only then is the
//! ciphertext decrypted.

use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{self, KdfParams, Pin, derive_key, mac};
use crate::error::{Error, Result};
use crate::payload::EmbeddedPayload;
use crate::pixels::PixelBuffer;
use crate::progress::{Callback, CancelToken, Progress, Stage, Tracker};
use crate::stego;

/// Output of [`Pipeline::encrypt_file`].
///
/// Owns the ciphertext and the payload until the caller has written both out;
/// nothing about the last run is kept anywhere else.
pub struct EncryptionResult {
    ciphertext: Vec<u8>,
    payload: EmbeddedPayload,
}

impl EncryptionResult {
    /// `ciphertext || tag`, with no header.
    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn payload(&self) -> &EmbeddedPayload {
        &self.payload
    }

    /// Hides the payload in `cover`, turning it into the key image.
    pub fn embed_into(&self, cover: &mut PixelBuffer) -> Result<()> {
        stego::embed(cover, &self.payload.to_bytes()[..])
    }

    pub fn into_ciphertext(self) -> Vec<u8> {
        self.ciphertext
    }
}

/// A configured pipeline. Invocations share no state besides the settings.
pub struct Pipeline<'a> {
    kdf: KdfParams,
    callback: Option<Callback<'a>>,
    cancel: Option<CancelToken>,
}

impl Default for Pipeline<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Pipeline<'a> {
    pub fn new() -> Self {
        Self {
            kdf: KdfParams::default(),
            callback: None,
            cancel: None,
        }
    }

    /// Overrides the KDF cost. Decryption must use the same parameters as
    /// encryption; they are not stored in the key image.
    pub fn with_kdf(mut self, kdf: KdfParams) -> Self {
        self.kdf = kdf;
        self
    }

    /// Registers a callback invoked synchronously at each checkpoint.
    pub fn on_progress(mut self, callback: impl FnMut(Progress) + 'a) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Attaches a token polled before every stage.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Encrypts `data` under a key derived from `pin`.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for a malformed PIN (reported before any
    /// checkpoint), [`Error::Cancelled`], [`Error::Random`] or
    /// [`Error::Encryption`].
    pub fn encrypt_file(&mut self, data: &[u8], pin: &str) -> Result<EncryptionResult> {
        let pin = Pin::parse(pin)?;
        let kdf = self.kdf;
        let mut tracker = Tracker::new(self.callback.as_mut(), self.cancel.as_ref());

        let result = seal(&mut tracker, kdf, data, &pin);
        match &result {
            Ok(_) => tracker.done(),
            Err(e) => {
                debug!(error = %e, "encryption aborted");
                tracker.fail();
            }
        }
        result
    }

    /// Decrypts `ciphertext` with the payload hidden in `key_image`.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for a malformed PIN, [`Error::Format`] when the
    /// image carries no payload, [`Error::Cancelled`], and
    /// [`Error::Decryption`] for every cryptographic failure: wrong PIN,
    /// wrong image and tampered data are indistinguishable.
    pub fn decrypt_file(
        &mut self,
        ciphertext: &[u8],
        key_image: &PixelBuffer,
        pin: &str,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let pin = Pin::parse(pin)?;
        let kdf = self.kdf;
        let mut tracker = Tracker::new(self.callback.as_mut(), self.cancel.as_ref());

        let result = open(&mut tracker, kdf, ciphertext, key_image, &pin);
        match &result {
            Ok(_) => tracker.done(),
            Err(e) => {
                debug!(error = %e, "decryption aborted");
                tracker.fail();
            }
        }
        result
    }
}

fn seal(
    tracker: &mut Tracker<'_, '_>,
    kdf: KdfParams,
    data: &[u8],
    pin: &Pin,
) -> Result<EncryptionResult> {
    let salt = crypto::generate_salt()?;
    let nonce = crypto::generate_nonce()?;

    tracker.enter(Stage::Deriving, 10)?;
    let key = derive_key(pin, &salt, kdf)?;

    tracker.enter(Stage::Encrypting, 30)?;
    let ciphertext = crypto::encrypt(&key, &nonce, data)?;
    tracker.enter(Stage::Encrypting, 80)?;

    tracker.enter(Stage::Verifying, 90)?;
    let mac = mac::compute(&key, &ciphertext)?;

    let raw_key = key.export_raw();
    let payload = EmbeddedPayload::new(salt, nonce, &raw_key, mac);

    debug!(plaintext = data.len(), ciphertext = ciphertext.len(), "file sealed");
    Ok(EncryptionResult {
        ciphertext,
        payload,
    })
}

fn open(
    tracker: &mut Tracker<'_, '_>,
    kdf: KdfParams,
    ciphertext: &[u8],
    key_image: &PixelBuffer,
    pin: &Pin,
) -> Result<Zeroizing<Vec<u8>>> {
    let payload = stego::extract_payload(key_image)?;

    tracker.enter(Stage::Deriving, 10)?;
    let key = derive_key(pin, payload.salt(), kdf)?;

    // MAC first: corrupted input never reaches the cipher
    tracker.enter(Stage::Verifying, 30)?;
    if !mac::verify(&key, ciphertext, payload.mac())? {
        debug!("ciphertext MAC mismatch");
        return Err(Error::Decryption);
    }

    tracker.enter(Stage::Decrypting, 60)?;
    crypto::decrypt(&key, payload.nonce(), ciphertext).inspect_err(|_| {
        debug!("AEAD tag rejected");
    })
}

/// [`Pipeline::encrypt_file`] with default settings.
pub fn encrypt_file(data: &[u8], pin: &str) -> Result<EncryptionResult> {
    Pipeline::new().encrypt_file(data, pin)
}

/// [`Pipeline::decrypt_file`] with default settings.
pub fn decrypt_file(
    ciphertext: &[u8],
    key_image: &PixelBuffer,
    pin: &str,
) -> Result<Zeroizing<Vec<u8>>> {
    Pipeline::new().decrypt_file(ciphertext, key_image, pin)
}
