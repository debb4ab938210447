//! The fixed-layout blob hidden in the key image.
//!
//! ```text
//! LENGTH (4, u32 BE = 92) | SALT (16) | NONCE (12) | KEY (32) | MAC (32)
//! ```

use zeroize::{Zeroize, Zeroizing};

use crate::crypto::{KEY_LEN, MAC_LEN, NONCE_LEN, SALT_LEN};
use crate::error::{Error, Result};

/// Length of the big-endian length prefix.
pub const HEADER_LEN: usize = 4;
/// Length of everything after the prefix; also the value stored in it.
pub const BODY_LEN: usize = SALT_LEN + NONCE_LEN + KEY_LEN + MAC_LEN;
/// Total embedded length.
pub const PAYLOAD_LEN: usize = HEADER_LEN + BODY_LEN;

const SALT_AT: usize = HEADER_LEN;
const NONCE_AT: usize = SALT_AT + SALT_LEN;
const KEY_AT: usize = NONCE_AT + NONCE_LEN;
const MAC_AT: usize = KEY_AT + KEY_LEN;

/// Salt, nonce, raw key and MAC as carried by the key image.
///
/// The raw key is stored verbatim next to its salt: anyone holding the image
/// can decrypt without the PIN.
pub struct EmbeddedPayload {
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    key: [u8; KEY_LEN],
    mac: [u8; MAC_LEN],
}

impl Drop for EmbeddedPayload {
    fn drop(&mut self) {
        self.key.zeroize();
        self.salt.zeroize();
    }
}

impl EmbeddedPayload {
    pub fn new(
        salt: [u8; SALT_LEN],
        nonce: [u8; NONCE_LEN],
        key: &[u8; KEY_LEN],
        mac: [u8; MAC_LEN],
    ) -> Self {
        Self {
            salt,
            nonce,
            key: *key,
            mac,
        }
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub fn raw_key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    pub fn mac(&self) -> &[u8; MAC_LEN] {
        &self.mac
    }

    pub fn to_bytes(&self) -> Zeroizing<[u8; PAYLOAD_LEN]> {
        let mut buf = Zeroizing::new([0u8; PAYLOAD_LEN]);

        buf[..HEADER_LEN].copy_from_slice(&(BODY_LEN as u32).to_be_bytes());
        buf[SALT_AT..NONCE_AT].copy_from_slice(&self.salt);
        buf[NONCE_AT..KEY_AT].copy_from_slice(&self.nonce);
        buf[KEY_AT..MAC_AT].copy_from_slice(&self.key);
        buf[MAC_AT..].copy_from_slice(&self.mac);

        buf
    }

    /// Parses a full payload, length prefix included.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the data has the wrong size or the
    /// prefix does not hold the body length.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() != PAYLOAD_LEN {
            return Err(Error::Format(format!(
                "expected {PAYLOAD_LEN} payload bytes, got {}",
                data.len()
            )));
        }

        check_header(&data[..HEADER_LEN])?;

        let mut payload = Self {
            salt: [0u8; SALT_LEN],
            nonce: [0u8; NONCE_LEN],
            key: [0u8; KEY_LEN],
            mac: [0u8; MAC_LEN],
        };
        payload.salt.copy_from_slice(&data[SALT_AT..NONCE_AT]);
        payload.nonce.copy_from_slice(&data[NONCE_AT..KEY_AT]);
        payload.key.copy_from_slice(&data[KEY_AT..MAC_AT]);
        payload.mac.copy_from_slice(&data[MAC_AT..]);

        Ok(payload)
    }
}

/// Checks that a 4-byte prefix holds [`BODY_LEN`] big-endian.
pub(crate) fn check_header(header: &[u8]) -> Result<()> {
    let prefix: [u8; HEADER_LEN] = header
        .try_into()
        .map_err(|_| Error::Format("truncated length prefix".into()))?;

    let declared = u32::from_be_bytes(prefix);
    if declared as usize != BODY_LEN {
        return Err(Error::Format(format!(
            "length prefix is {declared}, expected {BODY_LEN}"
        )));
    }
    Ok(())
}
