//! Password-based key derivation (PBKDF2-HMAC-SHA256).

use hmac::Hmac;
use pbkdf2::pbkdf2;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::common::{Result, StegoError};

pub const SALT_LEN: usize = 16;
pub const KEY_LEN: usize = 32;
pub const PBKDF2_ITERATIONS: u32 = 100_000;

pub type Salt = [u8; SALT_LEN];
pub type Key = [u8; KEY_LEN];

/// Fill a fresh salt from the OS RNG.
pub fn random_salt() -> Salt {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Derive a 256-bit key from `password`.
///
/// When `salt` is `None` a random one is generated. The salt actually used is
/// returned next to the key so the caller can store it.
///
/// Deterministic in `(password, salt)`, which is what lets decryption
/// reproduce the encrypt-time key.
pub fn derive_key(password: &str, salt: Option<Salt>) -> Result<(Key, Salt)> {
    let salt = salt.unwrap_or_else(random_salt);
    let mut key = [0u8; KEY_LEN];

    pbkdf2::<Hmac<Sha256>>(password.as_bytes(), &salt, PBKDF2_ITERATIONS, &mut key)
        .map_err(|e| StegoError::Crypto(format!("PBKDF2 failed: {e}")))?;

    Ok((key, salt))
}
