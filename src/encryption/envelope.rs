//! # Cipher Envelope
//!
//! Password encryption for the hidden archive: AES-256 in CBC mode with PKCS#7
//! padding, key from [`derive_key`](super::kdf::derive_key).
//!
//! ## Layout
//!
//! ```text
//! MAGIC (12) | SALT (16) | IV (16) | CIPHERTEXT (multiple of 16)
//! ```
//!
//! Fields are positional; nothing is length-delimited.
//!
//! There is no MAC. A wrong password is detected only through invalid padding,
//! so roughly 1 in 256 wrong keys (and some corruptions) decrypt to garbage
//! without an error.

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes256, Block as AesBlock};
use log::debug;
use rand::rngs::OsRng;
use rand::RngCore;

use super::kdf::{derive_key, random_salt, Salt, SALT_LEN};
use crate::common::{Result, StegoError};

/// Literal marker at the start of every encrypted payload.
pub const MAGIC: &[u8; 12] = b"INVISIOVAULT";
pub const IV_LEN: usize = 16;
pub const BLOCK_LEN: usize = 16;
pub const HEADER_LEN: usize = MAGIC.len() + SALT_LEN + IV_LEN;

/// True when `data` starts with the envelope marker.
pub fn is_encrypted(data: &[u8]) -> bool {
    data.starts_with(MAGIC)
}

/// Encrypt `data` under `password` into a self-contained envelope.
pub fn encrypt(data: &[u8], password: &str) -> Result<Vec<u8>> {
    let (key, salt) = derive_key(password, Some(random_salt()))?;
    let mut iv = [0u8; IV_LEN];
    OsRng.fill_bytes(&mut iv);

    let cipher = Aes256::new(GenericArray::from_slice(&key));
    let padded = pad(data);

    let mut out = Vec::with_capacity(HEADER_LEN + padded.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&salt);
    out.extend_from_slice(&iv);

    let mut prev = iv;
    for chunk in padded.chunks_exact(BLOCK_LEN) {
        let mut block_bytes = [0u8; BLOCK_LEN];
        xor_blocks(chunk, &prev, &mut block_bytes);
        let mut block = AesBlock::from(block_bytes);
        cipher.encrypt_block(&mut block);
        prev.copy_from_slice(block.as_slice());
        out.extend_from_slice(&prev);
    }

    debug!(
        "Encrypted {} bytes into a {} byte envelope",
        data.len(),
        out.len()
    );
    Ok(out)
}

/// Decrypt an envelope produced by [`encrypt`].
///
/// # Errors
/// - [`StegoError::Format`] when the marker is missing or the header is cut short
/// - [`StegoError::Crypto`] when the ciphertext length or padding is invalid
pub fn decrypt(blob: &[u8], password: &str) -> Result<Vec<u8>> {
    if !is_encrypted(blob) {
        return Err(StegoError::format("Invalid data format"));
    }
    if blob.len() < HEADER_LEN {
        return Err(StegoError::format("Encrypted header is truncated"));
    }

    let mut salt: Salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&blob[MAGIC.len()..MAGIC.len() + SALT_LEN]);
    let mut prev = [0u8; IV_LEN];
    prev.copy_from_slice(&blob[MAGIC.len() + SALT_LEN..HEADER_LEN]);
    let ciphertext = &blob[HEADER_LEN..];

    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(StegoError::crypto());
    }

    let (key, _) = derive_key(password, Some(salt))?;
    let cipher = Aes256::new(GenericArray::from_slice(&key));

    let mut plain = Vec::with_capacity(ciphertext.len());
    for chunk in ciphertext.chunks_exact(BLOCK_LEN) {
        let mut block = AesBlock::clone_from_slice(chunk);
        cipher.decrypt_block(&mut block);
        let mut plain_block = [0u8; BLOCK_LEN];
        xor_blocks(block.as_slice(), &prev, &mut plain_block);
        plain.extend_from_slice(&plain_block);
        prev.copy_from_slice(chunk);
    }

    unpad(plain)
}

fn xor_blocks(a: &[u8], b: &[u8], out: &mut [u8]) {
    for ((o, x), y) in out.iter_mut().zip(a).zip(b) {
        *o = x ^ y;
    }
}

/// PKCS#7: always adds 1..=16 bytes, each equal to the pad length.
fn pad(data: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK_LEN - data.len() % BLOCK_LEN;
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    padded.resize(data.len() + pad_len, pad_len as u8);
    padded
}

fn unpad(mut data: Vec<u8>) -> Result<Vec<u8>> {
    let pad_len = match data.last() {
        Some(&n) => n as usize,
        None => return Err(StegoError::crypto()),
    };
    if pad_len == 0 || pad_len > BLOCK_LEN || pad_len > data.len() {
        return Err(StegoError::crypto());
    }
    if !data[data.len() - pad_len..].iter().all(|&b| b as usize == pad_len) {
        return Err(StegoError::crypto());
    }
    data.truncate(data.len() - pad_len);
    Ok(data)
}
