//! # Payload Encryption
//!
//! Optional password protection applied once to the whole archive before it
//! is embedded.
//!
//! - [`kdf`]: PBKDF2-HMAC-SHA256 key derivation
//! - [`envelope`]: AES-256-CBC envelope with marker, salt and IV header

pub mod envelope;
pub mod kdf;

pub use envelope::{decrypt, encrypt, is_encrypted, MAGIC};
pub use kdf::derive_key;
