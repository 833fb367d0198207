//! # Image Processing and Steganography
//!
//! Carrier image handling and the LSB (Least Significant Bit) codec that hides
//! payload bytes in pixel data.

pub mod carrier;
pub mod steganography;

// Re-export main functions for convenience
pub use carrier::CarrierImage;
pub use steganography::{can_hide, embed, extract, max_bytes, payload_capacity};
