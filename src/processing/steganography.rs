//! # LSB Steganography Implementation
//!
//! Hides an opaque byte payload in the least significant bit of each color
//! channel (R, G, B) of a [`CarrierImage`].
//!
//! ## Algorithm
//!
//! ### Encoding Process
//! 1. Prepend a 4-byte big-endian length prefix to the payload
//! 2. Expand the bytes to bits, least significant bit first within each byte
//! 3. Pad with zero bits to a multiple of 3
//! 4. Walk pixels row-major; bit `k` of each group of three goes into channel `k`
//!    (R, G, B), clearing and then setting only that channel's LSB
//! 5. Pixels past the last group are left untouched
//!
//! ### Decoding Process
//! 1. Read 32 LSBs in the same order and rebuild the length `n`
//! 2. Keep reading from the same position until `32 + n * 8` bits are collected
//! 3. If the image runs out first, return the whole bytes read so far
//!
//! ### Capacity
//! An image holds `floor(width * height * 3 / 8)` bytes, 4 of which go to the
//! length prefix.
//!
//! Nothing ties a payload to its carrier: decoding an unrelated image yields
//! garbage or a short result, not an error.

use log::debug;

use super::carrier::CarrierImage;
use crate::common::{Result, StegoError};

/// Bytes taken by the big-endian length prefix.
pub const LENGTH_PREFIX: usize = 4;

const CHANNELS: usize = 3;

/// Maximum bytes (prefix included) an image of this size can hold.
pub fn max_bytes_for(width: u32, height: u32) -> usize {
    (width as u64 * height as u64 * CHANNELS as u64 / 8) as usize
}

pub fn max_bytes(image: &CarrierImage) -> usize {
    max_bytes_for(image.width(), image.height())
}

/// Largest payload that still fits next to the length prefix.
pub fn payload_capacity(image: &CarrierImage) -> usize {
    max_bytes(image).saturating_sub(LENGTH_PREFIX)
}

pub fn can_hide(image: &CarrierImage, payload_len: usize) -> bool {
    max_bytes(image) >= payload_len.saturating_add(LENGTH_PREFIX)
}

/// Fail with [`StegoError::Capacity`] unless `payload_len` bytes fit.
pub fn ensure_capacity(image: &CarrierImage, payload_len: usize) -> Result<()> {
    if can_hide(image, payload_len) {
        Ok(())
    } else {
        Err(StegoError::Capacity {
            needed: payload_len.saturating_add(LENGTH_PREFIX),
            available: max_bytes(image),
        })
    }
}

/// Embed `payload` into `image` in place.
pub fn embed(image: &mut CarrierImage, payload: &[u8]) -> Result<()> {
    embed_with_progress(image, payload, |_| {})
}

/// Embed `payload`, calling `on_progress` with the completed fraction (0.0-1.0)
/// after each pixel row.
///
/// The capacity check runs before any pixel is touched.
pub fn embed_with_progress<F>(image: &mut CarrierImage, payload: &[u8], mut on_progress: F) -> Result<()>
where
    F: FnMut(f32),
{
    ensure_capacity(image, payload.len())?;

    // Prepare data to embed: [4 bytes length][payload]
    let length = u32::try_from(payload.len()).map_err(|_| StegoError::Capacity {
        needed: payload.len().saturating_add(LENGTH_PREFIX),
        available: max_bytes(image),
    })?;
    let mut data_to_embed = Vec::with_capacity(LENGTH_PREFIX + payload.len());
    data_to_embed.extend_from_slice(&length.to_be_bytes());
    data_to_embed.extend_from_slice(payload);

    let data_bits = data_to_embed.len() * 8;
    let total_bits = data_bits.div_ceil(CHANNELS) * CHANNELS;

    let (width, height) = (image.width(), image.height());
    let img = image.pixels_mut();
    let mut bit_pos = 0usize;

    'outer: for y in 0..height {
        for x in 0..width {
            // Stop once every bit, padding included, is written
            if bit_pos >= total_bits {
                break 'outer;
            }

            let pixel = img.get_pixel_mut(x, y);
            for channel in 0..CHANNELS {
                let bit = if bit_pos < data_bits {
                    (data_to_embed[bit_pos / 8] >> (bit_pos % 8)) & 1
                } else {
                    0
                };
                pixel[channel] = (pixel[channel] & 0xFE) | bit;
                bit_pos += 1;
            }
        }
        on_progress(bit_pos as f32 / total_bits as f32);
    }
    on_progress(1.0);

    debug!(
        "Embedded {} payload bytes across {} pixels of a {}x{} image",
        payload.len(),
        total_bits / CHANNELS,
        width,
        height
    );
    Ok(())
}

/// Extract the payload hidden in `image`.
pub fn extract(image: &CarrierImage) -> Vec<u8> {
    extract_with_progress(image, |_| {})
}

/// Extract the payload, reporting the completed fraction (0.0-1.0) as bytes
/// are rebuilt.
///
/// Never fails: an image too small for the prefix yields an empty payload, and a
/// length pointing past the image yields whatever whole bytes could be read.
pub fn extract_with_progress<F>(image: &CarrierImage, mut on_progress: F) -> Vec<u8>
where
    F: FnMut(f32),
{
    let mut reader = LsbReader::new(image.channels());

    let mut length_bytes = [0u8; LENGTH_PREFIX];
    for byte in length_bytes.iter_mut() {
        match reader.read_byte() {
            Some(b) => *byte = b,
            None => {
                debug!("Image too small to hold a length prefix");
                on_progress(1.0);
                return Vec::new();
            }
        }
    }
    let length = u32::from_be_bytes(length_bytes) as usize;

    let readable = reader.remaining_bits() / 8;
    if length > readable {
        debug!(
            "Declared payload of {} bytes exceeds the {} bytes left in the image; truncating",
            length, readable
        );
    }
    let length = length.min(readable);

    let step = (length / 100).max(1);
    let mut data = Vec::with_capacity(length);
    while data.len() < length {
        match reader.read_byte() {
            Some(b) => data.push(b),
            None => break,
        }
        if data.len() % step == 0 {
            on_progress(data.len() as f32 / length as f32);
        }
    }
    on_progress(1.0);

    data
}

/// Embed `payload` into encoded image bytes and return the result as PNG bytes.
pub fn embed_into_png(image_bytes: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
    let mut carrier = CarrierImage::from_bytes(image_bytes)?;
    embed(&mut carrier, payload)?;

    let mut output_bytes = Vec::new();
    carrier.as_rgb().write_to(
        &mut std::io::Cursor::new(&mut output_bytes),
        image::ImageFormat::Png,
    )?;
    Ok(output_bytes)
}

/// Extract the payload from encoded image bytes.
pub fn extract_from_bytes(image_bytes: &[u8]) -> Result<Vec<u8>> {
    let carrier = CarrierImage::from_bytes(image_bytes)?;
    Ok(extract(&carrier))
}

/// Reads channel LSBs in scan order through one running cursor, so the length
/// prefix and the payload come from consecutive channels.
struct LsbReader<'a> {
    channels: &'a [u8],
    pos: usize,
}

impl<'a> LsbReader<'a> {
    fn new(channels: &'a [u8]) -> Self {
        Self { channels, pos: 0 }
    }

    fn remaining_bits(&self) -> usize {
        self.channels.len() - self.pos
    }

    /// Next 8 LSBs assembled least significant bit first.
    fn read_byte(&mut self) -> Option<u8> {
        let bits = self.channels.get(self.pos..self.pos + 8)?;
        self.pos += 8;
        Some(
            bits.iter()
                .enumerate()
                .fold(0u8, |byte, (i, channel)| byte | ((channel & 1) << i)),
        )
    }
}
