//! # Carrier Image
//!
//! Adapter between image files and the pixel grid the codec works on. Every
//! image is converted to 8-bit RGB on load; alpha and extra channels are
//! dropped.

use image::{GenericImageView, ImageFormat, RgbImage};
use log::debug;
use std::path::Path;

use crate::common::{Result, StegoError};

/// Encoders that store 8-bit RGB exactly. Anything else (JPEG, GIF, WebP, ...)
/// quantizes or compresses the low bits away.
pub const LOSSLESS_FORMATS: [ImageFormat; 6] = [
    ImageFormat::Png,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
    ImageFormat::Tga,
    ImageFormat::Pnm,
    ImageFormat::Qoi,
];

/// True when `format` can hold a stego image without altering any channel.
pub fn is_lossless_output(format: ImageFormat) -> bool {
    LOSSLESS_FORMATS.contains(&format)
}

/// An owned 3-channel pixel grid.
///
/// Dimensions never change once loaded.
#[derive(Debug, Clone)]
pub struct CarrierImage {
    pixels: RgbImage,
}

impl CarrierImage {
    /// Decode an image file and convert it to RGB.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let img = image::open(path.as_ref())?;
        let (width, height) = img.dimensions();
        debug!(
            "Loaded carrier {} ({:?}, {}x{})",
            path.as_ref().display(),
            img.color(),
            width,
            height
        );
        Ok(Self::from_rgb(img.to_rgb8()))
    }

    /// Decode an in-memory image and convert it to RGB.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_rgb(img.to_rgb8()))
    }

    pub fn from_rgb(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Channel bytes in row-major R,G,B order, limited to the pixel grid.
    pub fn channels(&self) -> &[u8] {
        let len = self.width() as usize * self.height() as usize * 3;
        &self.pixels.as_raw()[..len]
    }

    pub fn pixels_mut(&mut self) -> &mut RgbImage {
        &mut self.pixels
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.pixels
    }

    /// Write the image in the format implied by the extension of `path`.
    ///
    /// Only [`LOSSLESS_FORMATS`] are written; other encoders would scramble
    /// the low bits.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let format = ImageFormat::from_path(path)?;
        if !is_lossless_output(format) {
            return Err(StegoError::format(format!(
                "Cannot save to {}: {:?} encoding would destroy the hidden data, use PNG or BMP",
                path.display(),
                format
            )));
        }
        self.pixels.save_with_format(path, format)?;
        debug!("Saved {}x{} image to {}", self.width(), self.height(), path.display());
        Ok(())
    }
}
