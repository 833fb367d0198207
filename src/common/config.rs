//! # Configuration Utilities
//!
//! TOML configuration for the command-line front end. The library core takes
//! explicit arguments and never reads configuration itself.

use anyhow::Result;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::processing::carrier::is_lossless_output;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Arguments
/// - `path`: Path to the TOML configuration file
///
/// # Returns
/// - `Ok(T)`: Successfully loaded and parsed configuration
/// - `Err`: File I/O or parsing error
///
/// # Example
/// ```ignore
/// let config: VaultConfig = load_config("config/vault.toml")?;
/// ```
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Top-level configuration for the `invisio` binary.
///
/// # Example TOML
///
/// ```toml
/// [output]
/// hidden_suffix = "_hidden"
/// default_format = "png"
///
/// [logging]
/// level = "info"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Naming of generated stego images.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Appended to the carrier's file stem (e.g. `photo.png` -> `photo_hidden.png`)
    pub hidden_suffix: String,
    /// Extension used instead of the carrier's when that format is not lossless
    pub default_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            hidden_suffix: "_hidden".to_string(),
            default_format: "png".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `error`, `warn`, `info`, `debug`, `trace`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl VaultConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        load_config(path)
    }

    /// Default stego-image path for a carrier: `<dir>/<stem><suffix>.<ext>`.
    ///
    /// Carriers whose format cannot be written losslessly (JPEG, GIF, ...)
    /// get `default_format` as their extension.
    pub fn default_output_path(&self, carrier: &Path) -> PathBuf {
        let stem = carrier
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "carrier".to_string());
        let ext = carrier
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .filter(|e| ImageFormat::from_extension(e).is_some_and(is_lossless_output))
            .unwrap_or_else(|| self.output.default_format.clone());

        let name = format!("{}{}.{}", stem, self.output.hidden_suffix, ext);
        match carrier.parent() {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: VaultConfig = toml::from_str("[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.output.hidden_suffix, "_hidden");
        assert_eq!(config.output.default_format, "png");
    }

    #[test]
    fn test_default_output_path_keeps_lossless_extension() {
        let config = VaultConfig::default();
        let out = config.default_output_path(Path::new("/tmp/pics/cat.bmp"));
        assert_eq!(out, PathBuf::from("/tmp/pics/cat_hidden.bmp"));
    }

    #[test]
    fn test_default_output_path_replaces_jpeg() {
        let config = VaultConfig::default();
        let out = config.default_output_path(Path::new("holiday.JPG"));
        assert_eq!(out, PathBuf::from("holiday_hidden.png"));
    }

    #[test]
    fn test_default_output_path_replaces_gif() {
        let config = VaultConfig::default();
        let out = config.default_output_path(Path::new("anim.gif"));
        assert_eq!(out, PathBuf::from("anim_hidden.png"));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.toml");
        fs::write(&path, "[output]\nhidden_suffix = \"_stego\"\n").unwrap();

        let config = VaultConfig::from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.output.hidden_suffix, "_stego");
        assert_eq!(config.output.default_format, "png");
    }
}
