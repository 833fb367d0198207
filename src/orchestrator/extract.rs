//! # Extract Pipeline
//!
//! Stego image -> LSB extract -> (envelope) -> archive -> files on disk.
//!
//! Progress: pixel decoding covers 0-30%, decryption 30-50%, and unpacking
//! 50-100% split evenly over the declared file count.
//!
//! A record that cannot be parsed or written is reported and skipped; the run
//! still succeeds with the files that were recovered.

use log::{error, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use super::hide::display_name;
use super::sink::{EventSink, Reporter};
use crate::common::{Result, StegoError, TaskOutcome, TaskPhase};
use crate::container::{archive, FileRecord};
use crate::encryption::envelope;
use crate::processing::{steganography, CarrierImage};

/// Everything needed to recover files from a stego image.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub image_path: PathBuf,
    pub output_dir: PathBuf,
    pub password: Option<String>,
}

impl ExtractRequest {
    pub fn new(image_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            output_dir: output_dir.into(),
            password: None,
        }
    }

    /// Set the password; an empty string counts as none.
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password.filter(|p| !p.is_empty());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.image_path.is_file() {
            return Err(StegoError::invalid_request("Please select a valid image."));
        }
        if !self.output_dir.is_dir() {
            return Err(StegoError::invalid_request("Please specify a valid output directory."));
        }
        Ok(())
    }
}

/// Run an extract request to completion, reporting through `sink`.
///
/// Always ends with a `Finished` event carrying the same outcome as returned.
pub fn run_extract<S: EventSink + ?Sized>(request: &ExtractRequest, sink: &mut S) -> TaskOutcome {
    let mut reporter = Reporter::new(sink);

    let outcome = match extract_files(request, &mut reporter) {
        Ok(files) => TaskOutcome::Extracted { files },
        Err(e) => {
            error!("Extract failed: {}", e);
            reporter.status(format!("Error: {e}"));
            TaskOutcome::Failed {
                message: e.to_string(),
            }
        }
    };

    reporter.finish(outcome.clone());
    outcome
}

fn extract_files<S: EventSink + ?Sized>(request: &ExtractRequest, reporter: &mut Reporter<'_, S>) -> Result<Vec<PathBuf>> {
    request.validate()?;

    // ========== STEP 1: Read the payload out of the pixels ==========
    reporter.enter(TaskPhase::Decoding);
    reporter.status("Extracting data from image...");
    let carrier = CarrierImage::open(&request.image_path)?;
    let mut data = steganography::extract_with_progress(&carrier, |fraction| {
        reporter.progress_within(0, 30, fraction)
    });
    drop(carrier);
    if data.is_empty() {
        return Err(StegoError::format("No hidden data found in the image"));
    }
    reporter.progress(30);

    // ========== STEP 2: Decrypt if the envelope marker is present ==========
    if envelope::is_encrypted(&data) {
        let password = request.password.as_deref().ok_or(StegoError::PasswordRequired)?;
        reporter.enter(TaskPhase::Decrypting);
        reporter.status("Decrypting data...");
        data = envelope::decrypt(&data, password)?;
    }
    reporter.progress(50);

    // ========== STEP 3: Unpack and write each record ==========
    reporter.enter(TaskPhase::Unpacking);
    let unpacked = archive::unpack(&data)?;
    let declared = unpacked.declared_count as usize;
    reporter.status(format!("Found {} hidden files", declared));

    let found = unpacked.entries.len();
    let mut written = Vec::with_capacity(found);
    for (i, entry) in unpacked.entries.into_iter().enumerate() {
        match entry.and_then(|record| write_record(&request.output_dir, record)) {
            Ok(path) => {
                reporter.status(format!("Extracted: {}", display_name(&path)));
                written.push(path);
            }
            Err(e) => {
                warn!("Record {} could not be extracted: {}", i + 1, e);
                reporter.status(format!("Error extracting file {}: {}", i + 1, e));
            }
        }
        reporter.progress((50 + (i + 1) * 50 / declared) as u8);
    }

    if unpacked.truncated {
        reporter.status(format!(
            "Hidden data ended after {} of {} files",
            found, declared
        ));
    }

    reporter.progress(100);
    info!(
        "Extracted {} of {} declared file(s) into {}",
        written.len(),
        declared,
        request.output_dir.display()
    );
    reporter.status(format!("Successfully extracted {} files", written.len()));
    Ok(written)
}

/// Write a recovered file into `dir` under its recorded base name.
fn write_record(dir: &Path, record: FileRecord) -> Result<PathBuf> {
    let name = safe_file_name(&record.metadata.filename)
        .ok_or_else(|| StegoError::format(format!("Invalid file name {:?}", record.metadata.filename)))?;
    let path = unique_path(dir, &name);
    fs::write(&path, &record.content)?;
    Ok(path)
}

/// Strip any directory components a crafted name might carry.
fn safe_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next()?;
    match base {
        "" | "." | ".." => None,
        _ => Some(base.to_string()),
    }
}

/// `dir/name`, or `dir/<stem>_<n>.<ext>` with the smallest `n` not yet taken.
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let as_path = Path::new(name);
    let stem = as_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let ext = as_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1u32;
    loop {
        let candidate = dir.join(format!("{stem}_{counter}{ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("report.pdf").as_deref(), Some("report.pdf"));
        assert_eq!(safe_file_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(safe_file_name("C:\\Users\\me\\notes.txt").as_deref(), Some("notes.txt"));
        assert_eq!(safe_file_name(".."), None);
        assert_eq!(safe_file_name("dir/"), None);
        assert_eq!(safe_file_name(""), None);
    }

    #[test]
    fn test_unique_path_adds_counter() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(unique_path(dir.path(), "a.txt"), dir.path().join("a.txt"));

        fs::write(dir.path().join("a.txt"), b"").unwrap();
        assert_eq!(unique_path(dir.path(), "a.txt"), dir.path().join("a_1.txt"));

        fs::write(dir.path().join("a_1.txt"), b"").unwrap();
        assert_eq!(unique_path(dir.path(), "a.txt"), dir.path().join("a_2.txt"));

        fs::write(dir.path().join("Makefile"), b"").unwrap();
        assert_eq!(unique_path(dir.path(), "Makefile"), dir.path().join("Makefile_1"));
    }

    #[test]
    fn test_validation() {
        let dir = tempfile::tempdir().unwrap();
        let request = ExtractRequest::new(dir.path().join("none.png"), dir.path());
        let err = request.validate().unwrap_err();
        assert!(matches!(err, StegoError::InvalidRequest(_)));
        assert!(err.to_string().contains("valid image"));

        let image = dir.path().join("img.png");
        fs::write(&image, b"not really").unwrap();
        let request = ExtractRequest::new(&image, dir.path().join("missing"));
        assert!(request.validate().unwrap_err().to_string().contains("output directory"));
    }
}
