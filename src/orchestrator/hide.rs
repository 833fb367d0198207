//! # Hide Pipeline
//!
//! Input files -> record blocks -> archive -> (envelope) -> LSB embed -> stego image.
//!
//! Progress: preparing the files covers 0-50%, embedding and saving 50-100%.

use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::sink::{EventSink, Reporter};
use crate::common::{Result, StegoError, TaskOutcome, TaskPhase};
use crate::container::{archive, record};
use crate::encryption::envelope;
use crate::processing::{steganography, CarrierImage};

/// Everything needed to hide a batch of files in one carrier image.
#[derive(Debug, Clone)]
pub struct HideRequest {
    pub image_path: PathBuf,
    pub output_path: PathBuf,
    pub files: Vec<PathBuf>,
    pub password: Option<String>,
}

impl HideRequest {
    pub fn new(image_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>, files: Vec<PathBuf>) -> Self {
        Self {
            image_path: image_path.into(),
            output_path: output_path.into(),
            files,
            password: None,
        }
    }

    /// Set the password; an empty string means no encryption.
    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password.filter(|p| !p.is_empty());
        self
    }

    /// Check the request before any work starts.
    pub fn validate(&self) -> Result<()> {
        if !self.image_path.is_file() {
            return Err(StegoError::invalid_request("Please select a valid carrier image."));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(StegoError::invalid_request("Please specify an output image path."));
        }
        if self.files.is_empty() {
            return Err(StegoError::invalid_request("Please add at least one file to hide."));
        }
        if let Some(missing) = self.files.iter().find(|f| !f.is_file()) {
            return Err(StegoError::invalid_request(format!("File not found: {}", missing.display())));
        }
        Ok(())
    }
}

/// Run a hide request to completion, reporting through `sink`.
///
/// Always ends with a `Finished` event carrying the same outcome as returned.
pub fn run_hide<S: EventSink + ?Sized>(request: &HideRequest, sink: &mut S) -> TaskOutcome {
    let mut reporter = Reporter::new(sink);

    let outcome = match hide_files(request, &mut reporter) {
        Ok(output_path) => TaskOutcome::Hidden { output_path },
        Err(e) => {
            error!("Hide failed: {}", e);
            reporter.status(format!("Error: {e}"));
            TaskOutcome::Failed {
                message: e.to_string(),
            }
        }
    };

    reporter.finish(outcome.clone());
    outcome
}

fn hide_files<S: EventSink + ?Sized>(request: &HideRequest, reporter: &mut Reporter<'_, S>) -> Result<PathBuf> {
    request.validate()?;

    // ========== STEP 1: Pack every input file ==========
    reporter.enter(TaskPhase::Preparing);
    let total = request.files.len();
    let mut blocks = Vec::with_capacity(total);

    for (i, file_path) in request.files.iter().enumerate() {
        reporter.status(format!(
            "Preparing file {}/{}: {}",
            i + 1,
            total,
            display_name(file_path)
        ));
        let content = fs::read(file_path)?;
        blocks.push(record::pack(file_path, &content)?);
        reporter.progress(((i + 1) * 50 / total) as u8);
    }

    let mut payload = archive::pack(&blocks)?;
    drop(blocks);

    // ========== STEP 2: Encrypt the whole archive once ==========
    if let Some(password) = &request.password {
        reporter.enter(TaskPhase::Encrypting);
        reporter.status("Encrypting data...");
        payload = envelope::encrypt(&payload, password)?;
    }

    // ========== STEP 3: Embed and save ==========
    let mut carrier = CarrierImage::open(&request.image_path)?;
    steganography::ensure_capacity(&carrier, payload.len())?;

    reporter.enter(TaskPhase::Encoding);
    reporter.status("Hiding data in image...");
    steganography::embed_with_progress(&mut carrier, &payload, |fraction| {
        reporter.progress_within(50, 95, fraction)
    })?;
    carrier.save(&request.output_path)?;
    reporter.progress(100);

    info!(
        "Hid {} file(s), {} payload bytes, in {}",
        total,
        payload.len(),
        request.output_path.display()
    );
    reporter.status("Files successfully hidden in image");
    Ok(request.output_path.clone())
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TaskEvent;
    use image::{Rgb, RgbImage};

    fn write_carrier(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_hide_emits_events_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let carrier = write_carrier(dir.path(), "carrier.png", 64, 64);
        let secret = dir.path().join("secret.txt");
        fs::write(&secret, b"top secret").unwrap();
        let output = dir.path().join("out.png");

        let request = HideRequest::new(&carrier, &output, vec![secret]);
        let mut events = Vec::new();
        let outcome = run_hide(&request, &mut events);

        assert_eq!(outcome, TaskOutcome::Hidden { output_path: output.clone() });
        assert!(output.is_file());

        let phases: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                TaskEvent::Phase(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(phases, [TaskPhase::Preparing, TaskPhase::Encoding, TaskPhase::Done]);

        let progress: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                TaskEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(progress.first(), Some(&50));
        assert_eq!(progress.last(), Some(&100));
        assert!(progress.windows(2).all(|w| w[0] < w[1]));

        assert!(events.contains(&TaskEvent::Status("Preparing file 1/1: secret.txt".to_string())));
        assert_eq!(events.last(), Some(&TaskEvent::Finished(outcome)));
    }

    #[test]
    fn test_empty_password_means_plain() {
        let request = HideRequest::new("a.png", "b.png", vec![]).with_password(Some(String::new()));
        assert!(request.password.is_none());
    }

    #[test]
    fn test_too_small_carrier_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let carrier = write_carrier(dir.path(), "tiny.png", 8, 8);
        let secret = dir.path().join("big.bin");
        fs::write(&secret, vec![0u8; 500]).unwrap();
        let output = dir.path().join("out.png");

        let mut events = Vec::new();
        let outcome = run_hide(&HideRequest::new(&carrier, &output, vec![secret]), &mut events);

        match outcome {
            TaskOutcome::Failed { message } => assert!(message.contains("too small")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(!output.exists());
        assert!(events.contains(&TaskEvent::Phase(TaskPhase::Failed)));
    }

    #[test]
    fn test_validation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let carrier = write_carrier(dir.path(), "c.png", 8, 8);
        let out = dir.path().join("o.png");

        let missing_image = HideRequest::new(dir.path().join("nope.png"), &out, vec![carrier.clone()]);
        assert!(matches!(missing_image.validate(), Err(StegoError::InvalidRequest(_))));

        let no_files = HideRequest::new(&carrier, &out, vec![]);
        assert!(no_files.validate().unwrap_err().to_string().contains("at least one file"));

        let missing_file = HideRequest::new(&carrier, &out, vec![dir.path().join("ghost.txt")]);
        let err = missing_file.validate().unwrap_err();
        assert!(matches!(err, StegoError::InvalidRequest(_)));
        assert!(err.to_string().contains("File not found"));
    }
}
