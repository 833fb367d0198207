//! # File Record
//!
//! One file packed into a self-describing block:
//!
//! ```text
//! METALEN (4, big-endian) | METADATA (UTF-8 JSON, METALEN bytes) | CONTENT (rest)
//! ```
//!
//! Metadata keys are `filename` (base name only), `size` and `timestamp` (ISO-8601).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::common::{Result, StegoError};

/// Metadata stored ahead of each file's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub filename: String,
    pub size: u64,
    pub timestamp: String,
}

impl FileMetadata {
    /// Metadata for `file_path` holding `size` bytes, stamped with the local time.
    pub fn for_path(file_path: &Path, size: u64) -> Self {
        let filename = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            filename,
            size,
            timestamp: chrono::Local::now()
                .naive_local()
                .format("%Y-%m-%dT%H:%M:%S%.6f")
                .to_string(),
        }
    }
}

/// A file recovered from a record block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub metadata: FileMetadata,
    pub content: Vec<u8>,
}

/// Pack `content` read from `file_path` into a record block.
pub fn pack(file_path: &Path, content: &[u8]) -> Result<Vec<u8>> {
    let metadata = FileMetadata::for_path(file_path, content.len() as u64);
    pack_with_metadata(&metadata, content)
}

/// Pack with caller-supplied metadata.
pub fn pack_with_metadata(metadata: &FileMetadata, content: &[u8]) -> Result<Vec<u8>> {
    let meta_bytes = serde_json::to_vec(metadata)?;
    let meta_len = u32::try_from(meta_bytes.len())
        .map_err(|_| StegoError::format("File metadata is too large"))?;

    let mut block = Vec::with_capacity(4 + meta_bytes.len() + content.len());
    block.extend_from_slice(&meta_len.to_be_bytes());
    block.extend_from_slice(&meta_bytes);
    block.extend_from_slice(content);
    Ok(block)
}

/// Split a record block back into metadata and content.
///
/// Fails with [`StegoError::Format`] when the length prefix is missing or
/// points past the block, or when the metadata is not valid JSON.
pub fn unpack(block: &[u8]) -> Result<FileRecord> {
    if block.len() < 4 {
        return Err(StegoError::format("Invalid metadata format"));
    }
    let meta_len = u32::from_be_bytes([block[0], block[1], block[2], block[3]]) as usize;
    let meta_end = 4usize
        .checked_add(meta_len)
        .filter(|&end| end <= block.len())
        .ok_or_else(|| StegoError::format("Invalid metadata format"))?;

    let metadata: FileMetadata = serde_json::from_slice(&block[4..meta_end])
        .map_err(|e| StegoError::format(format!("Invalid metadata format: {e}")))?;

    Ok(FileRecord {
        metadata,
        content: block[meta_end..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_uses_base_name() {
        let block = pack(Path::new("/home/user/docs/report.pdf"), b"%PDF-1.7").unwrap();
        let record = unpack(&block).unwrap();
        assert_eq!(record.metadata.filename, "report.pdf");
        assert_eq!(record.metadata.size, 8);
        assert_eq!(record.content, b"%PDF-1.7");
    }

    #[test]
    fn test_layout() {
        let metadata = FileMetadata {
            filename: "a.txt".to_string(),
            size: 2,
            timestamp: "2024-01-02T03:04:05.000006".to_string(),
        };
        let block = pack_with_metadata(&metadata, b"hi").unwrap();

        let json = br#"{"filename":"a.txt","size":2,"timestamp":"2024-01-02T03:04:05.000006"}"#;
        assert_eq!(&block[..4], &(json.len() as u32).to_be_bytes());
        assert_eq!(&block[4..4 + json.len()], json);
        assert_eq!(&block[4 + json.len()..], b"hi");
    }

    #[test]
    fn test_timestamp_is_iso8601() {
        let metadata = FileMetadata::for_path(Path::new("x"), 0);
        assert!(chrono::NaiveDateTime::parse_from_str(&metadata.timestamp, "%Y-%m-%dT%H:%M:%S%.f").is_ok());
    }

    #[test]
    fn test_accepts_spaced_json() {
        // Whitespace after separators, as other writers emit it
        let json = br#"{"filename": "n.bin", "size": 3, "timestamp": "2024-05-06T07:08:09"}"#;
        let mut block = (json.len() as u32).to_be_bytes().to_vec();
        block.extend_from_slice(json);
        block.extend_from_slice(&[1, 2, 3]);

        let record = unpack(&block).unwrap();
        assert_eq!(record.metadata.filename, "n.bin");
        assert_eq!(record.content, vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_content() {
        let block = pack(Path::new("empty.dat"), b"").unwrap();
        let record = unpack(&block).unwrap();
        assert_eq!(record.metadata.size, 0);
        assert!(record.content.is_empty());
    }

    #[test]
    fn test_bad_metadata_is_format_error() {
        let mut block = 5u32.to_be_bytes().to_vec();
        block.extend_from_slice(b"nope!content");
        assert!(matches!(unpack(&block), Err(StegoError::Format(_))));

        assert!(matches!(unpack(&[0, 0]), Err(StegoError::Format(_))));

        let mut overlong = 100u32.to_be_bytes().to_vec();
        overlong.extend_from_slice(b"{}");
        assert!(matches!(unpack(&overlong), Err(StegoError::Format(_))));
    }
}
