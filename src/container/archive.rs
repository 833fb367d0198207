//! # Archive
//!
//! Batch container for record blocks:
//!
//! ```text
//! COUNT (4, big-endian) | { RECLEN (4, big-endian) | RECORD (RECLEN bytes) } * COUNT
//! ```
//!
//! Unpacking is lenient in two ways:
//! - A record that fails to parse becomes a per-entry error; the rest still unpack.
//! - Running out of bytes before `COUNT` records stops iteration and marks the
//!   archive truncated instead of failing.

use log::warn;

use super::record::{self, FileRecord};
use crate::common::{Result, StegoError};

/// Result of unpacking an archive.
#[derive(Debug)]
pub struct UnpackedArchive {
    /// Record count written in the archive header.
    pub declared_count: u32,
    /// One entry per record block found, in archive order.
    pub entries: Vec<Result<FileRecord>>,
    /// The buffer ended before `declared_count` blocks were read.
    pub truncated: bool,
}

impl UnpackedArchive {
    pub fn records(&self) -> impl Iterator<Item = &FileRecord> {
        self.entries.iter().filter_map(|e| e.as_ref().ok())
    }

    pub fn into_records(self) -> Vec<FileRecord> {
        self.entries.into_iter().filter_map(|e| e.ok()).collect()
    }
}

/// Pack pre-built record blocks, preserving their order.
pub fn pack<B: AsRef<[u8]>>(records: &[B]) -> Result<Vec<u8>> {
    let count = u32::try_from(records.len())
        .map_err(|_| StegoError::format("Too many files for one archive"))?;
    let total: usize = records.iter().map(|r| 4 + r.as_ref().len()).sum();

    let mut out = Vec::with_capacity(4 + total);
    out.extend_from_slice(&count.to_be_bytes());
    for record in records {
        let record = record.as_ref();
        let len = u32::try_from(record.len())
            .map_err(|_| StegoError::format("File record is too large"))?;
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(record);
    }
    Ok(out)
}

/// Read the declared record count from an archive header.
pub fn declared_count(data: &[u8]) -> Result<u32> {
    match data.get(..4) {
        Some(head) => Ok(u32::from_be_bytes([head[0], head[1], head[2], head[3]])),
        None => Err(StegoError::format("Hidden data is too short to hold a file count")),
    }
}

/// Walk the record blocks of an archive without parsing them.
///
/// Yields borrowed slices in archive order and stops at the first block whose
/// size field or body runs past the end of `data`.
pub struct BlockIter<'a> {
    data: &'a [u8],
    offset: usize,
    remaining: u32,
    truncated: bool,
}

impl<'a> BlockIter<'a> {
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let remaining = declared_count(data)?;
        Ok(Self {
            data,
            offset: 4,
            remaining,
            truncated: false,
        })
    }

    /// True once iteration stopped early because the data ran out.
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> Iterator for BlockIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let data: &'a [u8] = self.data;
        let header_end = self.offset + 4;
        let block = data.get(self.offset..header_end).and_then(|len| {
            let len = u32::from_be_bytes([len[0], len[1], len[2], len[3]]) as usize;
            let end = header_end.checked_add(len)?;
            data.get(header_end..end).map(|block| (block, end))
        });

        match block {
            Some((block, end)) => {
                self.offset = end;
                self.remaining -= 1;
                Some(block)
            }
            None => {
                warn!(
                    "Archive truncated at byte {} with {} record(s) still declared",
                    self.offset, self.remaining
                );
                self.truncated = true;
                self.remaining = 0;
                None
            }
        }
    }
}

/// Unpack every record of an archive.
///
/// Only a missing count header is an error; see the module docs for how
/// damaged records and truncation are reported.
pub fn unpack(data: &[u8]) -> Result<UnpackedArchive> {
    let declared_count = declared_count(data)?;
    let mut blocks = BlockIter::new(data)?;

    let mut entries = Vec::new();
    for (index, block) in blocks.by_ref().enumerate() {
        let entry = record::unpack(block);
        if let Err(e) = &entry {
            warn!("Skipping damaged record {}: {}", index + 1, e);
        }
        entries.push(entry);
    }

    Ok(UnpackedArchive {
        declared_count,
        entries,
        truncated: blocks.truncated(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::record::FileMetadata;
    use std::path::Path;

    fn block(name: &str, content: &[u8]) -> Vec<u8> {
        let metadata = FileMetadata {
            filename: name.to_string(),
            size: content.len() as u64,
            timestamp: "2024-01-01T00:00:00".to_string(),
        };
        record::pack_with_metadata(&metadata, content).unwrap()
    }

    #[test]
    fn test_batch_keeps_order() {
        let blocks = vec![
            block("one.txt", b"1"),
            block("two.bin", &[0u8, 255, 7]),
            block("three.md", b"# three"),
        ];
        let archive = pack(&blocks).unwrap();
        let unpacked = unpack(&archive).unwrap();

        assert_eq!(unpacked.declared_count, 3);
        assert!(!unpacked.truncated);
        let names: Vec<_> = unpacked.records().map(|r| r.metadata.filename.as_str()).collect();
        assert_eq!(names, ["one.txt", "two.bin", "three.md"]);
        let records = unpacked.into_records();
        assert_eq!(records[1].content, vec![0u8, 255, 7]);
    }

    #[test]
    fn test_layout() {
        let archive = pack(&[vec![9u8, 9], vec![1u8]]).unwrap();
        assert_eq!(archive, vec![0, 0, 0, 2, 0, 0, 0, 2, 9, 9, 0, 0, 0, 1, 1]);
    }

    #[test]
    fn test_count_beyond_data_is_truncation() {
        let mut archive = pack(&[block("a", b"aa"), block("b", b"bb")]).unwrap();
        archive[..4].copy_from_slice(&5u32.to_be_bytes());

        let unpacked = unpack(&archive).unwrap();
        assert_eq!(unpacked.declared_count, 5);
        assert_eq!(unpacked.entries.len(), 2);
        assert!(unpacked.entries.iter().all(|e| e.is_ok()));
        assert!(unpacked.truncated);
    }

    #[test]
    fn test_size_past_end_is_truncation() {
        let mut archive = pack(&[block("a", b"aa"), block("b", b"bbbb")]).unwrap();
        archive.truncate(archive.len() - 2);

        let unpacked = unpack(&archive).unwrap();
        assert_eq!(unpacked.entries.len(), 1);
        assert!(unpacked.truncated);
    }

    #[test]
    fn test_bad_record_is_skipped() {
        let blocks = vec![
            block("good1", b"x"),
            b"\x00\x00\x00\x03{{{garbage".to_vec(),
            block("good2", b"y"),
        ];
        let unpacked = unpack(&pack(&blocks).unwrap()).unwrap();

        assert_eq!(unpacked.entries.len(), 3);
        assert!(matches!(unpacked.entries[1], Err(StegoError::Format(_))));
        let names: Vec<_> = unpacked.records().map(|r| r.metadata.filename.clone()).collect();
        assert_eq!(names, ["good1", "good2"]);
    }

    #[test]
    fn test_empty_archive() {
        let unpacked = unpack(&pack::<Vec<u8>>(&[]).unwrap()).unwrap();
        assert_eq!(unpacked.declared_count, 0);
        assert!(unpacked.entries.is_empty());
        assert!(!unpacked.truncated);
    }

    #[test]
    fn test_missing_count_is_format_error() {
        assert!(matches!(unpack(&[0, 1]), Err(StegoError::Format(_))));
    }

    #[test]
    fn test_packs_real_records() {
        let a = record::pack(Path::new("dir/a.txt"), b"alpha").unwrap();
        let unpacked = unpack(&pack(&[a]).unwrap()).unwrap();
        let records = unpacked.into_records();
        assert_eq!(records[0].metadata.filename, "a.txt");
        assert_eq!(records[0].content, b"alpha");
    }
}
