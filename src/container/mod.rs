//! # Containers
//!
//! Byte layouts for the files being hidden.
//!
//! - [`record`]: one file's metadata and content in a single block
//! - [`archive`]: a counted batch of record blocks

pub mod archive;
pub mod record;

pub use archive::UnpackedArchive;
pub use record::{FileMetadata, FileRecord};
