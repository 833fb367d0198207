//! # invisio-vault
//!
//! Hides files inside images by LSB pixel encoding, optionally under a password,
//! and recovers them again.
//!
//! - [`encryption`]: PBKDF2 key derivation and the AES-256-CBC envelope
//! - [`container`]: file record and archive byte layouts
//! - [`processing`]: carrier images and the LSB codec
//! - [`orchestrator`]: hide/extract pipelines run as background tasks
//! - [`common`]: errors, events and configuration

pub mod common;
pub mod container;
pub mod encryption;
pub mod orchestrator;
pub mod processing;

pub use common::{Result, StegoError, TaskEvent, TaskOutcome, TaskPhase};
pub use orchestrator::{spawn_extract, spawn_hide, ExtractRequest, HideRequest, TaskHandle};
pub use processing::CarrierImage;
