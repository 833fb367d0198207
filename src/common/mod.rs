//! # Common Components
//!
//! Shared types used by every layer of the vault.
//!
//! ## Modules
//!
//! - [`error`]: The [`StegoError`] taxonomy and crate-wide `Result`
//! - [`events`]: Progress, status and outcome events emitted by running tasks
//! - [`config`]: TOML configuration for the command-line front end

pub mod config;
pub mod error;
pub mod events;

pub use error::{Result, StegoError};
pub use events::{TaskEvent, TaskOutcome, TaskPhase};
