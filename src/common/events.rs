//! # Task Events
//!
//! Defines everything a running hide or extract task tells its observer:
//! - Phase transitions of the task state machine
//! - Monotonic progress percentages
//! - Human-readable status lines
//! - The final outcome
//!
//! Events flow one way, from the task to the observer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// STATE MACHINE
// ============================================================================

/// Phase of a running task.
///
/// Hide: `Idle -> Preparing -> (Encrypting) -> Encoding -> Done | Failed`
///
/// Extract: `Idle -> Decoding -> (Decrypting) -> Unpacking -> Done | Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskPhase {
    Idle,
    Preparing,
    Encrypting,
    Encoding,
    Decoding,
    Decrypting,
    Unpacking,
    Done,
    Failed,
}

impl TaskPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskPhase::Done | TaskPhase::Failed)
    }
}

impl fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskPhase::Idle => "idle",
            TaskPhase::Preparing => "preparing",
            TaskPhase::Encrypting => "encrypting",
            TaskPhase::Encoding => "encoding",
            TaskPhase::Decoding => "decoding",
            TaskPhase::Decrypting => "decrypting",
            TaskPhase::Unpacking => "unpacking",
            TaskPhase::Done => "done",
            TaskPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

// ============================================================================
// EVENTS
// ============================================================================

/// Final result of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskOutcome {
    /// Hide succeeded; carries the path of the written stego image.
    Hidden { output_path: PathBuf },

    /// Extract succeeded; carries the written files in archive order.
    ///
    /// Records that failed to unpack or write are absent, so this may be
    /// shorter than the archive's declared count.
    Extracted { files: Vec<PathBuf> },

    /// The task aborted. `message` is the human-readable reason.
    Failed { message: String },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, TaskOutcome::Failed { .. })
    }
}

/// A single notification emitted by a running task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskEvent {
    /// **Phase** - the state machine moved to a new phase.
    Phase(TaskPhase),

    /// **Progress** - overall completion in percent (0-100), never decreasing.
    Progress(u8),

    /// **Status** - a line of status text for the user.
    Status(String),

    /// **Finished** - the last event a task emits.
    Finished(TaskOutcome),
}
