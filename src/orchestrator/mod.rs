//! # Orchestrator
//!
//! Sequences the record, archive, envelope and LSB layers for one "hide" or
//! "extract" run and reports progress to an observer.
//!
//! ## Modules
//!
//! - [`hide`]: `Idle -> Preparing -> (Encrypting) -> Encoding -> Done | Failed`
//! - [`extract`]: `Idle -> Decoding -> (Decrypting) -> Unpacking -> Done | Failed`
//! - [`sink`]: the [`EventSink`] trait and monotonic progress reporting
//! - [`task`]: background execution with a channel of [`TaskEvent`](crate::common::TaskEvent)s

pub mod extract;
pub mod hide;
pub mod sink;
pub mod task;

pub use extract::{run_extract, ExtractRequest};
pub use hide::{run_hide, HideRequest};
pub use sink::EventSink;
pub use task::{spawn_extract, spawn_hide, TaskHandle};
