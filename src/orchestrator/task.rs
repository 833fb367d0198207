//! # Background Tasks
//!
//! Runs a hide or extract pipeline on tokio's blocking pool so the pixel walk
//! never stalls the caller, and streams its events over an unbounded
//! single-producer channel.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let mut task = spawn_hide(HideRequest::new("cat.png", "cat_hidden.png", files));
//! while let Some(event) = task.next_event().await {
//!     println!("{event:?}");
//! }
//! let outcome = task.wait().await?;
//! ```
//!
//! There is no cancellation: once spawned, a task runs to `Done` or `Failed`.
//! Callers that must not run two tasks on the same slot have to enforce that
//! themselves.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::extract::{run_extract, ExtractRequest};
use super::hide::{run_hide, HideRequest};
use crate::common::{Result, StegoError, TaskEvent, TaskOutcome};

/// Handle to a running task: its event stream plus its completion.
pub struct TaskHandle {
    events: mpsc::UnboundedReceiver<TaskEvent>,
    join: JoinHandle<TaskOutcome>,
}

impl TaskHandle {
    /// Next event, or `None` once the task has finished and every event was read.
    pub async fn next_event(&mut self) -> Option<TaskEvent> {
        self.events.recv().await
    }

    /// Wait for the task and return its outcome. Unread events are discarded.
    pub async fn wait(self) -> Result<TaskOutcome> {
        self.join
            .await
            .map_err(|e| StegoError::Task(format!("Task panicked: {e}")))
    }

    /// Drain every event until the channel closes, then return the outcome.
    pub async fn collect(mut self) -> Result<(Vec<TaskEvent>, TaskOutcome)> {
        let mut events = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        let outcome = self.wait().await?;
        Ok((events, outcome))
    }
}

/// Start a hide task. Must be called from within a tokio runtime.
pub fn spawn_hide(request: HideRequest) -> TaskHandle {
    let (mut tx, events) = mpsc::unbounded_channel();
    let join = tokio::task::spawn_blocking(move || run_hide(&request, &mut tx));
    TaskHandle { events, join }
}

/// Start an extract task. Must be called from within a tokio runtime.
pub fn spawn_extract(request: ExtractRequest) -> TaskHandle {
    let (mut tx, events) = mpsc::unbounded_channel();
    let join = tokio::task::spawn_blocking(move || run_extract(&request, &mut tx));
    TaskHandle { events, join }
}
