//! Event delivery from a running pipeline to its observer.

use log::{debug, info};
use tokio::sync::mpsc;

use crate::common::{TaskEvent, TaskOutcome, TaskPhase};

/// Receiver side of task notifications.
///
/// `emit` is called from the task itself and must return quickly.
pub trait EventSink {
    fn emit(&mut self, event: TaskEvent);
}

impl EventSink for mpsc::UnboundedSender<TaskEvent> {
    fn emit(&mut self, event: TaskEvent) {
        // A dropped receiver means nobody is watching; the task still runs to completion.
        if self.send(event).is_err() {
            debug!("Event receiver dropped");
        }
    }
}

impl EventSink for Vec<TaskEvent> {
    fn emit(&mut self, event: TaskEvent) {
        self.push(event);
    }
}

/// Wraps a sink with the task's phase and a progress value that never goes
/// backwards.
pub struct Reporter<'a, S: EventSink + ?Sized> {
    sink: &'a mut S,
    phase: TaskPhase,
    progress: u8,
}

impl<'a, S: EventSink + ?Sized> Reporter<'a, S> {
    pub fn new(sink: &'a mut S) -> Self {
        Self {
            sink,
            phase: TaskPhase::Idle,
            progress: 0,
        }
    }

    pub fn enter(&mut self, phase: TaskPhase) {
        if self.phase != phase {
            debug!("Task phase {} -> {}", self.phase, phase);
            self.phase = phase;
            self.sink.emit(TaskEvent::Phase(phase));
        }
    }

    /// Report `percent`, clamped to 100. Values at or below the last
    /// reported one are dropped.
    pub fn progress(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent > self.progress {
            self.progress = percent;
            self.sink.emit(TaskEvent::Progress(percent));
        }
    }

    /// Map `fraction` of the `[start, end]` progress band.
    pub fn progress_within(&mut self, start: u8, end: u8, fraction: f32) {
        let fraction = fraction.clamp(0.0, 1.0);
        let span = end.saturating_sub(start) as f32;
        self.progress(start + (span * fraction) as u8);
    }

    pub fn status(&mut self, text: impl Into<String>) {
        let text = text.into();
        info!("{}", text);
        self.sink.emit(TaskEvent::Status(text));
    }

    /// Move to `Done` or `Failed` and emit the final event.
    pub fn finish(&mut self, outcome: TaskOutcome) {
        if outcome.is_success() {
            self.progress(100);
            self.enter(TaskPhase::Done);
        } else {
            self.enter(TaskPhase::Failed);
        }
        self.sink.emit(TaskEvent::Finished(outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic() {
        let mut events = Vec::new();
        let mut reporter = Reporter::new(&mut events);
        reporter.progress(10);
        reporter.progress(5);
        reporter.progress(10);
        reporter.progress(250);
        assert_eq!(events, vec![TaskEvent::Progress(10), TaskEvent::Progress(100)]);
    }

    #[test]
    fn test_progress_within_band() {
        let mut events = Vec::new();
        let mut reporter = Reporter::new(&mut events);
        reporter.progress_within(50, 100, 0.5);
        reporter.progress_within(50, 100, 2.0);
        assert_eq!(events, vec![TaskEvent::Progress(75), TaskEvent::Progress(100)]);
    }

    #[test]
    fn test_finish_failed() {
        let mut events = Vec::new();
        let mut reporter = Reporter::new(&mut events);
        reporter.enter(TaskPhase::Preparing);
        reporter.enter(TaskPhase::Preparing);
        let outcome = TaskOutcome::Failed {
            message: "boom".to_string(),
        };
        reporter.finish(outcome.clone());
        // already Failed, no second phase event
        reporter.enter(TaskPhase::Failed);
        assert_eq!(
            events,
            vec![
                TaskEvent::Phase(TaskPhase::Preparing),
                TaskEvent::Phase(TaskPhase::Failed),
                TaskEvent::Finished(outcome),
            ]
        );
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (mut tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        tx.emit(TaskEvent::Progress(1));
    }
}
