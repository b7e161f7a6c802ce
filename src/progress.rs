//! Progress reporting for the slow steps of a query: loading the grid and reading the search
//! window.
//!
//! Reporters are synchronous side channels. They must return quickly and do nothing when
//! disabled.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Receives the start, intermediate stages and end of a long-running operation.
///
/// Reporters are `Send` so an atlas holding one can be moved to a worker thread.
pub trait ProgressReporter: Send {
    /// Begin a new operation. A disabled reporter ignores every call until the next `start`.
    fn start(&mut self, label: &str, disabled: bool);
    /// Report the completion percentage, 0 to 100.
    fn update(&mut self, percent: u8);
    /// The operation is over, successfully or not.
    fn end(&mut self);
}

/// A reporter that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    #[inline]
    fn start(&mut self, _label: &str, _disabled: bool) {}
    #[inline]
    fn update(&mut self, _percent: u8) {}
    #[inline]
    fn end(&mut self) {}
}

/// A reporter that emits `debug` level tracing events.
#[derive(Debug, Clone, Default)]
pub struct TracingProgress {
    label: Option<String>,
}

impl ProgressReporter for TracingProgress {
    fn start(&mut self, label: &str, disabled: bool) {
        if disabled {
            self.label = None;
            return;
        }
        debug!(label, "progress started");
        self.label = Some(label.to_owned());
    }

    fn update(&mut self, percent: u8) {
        if let Some(ref label) = self.label {
            debug!(label = label.as_str(), percent = percent.min(100), "progress");
        }
    }

    fn end(&mut self) {
        if let Some(label) = self.label.take() {
            debug!(label = label.as_str(), "progress ended");
        }
    }
}

/// A call received by a [`RecordingProgress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// `start` with its label; disabled starts are not recorded.
    Start(String),
    /// `update` with its percentage.
    Update(u8),
    /// `end`.
    End,
}

/// A reporter keeping the calls it receives. Clones share the same record, so a clone can be
/// handed to an atlas and the original inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
    disabled: bool,
}

impl RecordingProgress {
    fn record(&self) -> MutexGuard<'_, Vec<ProgressEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every call recorded so far, oldest first.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.record().clone()
    }

    /// Just the percentages, in the order they were reported.
    pub fn percentages(&self) -> Vec<u8> {
        self.record()
            .iter()
            .filter_map(|ev| match ev {
                ProgressEvent::Update(pc) => Some(*pc),
                _ => None,
            })
            .collect()
    }
}

impl ProgressReporter for RecordingProgress {
    fn start(&mut self, label: &str, disabled: bool) {
        self.disabled = disabled;
        if !disabled {
            self.record().push(ProgressEvent::Start(label.to_owned()));
        }
    }

    fn update(&mut self, percent: u8) {
        if !self.disabled {
            self.record().push(ProgressEvent::Update(percent));
        }
    }

    fn end(&mut self) {
        if !self.disabled {
            self.record().push(ProgressEvent::End);
        }
        self.disabled = false;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tracing_progress_disabled() {
        let mut progress = TracingProgress::default();

        progress.start("Download RTOFS", true);
        assert!(progress.label.is_none());
        progress.update(30);
        progress.end();
        assert!(progress.label.is_none());
    }

    #[test]
    fn test_tracing_progress_lifecycle() {
        let mut progress = TracingProgress::default();

        progress.start("Retrieve RTOFS data", false);
        assert_eq!(progress.label.as_deref(), Some("Retrieve RTOFS data"));
        progress.update(40);
        progress.end();
        assert!(progress.label.is_none());
    }

    #[test]
    fn test_recording_progress() {
        let progress = RecordingProgress::default();
        let mut reporter = progress.clone();

        reporter.start("Download RTOFS", false);
        reporter.update(30);
        reporter.end();
        reporter.start("quiet", true);
        reporter.update(50);
        reporter.end();

        assert_eq!(
            progress.events(),
            vec![
                ProgressEvent::Start("Download RTOFS".to_owned()),
                ProgressEvent::Update(30),
                ProgressEvent::End,
            ]
        );
        assert_eq!(progress.percentages(), vec![30]);
    }

    #[test]
    fn test_recording_progress_across_threads() {
        let progress = RecordingProgress::default();
        let mut reporter = progress.clone();

        std::thread::spawn(move || {
            reporter.start("Download RTOFS", false);
            reporter.update(100);
            reporter.end();
        })
        .join()
        .unwrap();

        assert_eq!(progress.percentages(), vec![100]);
    }
}
