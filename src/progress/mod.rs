//! Progress Tracker (`spec.md` §4.12).
//!
//! Converts per-phase progress into an overall completion percentage and
//! emits [`ProgressEvent`]s to a [`ProgressSink`]. `FieldExtract` owns a
//! `(completed, total)` job sub-counter so each finished job advances the
//! phase percent proportionally.

use crate::llm::ProgressSink;
use crate::model::ProgressEvent;
use std::sync::Mutex;

/// One phase of an extraction, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    LoadDoc,
    Chunk,
    IdentifyDomain,
    FieldExtract,
    TemporalNormalize,
    ResultMerging,
    Dedup,
    Format,
    Completion,
    Error,
}

impl Phase {
    const fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::LoadDoc => "load_doc",
            Self::Chunk => "chunk",
            Self::IdentifyDomain => "identify_domain",
            Self::FieldExtract => "field_extraction",
            Self::TemporalNormalize => "temporal_normalize",
            Self::ResultMerging => "result_merging",
            Self::Dedup => "dedup",
            Self::Format => "format",
            Self::Completion => "completion",
            Self::Error => "error",
        }
    }

    /// Cumulative percent of overall work completed before this phase
    /// starts. Ordered to match the pipeline's actual emission order —
    /// per-chunk `ResultMerging` happens before `TemporalNormalize`, which
    /// runs on each chunk's already-merged fields before the cross-chunk
    /// `Dedup` merge — so percent stays non-decreasing across a run.
    const fn base(self) -> u8 {
        match self {
            Self::Init => 0,
            Self::LoadDoc => 5,
            Self::Chunk => 10,
            Self::IdentifyDomain => 15,
            Self::FieldExtract => 25,
            Self::ResultMerging => 75,
            Self::TemporalNormalize => 85,
            Self::Dedup => 90,
            Self::Format => 95,
            Self::Completion | Self::Error => 100,
        }
    }

    /// Share of overall work this phase accounts for.
    const fn weight(self) -> u8 {
        match self {
            Self::Init => 5,
            Self::LoadDoc => 5,
            Self::Chunk => 5,
            Self::IdentifyDomain => 10,
            Self::FieldExtract => 50,
            Self::TemporalNormalize => 5,
            Self::ResultMerging => 10,
            Self::Dedup => 5,
            Self::Format => 5,
            Self::Completion | Self::Error => 0,
        }
    }
}

/// Tracks overall extraction progress across phases and emits events to a
/// [`ProgressSink`]. Its job sub-counter is mutex-guarded so multiple
/// concurrent engine workers can report completion safely.
pub struct ProgressTracker {
    sink: std::sync::Arc<dyn ProgressSink>,
    job_counter: Mutex<(usize, usize)>,
}

impl ProgressTracker {
    /// Creates a tracker that delivers events to `sink`.
    #[must_use]
    pub fn new(sink: std::sync::Arc<dyn ProgressSink>) -> Self {
        Self {
            sink,
            job_counter: Mutex::new((0, 0)),
        }
    }

    /// Emits a progress update for `phase` at `phase_progress` percent
    /// `[0, 100]` of that phase's own work.
    pub fn update(&self, phase: Phase, message: impl Into<String>, phase_progress: u8) {
        let phase_progress = phase_progress.min(100);
        #[allow(clippy::cast_possible_truncation)]
        let overall = (u32::from(phase.base()) + u32::from(phase.weight()) * u32::from(phase_progress) / 100).min(100) as u8;
        (self.sink)(ProgressEvent::new(phase.name(), message, overall, 0));
    }

    /// Resets the `FieldExtract` job sub-counter to `(0, total)`.
    pub fn reset_job_counter(&self, total: usize) {
        if let Ok(mut guard) = self.job_counter.lock() {
            *guard = (0, total);
        }
    }

    /// Records one completed job and emits a `FieldExtract` progress
    /// update proportional to `completed / total`.
    pub fn advance_job(&self) {
        let (completed, total) = {
            let Ok(mut guard) = self.job_counter.lock() else {
                return;
            };
            guard.0 += 1;
            *guard
        };
        #[allow(clippy::cast_possible_truncation)]
        let phase_progress = if total == 0 { 100 } else { ((completed * 100) / total) as u8 };
        self.update(Phase::FieldExtract, format!("completed job {completed}/{total}"), phase_progress);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex as StdMutex};

    fn collecting_sink() -> (Arc<dyn ProgressSink>, Arc<StdMutex<Vec<ProgressEvent>>>) {
        let events = Arc::new(StdMutex::new(Vec::new()));
        let captured = Arc::clone(&events);
        let sink: Arc<dyn ProgressSink> = Arc::new(move |event: ProgressEvent| {
            if let Ok(mut guard) = captured.lock() {
                guard.push(event);
            }
        });
        (sink, events)
    }

    #[test]
    fn test_update_computes_base_plus_weighted_phase_progress() {
        let (sink, events) = collecting_sink();
        let tracker = ProgressTracker::new(sink);
        tracker.update(Phase::IdentifyDomain, "scoring", 50);
        let events = events.lock().unwrap();
        assert_eq!(events[0].percent, 20);
    }

    #[test]
    fn test_init_phase_at_zero_progress_is_zero_percent() {
        let (sink, events) = collecting_sink();
        let tracker = ProgressTracker::new(sink);
        tracker.update(Phase::Init, "starting", 0);
        assert_eq!(events.lock().unwrap()[0].percent, 0);
    }

    #[test]
    fn test_completion_phase_is_always_100() {
        let (sink, events) = collecting_sink();
        let tracker = ProgressTracker::new(sink);
        tracker.update(Phase::Completion, "done", 0);
        assert_eq!(events.lock().unwrap()[0].percent, 100);
    }

    #[test]
    fn test_advance_job_reports_proportional_field_extract_progress() {
        let (sink, events) = collecting_sink();
        let tracker = ProgressTracker::new(sink);
        tracker.reset_job_counter(4);
        tracker.advance_job();
        tracker.advance_job();
        let events = events.lock().unwrap();
        assert_eq!(events[1].percent, Phase::FieldExtract.base() + Phase::FieldExtract.weight() / 2);
    }
}
