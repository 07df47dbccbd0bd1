//! Runtime types that flow through a single extraction.
//!
//! Unlike [`crate::registry`] schema entities, these are owned by one
//! `Extraction` invocation and released on completion or cancellation.

mod chunk;
mod plan;
mod progress;
mod result;

pub use chunk::{Chunk, Segment};
pub use plan::{ExtractionOptions, ExtractionPlan, PreprocessedQuery};
pub use progress::ProgressEvent;
pub use result::{FinalResult, Job, MergedChunkResult, PartialResult};
