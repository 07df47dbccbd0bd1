//! # extractor
//!
//! Structured field extraction from unstructured documents.
//!
//! A caller declares a domain schema (fields grouped into sub-domains
//! grouped into domains), hands the crate a document and a
//! [`Completion`](llm::Completion) backend, and gets back a
//! [`FinalResult`](model::FinalResult) with every declared field
//! populated, merged across chunks, temporally normalized, deduplicated
//! and null-filtered.
//!
//! ## Pipeline
//!
//! `Document → Chunker → {per-chunk × per-sub-domain Prompt → LLM →
//! Parsed Partial} → Per-Chunk Merge → Temporal Normalize → Cross-Chunk
//! Merge+Dedup → Null Filter → Formatter`, orchestrated by
//! [`pipeline::extract`].

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![warn(unsafe_code)]

pub mod chunking;
pub mod config;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod filter;
pub mod format;
pub mod llm;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod query;
pub mod registry;
pub mod temporal;
pub mod value;

pub use error::{Error, Result};

pub use chunking::{Chunker, RecursiveChunker, default_chunker};
pub use embedding::{DEFAULT_DIMENSIONS, Embedder, FallbackEmbedder, cosine_similarity, create_embedder};
#[cfg(feature = "fastembed-embeddings")]
pub use embedding::FastEmbedEmbedder;
pub use engine::{CancelToken, EngineConfig, ExtractionEngine};
pub use llm::{Completion, DocumentSource, ProgressSink, no_op_progress_sink};
pub use model::{Chunk, ExtractionOptions, ExtractionPlan, FinalResult, Segment};
pub use pipeline::{ExtractOutput, Extraction, extract};
pub use registry::{DomainDefinition, DomainRegistry, FieldDefinition, FunctionRegistry, SubDomainDefinition};
pub use value::{FieldType, FieldValue};
