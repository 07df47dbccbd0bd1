//! Error types for the extraction pipeline.
//!
//! This module provides a comprehensive error hierarchy using `thiserror` for
//! schema, prompt, engine, formatting and configuration failures.

use thiserror::Error;

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error types for the extraction pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Schema errors (domain/sub-domain/field lookups).
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Chunking-related errors.
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// Prompt construction errors.
    #[error("prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Extraction engine errors (fan-out, cancellation, timeouts).
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// Output formatting errors.
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The extraction was cancelled.
    #[error("cancelled")]
    Cancelled,

    /// A deadline expired before the extraction finished.
    #[error("timeout")]
    Timeout,
}

/// Schema-specific errors (§6/§7: fatal, no retry).
#[derive(Error, Debug)]
pub enum SchemaError {
    /// No domain registered under the given name.
    #[error("domain not found: {name}")]
    DomainNotFound {
        /// Name of the domain that was not found.
        name: String,
    },

    /// No sub-domain registered under the given name within the domain.
    #[error("sub-domain not found: {domain}/{sub_domain}")]
    SubDomainNotFound {
        /// Domain name.
        domain: String,
        /// Sub-domain name that was not found.
        sub_domain: String,
    },

    /// Plan resolved to an empty set of sub-domains/fields.
    #[error("schema_empty: plan resolved to no sub-domains")]
    SchemaEmpty,

    /// A function id referenced by a field definition is unknown.
    #[error("unknown function: {id}")]
    UnknownFunction {
        /// Function id that failed to resolve.
        id: String,
    },

    /// Duplicate field name within a sub-domain at registration time.
    #[error("duplicate field {field} in sub-domain {sub_domain}")]
    DuplicateField {
        /// Sub-domain name.
        sub_domain: String,
        /// Duplicate field name.
        field: String,
    },
}

/// Chunking-specific errors.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Invalid chunk configuration.
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// Overlap exceeds chunk size.
    #[error("overlap {overlap} must be less than chunk size {size}")]
    OverlapTooLarge {
        /// Overlap size.
        overlap: usize,
        /// Chunk size.
        size: usize,
    },

    /// The splitter could not make forward progress on the input.
    #[error("chunker failed to make progress at offset {offset}")]
    NoProgress {
        /// Byte offset where the splitter stalled.
        offset: usize,
    },
}

/// Prompt construction errors.
#[derive(Error, Debug)]
pub enum PromptError {
    /// No sub-domains were selected for the prompt.
    #[error("schema_empty: no sub-domains selected for prompt")]
    SchemaEmpty,
}

/// Extraction-engine errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The underlying completion provider failed.
    #[error("provider_unavailable: {0}")]
    ProviderUnavailable(String),

    /// A job-level response could not be parsed as structured field data.
    #[error("failed to parse completion response: {0}")]
    ParseFailed(String),

    /// The document source failed to load segments.
    #[error("document load failed: {0}")]
    DocumentLoadFailed(String),
}

/// Output formatting errors.
#[derive(Error, Debug)]
pub enum FormatError {
    /// An unsupported output format flag was requested.
    #[error("invalid_output_format: {name}")]
    InvalidOutputFormat {
        /// The unrecognized format name.
        name: String,
    },

    /// No output format was requested.
    #[error("invalid_output_format: at least one output format must be requested")]
    NoFormatRequested,
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration key was missing.
    #[error("missing configuration key: {key}")]
    MissingKey {
        /// The missing key, e.g. `llm.base_url`.
        key: String,
    },

    /// A configuration value failed to parse.
    #[error("invalid configuration value for {key}: {reason}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseFailed(err.to_string())
    }
}
