//! External interfaces the pipeline is driven through (`spec.md` §6).
//!
//! The engine is generic over these traits so the same pipeline runs
//! against any LLM provider, document loader, or progress sink supplied
//! by the caller. [`Embedder`](crate::embedding::Embedder) stays
//! synchronous, matching its existing contract; call sites that need it
//! from async code run it via `tokio::task::spawn_blocking`.

use crate::error::Result;
use crate::model::{ProgressEvent, Segment};
use async_trait::async_trait;

/// A chat/completion backend the prompt builder's output is sent to.
///
/// Implementations are expected to be cheap to clone (e.g. wrapping an
/// `Arc`-held HTTP client) since one instance is shared across every
/// worker in the extraction engine's job pool.
#[async_trait]
pub trait Completion: Send + Sync {
    /// Sends `system_prompt` and `user_prompt` to the backend and returns
    /// its raw text response.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or returns a
    /// non-success response.
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Loader that turns an input document into the [`Segment`]s the
/// chunker consumes.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Loads every segment of the document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be read or parsed.
    async fn load(&self) -> Result<Vec<Segment>>;
}

/// Callback invoked with each [`ProgressEvent`] the pipeline emits.
///
/// Implemented as a plain function object rather than a trait with a
/// single method so callers can pass a closure directly.
pub trait ProgressSink: Fn(ProgressEvent) + Send + Sync {}

impl<F: Fn(ProgressEvent) + Send + Sync> ProgressSink for F {}

/// A [`ProgressSink`] that discards every event, used when the caller
/// does not care about progress reporting.
#[must_use]
pub fn no_op_progress_sink() -> impl ProgressSink {
    |_event: ProgressEvent| {}
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoCompletion;

    #[async_trait]
    impl Completion for EchoCompletion {
        async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
            Ok(user_prompt.to_string())
        }
    }

    struct StaticSource(Vec<Segment>);

    #[async_trait]
    impl DocumentSource for StaticSource {
        async fn load(&self) -> Result<Vec<Segment>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_completion_trait_object() {
        let completion: Box<dyn Completion> = Box::new(EchoCompletion);
        let response = completion.complete("system", "hello").await.unwrap();
        assert_eq!(response, "hello");
    }

    #[tokio::test]
    async fn test_document_source_trait_object() {
        let source: Box<dyn DocumentSource> = Box::new(StaticSource(vec![Segment::new("text")]));
        let segments = source.load().await.unwrap();
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_no_op_progress_sink_does_not_panic() {
        let sink = no_op_progress_sink();
        sink(ProgressEvent::new("init", "starting", 0, 0));
    }
}
