//! Parallel extraction engine (`spec.md` §4.7, §5).
//!
//! Fans every `(chunk, sub-domain)` pair out to the configured
//! [`Completion`] backend across a bounded worker pool, cooperatively
//! cancellable via [`CancelToken`]. A job's failure — timeout, provider
//! error, unparseable response — never fails the run: it becomes an
//! empty [`PartialResult`] and extraction continues.

mod cancel;

pub use cancel::CancelToken;

use crate::error::Result;
use crate::llm::{Completion, ProgressSink};
use crate::model::{Chunk, Job, PartialResult, ProgressEvent};
use crate::prompt;
use crate::registry::{DomainRegistry, FieldDefinition, FunctionRegistry};
use crate::value::FieldValue;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Configuration for one [`ExtractionEngine::run`] call.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of concurrent workers pulling jobs off the queue.
    pub max_concurrency: usize,
    /// Per-job deadline; a job that exceeds it is treated as a failure.
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 20,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Runs `(chunk, sub-domain)` extraction jobs across a worker pool.
///
/// Holds its dependencies as `Arc` so they can be cheaply shared into
/// spawned worker tasks.
pub struct ExtractionEngine {
    completion: Arc<dyn Completion>,
    domain_registry: Arc<DomainRegistry>,
    function_registry: Arc<FunctionRegistry>,
    config: EngineConfig,
}

impl ExtractionEngine {
    /// Creates a new engine bound to the given backend and registries.
    #[must_use]
    pub const fn new(
        completion: Arc<dyn Completion>,
        domain_registry: Arc<DomainRegistry>,
        function_registry: Arc<FunctionRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            completion,
            domain_registry,
            function_registry,
            config,
        }
    }

    /// Runs every `(chunk, sub-domain)` job named by `domain` and
    /// `sub_domain_names`, returning one [`PartialResult`] per job.
    ///
    /// Stops dispatching new jobs once `cancel` fires, returning whatever
    /// jobs completed before that point; this never surfaces as an error.
    pub async fn run(
        &self,
        domain: &str,
        sub_domain_names: &[String],
        fields: &[String],
        chunks: &[Chunk],
        cancel: &CancelToken,
        progress: Arc<dyn ProgressSink>,
    ) -> Result<Vec<PartialResult>> {
        let jobs: Vec<Job> = chunks
            .iter()
            .enumerate()
            .flat_map(|(chunk_index, _)| {
                sub_domain_names
                    .iter()
                    .map(move |name| Job::new(chunk_index, name.clone()))
            })
            .collect();
        let total = jobs.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let (tx, rx) = tokio::sync::mpsc::channel::<Job>(self.config.max_concurrency * 2 + 1);
        let rx = Arc::new(Mutex::new(rx));

        let feeder = tokio::spawn(async move {
            for job in jobs {
                if tx.send(job).await.is_err() {
                    break;
                }
            }
        });

        let results: Arc<Mutex<Vec<PartialResult>>> = Arc::new(Mutex::new(Vec::with_capacity(total)));
        let completed = Arc::new(AtomicUsize::new(0));

        let mut workers = JoinSet::new();
        for _ in 0..self.config.max_concurrency.max(1) {
            let rx = Arc::clone(&rx);
            let results = Arc::clone(&results);
            let completed = Arc::clone(&completed);
            let cancel = cancel.clone();
            let progress = Arc::clone(&progress);
            let domain = domain.to_string();
            let fields = fields.to_vec();
            let chunks = chunks.to_vec();
            let completion = Arc::clone(&self.completion);
            let domain_registry = Arc::clone(&self.domain_registry);
            let function_registry = Arc::clone(&self.function_registry);
            let timeout = self.config.request_timeout;

            workers.spawn(async move {
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let job = {
                        let mut guard = rx.lock().await;
                        guard.recv().await
                    };
                    let Some(job) = job else { break };

                    let partial = run_job(
                        completion.as_ref(),
                        &domain_registry,
                        &function_registry,
                        &domain,
                        &fields,
                        &job,
                        &chunks,
                        timeout,
                    )
                    .await;

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    #[allow(clippy::cast_possible_truncation)]
                    let percent = ((done * 100) / total.max(1)) as u8;
                    progress(ProgressEvent::new(
                        "field_extraction",
                        format!("completed job {done}/{total}"),
                        percent,
                        0,
                    ));

                    results.lock().await.push(partial);
                }
            });
        }

        while workers.join_next().await.is_some() {}
        let _ = feeder.await;

        let results = Arc::try_unwrap(results).map_or_else(|arc| arc.blocking_lock().clone(), Mutex::into_inner);
        Ok(results)
    }
}

async fn run_job(
    completion: &dyn Completion,
    domain_registry: &DomainRegistry,
    function_registry: &FunctionRegistry,
    domain: &str,
    fields: &[String],
    job: &Job,
    chunks: &[Chunk],
    timeout: Duration,
) -> PartialResult {
    let Some(chunk) = chunks.get(job.chunk_index) else {
        return PartialResult::empty(job.chunk_index, job.sub_domain_name.clone());
    };
    let Some(domain_def) = domain_registry.get(domain) else {
        return PartialResult::empty(job.chunk_index, job.sub_domain_name.clone());
    };
    let Some(sub_domain) = domain_def.sub_domain(&job.sub_domain_name) else {
        return PartialResult::empty(job.chunk_index, job.sub_domain_name.clone());
    };

    // Fall back to the open-ended prompt on any build failure instead of
    // dropping the job (`spec.md` §4.7 step 2, §4.2).
    let user_prompt = prompt::build(domain_def, &[sub_domain], fields, &chunk.text)
        .unwrap_or_else(|_| prompt::build_fallback(&chunk.text));

    let Ok(Ok(raw)) = tokio::time::timeout(timeout, completion.complete(prompt::SYSTEM_PROMPT, &user_prompt)).await
    else {
        return PartialResult::empty(job.chunk_index, job.sub_domain_name.clone());
    };

    let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(raw.trim()) else {
        return PartialResult::empty(job.chunk_index, job.sub_domain_name.clone());
    };

    let selected_fields: Vec<&FieldDefinition> = sub_domain
        .fields
        .iter()
        .filter(|field| fields.is_empty() || fields.iter().any(|name| name == &field.name))
        .collect();

    let mut field_values = HashMap::new();
    for field in selected_fields {
        let raw_value = map.get(&field.name).map_or(FieldValue::Null, FieldValue::from_json);
        let value = apply_pipeline(function_registry, field, raw_value);
        field_values.insert(field.name.clone(), value);
    }

    PartialResult::new(job.chunk_index, job.sub_domain_name.clone(), field_values)
}

/// Runs a field's formatter, then validator, then post-processor, in
/// that order (`spec.md` §4.6). A value that fails validation is
/// discarded to `null` rather than propagated unverified.
fn apply_pipeline(registry: &FunctionRegistry, field: &FieldDefinition, value: FieldValue) -> FieldValue {
    if value.is_null() {
        return value;
    }

    let formatted = field
        .format_function_id
        .as_deref()
        .and_then(|id| registry.call_transform(id, &value).ok())
        .unwrap_or(value);

    let validated = field
        .validation_function_id
        .as_deref()
        .map_or(true, |id| registry.call_validator(id, &formatted).unwrap_or(true));
    if !validated {
        return FieldValue::Null;
    }

    field
        .post_process_function_id
        .as_deref()
        .and_then(|id| registry.call_transform(id, &formatted).ok())
        .unwrap_or(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DomainDefinition, SubDomainDefinition};
    use crate::value::FieldType;
    use async_trait::async_trait;

    struct StubCompletion;

    #[async_trait]
    impl Completion for StubCompletion {
        async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
            Ok(r#"{"patient_name": "Jane Doe"}"#.to_string())
        }
    }

    fn sample_registry() -> Arc<DomainRegistry> {
        let mut registry = DomainRegistry::new();
        let sub = SubDomainDefinition::new(
            "patient_info",
            "demographics",
            vec![FieldDefinition::new("patient_name", "name", FieldType::String)],
        )
        .unwrap();
        registry.register(DomainDefinition::new("medical", "medical", vec![sub]));
        Arc::new(registry)
    }

    fn no_op_progress() -> Arc<dyn ProgressSink> {
        Arc::new(|_event: ProgressEvent| {})
    }

    #[tokio::test]
    async fn test_run_produces_one_result_per_job() {
        let domain_registry = sample_registry();
        let function_registry = Arc::new(FunctionRegistry::new());
        let completion: Arc<dyn Completion> = Arc::new(StubCompletion);
        let engine = ExtractionEngine::new(completion, domain_registry, function_registry, EngineConfig::default());

        let chunks = vec![Chunk::new(0, "patient Jane Doe".to_string(), 0, 0)];
        let cancel = CancelToken::new();
        let results = engine
            .run("medical", &["patient_info".to_string()], &[], &chunks, &cancel, no_op_progress())
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].field_values.get("patient_name"),
            Some(&FieldValue::String("Jane Doe".to_string()))
        );
    }

    #[tokio::test]
    async fn test_run_empty_jobs_returns_empty() {
        let domain_registry = sample_registry();
        let function_registry = Arc::new(FunctionRegistry::new());
        let completion: Arc<dyn Completion> = Arc::new(StubCompletion);
        let engine = ExtractionEngine::new(completion, domain_registry, function_registry, EngineConfig::default());

        let results = engine
            .run("medical", &[], &[], &[], &CancelToken::new(), no_op_progress())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_run_restricts_to_requested_fields() {
        let domain_registry = sample_registry();
        let function_registry = Arc::new(FunctionRegistry::new());
        let completion: Arc<dyn Completion> = Arc::new(StubCompletion);
        let engine = ExtractionEngine::new(completion, domain_registry, function_registry, EngineConfig::default());

        let chunks = vec![Chunk::new(0, "patient Jane Doe".to_string(), 0, 0)];
        let cancel = CancelToken::new();
        let results = engine
            .run(
                "medical",
                &["patient_info".to_string()],
                &["some_other_field".to_string()],
                &chunks,
                &cancel,
                no_op_progress(),
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].field_values.is_empty());
    }

    #[tokio::test]
    async fn test_run_respects_cancellation() {
        let domain_registry = sample_registry();
        let function_registry = Arc::new(FunctionRegistry::new());
        let completion: Arc<dyn Completion> = Arc::new(StubCompletion);
        let engine = ExtractionEngine::new(completion, domain_registry, function_registry, EngineConfig::default());

        let cancel = CancelToken::new();
        cancel.cancel();
        let chunks = vec![Chunk::new(0, "text".to_string(), 0, 0)];
        let results = engine
            .run("medical", &["patient_info".to_string()], &[], &chunks, &cancel, no_op_progress())
            .await
            .unwrap();
        assert!(results.len() <= 1);
    }
}
