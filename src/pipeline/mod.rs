//! Pipeline Orchestrator (`spec.md` §4.13).
//!
//! Single entry point `extract`, composing every stage: preprocess →
//! identify → load → chunk → parallel extraction → per-chunk merge →
//! temporal normalize → cross-chunk merge → null filter → format.

use crate::chunking::{Chunker, RecursiveChunker};
use crate::embedding::Embedder;
use crate::engine::{CancelToken, EngineConfig, ExtractionEngine};
use crate::error::{Error, Result, SchemaError};
use crate::filter::{self, FilterOptions};
use crate::format;
use crate::llm::{Completion, DocumentSource, ProgressSink};
use crate::model::{Chunk, ExtractionOptions, ExtractionPlan, FinalResult};
use crate::progress::{Phase, ProgressTracker};
use crate::query;
use crate::registry::{DomainRegistry, FunctionRegistry};
use crate::temporal;
use std::sync::Arc;
use std::time::Instant;

/// Preprocessor confidence at or above which its domain/field hints
/// override the caller-supplied plan (`spec.md` §4.13 step 2).
const PREPROCESSOR_OVERRIDE_THRESHOLD: f32 = 0.7;

/// Everything the orchestrator needs to run one extraction, gathered in
/// one place so `extract` doesn't take a dozen positional arguments.
pub struct Extraction {
    pub completion: Arc<dyn Completion>,
    pub document_source: Arc<dyn DocumentSource>,
    pub embedder: Arc<dyn Embedder>,
    pub domain_registry: Arc<DomainRegistry>,
    pub function_registry: Arc<FunctionRegistry>,
}

/// Output of a completed extraction: the formatted result plus the raw
/// [`FinalResult`] it was derived from, for callers that want both.
pub struct ExtractOutput {
    pub result: FinalResult,
    pub structured: serde_json::Value,
    pub flat_text: Option<String>,
    pub tagged_markup: Option<String>,
    pub elapsed: std::time::Duration,
}

/// Runs a full extraction: resolves the plan, loads and chunks the
/// document, fans field extraction out across the engine, merges,
/// normalizes, filters and formats the result.
///
/// # Errors
///
/// Returns [`SchemaError::SchemaEmpty`] if the resolved plan selects no
/// sub-domains, or propagates a document-load/engine failure.
pub async fn extract(
    deps: &Extraction,
    mut plan: ExtractionPlan,
    query_text: Option<&str>,
    opts: &ExtractionOptions,
    cancel: &CancelToken,
    progress: Arc<dyn ProgressSink>,
) -> Result<ExtractOutput> {
    let started = Instant::now();
    let tracker = ProgressTracker::new(Arc::clone(&progress));
    tracker.update(Phase::Init, "validating plan", 0);

    if opts.run_preprocessor {
        if let Some(query_text) = query_text {
            let preprocessed = query::preprocess(deps.completion.as_ref(), query_text).await;
            if preprocessed.confidence >= PREPROCESSOR_OVERRIDE_THRESHOLD {
                if let Some(domain) = preprocessed.identified_domain {
                    plan.domain = domain;
                }
                if !preprocessed.identified_fields.is_empty() {
                    plan.fields = preprocessed.identified_fields;
                }
            }
        }
    }

    tracker.update(Phase::LoadDoc, "loading document", 0);
    let segments = deps
        .document_source
        .load()
        .await
        .map_err(|e| Error::Engine(crate::error::EngineError::DocumentLoadFailed(e.to_string())))?;
    let document_text: String = segments.iter().map(|s| s.text.as_str()).collect::<Vec<_>>().join("\n\n");

    if plan.domain.is_empty() {
        plan = query::identify(&deps.domain_registry, &document_text);
    } else if plan.sub_domains.is_empty() {
        if let Some(domain_def) = deps.domain_registry.get(&plan.domain) {
            plan.sub_domains = domain_def.sub_domains.iter().map(|s| s.name.clone()).collect();
        }
    }
    if plan.sub_domains.is_empty() {
        return Err(Error::Schema(SchemaError::SchemaEmpty));
    }

    tracker.update(Phase::Chunk, "chunking document", 0);
    let chunker = RecursiveChunker;
    let mut chunks: Vec<Chunk> = Vec::new();
    for (segment_id, segment) in segments.iter().enumerate() {
        let segment_chunks = chunker.chunk(segment_id, &segment.text, opts.chunk_size, opts.chunk_overlap)?;
        chunks.extend(segment_chunks);
    }

    tracker.update(Phase::IdentifyDomain, "resolved extraction plan", 100);

    let engine_config = EngineConfig {
        max_concurrency: opts.max_concurrency,
        request_timeout: opts.request_timeout,
    };
    let engine = ExtractionEngine::new(
        Arc::clone(&deps.completion),
        Arc::clone(&deps.domain_registry),
        Arc::clone(&deps.function_registry),
        engine_config,
    );

    tracker.reset_job_counter(chunks.len() * plan.sub_domains.len().max(1));
    let tracker = Arc::new(tracker);
    let forwarding_tracker = Arc::clone(&tracker);
    let extract_progress: Arc<dyn ProgressSink> = Arc::new(move |_event: crate::model::ProgressEvent| {
        forwarding_tracker.advance_job();
    });

    let partials = engine.run(&plan.domain, &plan.sub_domains, &plan.fields, &chunks, cancel, extract_progress).await?;

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tracker.update(Phase::ResultMerging, "merging per-chunk results", 0);
    let mut chunk_results: Vec<_> = (0..chunks.len())
        .map(|chunk_index| {
            let chunk_partials: Vec<_> = partials.iter().filter(|p| p.chunk_index == chunk_index).cloned().collect();
            crate::merge::merge_chunk(chunk_index, &chunk_partials)
        })
        .collect();

    tracker.update(Phase::TemporalNormalize, "normalizing dates", 0);
    for chunk_result in &mut chunk_results {
        temporal::normalize_dates(&mut chunk_result.field_values, &deps.domain_registry, &plan.domain, &deps.function_registry);
    }

    tracker.update(Phase::Dedup, "merging across chunks", 0);
    let mut final_result = crate::merge::merge_results(
        &chunk_results,
        &deps.domain_registry,
        &plan.domain,
        deps.embedder.as_ref(),
        opts.dedup_threshold,
    );
    let timeline = temporal::build_timeline(&final_result, &deps.domain_registry, &plan.domain);

    let filter_opts = FilterOptions {
        preserve_metadata: opts.preserve_metadata,
        preserve_fields: opts.preserve_fields.clone(),
        strip_zeros: opts.strip_zeros,
    };
    final_result.field_values = filter::filter(&final_result.field_values, &filter_opts);

    tracker.update(Phase::Format, "rendering output", 0);
    let wants = |name: &str| plan.output_formats.iter().any(|f| f == name) || plan.output_formats.is_empty();
    let structured = format::structured(&final_result, Some(&timeline), opts.preserve_metadata);
    let flat_text = wants("flat_text").then(|| format::flat_text(&final_result, Some(&timeline)));
    let tagged_markup = wants("tagged_markup").then(|| format::tagged_markup(&final_result, opts.preserve_metadata));

    tracker.update(Phase::Completion, "extraction complete", 0);

    Ok(ExtractOutput {
        result: final_result,
        structured,
        flat_text,
        tagged_markup,
        elapsed: started.elapsed(),
    })
}
