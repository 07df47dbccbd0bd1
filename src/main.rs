//! Binary entry point for the extractor CLI.
//!
//! A thin wrapper around [`extractor::pipeline::extract`]: reads a
//! document from a file or stdin, resolves the domain schema from the
//! built-in registry, and prints one of the three output renderings.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::{Parser, ValueEnum};
use extractor::config::AppConfig;
use extractor::error::{EngineError, Result};
use extractor::pipeline::{self, Extraction};
use extractor::registry;
use extractor::{CancelToken, Completion, DocumentSource, DomainRegistry, ExtractionOptions, ExtractionPlan, FunctionRegistry, ProgressSink, Segment};
use std::io::Read as _;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Structured field extraction from an unstructured document.
#[derive(Parser, Debug)]
#[command(name = "extractor", version, about)]
struct Cli {
    /// Path to the document to extract from; reads stdin if omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Domain to extract against; auto-identified from the document if omitted.
    #[arg(long, default_value = "")]
    domain: String,

    /// Comma-separated sub-domain names within `domain`.
    #[arg(long, value_delimiter = ',')]
    sub_domains: Vec<String>,

    /// Output rendering to print.
    #[arg(long, value_enum, default_value_t = OutputFormat::Structured)]
    format: OutputFormat,

    /// Keep `_`-prefixed metadata keys through the null filter.
    #[arg(long)]
    preserve_metadata: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Structured,
    FlatText,
    TaggedMarkup,
}

/// Loads the whole document as a single [`Segment`] from a file path, or
/// from stdin when no path is given.
struct FileOrStdinSource(Option<PathBuf>);

#[async_trait::async_trait]
impl DocumentSource for FileOrStdinSource {
    async fn load(&self) -> Result<Vec<Segment>> {
        let text = match &self.0 {
            Some(path) => {
                std::fs::read_to_string(path).map_err(|e| EngineError::DocumentLoadFailed(e.to_string()))?
            }
            None => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|e| EngineError::DocumentLoadFailed(e.to_string()))?;
                buf
            }
        };
        Ok(vec![Segment::new(text)])
    }
}

#[cfg(feature = "openai-completion")]
struct OpenAiCompletion {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

#[cfg(feature = "openai-completion")]
#[async_trait::async_trait]
impl Completion for OpenAiCompletion {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        use async_openai::types::{
            ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
        };

        let system = ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()
            .map_err(|e| EngineError::ProviderUnavailable(e.to_string()))?;
        let user = ChatCompletionRequestUserMessageArgs::default()
            .content(user_prompt)
            .build()
            .map_err(|e| EngineError::ProviderUnavailable(e.to_string()))?;
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .messages(vec![system.into(), user.into()])
            .build()
            .map_err(|e| EngineError::ProviderUnavailable(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| EngineError::ProviderUnavailable(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| EngineError::ParseFailed("completion response had no content".to_string()).into())
    }
}

#[cfg(feature = "openai-completion")]
fn build_completion(config: &AppConfig) -> Arc<dyn Completion> {
    let openai_config =
        async_openai::config::OpenAIConfig::new().with_api_base(config.llm.base_url.clone()).with_api_key(config.llm.api_key.clone());
    Arc::new(OpenAiCompletion {
        client: async_openai::Client::with_config(openai_config),
        model: config.llm.model.clone(),
        temperature: config.llm.temperature,
    })
}

/// Stand-in used when built without `openai-completion`; every job fails
/// with `provider_unavailable` rather than the binary refusing to build.
#[cfg(not(feature = "openai-completion"))]
struct UnavailableCompletion;

#[cfg(not(feature = "openai-completion"))]
#[async_trait::async_trait]
impl Completion for UnavailableCompletion {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
        Err(EngineError::ProviderUnavailable(
            "built without the openai-completion feature; rebuild with --features openai-completion".to_string(),
        )
        .into())
    }
}

#[cfg(not(feature = "openai-completion"))]
fn build_completion(_config: &AppConfig) -> Arc<dyn Completion> {
    Arc::new(UnavailableCompletion)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let embedder = match extractor::create_embedder() {
        Ok(embedder) => Arc::from(embedder),
        Err(e) => {
            eprintln!("embedder initialization failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut domain_registry = DomainRegistry::new();
    registry::domains::seed(&mut domain_registry);

    let deps = Extraction {
        completion: build_completion(&config),
        document_source: Arc::new(FileOrStdinSource(cli.input.clone())),
        embedder,
        domain_registry: Arc::new(domain_registry),
        function_registry: Arc::new(FunctionRegistry::new()),
    };

    let mut plan = ExtractionPlan::new(cli.domain);
    plan.sub_domains = cli.sub_domains;
    plan.output_formats = vec!["structured".to_string(), "flat_text".to_string(), "tagged_markup".to_string()];

    let opts = ExtractionOptions {
        chunk_size: config.extraction.chunk_size,
        chunk_overlap: config.extraction.chunk_overlap,
        max_concurrency: config.extraction.max_concurrency,
        dedup_threshold: config.extraction.dedup_threshold,
        preserve_metadata: cli.preserve_metadata,
        ..ExtractionOptions::default()
    };

    let cancel = CancelToken::new();
    let progress: Arc<dyn ProgressSink> = Arc::new(|_event| {});

    match pipeline::extract(&deps, plan, None, &opts, &cancel, progress).await {
        Ok(output) => {
            let rendered = match cli.format {
                OutputFormat::Structured => serde_json::to_string_pretty(&output.structured).unwrap_or_default(),
                OutputFormat::FlatText => output.flat_text.unwrap_or_default(),
                OutputFormat::TaggedMarkup => output.tagged_markup.unwrap_or_default(),
            };
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("extraction failed: {e}");
            ExitCode::FAILURE
        }
    }
}
