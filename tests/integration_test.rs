//! End-to-end extraction scenarios driven through `pipeline::extract`
//! against stub completion and document-source backends.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use async_trait::async_trait;
use extractor::embedding::{Embedder, FallbackEmbedder};
use extractor::engine::CancelToken;
use extractor::error::{Error, Result};
use extractor::filter::{self, FilterOptions};
use extractor::llm::{Completion, DocumentSource};
use extractor::model::{ExtractionOptions, ExtractionPlan, Segment};
use extractor::pipeline::{self, Extraction};
use extractor::registry::{self, DomainDefinition, DomainRegistry, FieldDefinition, FunctionRegistry, SubDomainDefinition};
use extractor::value::{FieldType, FieldValue};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

fn document_of(user_prompt: &str) -> String {
    user_prompt
        .split("<document>\n")
        .nth(1)
        .and_then(|s| s.split("\n</document>").next())
        .unwrap_or("")
        .to_string()
}

fn requested_sub_domain(user_prompt: &str) -> &str {
    user_prompt.lines().find(|l| l.starts_with("## ")).map(|l| l[3..].trim()).unwrap_or("")
}

fn field_after(doc: &str, label: &str) -> Option<String> {
    let needle = format!("{}:", label.to_lowercase());
    doc.lines().find_map(|line| {
        let lower = line.to_lowercase();
        let idx = lower.find(&needle)?;
        Some(line[idx + needle.len()..].trim().to_string())
    })
}

/// Completion stub that reads labeled `Key: value` lines out of the
/// untrusted document block and answers whichever sub-domain's fields
/// were requested, standing in for a real model response.
struct LabeledFieldCompletion;

#[async_trait]
impl Completion for LabeledFieldCompletion {
    async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
        let doc = document_of(user_prompt);
        let body = match requested_sub_domain(user_prompt) {
            "patient_info" => serde_json::json!({
                "patient_name": field_after(&doc, "Patient"),
                "date_of_birth": field_after(&doc, "DOB"),
                "gender": null,
            }),
            "diagnoses" => serde_json::json!({
                "diagnoses": field_after(&doc, "Diagnosis").map(|d| vec![d]),
                "diagnosis_date": null,
            }),
            "parties" => serde_json::json!({
                "parties": field_after(&doc, "parties")
                    .map(|p| p.split(" and ").map(str::trim).map(str::to_string).collect::<Vec<_>>()),
            }),
            "dates" => serde_json::json!({
                "effective_date": field_after(&doc, "Effective Date"),
                "termination_date": field_after(&doc, "Termination Date"),
            }),
            "general_content" => serde_json::json!({
                "content": doc.trim(),
                "entities": null,
                "dates": null,
            }),
            _ => serde_json::json!({}),
        };
        Ok(body.to_string())
    }
}

fn fallback_embedder() -> Arc<dyn Embedder> {
    Arc::new(FallbackEmbedder::new(64))
}

#[tokio::test]
async fn test_medical_single_chunk_extracts_and_normalizes() {
    struct FixedSource;
    #[async_trait]
    impl DocumentSource for FixedSource {
        async fn load(&self) -> Result<Vec<Segment>> {
            Ok(vec![Segment::new(
                "Patient: John Doe\nDOB: 05/15/1980\nDiagnosis: Diabetes mellitus Type II",
            )])
        }
    }

    let mut domain_registry = DomainRegistry::new();
    registry::domains::seed(&mut domain_registry);

    let deps = Extraction {
        completion: Arc::new(LabeledFieldCompletion),
        document_source: Arc::new(FixedSource),
        embedder: fallback_embedder(),
        domain_registry: Arc::new(domain_registry),
        function_registry: Arc::new(FunctionRegistry::new()),
    };

    let mut plan = ExtractionPlan::new("medical");
    plan.sub_domains = vec!["patient_info".to_string(), "diagnoses".to_string()];

    let output = pipeline::extract(
        &deps,
        plan,
        None,
        &ExtractionOptions::default(),
        &CancelToken::new(),
        Arc::new(|_| {}),
    )
    .await
    .expect("extraction should succeed");

    assert_eq!(
        output.result.field_values.get("patient_name"),
        Some(&FieldValue::String("John Doe".to_string()))
    );
    assert_eq!(
        output.result.field_values.get("date_of_birth"),
        Some(&FieldValue::String("1980-05-15".to_string()))
    );
    assert_eq!(
        output.result.field_values.get("diagnoses"),
        Some(&FieldValue::List(vec![FieldValue::String("Diabetes mellitus Type II".to_string())]))
    );
}

#[tokio::test]
async fn test_legal_two_chunks_dedup_parties_keep_single_effective_date() {
    struct TwoSegmentSource;
    #[async_trait]
    impl DocumentSource for TwoSegmentSource {
        async fn load(&self) -> Result<Vec<Segment>> {
            Ok(vec![
                Segment::new(
                    "This Agreement is entered into by the undersigned.\n\
                     Effective Date: January 15, 2023\n\
                     Parties: ABC Corporation and XYZ Consulting LLC",
                ),
                Segment::new(
                    "As restated for reference below.\n\
                     Parties: ABC Corporation and XYZ Consulting LLC",
                ),
            ])
        }
    }

    let mut domain_registry = DomainRegistry::new();
    registry::domains::seed(&mut domain_registry);

    let deps = Extraction {
        completion: Arc::new(LabeledFieldCompletion),
        document_source: Arc::new(TwoSegmentSource),
        embedder: fallback_embedder(),
        domain_registry: Arc::new(domain_registry),
        function_registry: Arc::new(FunctionRegistry::new()),
    };

    let mut plan = ExtractionPlan::new("legal");
    plan.sub_domains = vec!["parties".to_string(), "dates".to_string()];

    let output = pipeline::extract(
        &deps,
        plan,
        None,
        &ExtractionOptions::default(),
        &CancelToken::new(),
        Arc::new(|_| {}),
    )
    .await
    .expect("extraction should succeed");

    assert_eq!(
        output.result.field_values.get("effective_date"),
        Some(&FieldValue::String("2023-01-15".to_string()))
    );
    let parties = output.result.field_values.get("parties").and_then(FieldValue::as_list).expect("parties list");
    assert_eq!(parties.len(), 2);
    assert!(parties.contains(&FieldValue::String("ABC Corporation".to_string())));
    assert!(parties.contains(&FieldValue::String("XYZ Consulting LLC".to_string())));
}

/// Embedder with handcrafted vectors so "Penicillin" and its abbreviation
/// "PCN" land above the default dedup threshold while "Peanuts" stays
/// well below it, standing in for a real sentence embedding model's
/// semantic closeness.
struct AllergyEmbedder;

impl Embedder for AllergyEmbedder {
    fn dimensions(&self) -> usize {
        3
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lower = text.to_lowercase();
        Ok(if lower.contains("penicillin") {
            vec![1.0, 0.0, 0.0]
        } else if lower.contains("pcn") {
            vec![0.98, 0.2, 0.0]
        } else {
            vec![0.0, 1.0, 0.0]
        })
    }
}

#[tokio::test]
async fn test_embedding_dedup_collapses_allergy_abbreviation() {
    struct AllergySource;
    #[async_trait]
    impl DocumentSource for AllergySource {
        async fn load(&self) -> Result<Vec<Segment>> {
            Ok(vec![
                Segment::new("Known allergies: Penicillin"),
                Segment::new("Known allergies: PCN"),
                Segment::new("Known allergies: Peanuts"),
            ])
        }
    }

    struct AllergyCompletion;
    #[async_trait]
    impl Completion for AllergyCompletion {
        async fn complete(&self, _system_prompt: &str, user_prompt: &str) -> Result<String> {
            let doc = document_of(user_prompt);
            let value = field_after(&doc, "Known allergies").map(|a| vec![a]);
            Ok(serde_json::json!({ "allergies": value }).to_string())
        }
    }

    let mut domain_registry = DomainRegistry::new();
    let allergies = SubDomainDefinition::new(
        "allergies",
        "known patient allergies",
        vec![FieldDefinition::new("allergies", "allergens", FieldType::List)],
    )
    .unwrap();
    domain_registry.register(DomainDefinition::new("allergy_check", "d", vec![allergies]));

    let deps = Extraction {
        completion: Arc::new(AllergyCompletion),
        document_source: Arc::new(AllergySource),
        embedder: Arc::new(AllergyEmbedder),
        domain_registry: Arc::new(domain_registry),
        function_registry: Arc::new(FunctionRegistry::new()),
    };

    let mut plan = ExtractionPlan::new("allergy_check");
    plan.sub_domains = vec!["allergies".to_string()];

    let output = pipeline::extract(
        &deps,
        plan,
        None,
        &ExtractionOptions::default(),
        &CancelToken::new(),
        Arc::new(|_| {}),
    )
    .await
    .expect("extraction should succeed");

    let allergies = output.result.field_values.get("allergies").and_then(FieldValue::as_list).expect("allergies list");
    assert_eq!(
        allergies,
        &[FieldValue::String("Penicillin".to_string()), FieldValue::String("Peanuts".to_string())]
    );
}

#[tokio::test]
async fn test_cancellation_mid_flight_returns_promptly() {
    struct SlowCompletion;
    #[async_trait]
    impl Completion for SlowCompletion {
        async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok("{}".to_string())
        }
    }

    struct BulkSource;
    #[async_trait]
    impl DocumentSource for BulkSource {
        async fn load(&self) -> Result<Vec<Segment>> {
            Ok((0..50).map(|i| Segment::new(format!("bulk segment {i} with filler text"))).collect())
        }
    }

    let mut domain_registry = DomainRegistry::new();
    let sub_a = SubDomainDefinition::new("sub_a", "d", vec![FieldDefinition::new("field_a", "d", FieldType::String)]).unwrap();
    let sub_b = SubDomainDefinition::new("sub_b", "d", vec![FieldDefinition::new("field_b", "d", FieldType::String)]).unwrap();
    domain_registry.register(DomainDefinition::new("bulk", "d", vec![sub_a, sub_b]));

    let deps = Extraction {
        completion: Arc::new(SlowCompletion),
        document_source: Arc::new(BulkSource),
        embedder: fallback_embedder(),
        domain_registry: Arc::new(domain_registry),
        function_registry: Arc::new(FunctionRegistry::new()),
    };

    let mut plan = ExtractionPlan::new("bulk");
    plan.sub_domains = vec!["sub_a".to_string(), "sub_b".to_string()];

    let cancel = CancelToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(15)).await;
        canceller.cancel();
    });

    let result = pipeline::extract(&deps, plan, None, &ExtractionOptions::default(), &cancel, Arc::new(|_| {})).await;

    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn test_null_filter_preserves_metadata_block() {
    let mut fields: HashMap<String, FieldValue> = HashMap::new();
    fields.insert("a".to_string(), FieldValue::Null);
    fields.insert("b".to_string(), FieldValue::String("x".to_string()));
    let mut metadata = BTreeMap::new();
    metadata.insert("c".to_string(), FieldValue::Number(1.0));
    fields.insert("_metadata".to_string(), FieldValue::Object(metadata.clone()));

    let opts = FilterOptions {
        preserve_metadata: true,
        ..FilterOptions::default()
    };
    let filtered = filter::filter(&fields, &opts);

    assert_eq!(filtered.get("a"), None);
    assert_eq!(filtered.get("b"), Some(&FieldValue::String("x".to_string())));
    assert_eq!(filtered.get("_metadata"), Some(&FieldValue::Object(metadata)));
}

#[tokio::test]
async fn test_empty_plan_falls_back_to_general_content() {
    struct UnrelatedSource;
    #[async_trait]
    impl DocumentSource for UnrelatedSource {
        async fn load(&self) -> Result<Vec<Segment>> {
            Ok(vec![Segment::new("The quick brown fox jumps over the lazy dog in the garden.")])
        }
    }

    let mut domain_registry = DomainRegistry::new();
    registry::domains::seed(&mut domain_registry);

    let deps = Extraction {
        completion: Arc::new(LabeledFieldCompletion),
        document_source: Arc::new(UnrelatedSource),
        embedder: fallback_embedder(),
        domain_registry: Arc::new(domain_registry),
        function_registry: Arc::new(FunctionRegistry::new()),
    };

    let output = pipeline::extract(
        &deps,
        ExtractionPlan::new(""),
        Some("extract stuff"),
        &ExtractionOptions::default(),
        &CancelToken::new(),
        Arc::new(|_| {}),
    )
    .await
    .expect("extraction should succeed");

    match output.result.field_values.get("content") {
        Some(FieldValue::String(s)) => assert!(!s.is_empty()),
        other => panic!("expected non-null content field, got {other:?}"),
    }
}
