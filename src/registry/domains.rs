//! Built-in domains seeded into a fresh [`super::DomainRegistry`].
//!
//! Ported at reduced field counts from the original Python
//! `dudoxx_extraction.domains` package (`medical_domain.py`,
//! `legal_domain.py`, `general_domain.py`).

use super::{DomainDefinition, FieldDefinition, SubDomainDefinition};
use crate::value::FieldType;

/// Registers the built-in `medical`, `legal` and `general` domains.
pub fn seed(registry: &mut super::DomainRegistry) {
    registry.register(medical());
    registry.register(legal());
    registry.register(general());
}

fn medical() -> DomainDefinition {
    let patient_info = SubDomainDefinition::new(
        "patient_info",
        "patient demographic information",
        vec![
            FieldDefinition::new("patient_name", "full name of the patient", FieldType::String)
                .required(true)
                .unique(true)
                .post_process_function("capitalize_names")
                .keywords(["patient", "name"])
                .priority(10),
            FieldDefinition::new("date_of_birth", "patient's date of birth", FieldType::Date)
                .unique(true)
                .format_function("format_date_iso")
                .keywords(["dob", "date of birth", "born"])
                .priority(8),
            FieldDefinition::new("gender", "patient's gender", FieldType::String)
                .unique(true)
                .keywords(["gender", "sex"]),
        ],
    )
    .expect("built-in medical patient_info fields are unique");

    let diagnoses = SubDomainDefinition::new(
        "diagnoses",
        "diagnoses and conditions recorded for the patient",
        vec![
            FieldDefinition::new("diagnoses", "list of diagnoses", FieldType::List)
                .required(true)
                .keywords(["diagnosis", "diagnosed", "condition"])
                .priority(9),
            FieldDefinition::new("diagnosis_date", "date a diagnosis was made", FieldType::Date)
                .format_function("format_date_iso")
                .keywords(["diagnosed on", "as of"]),
        ],
    )
    .expect("built-in medical diagnoses fields are unique");

    let medications = SubDomainDefinition::new(
        "medications",
        "medications prescribed to the patient",
        vec![FieldDefinition::new("medications", "list of prescribed medications", FieldType::List)
            .keywords(["medication", "prescribed", "dosage", "mg"])],
    )
    .expect("built-in medical medications fields are unique");

    DomainDefinition::new("medical", "medical records: patients, diagnoses, medications", vec![
        patient_info,
        diagnoses,
        medications,
    ])
    .keywords(["patient", "diagnosis", "medical", "treatment", "clinical"])
    .anti_hallucination_instructions(
        "Do not infer a diagnosis, medication, or date that is not explicitly stated in the text.",
    )
}

fn legal() -> DomainDefinition {
    let parties = SubDomainDefinition::new(
        "parties",
        "parties to the agreement",
        vec![FieldDefinition::new("parties", "list of named parties to the contract", FieldType::List)
            .required(true)
            .keywords(["party", "parties", "between", "and"])
            .priority(9)],
    )
    .expect("built-in legal parties fields are unique");

    let dates = SubDomainDefinition::new(
        "dates",
        "dates governing the agreement",
        vec![
            FieldDefinition::new("effective_date", "date the agreement takes effect", FieldType::Date)
                .unique(true)
                .format_function("format_date_iso")
                .keywords(["effective date", "commencing", "effective as of"])
                .priority(8),
            FieldDefinition::new("termination_date", "date the agreement ends", FieldType::Date)
                .unique(true)
                .format_function("format_date_iso")
                .keywords(["termination date", "expires", "end date"]),
        ],
    )
    .expect("built-in legal dates fields are unique");

    let obligations = SubDomainDefinition::new(
        "obligations",
        "obligations and covenants of the parties",
        vec![FieldDefinition::new("obligations", "list of contractual obligations", FieldType::List)
            .keywords(["shall", "agrees to", "obligation", "covenant"])],
    )
    .expect("built-in legal obligations fields are unique");

    DomainDefinition::new("legal", "legal contracts: parties, dates, obligations", vec![
        parties,
        dates,
        obligations,
    ])
    .keywords(["agreement", "contract", "party", "clause", "covenant"])
    .anti_hallucination_instructions(
        "Quote contractual language exactly; never paraphrase dates, party names or obligations.",
    )
}

fn general() -> DomainDefinition {
    let general_content = SubDomainDefinition::new(
        "general_content",
        "general content information",
        vec![
            FieldDefinition::new("content", "general content extracted from the text", FieldType::String)
                .required(true)
                .unique(true)
                .priority(5),
            FieldDefinition::new("entities", "named entities found in the text", FieldType::List),
            FieldDefinition::new("dates", "dates mentioned in the text", FieldType::List),
        ],
    )
    .expect("built-in general_content fields are unique");

    let key_value_pairs = SubDomainDefinition::new(
        "key_value_pairs",
        "key-value pairs extracted from the text",
        vec![FieldDefinition::new("pairs", "key-value pairs extracted from the text", FieldType::List)
            .required(true)],
    )
    .expect("built-in key_value_pairs fields are unique");

    DomainDefinition::new(
        "general",
        "fallback domain used when no specific domain is identified",
        vec![general_content, key_value_pairs],
    )
}
