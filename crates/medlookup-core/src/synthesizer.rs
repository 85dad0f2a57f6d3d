//! Answer text generation.
//!
//! Catalog-backed answers are phrased by the LLM from the record fields only;
//! general-knowledge answers are marked unverified. Disambiguation and
//! guidance replies are plain text.

use std::sync::Arc;

use medlookup_llm::{
    length_guidance, CompletionOptions, CompletionRequest, LlmClient, LlmError, Prompt,
    ASSISTANT_SYSTEM_PROMPT, GENERAL_KNOWLEDGE_SYSTEM_PROMPT,
};
use thiserror::Error;
use tracing::debug;

use crate::models::{MedicineRecord, MedicineSummary, QueryIntent, Suggestion};

/// Appended to catalog-backed answers.
pub const EDUCATIONAL_DISCLAIMER: &str = "This information is for educational purposes only; consult a licensed healthcare professional for personalized advice.";

/// Appended to general-knowledge answers.
pub const GENERAL_DISCLAIMER: &str = "Note: This is general medical information for educational purposes. For diagnosis or prescriptions, consult a licensed healthcare professional in person.";

pub const REJECTED_REPLY: &str = "That doesn't look like a medicine question. Ask about a medicine's price, composition, side effects or alternatives.";

pub const UNIDENTIFIED_REPLY: &str = "Could not identify a medicine name in your query. Please specify the medicine you want to know about.";

pub const NAME_TIP: &str = "Include the complete medicine name and strength (if known)";

/// Example queries shown with guidance replies.
pub const EXAMPLE_QUERIES: &[&str] = &[
    "What is the price of Paracetamol 650?",
    "Tell me about Allegra 120mg tablet",
    "Show alternatives to Azithral by Alembic",
];

/// Synthesis errors.
#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Prompt serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SynthesisError {
    pub fn is_transient(&self) -> bool {
        match self {
            SynthesisError::Llm(e) => e.is_retryable(),
            SynthesisError::Serialize(_) => false,
        }
    }
}

pub type SynthesisResult<T> = Result<T, SynthesisError>;

/// Turns resolved records into user-facing answer text.
#[derive(Debug, Clone)]
pub struct ResponseSynthesizer {
    llm: Arc<dyn LlmClient>,
    answer_options: CompletionOptions,
    general_options: CompletionOptions,
}

impl ResponseSynthesizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            answer_options: CompletionOptions::new(0.2, 600).with_top_p(1.0),
            general_options: CompletionOptions::new(0.3, 800).with_top_p(1.0),
        }
    }

    /// Model identifier for response metadata.
    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Answer from a catalog record, with the educational disclaimer appended.
    pub async fn synthesize(
        &self,
        intent: &QueryIntent,
        primary: &MedicineRecord,
        alternatives: &[MedicineRecord],
        message: &str,
    ) -> SynthesisResult<String> {
        let user = build_answer_prompt(intent, primary, alternatives, message)?;
        let request = CompletionRequest::text(
            Prompt::new(user).with_system(ASSISTANT_SYSTEM_PROMPT),
            self.answer_options,
        );

        debug!(medicine = %primary.name, query_type = %intent.query_type, "Synthesizing answer");
        let reply = self.llm.complete(&request).await?;
        Ok(format!("{}\n\n{}", reply.trim(), EDUCATIONAL_DISCLAIMER))
    }

    /// Answer from model knowledge alone, flagged as not from the catalog.
    pub async fn general_knowledge(
        &self,
        medicine_name: &str,
        message: &str,
    ) -> SynthesisResult<String> {
        let user = format!(
            "User query: \"{}\"\nMedicine: {}\n\nProvide general educational information about this medicine.",
            message.trim(),
            medicine_name
        );
        let request = CompletionRequest::text(
            Prompt::new(user).with_system(GENERAL_KNOWLEDGE_SYSTEM_PROMPT),
            self.general_options,
        );

        debug!(medicine = %medicine_name, "Falling back to general knowledge");
        let reply = self.llm.complete(&request).await?;
        Ok(format!(
            "{}\n\n{}\n\n---\n\n{}",
            not_found_notice(medicine_name),
            reply.trim(),
            GENERAL_DISCLAIMER
        ))
    }
}

/// The task prompt for a catalog-backed answer.
pub fn build_answer_prompt(
    intent: &QueryIntent,
    primary: &MedicineRecord,
    alternatives: &[MedicineRecord],
    message: &str,
) -> SynthesisResult<String> {
    let primary_json = serde_json::to_string(&primary.summary())?;
    let alternatives_json = serde_json::to_string(
        &alternatives
            .iter()
            .map(MedicineRecord::summary)
            .collect::<Vec<MedicineSummary>>(),
    )?;
    let query_type = intent.query_type.as_str();

    Ok(format!(
        r#"Task: Provide a clear, professional answer using the database fields supplied.

User query: "{message}"
Query type: {query_type}

Primary medicine (fields may be null; if null, write "Information not available"):
{primary_json}

Alternatives (up to 5, fields may be null; if null, write "Information not available"):
{alternatives_json}

Instructions:
- Start with the requested aspect ({query_type}) first.
- Include manufacturer, type, price, and pack size if available; if missing, write "Information not available".
- Summarize composition; if missing, write "Information not available".
- If present, mention key side effects and notable drug interactions briefly; otherwise state "Information not available".
- For alternatives, list 1-3 with a brief price/composition comparison; if none, say "Information not available".
- Avoid dosing and diagnosis; include relevant precautions.

Length: {length}."#,
        message = message.trim(),
        query_type = query_type,
        primary_json = primary_json,
        alternatives_json = alternatives_json,
        length = length_guidance(query_type),
    ))
}

/// Leading notice on general-knowledge answers.
pub fn not_found_notice(medicine_name: &str) -> String {
    format!(
        "\"{}\" was not found in our medicine database. The information below is general knowledge and has not been verified against our catalog.",
        medicine_name
    )
}

/// Ask the user to confirm one of the fuzzy candidates.
pub fn disambiguation_reply(term: &str, suggestions: &[Suggestion]) -> String {
    let mut reply = format!(
        "I couldn't find an exact match for \"{}\". Did you mean one of these?\n",
        term
    );
    for (i, s) in suggestions.iter().enumerate() {
        match s.manufacturer_name.as_deref() {
            Some(manufacturer) => {
                reply.push_str(&format!("\n{}. {} ({})", i + 1, s.name, manufacturer))
            }
            None => reply.push_str(&format!("\n{}. {}", i + 1, s.name)),
        }
    }
    reply.push_str("\n\nReply with the exact name to get full details.");
    reply
}
