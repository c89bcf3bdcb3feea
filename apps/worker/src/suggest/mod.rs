//! Suggestion Generator — builds a structured prompt from a job description
//! and the user's resume, invokes the model, and parses its output into a
//! typed `SuggestionSet`.
//!
//! This stage never errors. A missing suggestion must not prevent a posting
//! from being recorded, so every failure path degrades: unparsable output is
//! wrapped as a single general suggestion, and provider failures (or a
//! missing API key) return a fixed canned set. The `source` tag keeps
//! fallback data distinguishable from real model output.

pub mod prompts;

use async_trait::async_trait;
use tracing::warn;

use crate::llm_client::{strip_json_fences, LlmClient};
use crate::models::job::{ExtractedPosting, JobQuery, ResumeData};
use crate::models::suggestion::{Suggestion, SuggestionSet};
use crate::suggest::prompts::SUGGESTION_PROMPT_TEMPLATE;

/// Where a suggestion set actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionSource {
    /// Parsed from structured model output.
    Model,
    /// The model answered, but not in the requested schema; the raw text is
    /// wrapped as a single general suggestion.
    RawText,
    /// The canned set — provider unavailable or unconfigured.
    Fallback,
}

#[derive(Debug, Clone)]
pub struct GeneratedSuggestions {
    pub set: SuggestionSet,
    pub source: SuggestionSource,
}

#[async_trait]
pub trait SuggestionEngine: Send + Sync {
    async fn suggest(
        &self,
        posting: &ExtractedPosting,
        resume: &ResumeData,
        query: &JobQuery,
    ) -> GeneratedSuggestions;
}

pub struct GeminiSuggester {
    llm: Option<LlmClient>,
}

impl GeminiSuggester {
    /// `api_key: None` puts the engine permanently into fallback mode.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            llm: api_key.map(LlmClient::new),
        }
    }
}

#[async_trait]
impl SuggestionEngine for GeminiSuggester {
    async fn suggest(
        &self,
        posting: &ExtractedPosting,
        resume: &ResumeData,
        query: &JobQuery,
    ) -> GeneratedSuggestions {
        let Some(llm) = &self.llm else {
            warn!("GEMINI_API_KEY not configured; using fallback suggestions");
            return GeneratedSuggestions {
                set: fallback_suggestions(),
                source: SuggestionSource::Fallback,
            };
        };

        let prompt = build_prompt(posting, resume, query);

        match llm.generate(&prompt).await {
            Ok(text) => parse_model_response(&text),
            Err(e) => {
                warn!("Model call failed: {e}; using fallback suggestions");
                GeneratedSuggestions {
                    set: fallback_suggestions(),
                    source: SuggestionSource::Fallback,
                }
            }
        }
    }
}

/// Fills the fixed prompt template with job metadata, the extracted
/// description, and the resume serialized as pretty JSON.
fn build_prompt(posting: &ExtractedPosting, resume: &ResumeData, query: &JobQuery) -> String {
    SUGGESTION_PROMPT_TEMPLATE
        .replace("{job_name}", &query.name)
        .replace("{job_location}", &query.location)
        .replace("{job_type}", &query.job_type)
        .replace("{job_description}", &posting.description)
        .replace("{resume_json}", &resume.to_prompt_json())
}

/// Parses model output into a `SuggestionSet`, wrapping anything that is not
/// valid JSON as a single general suggestion carrying the raw text.
fn parse_model_response(text: &str) -> GeneratedSuggestions {
    match serde_json::from_str::<SuggestionSet>(strip_json_fences(text)) {
        Ok(set) => GeneratedSuggestions {
            set,
            source: SuggestionSource::Model,
        },
        Err(_) => GeneratedSuggestions {
            set: SuggestionSet::from_raw_text(text),
            source: SuggestionSource::RawText,
        },
    }
}

/// The canned set returned when the provider cannot be reached. Plausible
/// but fixed; the `Fallback` source tag is the only marker.
fn fallback_suggestions() -> SuggestionSet {
    SuggestionSet {
        suggestions: vec![
            Suggestion {
                category: "skills".to_string(),
                suggestion: "Add React.js and Node.js to your skills section".to_string(),
                priority: "high".to_string(),
            },
            Suggestion {
                category: "experience".to_string(),
                suggestion: "Quantify your achievements with specific metrics".to_string(),
                priority: "medium".to_string(),
            },
        ],
        resume_updates: serde_json::json!({
            "summary": "Experienced software developer with strong technical skills",
            "skills": ["React.js", "Node.js", "JavaScript"],
            "experience_highlights": ["Led development of web applications"]
        })
        .as_object()
        .cloned()
        .unwrap_or_default(),
        keywords_to_include: vec![
            "React".to_string(),
            "Node.js".to_string(),
            "JavaScript".to_string(),
            "API".to_string(),
        ],
        overall_assessment: "Your resume shows good experience but needs more specific technical skills."
            .to_string(),
    }
}
