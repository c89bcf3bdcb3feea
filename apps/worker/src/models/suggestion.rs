//! Typed model for AI resume-tailoring suggestions.
//!
//! The JSON field names mirror the schema the model is prompted to produce
//! and the `ai_suggestions` column the API layer reads back, so they must
//! stay in snake_case exactly as written here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One actionable suggestion for tailoring the resume to a posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub category: String,
    pub suggestion: String,
    pub priority: String,
}

/// The full structured output of one suggestion-generation call.
///
/// Always well-formed: `suggestions` may be empty, but the object itself is
/// never absent. Missing fields in model output default rather than failing
/// the parse — the schema is trusted, not deeply validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionSet {
    #[serde(default)]
    pub suggestions: Vec<Suggestion>,
    #[serde(default)]
    pub resume_updates: Map<String, Value>,
    #[serde(default)]
    pub keywords_to_include: Vec<String>,
    #[serde(default)]
    pub overall_assessment: String,
}

impl SuggestionSet {
    /// Wraps unparsable model output as a single general suggestion so the
    /// raw advice is still surfaced to the user.
    pub fn from_raw_text(text: &str) -> Self {
        SuggestionSet {
            suggestions: vec![Suggestion {
                category: "general".to_string(),
                suggestion: text.to_string(),
                priority: "medium".to_string(),
            }],
            resume_updates: Map::new(),
            keywords_to_include: Vec::new(),
            overall_assessment: "AI analysis completed".to_string(),
        }
    }
}
