//! Core data model for the job-search pipeline.
//!
//! `JobSearchRequest` is the queue wire format; `CandidateLink` and
//! `ExtractedPosting` are transient per-stage values; `JobRecord` is the
//! final persisted unit (one row per successfully processed link).

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::suggestion::SuggestionSet;

/// A user's job-search submission, as delivered on the queue.
///
/// Wire format (JSON, camelCase) is owned by the producing API layer and
/// must not drift: `{jobName, jobLocation, jobType, userId, timestamp}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSearchRequest {
    pub job_name: String,
    pub job_location: String,
    pub job_type: String,
    pub user_id: Uuid,
    #[serde(rename = "timestamp")]
    pub submitted_at: DateTime<Utc>,
}

impl JobSearchRequest {
    pub fn query(&self) -> JobQuery {
        JobQuery {
            name: self.job_name.clone(),
            location: self.job_location.clone(),
            job_type: self.job_type.clone(),
        }
    }
}

/// The three search dimensions threaded through discovery and suggestions.
#[derive(Debug, Clone)]
pub struct JobQuery {
    pub name: String,
    pub location: String,
    pub job_type: String,
}

impl JobQuery {
    /// The exact search string sent to the provider and persisted as
    /// `search_query` on every record produced for this request.
    pub fn search_string(&self) -> String {
        format!("{} {} jobs {}", self.name, self.job_type, self.location)
    }
}

/// One search result believed to point at a job posting. Ephemeral — never
/// persisted; ordering reflects provider relevance.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateLink {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Title and description pulled out of one candidate link's HTML.
/// Both fields are always non-empty — extraction fills placeholders rather
/// than returning partial data.
#[derive(Debug, Clone)]
pub struct ExtractedPosting {
    pub title: String,
    pub description: String,
    pub source_url: String,
}

/// The user's stored resume, opaque to the pipeline. Read-only input to
/// suggestion generation.
#[derive(Debug, Clone)]
pub struct ResumeData(pub Value);

impl ResumeData {
    /// Pretty-printed JSON for prompt embedding.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_else(|_| self.0.to_string())
    }
}

/// The persisted unit: one processed posting plus optional suggestions,
/// immutable after creation.
#[derive(Debug, Clone)]
pub struct JobRecord {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub url: String,
    pub location: String,
    pub job_type: String,
    pub company: String,
    pub suggestions: Option<SuggestionSet>,
    pub search_query: String,
    pub scraped_at: DateTime<Utc>,
}

/// Derives a company name from a search-result title of the common
/// "Role at Company" shape. Only the segment directly after the first
/// " at " is taken; anything else maps to "Unknown".
pub fn company_from_link_title(title: &str) -> String {
    title
        .split(" at ")
        .nth(1)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| "Unknown".to_string())
}
