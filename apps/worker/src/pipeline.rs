//! Pipeline Orchestrator — drives discovery, extraction, suggestion
//! generation, and persistence for one job-search request.
//!
//! The unit of atomicity is the whole request, not each link: links are
//! processed sequentially and independently, and a failure on one (fetch
//! error, hostile page, write failure) is logged and skipped without
//! touching its siblings. A request counts as processed once the loop
//! completes, however many links failed along the way.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::errors::WorkerError;
use crate::models::job::{
    company_from_link_title, CandidateLink, ExtractedPosting, JobRecord, JobSearchRequest,
    ResumeData,
};
use crate::models::suggestion::SuggestionSet;
use crate::scrape::PostingExtractor;
use crate::search::{DiscoverySource, LinkSearcher};
use crate::store::JobStore;
use crate::suggest::{SuggestionEngine, SuggestionSource};

/// Links processed per queued request.
pub const WORKER_LINK_CAP: usize = 5;
/// Links processed by the immediate request-response variant.
#[allow(dead_code)] // reached from the API layer's immediate path, not the worker binary
pub const IMMEDIATE_LINK_CAP: usize = 3;

/// External collaborators injected into the orchestrator at startup.
/// Long-lived, connection-reusing clients — constructed once in `main`.
#[derive(Clone)]
pub struct PipelineDeps {
    pub searcher: Arc<dyn LinkSearcher>,
    pub extractor: Arc<dyn PostingExtractor>,
    pub suggester: Arc<dyn SuggestionEngine>,
    pub store: Arc<dyn JobStore>,
}

/// Counts for one completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSummary {
    pub discovered: usize,
    pub persisted: usize,
    pub failed: usize,
}

/// Aggregate result of the immediate variant. Nothing is persisted; the
/// caller gets everything in one response.
#[allow(dead_code)]
#[derive(Debug)]
pub struct ImmediateSearchResult {
    pub links: Vec<CandidateLink>,
    pub postings: Vec<ExtractedPosting>,
    pub suggestions: SuggestionSet,
    pub search_query: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Queued-request processing
// ────────────────────────────────────────────────────────────────────────────

/// Processes one queued request end to end.
///
/// Degradation policy: discovery never fails (fallback links); a missing or
/// unreadable resume skips suggestion generation for every link but leaves
/// discovery, extraction, and persistence running; per-link extraction and
/// persistence failures skip that link only.
pub async fn process_request(
    deps: &PipelineDeps,
    request: &JobSearchRequest,
) -> Result<ProcessSummary, WorkerError> {
    let query = request.query();
    info!(
        "Processing job search for user {}: {} in {} ({})",
        request.user_id, request.job_name, request.job_location, request.job_type
    );

    let discovered = deps.searcher.discover(&query).await;
    if discovered.source == DiscoverySource::Fallback {
        warn!("Link discovery degraded to fallback data for this request");
    }

    let resume = fetch_resume_best_effort(deps, request).await;

    let search_query = query.search_string();
    let mut persisted = 0;
    let mut failed = 0;
    let total = discovered.links.len().min(WORKER_LINK_CAP);

    for (i, link) in discovered.links.iter().take(WORKER_LINK_CAP).enumerate() {
        info!("Processing link {}/{}: {}", i + 1, total, link.url);

        let posting = match deps.extractor.extract(&link.url).await {
            Ok(posting) => posting,
            Err(e) => {
                warn!("Skipping link {}: {e}", link.url);
                failed += 1;
                continue;
            }
        };

        let suggestions = match &resume {
            Some(resume) => {
                let generated = deps.suggester.suggest(&posting, resume, &query).await;
                if generated.source != SuggestionSource::Model {
                    warn!(
                        "Suggestions for {} degraded to {:?}",
                        link.url, generated.source
                    );
                }
                Some(generated.set)
            }
            None => None,
        };

        let record = JobRecord {
            user_id: request.user_id,
            title: posting.title,
            description: posting.description,
            url: link.url.clone(),
            location: request.job_location.clone(),
            job_type: request.job_type.clone(),
            company: company_from_link_title(&link.title),
            suggestions,
            search_query: search_query.clone(),
            scraped_at: Utc::now(),
        };

        match deps.store.save_job(&record).await {
            Ok(()) => persisted += 1,
            Err(e) => {
                warn!("Failed to persist record for {}: {e}", link.url);
                failed += 1;
            }
        }
    }

    let summary = ProcessSummary {
        discovered: discovered.links.len(),
        persisted,
        failed,
    };
    info!(
        "Request complete for user {}: {}/{} links persisted ({} failed)",
        request.user_id, summary.persisted, total, summary.failed
    );
    Ok(summary)
}

/// Resume lookup degrades to `None` on both "not found" and read errors —
/// job discovery is still valuable without personalization.
async fn fetch_resume_best_effort(
    deps: &PipelineDeps,
    request: &JobSearchRequest,
) -> Option<ResumeData> {
    match deps.store.fetch_resume(request.user_id).await {
        Ok(Some(resume)) => Some(resume),
        Ok(None) => {
            warn!(
                "No resume on file for user {}; skipping suggestions",
                request.user_id
            );
            None
        }
        Err(e) => {
            warn!(
                "Could not fetch resume for user {}: {e}; skipping suggestions",
                request.user_id
            );
            None
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Immediate (request-response) variant
// ────────────────────────────────────────────────────────────────────────────

/// Runs the pipeline synchronously for the API's immediate path.
///
/// Unlike the queued path this requires a resume up front, caps extraction
/// at three links, generates one suggestion set from the first extracted
/// posting (or a synthesized description when none extract), and persists
/// nothing. Failures surface as a single `WorkerError`.
#[allow(dead_code)] // reached from the API layer's immediate path, not the worker binary
pub async fn process_immediate(
    deps: &PipelineDeps,
    request: &JobSearchRequest,
) -> Result<ImmediateSearchResult, WorkerError> {
    let query = request.query();

    let resume = deps
        .store
        .fetch_resume(request.user_id)
        .await?
        .ok_or(WorkerError::ResumeNotFound(request.user_id))?;

    let discovered = deps.searcher.discover(&query).await;

    let mut postings = Vec::new();
    for link in discovered.links.iter().take(IMMEDIATE_LINK_CAP) {
        match deps.extractor.extract(&link.url).await {
            Ok(posting) => postings.push(posting),
            Err(e) => warn!("Skipping link {}: {e}", link.url),
        }
    }

    let suggestions = match postings.first() {
        Some(posting) => deps.suggester.suggest(posting, &resume, &query).await.set,
        None => {
            // Nothing extracted: synthesize a generic description so the
            // user still gets tailoring advice for the role they asked for.
            let generic = ExtractedPosting {
                title: request.job_name.clone(),
                description: format!(
                    "We are looking for a {} to join our team in {}. This is a {} position \
                     that requires strong technical skills and experience in the field.",
                    request.job_name, request.job_location, request.job_type
                ),
                source_url: String::new(),
            };
            deps.suggester.suggest(&generic, &resume, &query).await.set
        }
    };

    Ok(ImmediateSearchResult {
        links: discovered.links,
        postings,
        suggestions,
        search_query: query.search_string(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::models::job::JobQuery;
    use crate::scrape::ExtractError;
    use crate::search::DiscoveredLinks;
    use crate::suggest::{GeneratedSuggestions, SuggestionSource};

    fn request() -> JobSearchRequest {
        JobSearchRequest {
            job_name: "Software Engineer".to_string(),
            job_location: "San Francisco, CA".to_string(),
            job_type: "Full-time".to_string(),
            user_id: Uuid::new_v4(),
            submitted_at: Utc::now(),
        }
    }

    fn links(n: usize) -> Vec<CandidateLink> {
        (1..=n)
            .map(|i| CandidateLink {
                url: format!("https://jobs.example.com/{i}"),
                title: format!("Engineer {i} at Company {i}"),
                snippet: "snippet".to_string(),
            })
            .collect()
    }

    struct StubSearcher {
        links: Vec<CandidateLink>,
    }

    #[async_trait]
    impl LinkSearcher for StubSearcher {
        async fn discover(&self, _query: &JobQuery) -> DiscoveredLinks {
            DiscoveredLinks {
                links: self.links.clone(),
                source: DiscoverySource::Provider,
            }
        }
    }

    /// Fails extraction for any URL containing one of the given markers.
    struct FlakyExtractor {
        fail_on: Vec<&'static str>,
    }

    #[async_trait]
    impl PostingExtractor for FlakyExtractor {
        async fn extract(&self, url: &str) -> Result<ExtractedPosting, ExtractError> {
            if self.fail_on.iter().any(|marker| url.contains(marker)) {
                // An unparsable URL yields a real reqwest::Error without
                // touching the network.
                let source = reqwest::Client::new()
                    .get("not a valid url")
                    .build()
                    .expect_err("request build must fail for an invalid URL");
                return Err(ExtractError::Fetch {
                    url: url.to_string(),
                    source,
                });
            }
            Ok(ExtractedPosting {
                title: format!("Posting for {url}"),
                description: "A long enough description of the role.".to_string(),
                source_url: url.to_string(),
            })
        }
    }

    struct StubSuggester;

    #[async_trait]
    impl SuggestionEngine for StubSuggester {
        async fn suggest(
            &self,
            _posting: &ExtractedPosting,
            _resume: &ResumeData,
            _query: &JobQuery,
        ) -> GeneratedSuggestions {
            GeneratedSuggestions {
                set: SuggestionSet::from_raw_text("stub advice"),
                source: SuggestionSource::Model,
            }
        }
    }

    /// In-memory store capturing saved records.
    struct MemoryStore {
        resume: Option<ResumeData>,
        saved: Mutex<Vec<JobRecord>>,
    }

    impl MemoryStore {
        fn new(resume: Option<ResumeData>) -> Self {
            Self {
                resume,
                saved: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl JobStore for MemoryStore {
        async fn fetch_resume(&self, _user_id: Uuid) -> Result<Option<ResumeData>, WorkerError> {
            Ok(self.resume.clone())
        }

        async fn save_job(&self, record: &JobRecord) -> Result<(), WorkerError> {
            self.saved.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    /// Store whose saves fail for URLs containing a marker; successful saves
    /// are captured like `MemoryStore`.
    struct RejectingStore {
        fail_save_on: &'static str,
        saved: Mutex<Vec<JobRecord>>,
    }

    #[async_trait]
    impl JobStore for RejectingStore {
        async fn fetch_resume(&self, _user_id: Uuid) -> Result<Option<ResumeData>, WorkerError> {
            Ok(Some(sample_resume()))
        }

        async fn save_job(&self, record: &JobRecord) -> Result<(), WorkerError> {
            if record.url.contains(self.fail_save_on) {
                return Err(WorkerError::Internal(anyhow::anyhow!(
                    "connection closed mid-write"
                )));
            }
            self.saved.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    fn deps(
        link_count: usize,
        fail_on: Vec<&'static str>,
        resume: Option<ResumeData>,
    ) -> (PipelineDeps, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(resume));
        let deps = PipelineDeps {
            searcher: Arc::new(StubSearcher {
                links: links(link_count),
            }),
            extractor: Arc::new(FlakyExtractor { fail_on }),
            suggester: Arc::new(StubSuggester),
            store: store.clone(),
        };
        (deps, store)
    }

    fn sample_resume() -> ResumeData {
        ResumeData(serde_json::json!({"skills": ["Rust"]}))
    }

    #[tokio::test]
    async fn test_partial_failure_persists_siblings() {
        // Link #3 fails to fetch; the other four must still be persisted.
        let (deps, store) = deps(5, vec!["/3"], Some(sample_resume()));

        let summary = process_request(&deps, &request()).await.unwrap();

        assert_eq!(summary.discovered, 5);
        assert_eq!(summary.persisted, 4);
        assert_eq!(summary.failed, 1);

        let saved = store.saved.lock().unwrap();
        let urls: Vec<&str> = saved.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://jobs.example.com/1",
                "https://jobs.example.com/2",
                "https://jobs.example.com/4",
                "https://jobs.example.com/5",
            ]
        );
    }

    #[tokio::test]
    async fn test_persistence_failure_skips_link_but_keeps_siblings() {
        // Saving link #2 fails; #1 and #3 must still land and the failure
        // must show up in the summary.
        let store = Arc::new(RejectingStore {
            fail_save_on: "/2",
            saved: Mutex::new(Vec::new()),
        });
        let deps = PipelineDeps {
            searcher: Arc::new(StubSearcher { links: links(3) }),
            extractor: Arc::new(FlakyExtractor { fail_on: vec![] }),
            suggester: Arc::new(StubSuggester),
            store: store.clone(),
        };

        let summary = process_request(&deps, &request()).await.unwrap();

        assert_eq!(summary.discovered, 3);
        assert_eq!(summary.persisted, 2);
        assert_eq!(summary.failed, 1);

        let saved = store.saved.lock().unwrap();
        let urls: Vec<&str> = saved.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://jobs.example.com/1", "https://jobs.example.com/3"]
        );
    }

    #[tokio::test]
    async fn test_missing_resume_persists_with_null_suggestions() {
        let (deps, store) = deps(3, vec![], None);

        let summary = process_request(&deps, &request()).await.unwrap();

        assert_eq!(summary.persisted, 3);
        let saved = store.saved.lock().unwrap();
        assert!(saved.iter().all(|r| r.suggestions.is_none()));
    }

    #[tokio::test]
    async fn test_resume_present_attaches_suggestions() {
        let (deps, store) = deps(2, vec![], Some(sample_resume()));

        process_request(&deps, &request()).await.unwrap();

        let saved = store.saved.lock().unwrap();
        assert!(saved.iter().all(|r| r.suggestions.is_some()));
    }

    #[tokio::test]
    async fn test_link_cap_is_five_for_queued_requests() {
        let (deps, store) = deps(9, vec![], Some(sample_resume()));

        let summary = process_request(&deps, &request()).await.unwrap();

        assert_eq!(summary.discovered, 9);
        assert_eq!(summary.persisted, 5);
        assert_eq!(store.saved.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_record_fields_come_from_request_and_link() {
        let (deps, store) = deps(1, vec![], None);
        let request = request();

        process_request(&deps, &request).await.unwrap();

        let saved = store.saved.lock().unwrap();
        let record = &saved[0];
        assert_eq!(record.user_id, request.user_id);
        assert_eq!(record.location, "San Francisco, CA");
        assert_eq!(record.job_type, "Full-time");
        assert_eq!(record.company, "Company 1");
        assert_eq!(
            record.search_query,
            "Software Engineer Full-time jobs San Francisco, CA"
        );
    }

    #[tokio::test]
    async fn test_immediate_requires_resume() {
        let (deps, _store) = deps(3, vec![], None);

        let result = process_immediate(&deps, &request()).await;

        assert!(matches!(result, Err(WorkerError::ResumeNotFound(_))));
    }

    #[tokio::test]
    async fn test_immediate_caps_at_three_and_persists_nothing() {
        let (deps, store) = deps(6, vec![], Some(sample_resume()));

        let result = process_immediate(&deps, &request()).await.unwrap();

        assert_eq!(result.links.len(), 6);
        assert_eq!(result.postings.len(), 3);
        assert!(store.saved.lock().unwrap().is_empty());
        assert!(!result.suggestions.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_immediate_synthesizes_description_when_all_extractions_fail() {
        let (deps, _store) = deps(2, vec!["jobs.example.com"], Some(sample_resume()));

        let result = process_immediate(&deps, &request()).await.unwrap();

        assert!(result.postings.is_empty());
        // Suggestions still produced from the synthesized description.
        assert!(!result.suggestions.suggestions.is_empty());
    }
}
