//! Link Discovery — turns a job query into a ranked list of candidate
//! posting URLs via Brave Search.
//!
//! Discovery never fails: any provider problem (missing key, network error,
//! non-2xx) degrades to a fixed two-element fallback list so downstream
//! stages always have candidates to exercise. The result carries an explicit
//! source tag so callers and logs can tell real results from fallback data.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::models::job::{CandidateLink, JobQuery};

const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";
/// Results requested from the provider; filtered down to `MAX_LINKS`.
const SEARCH_RESULT_COUNT: u32 = 20;
/// Hard cap on discovered links per query.
const MAX_LINKS: usize = 10;
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Keyword allowlist: a result survives filtering only if its URL or title
/// contains at least one of these (known job boards plus generic terms).
const JOB_KEYWORDS: [&str; 15] = [
    "indeed",
    "linkedin",
    "glassdoor",
    "monster",
    "careerbuilder",
    "ziprecruiter",
    "simplyhired",
    "dice",
    "angel",
    "stackoverflow",
    "remote",
    "job",
    "career",
    "position",
    "opening",
];

/// Where a discovery result actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoverySource {
    /// Real results from the search provider.
    Provider,
    /// The fixed substitute list — provider unavailable or unconfigured.
    Fallback,
}

/// The outcome of one discovery call: at most `MAX_LINKS` links in provider
/// relevance order, tagged with their origin.
#[derive(Debug, Clone)]
pub struct DiscoveredLinks {
    pub links: Vec<CandidateLink>,
    pub source: DiscoverySource,
}

#[async_trait]
pub trait LinkSearcher: Send + Sync {
    async fn discover(&self, query: &JobQuery) -> DiscoveredLinks;
}

// ────────────────────────────────────────────────────────────────────────────
// Brave Search implementation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BraveResponse {
    web: Option<BraveWebResults>,
}

#[derive(Debug, Deserialize)]
struct BraveWebResults {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

pub struct BraveSearcher {
    client: Client,
    api_key: Option<String>,
}

impl BraveSearcher {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    async fn search_provider(
        &self,
        api_key: &str,
        query: &JobQuery,
    ) -> Result<Vec<BraveResult>, reqwest::Error> {
        let q = query.search_string();
        let count = SEARCH_RESULT_COUNT.to_string();
        let response = self
            .client
            .get(BRAVE_SEARCH_URL)
            .query(&[("q", q.as_str()), ("count", count.as_str()), ("country", "us")])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", api_key)
            .send()
            .await?
            .error_for_status()?;

        let body: BraveResponse = response.json().await?;
        Ok(body.web.map(|w| w.results).unwrap_or_default())
    }
}

#[async_trait]
impl LinkSearcher for BraveSearcher {
    async fn discover(&self, query: &JobQuery) -> DiscoveredLinks {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("BRAVE_API_KEY not configured; using fallback links");
            return DiscoveredLinks {
                links: fallback_links(),
                source: DiscoverySource::Fallback,
            };
        };

        match self.search_provider(api_key, query).await {
            Ok(results) => {
                let links = filter_job_links(results);
                info!(
                    "Discovered {} candidate links for '{}'",
                    links.len(),
                    query.search_string()
                );
                DiscoveredLinks {
                    links,
                    source: DiscoverySource::Provider,
                }
            }
            Err(e) => {
                warn!("Search provider error: {e}; using fallback links");
                DiscoveredLinks {
                    links: fallback_links(),
                    source: DiscoverySource::Fallback,
                }
            }
        }
    }
}

/// Keeps results whose URL or title contains a job keyword, preserving
/// provider order, capped at `MAX_LINKS`. Filtering only removes — it never
/// re-ranks or synthesizes entries.
fn filter_job_links(results: Vec<BraveResult>) -> Vec<CandidateLink> {
    results
        .into_iter()
        .filter(|r| {
            let url = r.url.to_lowercase();
            let title = r.title.to_lowercase();
            JOB_KEYWORDS
                .iter()
                .any(|k| url.contains(k) || title.contains(k))
        })
        .take(MAX_LINKS)
        .map(|r| CandidateLink {
            url: r.url,
            title: r.title,
            snippet: r.description,
        })
        .collect()
}

/// The fixed substitute list returned whenever the provider is unavailable.
pub fn fallback_links() -> Vec<CandidateLink> {
    vec![
        CandidateLink {
            url: "https://example.com/job1".to_string(),
            title: "Software Engineer at Example Corp".to_string(),
            snippet: "We are looking for a talented software engineer...".to_string(),
        },
        CandidateLink {
            url: "https://example.com/job2".to_string(),
            title: "Full Stack Developer".to_string(),
            snippet: "Join our team as a full stack developer...".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str, title: &str) -> BraveResult {
        BraveResult {
            url: url.to_string(),
            title: title.to_string(),
            description: "snippet".to_string(),
        }
    }

    #[test]
    fn test_filter_keeps_job_board_domains() {
        let links = filter_job_links(vec![
            result("https://www.indeed.com/viewjob?jk=1", "Backend Engineer"),
            result("https://example.org/blog", "My gardening blog"),
            result("https://boards.greenhouse.io/x", "Senior Rust Position"),
        ]);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://www.indeed.com/viewjob?jk=1");
        assert_eq!(links[1].title, "Senior Rust Position");
    }

    #[test]
    fn test_filter_never_admits_keyword_free_results() {
        let links = filter_job_links(vec![
            result("https://example.org/a", "Totally unrelated"),
            result("https://example.org/b", "Recipe collection"),
        ]);
        assert!(links.is_empty());
    }

    #[test]
    fn test_filter_caps_at_ten_and_preserves_order() {
        let results: Vec<BraveResult> = (0..15)
            .map(|i| result(&format!("https://jobs.example.com/{i}"), "Opening"))
            .collect();
        let links = filter_job_links(results);
        assert_eq!(links.len(), 10);
        assert_eq!(links[0].url, "https://jobs.example.com/0");
        assert_eq!(links[9].url, "https://jobs.example.com/9");
    }

    #[test]
    fn test_filter_matches_on_title_alone() {
        let links = filter_job_links(vec![result(
            "https://acme.example.org/openings/42",
            "Platform Engineer opening",
        )]);
        assert_eq!(links.len(), 1);
    }

    #[tokio::test]
    async fn test_discover_without_credentials_returns_fixed_fallback() {
        let searcher = BraveSearcher::new(None);
        let query = JobQuery {
            name: "Software Engineer".to_string(),
            location: "Remote".to_string(),
            job_type: "Full-time".to_string(),
        };

        let discovered = searcher.discover(&query).await;

        assert_eq!(discovered.source, DiscoverySource::Fallback);
        assert_eq!(discovered.links.len(), 2);
        for link in &discovered.links {
            assert!(!link.url.is_empty());
            assert!(!link.title.is_empty());
            assert!(!link.snippet.is_empty());
        }
        assert_eq!(discovered.links, fallback_links());
    }
}
