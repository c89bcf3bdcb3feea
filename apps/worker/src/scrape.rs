//! Description Extractor — fetches a candidate link and heuristically pulls
//! a job title and description out of arbitrary third-party markup.
//!
//! Job postings live on heterogeneous sites with no shared markup
//! convention, so extraction is a cascade of selectors tried in order, with
//! whole-page fallbacks behind them. Only the HTTP fetch itself surfaces a
//! hard error; parsing always produces non-empty fields, placeholders
//! included. Selector lists are data — add new site patterns there, not in
//! the control flow.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use thiserror::Error;

use crate::models::job::ExtractedPosting;

/// Some job boards reject obvious bot agents, so we present as a browser.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Ordered title strategies; first non-empty trimmed match wins.
const TITLE_SELECTORS: [&str; 6] = [
    "h1",
    r#"[data-testid="job-title"]"#,
    ".job-title",
    ".title",
    r#"h1[class*="title"]"#,
    r#"h1[class*="job"]"#,
];

/// Ordered description strategies; first match longer than
/// `MIN_DESCRIPTION_LEN` wins. Shorter matches are noise (breadcrumbs,
/// teaser snippets) and are skipped.
const DESCRIPTION_SELECTORS: [&str; 10] = [
    r#"[data-testid="job-description"]"#,
    ".job-description",
    ".description",
    ".content",
    ".job-details",
    ".job-content",
    r#"[class*="description"]"#,
    r#"[class*="content"]"#,
    "main",
    "article",
];

const MIN_DESCRIPTION_LEN: usize = 100;
/// Cap on the whole-body fallback only; a selector match is kept in full.
const MAX_DESCRIPTION_LEN: usize = 3000;

const TITLE_PLACEHOLDER: &str = "Job Title Not Found";
const DESCRIPTION_PLACEHOLDER: &str = "Job description could not be extracted";

/// Page chrome excluded from the whole-body description fallback.
const CHROME_ELEMENTS: [&str; 6] = ["nav", "header", "footer", "aside", "script", "style"];
const CHROME_CLASSES: [&str; 4] = ["nav", "header", "footer", "sidebar"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[async_trait]
pub trait PostingExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<ExtractedPosting, ExtractError>;
}

pub struct HtmlExtractor {
    client: Client,
}

impl HtmlExtractor {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .user_agent(BROWSER_USER_AGENT)
                .build()
                .expect("Failed to build HTTP client"),
        }
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostingExtractor for HtmlExtractor {
    async fn extract(&self, url: &str) -> Result<ExtractedPosting, ExtractError> {
        let fetch_err = |source| ExtractError::Fetch {
            url: url.to_string(),
            source,
        };

        let html = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fetch_err)?
            .text()
            .await
            .map_err(fetch_err)?;

        Ok(parse_posting(&html, url))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pure HTML heuristics
// ────────────────────────────────────────────────────────────────────────────

/// Runs the full selector cascade over one page. Infallible: every path ends
/// in non-empty `title` and `description`, falling back to fixed
/// placeholders when nothing usable is found.
pub fn parse_posting(html: &str, url: &str) -> ExtractedPosting {
    let document = Html::parse_document(html);

    let title = select_title(&document)
        .or_else(|| first_heading(&document))
        .unwrap_or_else(|| TITLE_PLACEHOLDER.to_string());

    let description = select_description(&document)
        .or_else(|| body_text_without_chrome(&document))
        .unwrap_or_else(|| DESCRIPTION_PLACEHOLDER.to_string());

    ExtractedPosting {
        title,
        description,
        source_url: url.to_string(),
    }
}

fn select_title(document: &Html) -> Option<String> {
    for raw in TITLE_SELECTORS {
        let selector = Selector::parse(raw).expect("title selector list entries are valid CSS");
        if let Some(element) = document.select(&selector).next() {
            let text = collapse_whitespace(&element.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

fn select_description(document: &Html) -> Option<String> {
    for raw in DESCRIPTION_SELECTORS {
        let selector =
            Selector::parse(raw).expect("description selector list entries are valid CSS");
        if let Some(element) = document.select(&selector).next() {
            let text = collapse_whitespace(&element.text().collect::<String>());
            if text.len() > MIN_DESCRIPTION_LEN {
                return Some(text);
            }
        }
    }
    None
}

/// Title fallback: text of the first h1/h2/h3 on the page.
fn first_heading(document: &Html) -> Option<String> {
    let selector = Selector::parse("h1, h2, h3").expect("heading selector is valid CSS");
    document.select(&selector).find_map(|element| {
        let text = collapse_whitespace(&element.text().collect::<String>());
        (!text.is_empty()).then_some(text)
    })
}

/// Description fallback: all body text with navigation/header/footer/sidebar
/// subtrees removed, whitespace collapsed, truncated to the length cap.
fn body_text_without_chrome(document: &Html) -> Option<String> {
    let selector = Selector::parse("body").expect("body selector is valid CSS");
    let body = document.select(&selector).next()?;

    let mut raw = String::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let inside_chrome = node.ancestors().any(|ancestor| {
            ancestor.value().as_element().is_some_and(|el| {
                CHROME_ELEMENTS.contains(&el.name())
                    || el.classes().any(|class| {
                        CHROME_CLASSES
                            .iter()
                            .any(|chrome| class.eq_ignore_ascii_case(chrome))
                    })
            })
        });
        if !inside_chrome {
            raw.push_str(text);
            raw.push(' ');
        }
    }

    let text = collapse_whitespace(&raw);
    (!text.is_empty()).then(|| truncate_chars(&text, MAX_DESCRIPTION_LEN))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Char-boundary-safe truncation.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://example.com/posting";

    fn long_text(words: usize) -> String {
        vec!["responsibility"; words].join(" ")
    }

    #[test]
    fn test_title_from_h1() {
        let html = "<html><body><h1>Senior Rust Engineer</h1></body></html>";
        let posting = parse_posting(html, URL);
        assert_eq!(posting.title, "Senior Rust Engineer");
        assert_eq!(posting.source_url, URL);
    }

    #[test]
    fn test_title_from_test_id_when_h1_empty() {
        let html = r#"<html><body>
            <h1>   </h1>
            <div data-testid="job-title">Staff Platform Engineer</div>
        </body></html>"#;
        let posting = parse_posting(html, URL);
        assert_eq!(posting.title, "Staff Platform Engineer");
    }

    #[test]
    fn test_title_fallback_to_first_heading() {
        let html = "<html><body><h2>Engineering Manager</h2></body></html>";
        let posting = parse_posting(html, URL);
        assert_eq!(posting.title, "Engineering Manager");
    }

    #[test]
    fn test_title_placeholder_when_no_headings() {
        let html = "<html><body><p>nothing here</p></body></html>";
        let posting = parse_posting(html, URL);
        assert_eq!(posting.title, "Job Title Not Found");
    }

    #[test]
    fn test_description_from_class_selector() {
        let body = long_text(40);
        let html = format!(
            r#"<html><body><h1>Role</h1><div class="job-description">{body}</div></body></html>"#
        );
        let posting = parse_posting(&html, URL);
        assert!(posting.description.starts_with("responsibility"));
        assert!(posting.description.len() > MIN_DESCRIPTION_LEN);
    }

    #[test]
    fn test_short_description_match_is_skipped_as_noise() {
        // `.description` matches but is under the length floor; the longer
        // `main` content must win instead.
        let main_text = long_text(40);
        let html = format!(
            r#"<html><body>
                <div class="description">Apply now</div>
                <main>{main_text}</main>
            </body></html>"#
        );
        let posting = parse_posting(&html, URL);
        assert!(posting.description.contains("responsibility"));
        assert!(!posting.description.contains("Apply now"));
    }

    #[test]
    fn test_body_fallback_strips_chrome() {
        let filler = long_text(40);
        let html = format!(
            r#"<html><body>
                <nav>Home Jobs About</nav>
                <div class="sidebar">Related links</div>
                <p>{filler}</p>
                <footer>Copyright 2024</footer>
            </body></html>"#
        );
        let posting = parse_posting(&html, URL);
        assert!(posting.description.contains("responsibility"));
        assert!(!posting.description.contains("Copyright"));
        assert!(!posting.description.contains("Related links"));
        assert!(!posting.description.contains("Home Jobs About"));
    }

    #[test]
    fn test_description_placeholder_on_empty_page() {
        let posting = parse_posting("<html><body></body></html>", URL);
        assert_eq!(posting.description, "Job description could not be extracted");
    }

    #[test]
    fn test_fields_never_empty() {
        for html in ["", "<html></html>", "<p>x</p>", "not html at all"] {
            let posting = parse_posting(html, URL);
            assert!(!posting.title.is_empty());
            assert!(!posting.description.is_empty());
        }
    }

    #[test]
    fn test_selector_description_kept_in_full() {
        // Long postings matched by a selector must not be cut down.
        let body = "x".repeat(4000);
        let html =
            format!(r#"<html><body><div class="job-description">{body}</div></body></html>"#);
        let posting = parse_posting(&html, URL);
        assert_eq!(posting.description.chars().count(), 4000);
    }

    #[test]
    fn test_body_fallback_truncated_to_cap() {
        // No description selector matches; the whole-body fallback is capped.
        let huge = long_text(600);
        let html = format!("<html><body><p>{huge}</p></body></html>");
        let posting = parse_posting(&html, URL);
        assert_eq!(posting.description.chars().count(), MAX_DESCRIPTION_LEN);
    }

    #[test]
    fn test_whitespace_collapsed_in_fallback() {
        let words = long_text(40);
        let html = format!("<html><body><p>several\n\n   spaced\t{words}</p></body></html>");
        let posting = parse_posting(&html, URL);
        assert!(posting.description.starts_with("several spaced"));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }
}
