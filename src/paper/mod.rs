//! Typed paper data model
//!
//! The search index and the metadata store both speak loose JSON; this module
//! pins the fields down into a `Paper` record at the crate boundary. All
//! conversions are tolerant: unknown fields are ignored and missing fields
//! stay `None`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel rendered when a paper carries no resolvable link.
pub const LINK_NOT_AVAILABLE: &str = "Not available";

/// Descriptive fields for a paper.
///
/// The search index populates a partial version of this at retrieval time;
/// the authoritative copy lives in the external metadata store and is merged
/// in by the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaperMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(
        default,
        rename = "abstract",
        skip_serializing_if = "Option::is_none"
    )]
    pub abstract_text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi_url: Option<String>,
}

impl PaperMetadata {
    /// Extract metadata from a loose JSON object, tolerating type drift
    /// (authors as a string or an array, numeric years, etc.).
    pub fn from_value(value: &Value) -> Self {
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => return Self::default(),
        };

        Self {
            title: string_field(obj.get("title")),
            abstract_text: string_field(obj.get("abstract")),
            authors: authors_field(obj.get("authors")),
            journal: string_field(obj.get("journal")),
            publication_date: date_field(obj.get("publication_date")),
            url: string_field(obj.get("url")),
            link: string_field(obj.get("link")),
            doi_url: string_field(obj.get("doi_url")),
        }
    }

    /// Merge an authoritative metadata record into this metadata.
    ///
    /// Fetched fields win on conflict; fields absent from the record keep
    /// their current value. This mirrors a dict-update, not a replace.
    pub fn merge_from_value(&mut self, value: &Value) {
        let fetched = Self::from_value(value);

        if fetched.title.is_some() {
            self.title = fetched.title;
        }
        if fetched.abstract_text.is_some() {
            self.abstract_text = fetched.abstract_text;
        }
        if fetched.authors.is_some() {
            self.authors = fetched.authors;
        }
        if fetched.journal.is_some() {
            self.journal = fetched.journal;
        }
        if fetched.publication_date.is_some() {
            self.publication_date = fetched.publication_date;
        }
        if fetched.url.is_some() {
            self.url = fetched.url;
        }
        if fetched.link.is_some() {
            self.link = fetched.link;
        }
        if fetched.doi_url.is_some() {
            self.doi_url = fetched.doi_url;
        }
    }

    /// First of `url`, `link`, `doi_url` that looks like an HTTP URL.
    pub fn primary_link(&self) -> Option<&str> {
        [&self.url, &self.link, &self.doi_url]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|link| link.starts_with("http"))
    }
}

fn string_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn date_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        // Bare-year dates sometimes arrive as numbers
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn authors_field(value: Option<&Value>) -> Option<Vec<String>> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(vec![s.clone()]),
        Value::Array(items) => {
            let authors: Vec<String> = items
                .iter()
                .filter_map(|item| item.as_str())
                .map(str::to_string)
                .collect();
            if authors.is_empty() {
                None
            } else {
                Some(authors)
            }
        }
        _ => None,
    }
}

/// A retrieved document, constructed fresh per search call from index hits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    /// Opaque unique identifier, stable across index and metadata store
    pub paper_id: String,

    /// Descriptive fields; authoritative version held externally
    pub metadata: PaperMetadata,

    /// Full or partial extracted text, used for excerpting
    pub content: String,

    /// Fused RRF score in AND mode, raw engine relevance in OR mode
    pub relevance_score: f64,
}

impl Paper {
    pub fn new(paper_id: impl Into<String>, metadata: PaperMetadata, content: String) -> Self {
        Self {
            paper_id: paper_id.into(),
            metadata,
            content,
            relevance_score: 0.0,
        }
    }

    /// Title for display, falling back to the index placeholder.
    pub fn title(&self) -> &str {
        self.metadata.title.as_deref().unwrap_or("N/A")
    }

    /// Content excerpt for prompt building: prefer the abstract, fall back
    /// to raw content, truncate to `max_chars` on a char boundary.
    pub fn excerpt(&self, max_chars: usize) -> String {
        let source = self
            .metadata
            .abstract_text
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.content);
        source.chars().take(max_chars).collect()
    }
}
