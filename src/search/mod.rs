//! Hybrid retrieval: search-engine boundary, rank fusion, and mode policy
//!
//! This module owns the path from a keyword set to a ranked, deduplicated
//! paper list. The full-text engine itself is an external collaborator
//! behind the [`SearchEngine`] trait.

mod client;
mod fusion;

pub use client::SearchClient;
pub use fusion::{fuse_ranked_lists, rank_by_relevance, FusionConfig, FusionError, FusionOutcome};

use crate::timewindow::{DateRange, TimeWindow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Search engine unavailable: {0}")]
    Unavailable(String),

    #[error("Search query rejected: {0}")]
    Query(String),
}

/// How keywords combine in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchOperator {
    And,
    Or,
}

/// Search mode selected by the user.
///
/// `AllKeywords` curates a small fused set; `AnyKeyword` favors
/// completeness over precision and returns everything that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    AllKeywords,
    AnyKeyword,
}

impl SearchMode {
    pub fn operator(self) -> SearchOperator {
        match self {
            SearchMode::AllKeywords => SearchOperator::And,
            SearchMode::AnyKeyword => SearchOperator::Or,
        }
    }
}

/// A single scored hit from the search engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Document id, stable across index and metadata store
    pub id: String,

    /// Engine-native relevance score
    pub score: f64,

    /// Source fields as indexed (title, abstract, content, ...)
    pub fields: Value,
}

/// Search request handed in by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Keywords to search for; an empty set short-circuits to an empty result
    pub keywords: Vec<String>,

    /// Keyword combination mode
    pub mode: SearchMode,

    /// Publication time window
    pub time_window: TimeWindow,

    /// Append a references section to the report (follow-up turns in a
    /// conversation suppress it to avoid duplicate lists)
    pub include_references: bool,
}

impl SearchRequest {
    pub fn new(keywords: Vec<String>, mode: SearchMode) -> Self {
        Self {
            keywords,
            mode,
            time_window: TimeWindow::AllTime,
            include_references: true,
        }
    }
}

/// External full-text search engine boundary.
///
/// Retry and backoff are the implementor's concern; the pipeline treats any
/// error as "zero results" and never crashes on it.
pub trait SearchEngine: Send + Sync {
    fn search(
        &self,
        keywords: &[String],
        filter: Option<&DateRange>,
        size: usize,
        operator: SearchOperator,
    ) -> Result<Vec<SearchHit>, EngineError>;
}
