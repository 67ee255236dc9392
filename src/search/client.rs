//! Search engine adapter: boundary validation and fail-to-empty

use crate::paper::{Paper, PaperMetadata};
use crate::search::{SearchEngine, SearchHit, SearchOperator};
use crate::timewindow::DateRange;
use std::sync::Arc;
use tracing::{debug, warn};

/// Thin adapter over the external search engine.
///
/// Converts raw hits into validated [`Paper`] records and absorbs engine
/// failures: an unreachable or erroring engine degrades to zero results.
pub struct SearchClient {
    engine: Arc<dyn SearchEngine>,
}

impl SearchClient {
    pub fn new(engine: Arc<dyn SearchEngine>) -> Self {
        Self { engine }
    }

    /// Run one query and return papers in engine rank order.
    ///
    /// Each paper carries the engine-native relevance score; fusion decides
    /// downstream whether that score or the rank position matters.
    pub fn search(
        &self,
        keywords: &[String],
        filter: Option<&DateRange>,
        size: usize,
        operator: SearchOperator,
    ) -> Vec<Paper> {
        if keywords.is_empty() {
            return Vec::new();
        }

        let hits = match self.engine.search(keywords, filter, size, operator) {
            Ok(hits) => hits,
            Err(e) => {
                warn!("Search engine call failed, treating as zero hits: {}", e);
                return Vec::new();
            }
        };

        debug!(
            hits = hits.len(),
            ?operator,
            "Search engine returned ranked hits"
        );

        hits.into_iter().map(paper_from_hit).collect()
    }
}

fn paper_from_hit(hit: SearchHit) -> Paper {
    let metadata = PaperMetadata::from_value(&hit.fields);
    let content = hit
        .fields
        .get("content")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let mut paper = Paper::new(hit.id, metadata, content);
    paper.relevance_score = hit.score;
    paper
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::EngineError;
    use serde_json::json;

    struct FailingEngine;

    impl SearchEngine for FailingEngine {
        fn search(
            &self,
            _keywords: &[String],
            _filter: Option<&DateRange>,
            _size: usize,
            _operator: SearchOperator,
        ) -> Result<Vec<SearchHit>, EngineError> {
            Err(EngineError::Unavailable("connection refused".to_string()))
        }
    }

    struct SingleHitEngine;

    impl SearchEngine for SingleHitEngine {
        fn search(
            &self,
            _keywords: &[String],
            _filter: Option<&DateRange>,
            _size: usize,
            _operator: SearchOperator,
        ) -> Result<Vec<SearchHit>, EngineError> {
            Ok(vec![SearchHit {
                id: "gwas_2025_001.pdf".to_string(),
                score: 12.5,
                fields: json!({
                    "title": "GWAS of type 2 diabetes",
                    "content": "full body text",
                    "url": "https://example.org/gwas"
                }),
            }])
        }
    }

    #[test]
    fn test_engine_failure_degrades_to_empty() {
        let client = SearchClient::new(Arc::new(FailingEngine));
        let papers = client.search(
            &["GWAS".to_string()],
            None,
            100,
            SearchOperator::And,
        );
        assert!(papers.is_empty());
    }

    #[test]
    fn test_hit_validated_into_paper() {
        let client = SearchClient::new(Arc::new(SingleHitEngine));
        let papers = client.search(&["GWAS".to_string()], None, 100, SearchOperator::And);

        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].paper_id, "gwas_2025_001.pdf");
        assert_eq!(papers[0].title(), "GWAS of type 2 diabetes");
        assert_eq!(papers[0].content, "full body text");
        assert_eq!(papers[0].relevance_score, 12.5);
    }

    #[test]
    fn test_empty_keywords_skip_engine() {
        let client = SearchClient::new(Arc::new(FailingEngine));
        assert!(client.search(&[], None, 100, SearchOperator::Or).is_empty());
    }
}
