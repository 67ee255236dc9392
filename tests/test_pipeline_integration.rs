//! Integration test: the full search-to-report pipeline
//!
//! Exercises the orchestrator end to end with in-memory collaborators
//! standing in for the search index, the metadata store, and the language
//! model.

use paperlens::config::Config;
use paperlens::metadata::{MetadataStore, StoreError};
use paperlens::report::{LanguageModel, ModelError};
use paperlens::search::{EngineError, SearchEngine, SearchHit, SearchOperator};
use paperlens::timewindow::DateRange;
use paperlens::{SearchMode, SearchOrchestrator, SearchRequest, TimeWindow};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

struct StaticEngine {
    hits: Vec<SearchHit>,
    fail: bool,
}

impl SearchEngine for StaticEngine {
    fn search(
        &self,
        _keywords: &[String],
        _filter: Option<&DateRange>,
        size: usize,
        _operator: SearchOperator,
    ) -> Result<Vec<SearchHit>, EngineError> {
        if self.fail {
            return Err(EngineError::Unavailable("cluster down".to_string()));
        }
        Ok(self.hits.iter().take(size).cloned().collect())
    }
}

struct MapStore {
    records: HashMap<String, Value>,
}

impl MetadataStore for MapStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.records.get(key).cloned())
    }
}

struct ScriptedModel {
    reply: Option<String>,
}

impl LanguageModel for ScriptedModel {
    fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
        match &self.reply {
            Some(text) => Ok(text.clone()),
            None => Err(ModelError::Unavailable("deadline exceeded".to_string())),
        }
    }
}

fn hit(id: &str, score: f64) -> SearchHit {
    SearchHit {
        id: id.to_string(),
        score,
        fields: json!({
            "title": format!("Study {}", id),
            "abstract": format!("Abstract of study {}", id),
            "url": format!("https://papers.example.org/{}", id),
            "content": "full body text",
        }),
    }
}

fn hits(n: usize) -> Vec<SearchHit> {
    (1..=n)
        .map(|i| hit(&format!("paper_{:03}.pdf", i), (n - i + 1) as f64))
        .collect()
}

fn orchestrator(
    engine_hits: Vec<SearchHit>,
    records: HashMap<String, Value>,
    reply: Option<&str>,
) -> SearchOrchestrator {
    SearchOrchestrator::new(
        Arc::new(StaticEngine {
            hits: engine_hits,
            fail: false,
        }),
        Arc::new(MapStore { records }),
        Arc::new(ScriptedModel {
            reply: reply.map(str::to_string),
        }),
        &Config::default(),
    )
    .unwrap()
}

#[test]
fn test_and_search_curates_but_counts_all_matches() {
    init_tracing();
    let orch = orchestrator(
        hits(20),
        HashMap::new(),
        Some("Risk prediction improved [1][2]."),
    );

    let request = SearchRequest::new(
        vec!["GWAS".to_string(), "PRS".to_string()],
        SearchMode::AllKeywords,
    );
    let outcome = orch.search(&request);

    // 20 matched, 15 shown, fused order preserved
    assert_eq!(outcome.total_found, 20);
    assert_eq!(outcome.papers.len(), 15);
    assert_eq!(outcome.papers[0].paper_id, "paper_001.pdf");
    assert!(outcome.papers[0].relevance_score > outcome.papers[14].relevance_score);

    let report = outcome.report.unwrap();
    assert!(report.contains(
        "<a href=\"https://papers.example.org/paper_001.pdf\" target=\"_blank\" class=\"citation-link\">[1]</a>"
    ));
    assert!(report.contains("### References"));
    assert!(report.contains("**[15]**"));
    assert!(!report.contains("**[16]**"));
}

#[test]
fn test_or_search_with_zero_hits() {
    let orch = orchestrator(vec![], HashMap::new(), Some("unused"));

    let request = SearchRequest::new(vec!["diabetes".to_string()], SearchMode::AnyKeyword);
    let outcome = orch.search(&request);

    assert!(outcome.report.is_none());
    assert!(outcome.papers.is_empty());
    assert_eq!(outcome.total_found, 0);
}

#[test]
fn test_citation_run_capped_to_three() {
    let orch = orchestrator(
        hits(5),
        HashMap::new(),
        Some("risk prediction improved [1][2][3][4]."),
    );

    let request = SearchRequest::new(vec!["PRS".to_string()], SearchMode::AllKeywords);
    let report = orch.search(&request).report.unwrap();

    // Only the first three survive the cap; [4] is dropped entirely
    let body = report.split("### References").next().unwrap();
    assert!(body.contains("citation-link\">[1]</a>"));
    assert!(body.contains("citation-link\">[2]</a>"));
    assert!(body.contains("citation-link\">[3]</a>"));
    assert!(!body.contains("[4]"));
}

#[test]
fn test_or_mode_splits_references_and_caps_analysis_set() {
    let orch = orchestrator(hits(18), HashMap::new(), Some("Broad survey [1]."));

    let request = SearchRequest::new(vec!["cancer".to_string()], SearchMode::AnyKeyword);
    let outcome = orch.search(&request);

    // OR mode returns everything, analysis subset capped at 15
    assert_eq!(outcome.total_found, 18);
    assert_eq!(outcome.papers.len(), 18);

    let report = outcome.report.unwrap();
    assert!(report.contains("#### References Used in Analysis"));
    assert!(report.contains("#### Additional References Found"));
    assert!(report.contains("**[16]**"));
    assert!(report.contains("**[18]**"));
}

#[test]
fn test_month_window_filters_on_authoritative_dates() {
    let mut records = HashMap::new();
    records.insert(
        "paper_001.metadata.json".to_string(),
        json!({"publication_date": "2025-03-15"}),
    );
    records.insert(
        "paper_002.metadata.json".to_string(),
        json!({"publication_date": "2025-04-01"}),
    );
    // paper_003 has no metadata record: retained fail-open

    let orch = orchestrator(hits(3), records, Some("March findings [1]."));

    let mut request = SearchRequest::new(vec!["GWAS".to_string()], SearchMode::AllKeywords);
    request.time_window = TimeWindow::Month(3);
    let outcome = orch.search(&request);

    let ids: Vec<&str> = outcome.papers.iter().map(|p| p.paper_id.as_str()).collect();
    assert_eq!(ids, vec!["paper_001.pdf", "paper_003.pdf"]);
    assert_eq!(outcome.total_found, 2);
}

#[test]
fn test_reconciler_refreshes_stale_titles() {
    let mut records = HashMap::new();
    records.insert(
        "paper_001.metadata.json".to_string(),
        json!({"title": "Corrected title", "journal": "Nature Genetics"}),
    );

    let orch = orchestrator(hits(1), records, Some("Report [1]."));

    let request = SearchRequest::new(vec!["GWAS".to_string()], SearchMode::AllKeywords);
    let outcome = orch.search(&request);

    let paper = &outcome.papers[0];
    assert_eq!(paper.metadata.title.as_deref(), Some("Corrected title"));
    assert_eq!(paper.metadata.journal.as_deref(), Some("Nature Genetics"));
    // Index-sourced fields absent from the record survive the merge
    assert_eq!(
        paper.metadata.url.as_deref(),
        Some("https://papers.example.org/paper_001.pdf")
    );

    // The refreshed title shows up in the references section
    let report = outcome.report.unwrap();
    assert!(report.contains("**[1]** [Corrected title]"));
}

#[test]
fn test_model_failure_still_returns_papers() {
    let orch = orchestrator(hits(3), HashMap::new(), None);

    let request = SearchRequest::new(vec!["GWAS".to_string()], SearchMode::AllKeywords);
    let outcome = orch.search(&request);

    assert!(outcome.report.is_none());
    assert_eq!(outcome.papers.len(), 3);
    assert_eq!(outcome.total_found, 3);
}

#[test]
fn test_engine_failure_degrades_to_empty_outcome() {
    init_tracing();
    let orch = SearchOrchestrator::new(
        Arc::new(StaticEngine {
            hits: vec![],
            fail: true,
        }),
        Arc::new(MapStore {
            records: HashMap::new(),
        }),
        Arc::new(ScriptedModel {
            reply: Some("unused".to_string()),
        }),
        &Config::default(),
    )
    .unwrap();

    let request = SearchRequest::new(vec!["GWAS".to_string()], SearchMode::AllKeywords);
    let outcome = orch.search(&request);

    assert!(outcome.report.is_none());
    assert!(outcome.papers.is_empty());
    assert_eq!(outcome.total_found, 0);
}
