//! Authoritative metadata store boundary and reconciliation
//!
//! The search index may hold stale or partial metadata; the authoritative
//! record for a paper lives in an external document store, keyed by a
//! deterministic transform of the paper id. Everything here fails open: a
//! missing or unreadable record leaves the paper untouched.

use crate::paper::Paper;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Suffix of the per-paper authoritative metadata record key.
pub const METADATA_SUFFIX: &str = ".metadata.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Metadata store unavailable: {0}")]
    Unavailable(String),

    #[error("Metadata record unreadable: {0}")]
    Unreadable(String),
}

/// External key-value document store boundary.
pub trait MetadataStore: Send + Sync {
    /// Fetch a JSON document by key; `Ok(None)` when no record exists.
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
}

/// Derive the metadata record key for a paper id: strip the trailing
/// extension segment, append the metadata suffix. Ids without an extension
/// get the suffix appended whole.
pub fn metadata_key(paper_id: &str) -> String {
    let stem = match paper_id.rfind('.') {
        Some(idx) => &paper_id[..idx],
        None => paper_id,
    };
    format!("{}{}", stem, METADATA_SUFFIX)
}

/// Refreshes paper metadata from the authoritative store after retrieval.
pub struct MetadataReconciler {
    store: Arc<dyn MetadataStore>,
}

impl MetadataReconciler {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Merge each paper's authoritative record into its metadata in place.
    ///
    /// Fetched fields win on conflict; fields absent from the record are
    /// preserved. Lookup failures degrade to "leave unchanged".
    pub fn reconcile(&self, papers: &mut [Paper]) {
        let mut refreshed = 0usize;

        for paper in papers.iter_mut() {
            let key = metadata_key(&paper.paper_id);
            match self.store.get(&key) {
                Ok(Some(record)) => {
                    paper.metadata.merge_from_value(&record);
                    refreshed += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(paper_id = %paper.paper_id, "Metadata lookup failed, keeping original: {}", e);
                }
            }
        }

        debug!(refreshed, total = papers.len(), "Metadata reconciliation done");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::PaperMetadata;
    use serde_json::json;
    use std::collections::HashMap;

    struct MapStore {
        records: HashMap<String, Value>,
        fail: bool,
    }

    impl MetadataStore for MapStore {
        fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("bucket gone".to_string()));
            }
            Ok(self.records.get(key).cloned())
        }
    }

    fn paper(id: &str, title: &str) -> Paper {
        Paper::new(
            id,
            PaperMetadata {
                title: Some(title.to_string()),
                ..Default::default()
            },
            String::new(),
        )
    }

    #[test]
    fn test_metadata_key_derivation() {
        assert_eq!(metadata_key("paper_001.pdf"), "paper_001.metadata.json");
        assert_eq!(
            metadata_key("archive.v2.pdf"),
            "archive.v2.metadata.json"
        );
        assert_eq!(metadata_key("no_extension"), "no_extension.metadata.json");
    }

    #[test]
    fn test_reconcile_merges_fetched_fields() {
        let mut records = HashMap::new();
        records.insert(
            "p1.metadata.json".to_string(),
            json!({"title": "Fresh", "publication_date": "2025-03-15"}),
        );
        let reconciler = MetadataReconciler::new(Arc::new(MapStore {
            records,
            fail: false,
        }));

        let mut papers = vec![paper("p1.pdf", "Stale"), paper("p2.pdf", "Untouched")];
        reconciler.reconcile(&mut papers);

        assert_eq!(papers[0].metadata.title.as_deref(), Some("Fresh"));
        assert_eq!(
            papers[0].metadata.publication_date.as_deref(),
            Some("2025-03-15")
        );
        assert_eq!(papers[1].metadata.title.as_deref(), Some("Untouched"));
    }

    #[test]
    fn test_store_failure_leaves_papers_unchanged() {
        let reconciler = MetadataReconciler::new(Arc::new(MapStore {
            records: HashMap::new(),
            fail: true,
        }));

        let mut papers = vec![paper("p1.pdf", "Original")];
        reconciler.reconcile(&mut papers);

        assert_eq!(papers[0].metadata.title.as_deref(), Some("Original"));
    }
}
