//! Search orchestration: the pipeline entry point
//!
//! Ties the retrieval, fusion, filtering, reconciliation, composition, and
//! linking stages together. The orchestrator itself never fails: every
//! collaborator error is absorbed at its stage and degrades to the
//! documented empty or fail-open behavior, so the caller always gets a
//! well-formed outcome.

use crate::config::Config;
use crate::error::{PaperlensError, Result};
use crate::metadata::{MetadataReconciler, MetadataStore};
use crate::paper::Paper;
use crate::report::{CitationLinker, LanguageModel, ReportComposer};
use crate::search::{
    fuse_ranked_lists, rank_by_relevance, FusionConfig, FusionOutcome, SearchClient,
    SearchEngine, SearchMode, SearchRequest,
};
use crate::timewindow::{TimeWindow, TimeWindowFilter};
use std::sync::Arc;
use tracing::debug;

/// What one orchestrated search returns to the caller.
///
/// `report == None` unambiguously means "nothing found or generated"; the
/// caller owns how that is rendered.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Citation-linked analysis report, when one was generated
    pub report: Option<String>,

    /// Ranked references, deduplicated by paper id
    pub papers: Vec<Paper>,

    /// How many papers matched, counted before curation caps
    pub total_found: usize,
}

impl SearchOutcome {
    fn empty() -> Self {
        Self {
            report: None,
            papers: Vec::new(),
            total_found: 0,
        }
    }
}

/// The request-response pipeline: keywords and mode in, report and
/// references out. Holds no cross-request mutable state; concurrent
/// searches are independent.
pub struct SearchOrchestrator {
    client: SearchClient,
    fusion_config: FusionConfig,
    time_filter: TimeWindowFilter,
    reconciler: MetadataReconciler,
    composer: ReportComposer,
    linker: CitationLinker,
    and_query_size: usize,
    or_query_size: usize,
    max_final_results: usize,
}

impl SearchOrchestrator {
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        store: Arc<dyn MetadataStore>,
        model: Arc<dyn LanguageModel>,
        config: &Config,
    ) -> Result<Self> {
        let fusion_config = FusionConfig::new(
            config.search.rrf_k,
            config.search.score_threshold,
            config.search.max_final_results,
        )
        .map_err(|e| PaperlensError::Config(e.to_string()))?;

        let linker = CitationLinker::new(config.report.citation_cap)
            .map_err(|e| PaperlensError::Config(e.to_string()))?;

        Ok(Self {
            client: SearchClient::new(engine),
            fusion_config,
            time_filter: TimeWindowFilter::new(store.clone(), config.time.reference_year),
            reconciler: MetadataReconciler::new(store),
            composer: ReportComposer::new(model, config.report.clone()),
            linker,
            and_query_size: config.search.and_query_size,
            or_query_size: config.search.or_query_size,
            max_final_results: config.search.max_final_results,
        })
    }

    /// Run one search to completion.
    ///
    /// An empty keyword set is a caller-input condition, not a fault: it
    /// short-circuits to an empty outcome without touching the engine.
    pub fn search(&self, request: &SearchRequest) -> SearchOutcome {
        if request.keywords.is_empty() {
            return SearchOutcome::empty();
        }

        let size = match request.mode {
            SearchMode::AllKeywords => self.and_query_size,
            SearchMode::AnyKeyword => self.or_query_size,
        };

        // Native index date filtering is unreliable for this corpus; the
        // time window is applied as a post-filter below instead.
        let hits = self
            .client
            .search(&request.keywords, None, size, request.mode.operator());

        let FusionOutcome {
            mut papers,
            mut total_found,
        } = match request.mode {
            SearchMode::AllKeywords => fuse_ranked_lists(vec![hits], &self.fusion_config),
            SearchMode::AnyKeyword => rank_by_relevance(hits),
        };

        debug!(
            total_found,
            curated = papers.len(),
            mode = ?request.mode,
            "Fusion complete"
        );

        if request.time_window != TimeWindow::AllTime && !papers.is_empty() {
            papers = self.time_filter.apply(papers, request.time_window);
            total_found = papers.len();
        }

        if papers.is_empty() {
            return SearchOutcome::empty();
        }

        // OR mode shows the model a capped subset but lists everything as a
        // reference; AND mode is already curated, so both sets coincide.
        let analysis_len = match request.mode {
            SearchMode::AllKeywords => papers.len(),
            SearchMode::AnyKeyword => papers.len().min(self.max_final_results),
        };

        // The analysis subset is a prefix of the reference list, so one
        // reconciliation pass refreshes both sets.
        self.reconciler.reconcile(&mut papers);
        let analysis_papers = &papers[..analysis_len];

        let report = self.composer.compose(analysis_papers).map(|text| {
            let linked = self.linker.link_inline(&text, analysis_papers);
            if request.include_references {
                self.linker
                    .append_references(linked, &papers, analysis_papers, request.mode)
            } else {
                linked
            }
        });

        SearchOutcome {
            report,
            papers,
            total_found,
        }
    }
}
