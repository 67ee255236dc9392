//! Reciprocal Rank Fusion and mode-specific ranking policy

use crate::paper::Paper;
use ahash::AHashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FusionError {
    #[error("Invalid fusion configuration: rrf_k must be positive")]
    InvalidK,

    #[error("Invalid fusion configuration: max_final_results must be positive")]
    InvalidResultCap,
}

/// Configuration for the AND-mode fusion policy
#[derive(Debug, Clone)]
pub struct FusionConfig {
    /// RRF K constant (typically 60)
    pub rrf_k: f64,

    /// Minimum fused score a paper must reach to be kept
    pub score_threshold: f64,

    /// Cap on the curated result list after filtering
    pub max_final_results: usize,
}

impl FusionConfig {
    pub fn new(
        rrf_k: f64,
        score_threshold: f64,
        max_final_results: usize,
    ) -> Result<Self, FusionError> {
        if rrf_k <= 0.0 {
            return Err(FusionError::InvalidK);
        }
        if max_final_results == 0 {
            return Err(FusionError::InvalidResultCap);
        }

        Ok(Self {
            rrf_k,
            score_threshold,
            max_final_results,
        })
    }
}

/// Result of a fusion run.
#[derive(Debug, Clone)]
pub struct FusionOutcome {
    /// Ranked, deduplicated papers after mode-specific filtering
    pub papers: Vec<Paper>,

    /// Unique papers seen before threshold filtering and truncation, so the
    /// caller can report how many papers matched even when fewer are shown
    pub total_found: usize,
}

/// Accumulated fusion state for one unique paper id.
struct FusionEntry {
    score: f64,
    doc: Paper,
}

/// Apply Reciprocal Rank Fusion over one or more ranked lists (AND mode).
///
/// RRF formula: score(id) = sum over contributing lists of: 1 / (k + rank),
/// rank 1-based. Contributions for the same paper id accumulate across
/// lists, so a document ranked by several sources rises. The output keeps
/// papers whose fused score reaches the threshold, sorted descending by
/// fused score and truncated to the configured cap. Ties keep the earliest
/// original rank (stable sort).
pub fn fuse_ranked_lists(lists: Vec<Vec<Paper>>, config: &FusionConfig) -> FusionOutcome {
    let mut entries: AHashMap<String, FusionEntry> = AHashMap::new();
    // First-seen order, so equal scores preserve original rank
    let mut order: Vec<String> = Vec::new();

    for list in lists {
        for (i, paper) in list.into_iter().enumerate() {
            let rank = i + 1;
            let contribution = 1.0 / (config.rrf_k + rank as f64);

            match entries.get_mut(&paper.paper_id) {
                Some(entry) => entry.score += contribution,
                None => {
                    order.push(paper.paper_id.clone());
                    entries.insert(
                        paper.paper_id.clone(),
                        FusionEntry {
                            score: contribution,
                            doc: paper,
                        },
                    );
                }
            }
        }
    }

    // Count unique matches before any filtering
    let total_found = entries.len();

    let mut fused: Vec<Paper> = order
        .into_iter()
        .filter_map(|id| entries.remove(&id))
        .map(|entry| {
            let mut paper = entry.doc;
            paper.relevance_score = entry.score;
            paper
        })
        .collect();

    fused.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    fused.retain(|paper| paper.relevance_score >= config.score_threshold);
    fused.truncate(config.max_final_results);

    FusionOutcome {
        papers: fused,
        total_found,
    }
}

/// Rank papers by engine-native relevance (OR mode).
///
/// No fusion, no threshold, no truncation: the user asked for everything
/// matching any keyword, so completeness wins over precision.
pub fn rank_by_relevance(mut papers: Vec<Paper>) -> FusionOutcome {
    papers.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let total_found = papers.len();
    FusionOutcome {
        papers,
        total_found,
    }
}
