//! Paperlens - Research-Paper Discovery & Synthesis Core
//!
//! A hybrid retrieval-and-citation pipeline: keywords and a search mode go
//! in, a ranked deduplicated paper list and a citation-linked analysis
//! report come out. The search index, metadata store, and language model
//! are external collaborators behind traits; the pipeline orchestrates them
//! with deterministic fusion and citation behavior.

pub mod config;
pub mod error;
pub mod metadata;
pub mod orchestrator;
pub mod paper;
pub mod report;
pub mod search;
pub mod timewindow;

pub use error::{PaperlensError, Result};
pub use orchestrator::{SearchOrchestrator, SearchOutcome};
pub use paper::{Paper, PaperMetadata};
pub use search::{SearchMode, SearchRequest};
pub use timewindow::TimeWindow;
