//! Report composition and citation linking
//!
//! Turns a fused paper set into an LLM-generated report whose inline
//! citation markers link back to verifiable sources. The language model is
//! an external collaborator behind the [`LanguageModel`] trait.

mod citations;
mod composer;

pub use citations::CitationLinker;
pub use composer::ReportComposer;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Language model unavailable: {0}")]
    Unavailable(String),

    #[error("Language model returned an empty response")]
    Empty,
}

/// Generative language model boundary: one complete text per prompt, or an
/// explicit failure. No streaming, no function calling.
pub trait LanguageModel: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}
