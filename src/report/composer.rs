//! Prompt construction and report generation

use crate::config::ReportConfig;
use crate::paper::{Paper, LINK_NOT_AVAILABLE};
use crate::report::LanguageModel;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds the analysis prompt from a numbered source list and invokes the
/// language model. The contract is strictly result-or-nothing: any model
/// failure or empty response yields `None`, never a partial report.
pub struct ReportComposer {
    model: Arc<dyn LanguageModel>,
    config: ReportConfig,
}

impl ReportComposer {
    pub fn new(model: Arc<dyn LanguageModel>, config: ReportConfig) -> Self {
        Self { model, config }
    }

    /// Generate the thematic analysis report for the papers shown to the
    /// model. Source numbering is 1-based and must match the numbering the
    /// citation linker later resolves against.
    pub fn compose(&self, papers: &[Paper]) -> Option<String> {
        if papers.is_empty() {
            return None;
        }

        let prompt = self.build_analysis_prompt(papers);
        debug!(
            sources = papers.len(),
            prompt_chars = prompt.len(),
            "Invoking language model for analysis report"
        );
        self.generate(&prompt)
    }

    /// Generate a free-form summary of caller-supplied papers (the upload
    /// path). Returns a fixed notice for an empty set.
    pub fn compose_summary(&self, papers: &[Paper]) -> Option<String> {
        if papers.is_empty() {
            return Some("No papers uploaded.".to_string());
        }

        let titles: Vec<&str> = papers.iter().map(|p| p.title()).collect();
        let mut content = String::new();
        for paper in papers {
            let _ = write!(content, "\n\n--- {} ---\n{}", paper.title(), paper.content);
        }

        let prompt = format!(
            "Please provide a comprehensive summary of the following {count} research paper(s):\n\
             \n\
             Papers: {titles}\n\
             \n\
             Content:\n\
             {content}\n\
             \n\
             Please provide:\n\
             1. A brief overview of each paper\n\
             2. Key findings and methodologies\n\
             3. Common themes across the papers\n\
             4. Overall conclusions and implications\n\
             \n\
             Keep the summary concise but informative.",
            count = papers.len(),
            titles = titles.join(", "),
            content = content,
        );

        self.generate(&prompt)
    }

    fn generate(&self, prompt: &str) -> Option<String> {
        match self.model.generate(prompt) {
            Ok(text) if !text.trim().is_empty() => Some(text),
            Ok(_) => {
                warn!("Language model returned empty text, treating as no report");
                None
            }
            Err(e) => {
                warn!("Language model call failed, treating as no report: {}", e);
                None
            }
        }
    }

    fn build_analysis_prompt(&self, papers: &[Paper]) -> String {
        let mut context = String::from(
            "You are a world-class scientific analyst and expert research assistant. \
             Your primary objective is to generate the most detailed and extensive report \
             possible based on the following scientific paper excerpts.\n\n",
        );

        for (i, paper) in papers.iter().enumerate() {
            let link = paper
                .metadata
                .primary_link()
                .unwrap_or(LINK_NOT_AVAILABLE);
            let _ = write!(
                context,
                "SOURCE [{number}]:\nTitle: {title}\nLink: {link}\nContent: {excerpt}\n---\n\n",
                number = i + 1,
                title = paper.title(),
                link = link,
                excerpt = paper.excerpt(self.config.excerpt_max_chars),
            );
        }

        let cap = self.config.citation_cap;
        format!(
            "{context}\
---
**CRITICAL TASK:**

You are a world-class scientific analyst. Your task is to generate an exceptionally detailed \
and extensive multi-part report based *only* on the provided paper sources. The final report \
should be substantial in length, reflecting a deep synthesis of information from all provided papers.

# Part 1: Thematic Analysis
For the sections \"Key Methodological Advances,\" \"Emerging Trends,\" and \"Overall Summary,\" \
your analysis **MUST** be exhaustive. Generate at least **three long and detailed paragraphs** \
or a comprehensive multi-level bulleted list for each of these sections. Do not just list \
findings; you must deeply synthesize information across multiple sources, explain the \
significance, compare and contrast approaches, and build a compelling narrative about the state \
of the research.

   ### Diseases: List the specific diseases, conditions, or traits studied.
   ### Sample Size & Genetic Ancestry: Summarize sample sizes and genetic ancestries mentioned across the papers.
   ### Key Methodological Advances: Provide an in-depth description of significant methods, pipelines, or statistical approaches. Explain *why* they are important advances, how they differ from previous methods, and what new possibilities they unlock.
   ### Emerging Trends: Identify future directions and new research areas. Synthesize recurring themes to explain what trends are emerging in the field. Discuss the implications of these trends for science and medicine.
   ### Overall Summary: Provide a comprehensive, multi-paragraph textual summary of the key findings and clinical implications. This should be a full executive summary, not a brief conclusion.

**CRITICAL INSTRUCTION FOR PART 1:** At the end of every sentence or key finding that you derive \
from a source, you **MUST** include a citation marker referencing the source's number in \
brackets. For example: `This new method improves risk prediction [1].` Multiple sources can be \
cited like `This was observed in several cohorts [2][3].` **IMPORTANT:** Limit citations to a \
maximum of {cap} per sentence. If more than {cap} sources support a finding, choose the {cap} \
most relevant or representative sources.

# Part 2: Key Paper Summaries
Identify the top 3-5 most impactful papers from the sources and provide a detailed, \
one-paragraph summary for each.

**IMPORTANT:** Do NOT create a \"References\" section. Focus only on the thematic analysis and \
key paper summaries.

**CRITICAL INSTRUCTION FOR CITATIONS:** At the end of every sentence or key finding that you \
derive from a source, you **MUST** include a citation marker referencing the source's number in \
brackets. For example: `This new method improves risk prediction [1].` Multiple sources can be \
cited like `This was observed in several cohorts [2][3].` **IMPORTANT:** Always separate \
multiple citations with individual brackets, like `[2][3][4]` NOT `[234]`. **CRUCIAL:** In the \
Key Paper Summaries section, do NOT add citation numbers to the paper titles - only add \
citations at the end of the summary paragraphs. **FORMATTING RULE:** All citations MUST be in \
square brackets [1], [2], [3], etc. - never use unbracketed numbers for citations. **CITATION \
LIMIT:** Maximum {cap} citations per sentence. If more than {cap} sources support a finding, \
choose the {cap} most relevant or representative sources.
",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::PaperMetadata;
    use crate::report::ModelError;
    use std::sync::Mutex;

    struct ScriptedModel {
        reply: Result<String, ModelError>,
        last_prompt: Mutex<Option<String>>,
    }

    impl ScriptedModel {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                last_prompt: Mutex::new(None),
            }
        }
    }

    impl LanguageModel for ScriptedModel {
        fn generate(&self, prompt: &str) -> Result<String, ModelError> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(ModelError::Empty) => Err(ModelError::Empty),
                Err(ModelError::Unavailable(msg)) => Err(ModelError::Unavailable(msg.clone())),
            }
        }
    }

    fn sample_paper(title: &str, url: Option<&str>) -> Paper {
        Paper::new(
            format!("{}.pdf", title),
            PaperMetadata {
                title: Some(title.to_string()),
                abstract_text: Some(format!("Abstract of {}", title)),
                url: url.map(str::to_string),
                ..Default::default()
            },
            "body".to_string(),
        )
    }

    fn config() -> ReportConfig {
        ReportConfig {
            excerpt_max_chars: 4000,
            citation_cap: 3,
        }
    }

    #[test]
    fn test_prompt_numbers_sources_in_order() {
        let model = Arc::new(ScriptedModel::replying("report"));
        let composer = ReportComposer::new(model.clone(), config());

        let papers = vec![
            sample_paper("First", Some("https://example.org/1")),
            sample_paper("Second", None),
        ];
        let report = composer.compose(&papers);
        assert_eq!(report.as_deref(), Some("report"));

        let prompt = model.last_prompt.lock().unwrap().clone().unwrap();
        let first = prompt.find("SOURCE [1]:\nTitle: First").unwrap();
        let second = prompt.find("SOURCE [2]:\nTitle: Second").unwrap();
        assert!(first < second);
        assert!(prompt.contains("Link: https://example.org/1"));
        assert!(prompt.contains("Link: Not available"));
        assert!(prompt.contains("Maximum 3 citations per sentence"));
    }

    #[test]
    fn test_model_failure_yields_none() {
        let model = Arc::new(ScriptedModel {
            reply: Err(ModelError::Unavailable("quota".to_string())),
            last_prompt: Mutex::new(None),
        });
        let composer = ReportComposer::new(model, config());
        assert!(composer.compose(&[sample_paper("Only", None)]).is_none());
    }

    #[test]
    fn test_blank_response_yields_none() {
        let model = Arc::new(ScriptedModel::replying("   \n"));
        let composer = ReportComposer::new(model, config());
        assert!(composer.compose(&[sample_paper("Only", None)]).is_none());
    }

    #[test]
    fn test_empty_paper_set_skips_model() {
        let model = Arc::new(ScriptedModel::replying("report"));
        let composer = ReportComposer::new(model.clone(), config());
        assert!(composer.compose(&[]).is_none());
        assert!(model.last_prompt.lock().unwrap().is_none());
    }

    #[test]
    fn test_summary_of_empty_set() {
        let model = Arc::new(ScriptedModel::replying("summary"));
        let composer = ReportComposer::new(model, config());
        assert_eq!(
            composer.compose_summary(&[]).as_deref(),
            Some("No papers uploaded.")
        );
    }
}
