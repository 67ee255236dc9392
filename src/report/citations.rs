//! Inline citation linking and references rendering

use crate::paper::Paper;
use crate::search::SearchMode;
use regex::Regex;
use std::collections::HashSet;
use std::fmt::Write as _;
use thiserror::Error;

/// A maximal run of adjacent bracket groups, e.g. `[2][3][4]`
const MARKER_RUN_PATTERN: &str = r"\[\d+\](?:\[\d+\])*";

#[derive(Error, Debug)]
pub enum CitationError {
    #[error("Citation cap must be at least 1")]
    InvalidCap,

    #[error("Invalid citation pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Rewrites generated text so inline `[n]` markers become clickable links
/// bound to the n-th source, and appends the references section.
///
/// Both halves degrade gracefully: an empty source set returns the text
/// unchanged, an out-of-range or linkless marker stays plain. Numbers
/// outside bracket-marker syntax are never touched.
pub struct CitationLinker {
    citation_cap: usize,
    marker_run: Regex,
}

impl CitationLinker {
    pub fn new(citation_cap: usize) -> Result<Self, CitationError> {
        if citation_cap == 0 {
            return Err(CitationError::InvalidCap);
        }

        Ok(Self {
            citation_cap,
            marker_run: Regex::new(MARKER_RUN_PATTERN)?,
        })
    }

    /// Rewrite inline citation-marker runs against the sources the model saw.
    ///
    /// Each run keeps at most `citation_cap` numbers (the model was already
    /// instructed to cap itself; this re-applies the rule defensively). A
    /// number with a resolvable source link becomes an anchor, anything else
    /// stays a plain bracket.
    pub fn link_inline(&self, text: &str, sources: &[Paper]) -> String {
        if sources.is_empty() {
            return text.to_string();
        }

        self.marker_run
            .replace_all(text, |caps: &regex::Captures<'_>| {
                self.render_marker_run(&caps[0], sources)
            })
            .into_owned()
    }

    fn render_marker_run(&self, run: &str, sources: &[Paper]) -> String {
        let numbers = match parse_marker_run(run) {
            Some(numbers) => numbers,
            // Malformed run (number overflow): leave the text as-is
            None => return run.to_string(),
        };

        let mut rendered = String::new();
        for number in numbers.into_iter().take(self.citation_cap) {
            let link = number
                .checked_sub(1)
                .and_then(|idx| sources.get(idx))
                .and_then(|paper| paper.metadata.primary_link());

            match link {
                Some(link) => {
                    let _ = write!(
                        rendered,
                        "<a href=\"{}\" target=\"_blank\" class=\"citation-link\">[{}]</a>",
                        link, number
                    );
                }
                None => {
                    let _ = write!(rendered, "[{}]", number);
                }
            }
        }
        rendered
    }

    /// Append the references section, when requested.
    ///
    /// AND mode lists every reference in one flat numbered list. OR mode
    /// splits into the analyzed subset (numbered to match the inline
    /// markers) and the additional papers found, numbering continued, so
    /// inline citation `n` always refers to the n-th entry of the first
    /// sub-list.
    pub fn append_references(
        &self,
        text: String,
        all_papers: &[Paper],
        analysis_papers: &[Paper],
        mode: SearchMode,
    ) -> String {
        if all_papers.is_empty() {
            return text;
        }

        let mut section = String::from("\n\n---\n\n### References\n\n");

        if mode == SearchMode::AnyKeyword && !analysis_papers.is_empty() {
            section.push_str("#### References Used in Analysis\n\n");
            for (i, paper) in analysis_papers.iter().enumerate() {
                push_reference_entry(&mut section, i + 1, paper);
            }

            let analyzed: HashSet<&str> = analysis_papers
                .iter()
                .map(|p| p.paper_id.as_str())
                .collect();
            let additional: Vec<&Paper> = all_papers
                .iter()
                .filter(|p| !analyzed.contains(p.paper_id.as_str()))
                .collect();

            if !additional.is_empty() {
                section.push_str("#### Additional References Found\n\n");
                let start = analysis_papers.len() + 1;
                for (i, paper) in additional.into_iter().enumerate() {
                    push_reference_entry(&mut section, start + i, paper);
                }
            }
        } else {
            for (i, paper) in all_papers.iter().enumerate() {
                push_reference_entry(&mut section, i + 1, paper);
            }
        }

        text + &section
    }
}

fn push_reference_entry(section: &mut String, number: usize, paper: &Paper) {
    let title = paper.title();
    match paper.metadata.primary_link() {
        Some(link) => {
            let _ = write!(section, "**[{}]** [{}]({})\n\n", number, title, link);
        }
        None => {
            let _ = write!(section, "**[{}]** {}\n\n", number, title);
        }
    }
}

/// Parse a marker run into its citation numbers, in order.
///
/// The run is tokenized bracket group by bracket group rather than split by
/// regex, so adjacent groups stay intact and anything unparsable rejects the
/// whole run. Returns `None` when a group's digits overflow.
fn parse_marker_run(run: &str) -> Option<Vec<usize>> {
    let mut numbers = Vec::new();
    let mut chars = run.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '[' {
            return None;
        }
        let mut digits = String::new();
        for digit in chars.by_ref() {
            if digit == ']' {
                break;
            }
            digits.push(digit);
        }
        numbers.push(digits.parse::<usize>().ok()?);
    }

    Some(numbers)
}
