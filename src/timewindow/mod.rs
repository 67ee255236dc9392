//! Publication time windows and authoritative-date post-filtering
//!
//! The search index's native date field is unreliable in this corpus, so
//! windows are applied in two stages: resolve the human-readable selector
//! into a concrete date range, then post-filter candidates against the
//! authoritative publication date held in the metadata store. Papers whose
//! authoritative date cannot be fetched or parsed are retained (fail-open)
//! rather than silently dropped over a metadata gap.

use crate::metadata::{metadata_key, MetadataStore};
use crate::paper::Paper;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Human time-window selector, as handed over by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeWindow {
    AllTime,
    CurrentYear,
    LastThreeMonths,
    LastSixMonths,
    /// Calendar month of the reference year, 1-based
    Month(u32),
}

impl TimeWindow {
    /// Parse the UI selector strings ("All time", "Current year",
    /// "Last 3 months", "Last 6 months", or a month name).
    pub fn from_selector(selector: &str) -> Option<Self> {
        match selector {
            "All time" => Some(TimeWindow::AllTime),
            "Current year" => Some(TimeWindow::CurrentYear),
            "Last 3 months" => Some(TimeWindow::LastThreeMonths),
            "Last 6 months" => Some(TimeWindow::LastSixMonths),
            name => MONTH_NAMES
                .iter()
                .position(|m| *m == name)
                .map(|idx| TimeWindow::Month(idx as u32 + 1)),
        }
    }
}

/// Half-open date range: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

/// Resolve a window into a concrete range for the reference year.
///
/// `AllTime` resolves to `None` (no predicate). The relative windows all
/// pin to the reference year: "Last 3 months" and "Last 6 months" keep the
/// within-the-active-year semantics of the original selector set. Month
/// windows cover `[first_of_month, first_of_next_month)`, with December
/// rolling over into January of the following year.
pub fn resolve_window(window: TimeWindow, reference_year: i32) -> Option<DateRange> {
    match window {
        TimeWindow::AllTime => None,
        TimeWindow::CurrentYear | TimeWindow::LastThreeMonths | TimeWindow::LastSixMonths => {
            Some(DateRange {
                start: NaiveDate::from_ymd_opt(reference_year, 1, 1)?,
                end: NaiveDate::from_ymd_opt(reference_year + 1, 1, 1)?,
            })
        }
        TimeWindow::Month(month) => {
            let (next_year, next_month) = if month == 12 {
                (reference_year + 1, 1)
            } else {
                (reference_year, month + 1)
            };
            Some(DateRange {
                start: NaiveDate::from_ymd_opt(reference_year, month, 1)?,
                end: NaiveDate::from_ymd_opt(next_year, next_month, 1)?,
            })
        }
    }
}

/// Parse a publication date in any of the formats the corpus carries:
/// ISO (`YYYY-MM-DD`, `YYYY-MM`), `DD Mon YYYY`, `Mon YYYY`, bare year.
/// Timestamps are truncated to their date part.
pub fn parse_publication_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // Timestamp forms: keep the date part only
    let date_part = raw.split('T').next().unwrap_or(raw);

    if let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Some(date);
    }
    for format in ["%d %b %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    // YYYY-MM: first day of the month
    if let Some((year, month)) = date_part.split_once('-') {
        if year.len() == 4 {
            if let (Ok(y), Ok(m)) = (year.parse::<i32>(), month.parse::<u32>()) {
                if let Some(date) = NaiveDate::from_ymd_opt(y, m, 1) {
                    return Some(date);
                }
            }
        }
    }

    // Mon YYYY: first day of the month
    for format in ["%d %b %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("01 {}", raw), format) {
            return Some(date);
        }
    }

    // Bare year: January 1st
    if raw.len() == 4 && raw.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(year) = raw.parse::<i32>() {
            return NaiveDate::from_ymd_opt(year, 1, 1);
        }
    }

    None
}

/// Post-filters papers against their authoritative publication date.
pub struct TimeWindowFilter {
    store: Arc<dyn MetadataStore>,
    reference_year: i32,
}

impl TimeWindowFilter {
    pub fn new(store: Arc<dyn MetadataStore>, reference_year: i32) -> Self {
        Self {
            store,
            reference_year,
        }
    }

    /// Keep papers whose authoritative publication date falls in the window.
    ///
    /// Fail-open on every metadata gap: a store failure, a missing record, a
    /// missing date field, or an unparsable date all retain the paper.
    pub fn apply(&self, papers: Vec<Paper>, window: TimeWindow) -> Vec<Paper> {
        let range = match resolve_window(window, self.reference_year) {
            Some(range) => range,
            None => return papers,
        };

        let before = papers.len();
        let filtered: Vec<Paper> = papers
            .into_iter()
            .filter(|paper| self.retains(paper, &range))
            .collect();

        debug!(
            before,
            after = filtered.len(),
            ?window,
            "Applied publication time window"
        );
        filtered
    }

    fn retains(&self, paper: &Paper, range: &DateRange) -> bool {
        let record = match self.store.get(&metadata_key(&paper.paper_id)) {
            Ok(Some(record)) => record,
            Ok(None) => return true,
            Err(e) => {
                warn!(paper_id = %paper.paper_id, "Metadata lookup failed during time filter: {}", e);
                return true;
            }
        };

        let raw_date = record
            .get("publication_date")
            .and_then(|v| v.as_str())
            .unwrap_or_default();

        match parse_publication_date(raw_date) {
            Some(date) => range.contains(date),
            None => true,
        }
    }
}
