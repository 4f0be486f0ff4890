//! Verification report model and loader
//!
//! The report is produced offline by the number-verification tooling and
//! shipped next to the site as JSON. Only `files` is required; the summary
//! block and per-page counts are carried through for display but never used
//! for matching.

use crate::error::VerifyError;
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Where a verified number was found in the site's data files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub file: String,
    #[serde(default)]
    pub path: String,
}

/// One numeric claim extracted from a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberRecord {
    /// Line in the source HTML the number came from
    pub line: u32,
    /// Literal display text, e.g. `"62,985.50"`
    pub value: String,
    /// Free-form classification (currency, integer, year...)
    #[serde(rename = "type", default)]
    pub record_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceRef>,
    /// Echo of the list this record was written to; the list is authoritative
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl NumberRecord {
    pub fn new(line: u32, value: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            line,
            value: value.into(),
            record_type: record_type.into(),
            context: None,
            sources: Vec::new(),
            verified: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_source(mut self, file: impl Into<String>, path: impl Into<String>) -> Self {
        self.sources.push(SourceRef {
            file: file.into(),
            path: path.into(),
        });
        self
    }

    /// First source reference, the one shown in the detail view
    pub fn primary_source(&self) -> Option<&SourceRef> {
        self.sources.first()
    }
}

/// The report's record for one site page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    /// Page path relative to the site root, e.g. `financial-reports/ffr1.html`
    pub file: String,
    #[serde(default)]
    pub verified: Vec<NumberRecord>,
    #[serde(default)]
    pub unverified: Vec<NumberRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub json_sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_numbers: Option<u32>,
}

impl PageEntry {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            verified: Vec::new(),
            unverified: Vec::new(),
            json_sources: Vec::new(),
            total_numbers: None,
        }
    }

    /// All records in list order, verified first, paired with their
    /// auto-verified flag
    pub fn records(&self) -> impl Iterator<Item = (&NumberRecord, bool)> {
        self.verified
            .iter()
            .map(|r| (r, true))
            .chain(self.unverified.iter().map(|r| (r, false)))
    }

    /// Record at a position in `records()` order
    pub fn record_at(&self, index: usize) -> Option<(&NumberRecord, bool)> {
        if index < self.verified.len() {
            self.verified.get(index).map(|r| (r, true))
        } else {
            self.unverified
                .get(index - self.verified.len())
                .map(|r| (r, false))
        }
    }

    pub fn record_count(&self) -> usize {
        self.verified.len() + self.unverified.len()
    }
}

/// Site-wide totals written by the generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    #[serde(default)]
    pub total_files: u32,
    #[serde(default)]
    pub total_numbers: u32,
    #[serde(default)]
    pub verified: u32,
    #[serde(default)]
    pub unverified: u32,
    #[serde(default)]
    pub verification_rate: f64,
}

/// Whole verification report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<ReportSummary>,
    pub files: Vec<PageEntry>,
}

/// Parse a report from JSON text
pub fn parse_report(json: &str) -> Result<VerificationReport, VerifyError> {
    Ok(serde_json::from_str(json)?)
}

/// Try each candidate location in order and return the first report that
/// both fetches and parses
///
/// `fetch` maps a URL to the response body. Failures are logged and the next
/// candidate is tried; there are no retries.
///
/// # Errors
///
/// `VerifyError::ReportUnavailable` when every candidate failed.
pub async fn load_report<F, Fut>(
    candidates: &[String],
    mut fetch: F,
) -> Result<VerificationReport, VerifyError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String, VerifyError>>,
{
    for url in candidates {
        match fetch(url.clone()).await {
            Ok(body) => match parse_report(&body) {
                Ok(report) => {
                    tracing::info!(
                        "Loaded verification report from {} ({} pages)",
                        url,
                        report.files.len()
                    );
                    return Ok(report);
                }
                Err(e) => tracing::debug!("Report at {} did not parse: {}", url, e),
            },
            Err(e) => tracing::debug!("Report at {} unavailable: {}", url, e),
        }
    }

    Err(VerifyError::ReportUnavailable {
        tried: candidates.len(),
    })
}
