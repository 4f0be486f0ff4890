//! Current-page lookup
//!
//! Sites are deployed both at a domain root (`/financial-reports/ffr1.html`)
//! and under a repository subpath (`/hub/financial-reports/ffr1.html`), so a
//! page matches when either string is a suffix of the other.

use crate::error::VerifyError;
use crate::report::{PageEntry, VerificationReport};

/// Whether a browser path refers to a report entry's file
pub fn path_matches(path: &str, entry_file: &str) -> bool {
    if path.is_empty() || path == "/" || entry_file.is_empty() {
        return false;
    }
    path.ends_with(entry_file) || entry_file.ends_with(path)
}

/// First page entry matching the browser path
pub fn resolve_page<'a>(report: &'a VerificationReport, path: &str) -> Option<&'a PageEntry> {
    report
        .files
        .iter()
        .find(|entry| path_matches(path, &entry.file))
}

/// Like [`resolve_page`], but reports a miss as an error
pub fn require_page<'a>(
    report: &'a VerificationReport,
    path: &str,
) -> Result<&'a PageEntry, VerifyError> {
    resolve_page(report, path).ok_or_else(|| VerifyError::PageNotFound(path.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> VerificationReport {
        VerificationReport {
            generated: None,
            summary: None,
            files: vec![
                PageEntry::new("work-budget-plans/gp1.html"),
                PageEntry::new("financial-reports/ffr1.html"),
                PageEntry::new("financial-reports/index.html"),
            ],
        }
    }

    #[test]
    fn test_root_relative_path() {
        let report = report();
        let page = resolve_page(&report, "/financial-reports/ffr1.html").unwrap();
        assert_eq!(page.file, "financial-reports/ffr1.html");
    }

    #[test]
    fn test_subpath_deployment() {
        let report = report();
        let page = resolve_page(&report, "/cost-hub/work-budget-plans/gp1.html").unwrap();
        assert_eq!(page.file, "work-budget-plans/gp1.html");
    }

    #[test]
    fn test_entry_ends_with_path() {
        let report = report();
        let page = resolve_page(&report, "ffr1.html").unwrap();
        assert_eq!(page.file, "financial-reports/ffr1.html");
    }

    #[test]
    fn test_no_match() {
        let report = report();
        assert!(resolve_page(&report, "/members.html").is_none());
        assert!(matches!(
            require_page(&report, "/members.html"),
            Err(VerifyError::PageNotFound(p)) if p == "/members.html"
        ));
    }

    #[test]
    fn test_root_and_empty_never_match() {
        let report = report();
        assert!(resolve_page(&report, "").is_none());
        assert!(resolve_page(&report, "/").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let mut report = report();
        report
            .files
            .insert(0, PageEntry::new("mirror/financial-reports/ffr1.html"));
        let page = resolve_page(&report, "financial-reports/ffr1.html").unwrap();
        assert_eq!(page.file, "mirror/financial-reports/ffr1.html");
    }
}
