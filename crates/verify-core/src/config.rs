//! Overlay configuration
//!
//! Every field has a default so pages can pass a partial JSON object (or
//! nothing at all) to the entry points.

use crate::error::VerifyError;
use serde::{Deserialize, Serialize};

/// Default report locations, tried in order
pub const DEFAULT_REPORT_CANDIDATES: &[&str] = &[
    "../reports/html_number_verification.json",
    "reports/html_number_verification.json",
    "/reports/html_number_verification.json",
];

/// Storage key for the manual-check mapping
pub const MANUAL_CHECKS_KEY: &str = "verification-overlay-manual-checks";

/// Storage key for the enabled flag
pub const ENABLED_KEY: &str = "verification-overlay-enabled";

/// Runtime configuration for the overlay and the data-binding helper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Candidate URLs for the verification report (first success wins)
    #[serde(default = "default_report_candidates")]
    pub report_candidates: Vec<String>,
    /// Local-storage key holding manual checks
    #[serde(default = "default_manual_checks_key")]
    pub manual_checks_key: String,
    /// Local-storage key holding the enabled flag
    #[serde(default = "default_enabled_key")]
    pub enabled_key: String,
    /// Prefix for data files referenced by `data-source` attributes
    #[serde(default = "default_data_base_url")]
    pub data_base_url: String,
    /// Minimum log level forwarded to the console (trace..error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_report_candidates() -> Vec<String> {
    DEFAULT_REPORT_CANDIDATES
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_manual_checks_key() -> String {
    MANUAL_CHECKS_KEY.to_string()
}

fn default_enabled_key() -> String {
    ENABLED_KEY.to_string()
}

fn default_data_base_url() -> String {
    "../data/".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            report_candidates: default_report_candidates(),
            manual_checks_key: default_manual_checks_key(),
            enabled_key: default_enabled_key(),
            data_base_url: default_data_base_url(),
            log_level: default_log_level(),
        }
    }
}

impl OverlayConfig {
    /// Parse configuration from a JSON string
    ///
    /// # Errors
    ///
    /// Returns `VerifyError::Parse` if the JSON is malformed or a field has the
    /// wrong type. Missing fields fall back to defaults.
    pub fn from_json(s: &str) -> Result<Self, VerifyError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Parse optional configuration, falling back to defaults when absent or blank
    pub fn from_optional_json(s: Option<&str>) -> Result<Self, VerifyError> {
        match s {
            Some(s) if !s.trim().is_empty() => Self::from_json(s),
            _ => Ok(Self::default()),
        }
    }

    /// URL for a data file referenced by a `data-source` expression
    pub fn data_url(&self, file: &str) -> String {
        format!("{}{}.json", self.data_base_url, file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = OverlayConfig::from_json("{}").unwrap();
        assert_eq!(config, OverlayConfig::default());
        assert_eq!(config.report_candidates.len(), 3);
        assert_eq!(config.manual_checks_key, MANUAL_CHECKS_KEY);
    }

    #[test]
    fn test_partial_override() {
        let config =
            OverlayConfig::from_json(r#"{"report_candidates":["r.json"],"log_level":"debug"}"#)
                .unwrap();
        assert_eq!(config.report_candidates, vec!["r.json".to_string()]);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.enabled_key, ENABLED_KEY);
    }

    #[test]
    fn test_optional_blank_is_default() {
        assert_eq!(
            OverlayConfig::from_optional_json(Some("  ")).unwrap(),
            OverlayConfig::default()
        );
        assert_eq!(
            OverlayConfig::from_optional_json(None).unwrap(),
            OverlayConfig::default()
        );
    }

    #[test]
    fn test_malformed_config_is_error() {
        let err = OverlayConfig::from_json(r#"{"report_candidates": 5}"#).unwrap_err();
        assert!(matches!(err, VerifyError::Parse(_)));
    }

    #[test]
    fn test_data_url() {
        let config = OverlayConfig::default();
        assert_eq!(config.data_url("budget_data"), "../data/budget_data.json");
    }
}
