use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Verification report unavailable after trying {tried} location(s)")]
    ReportUnavailable { tried: usize },

    #[error("No report entry for page: {0}")]
    PageNotFound(String),

    #[error("Failed to parse JSON: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Invalid data source expression: {0}")]
    InvalidSource(String),

    #[error("Path not found in {file}: {path}")]
    PathNotFound { file: String, path: String },

    #[error("Render error: {0}")]
    Render(String),
}

impl From<serde_json::Error> for VerifyError {
    fn from(err: serde_json::Error) -> Self {
        VerifyError::Parse(err.to_string())
    }
}
