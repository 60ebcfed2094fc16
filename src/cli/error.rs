//! CLI error types and conversions

use crate::collector::CollectError;
use crate::fetcher::FetcherError;
use crate::report::ReportError;
use crate::resume::ResumeError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Collection error
    #[error("collection error: {0}")]
    CollectError(#[from] CollectError),

    /// Fetcher error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Storage error
    #[error("storage error: {0}")]
    ResumeError(#[from] ResumeError),

    /// Report error
    #[error("report error: {0}")]
    ReportError(#[from] ReportError),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigurationError(String),
}
