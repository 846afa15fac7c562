//! Typed errors for the analysis library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur during an analysis run.
///
/// Only `PrimarySite` is fatal to a run. Everything else is absorbed by the
/// orchestrator and reflected as null fields plus a reason string on the
/// affected record.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The primary site could not be reached or minimally profiled.
    /// This is the only error that aborts a run.
    #[error("primary site could not be analyzed: {reason}")]
    PrimarySite { reason: String },

    /// Competitor discovery failed
    #[error("discovery failed: {0}")]
    Discovery(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Structured extraction failed for a single URL
    #[error("extraction failed for {url}: {reason}")]
    Extraction { url: String, reason: String },

    /// Narrative/recommendation generation failed
    #[error("synthesis failed: {0}")]
    Synthesis(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Persisting a finished result failed
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Malformed caller input
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// JSON parsing error at the untrusted-LLM-text boundary
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
