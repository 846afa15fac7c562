//! Data types for the analysis pipeline.

pub mod business;
pub mod competitor;
pub mod progress;

pub use business::{bare_domain, ensure_scheme, BusinessProfile, Candidate, StructuredData};
pub use competitor::{
    AggregateMetrics, AnalysisRequest, AnalysisResult, Competitor, SiteProfile,
};
pub use progress::{ProgressEvent, ProgressEventKind, Stage};
