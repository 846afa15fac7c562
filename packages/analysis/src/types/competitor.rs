//! Competitor records and the final analysis result.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::business::{ensure_scheme, Candidate, StructuredData};

/// A competitor as it moves through the pipeline.
///
/// Created during discovery, mutated by verification (`verified`) and
/// extraction (`extracted` / `threshold` / `extraction_error`), immutable
/// thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competitor {
    pub name: String,

    /// Bare domain, no scheme.
    pub website: String,

    #[serde(default)]
    pub products_summary: String,

    pub verified: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted: Option<StructuredData>,

    /// Canonical free-shipping dollar amount. `0` means free with no
    /// minimum; `None` means unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,
}

impl Competitor {
    pub fn from_candidate(candidate: Candidate) -> Self {
        Self {
            name: candidate.name,
            website: candidate.website,
            products_summary: candidate.products_summary,
            verified: false,
            extracted: None,
            threshold: None,
            extraction_error: None,
        }
    }

    /// Scheme-qualified URL for network use.
    pub fn url(&self) -> String {
        ensure_scheme(&self.website)
    }
}

/// The primary site: same shape as [`Competitor`] minus `verified`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    pub name: String,

    pub website: String,

    #[serde(default)]
    pub products_summary: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted: Option<StructuredData>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction_error: Option<String>,
}

/// Mean/median over the thresholds that are actually known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean_threshold: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub median_threshold: Option<f64>,
}

/// The immutable output of a completed run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_id: Uuid,

    pub primary_site: SiteProfile,

    /// Insertion order matches discovery/verification order. Length is
    /// bounded by the configured quota.
    pub competitors: Vec<Competitor>,

    pub aggregate_metrics: AggregateMetrics,

    pub narrative: String,

    pub recommendations: String,

    pub completed_at: DateTime<Utc>,
}

/// Caller input to [`crate::pipeline::AnalysisPipeline::run`].
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRequest {
    pub website_url: String,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub session_id: Option<String>,
}
