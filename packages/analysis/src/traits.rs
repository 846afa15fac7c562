//! Trait seams for the external collaborators the pipeline consumes.
//!
//! These are infrastructure seams only — the orchestrator owns all control
//! flow and failure policy. Production implementations live in the server
//! crate; mocks live in [`crate::testing`].

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::types::{
    AnalysisResult, BusinessProfile, Candidate, Competitor, SiteProfile, StructuredData,
};

/// LLM-backed competitor discovery.
#[async_trait]
pub trait CandidateDiscovery: Send + Sync {
    /// Surface up to `count` candidate competitors for the profiled
    /// business, excluding any website in `excluding`.
    async fn discover(
        &self,
        context: &BusinessProfile,
        excluding: &[String],
        count: usize,
    ) -> Result<Vec<Candidate>>;
}

/// Turns a live page into structured shipping/business fields.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<StructuredData>;
}

/// Best-effort field backfill. Never fails — returns the best data
/// available, which may be `partial` unchanged.
#[async_trait]
pub trait ProfileEnricher: Send + Sync {
    async fn enrich(&self, url: &str, partial: StructuredData) -> StructuredData;
}

/// Which prose artifact to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisKind {
    Analysis,
    Recommendations,
}

/// Aggregated context handed to the synthesizer.
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisContext {
    pub primary_site: SiteProfile,
    pub competitors: Vec<Competitor>,
}

/// Prose generation. The orchestrator substitutes a fixed fallback string
/// on failure, so implementations are free to propagate errors.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, kind: SynthesisKind, context: &SynthesisContext) -> Result<String>;
}

/// Optional, fire-and-forget persistence of finished results. Failures are
/// logged by the orchestrator, never propagated to the caller.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn persist(&self, result: &AnalysisResult) -> Result<()>;
}
