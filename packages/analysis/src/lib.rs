//! Shipping-Incentive Competitor Analysis
//!
//! Analyzes a business's website and a set of discovered competitors to
//! extract and compare shipping-incentive policies. This library is the
//! analysis core: the pipeline orchestrator, the batched extraction
//! executor, reachability verification, threshold normalization, a
//! session-keyed progress channel, and a per-user timeout guard.
//!
//! External capabilities — LLM discovery, structured page extraction,
//! profile enrichment, prose synthesis, persistence — are consumed through
//! narrow trait seams in [`traits`]; production implementations live in the
//! server crate, mocks in [`testing`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use analysis::{AnalysisPipeline, AnalysisRequest, PipelineConfig};
//! use analysis::progress::ProgressChannel;
//! use analysis::verifier::DomainVerifier;
//!
//! let progress = ProgressChannel::new();
//! let pipeline = AnalysisPipeline::new(
//!     discovery, extractor, enricher, synthesizer,
//!     DomainVerifier::new(), progress.clone(), PipelineConfig::default(),
//! );
//!
//! let result = pipeline.run(AnalysisRequest {
//!     website_url: "example.com".into(),
//!     user_id: None,
//!     session_id: Some("session-1".into()),
//! }).await?;
//! ```

pub mod batch;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod testing;
pub mod threshold;
pub mod traits;
pub mod types;
pub mod verifier;
pub mod watchdog;

// Re-export core types at crate root
pub use error::{AnalysisError, Result};
pub use pipeline::{
    aggregate_metrics, normalize_request_url, parse_candidates, AnalysisPipeline, PipelineConfig,
    SYNTHESIS_FALLBACK,
};
pub use traits::{
    CandidateDiscovery, ProfileEnricher, ResultStore, StructuredExtractor, SynthesisContext,
    SynthesisKind, Synthesizer,
};
pub use types::{
    AggregateMetrics, AnalysisRequest, AnalysisResult, BusinessProfile, Candidate, Competitor,
    ProgressEvent, ProgressEventKind, SiteProfile, Stage, StructuredData,
};

pub use batch::{BatchPolicy, ExtractionExecutor, NoopObserver, ProgressObserver};
pub use progress::{AnalysisSession, ProgressChannel};
pub use threshold::{extract_threshold, ThresholdSignal, THRESHOLD_CEILING};
pub use verifier::{DomainVerifier, HttpProbe, ReachabilityProbe};
pub use watchdog::{AnalysisWatchdog, DEFAULT_DEADLINE};
