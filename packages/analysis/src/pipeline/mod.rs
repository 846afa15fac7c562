//! Analysis pipeline: orchestration, candidate parsing, aggregate metrics.

pub mod candidates;
pub mod metrics;
pub mod orchestrator;

pub use candidates::{parse_candidates, strip_code_fences};
pub use metrics::aggregate_metrics;
pub use orchestrator::{
    normalize_request_url, AnalysisPipeline, PipelineConfig, SYNTHESIS_FALLBACK,
};
