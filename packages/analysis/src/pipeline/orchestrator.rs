//! Pipeline orchestrator.
//!
//! Drives the discovery → verification → extraction → intelligence →
//! synthesis sequence as a strictly sequential state machine, accumulating
//! the result and streaming progress along the way. Only the primary site
//! failing to profile is fatal; individual competitor failures are recorded
//! on their records and the run completes with partial data.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::batch::{BatchPolicy, ExtractionExecutor, ProgressObserver};
use crate::error::{AnalysisError, Result};
use crate::pipeline::metrics::aggregate_metrics;
use crate::progress::ProgressChannel;
use crate::threshold::extract_threshold;
use crate::traits::{
    CandidateDiscovery, ProfileEnricher, ResultStore, StructuredExtractor, SynthesisContext,
    SynthesisKind, Synthesizer,
};
use crate::types::{
    bare_domain, ensure_scheme, AnalysisRequest, AnalysisResult, BusinessProfile, Candidate,
    Competitor, ProgressEvent, SiteProfile, Stage, StructuredData,
};
use crate::verifier::DomainVerifier;
use crate::watchdog::{AnalysisWatchdog, DEFAULT_DEADLINE};

/// Substituted when narrative generation fails.
pub const SYNTHESIS_FALLBACK: &str = "Analysis unavailable.";

const DISCOVERY_PROGRESS: u8 = 5;
const VERIFICATION_PROGRESS: u8 = 15;
const EXTRACTION_PROGRESS_START: u8 = 25;
const EXTRACTION_PROGRESS_SPAN: u8 = 45;
const INTELLIGENCE_PROGRESS: u8 = 75;
const SYNTHESIS_PROGRESS: u8 = 85;

/// Tunables for a pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Target number of verified competitors per run.
    pub competitor_quota: usize,

    /// Candidates requested per discovery call — more than the quota, to
    /// absorb verification losses.
    pub discovery_count: usize,

    pub batch: BatchPolicy,

    pub watchdog_deadline: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            competitor_quota: 10,
            discovery_count: 15,
            batch: BatchPolicy::default(),
            watchdog_deadline: DEFAULT_DEADLINE,
        }
    }
}

/// Composes the collaborators and core components into one analysis run.
pub struct AnalysisPipeline {
    discovery: Arc<dyn CandidateDiscovery>,
    extractor: Arc<dyn StructuredExtractor>,
    enricher: Arc<dyn ProfileEnricher>,
    synthesizer: Arc<dyn Synthesizer>,
    store: Option<Arc<dyn ResultStore>>,
    verifier: DomainVerifier,
    progress: ProgressChannel,
    watchdog: AnalysisWatchdog,
    config: PipelineConfig,
}

impl AnalysisPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        discovery: Arc<dyn CandidateDiscovery>,
        extractor: Arc<dyn StructuredExtractor>,
        enricher: Arc<dyn ProfileEnricher>,
        synthesizer: Arc<dyn Synthesizer>,
        verifier: DomainVerifier,
        progress: ProgressChannel,
        config: PipelineConfig,
    ) -> Self {
        Self {
            discovery,
            extractor,
            enricher,
            synthesizer,
            store: None,
            verifier,
            progress,
            watchdog: AnalysisWatchdog::new(),
            config,
        }
    }

    /// Attach an optional result store. Persistence failures are logged,
    /// never propagated.
    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Run a full analysis.
    ///
    /// The watchdog is stopped on every exit path; the caller only sees an
    /// error when the primary site itself cannot be profiled.
    pub async fn run(&self, request: AnalysisRequest) -> Result<AnalysisResult> {
        let url = normalize_request_url(&request.website_url)?;

        if let Some(user_id) = &request.user_id {
            let user = user_id.clone();
            self.watchdog
                .start(user_id, self.config.watchdog_deadline, move || {
                    tracing::error!(user_id = %user, "analysis exceeded its deadline");
                });
        }

        let outcome = self.run_stages(&url, request.session_id.as_deref()).await;

        if let Some(user_id) = &request.user_id {
            self.watchdog.stop(user_id);
        }

        outcome
    }

    async fn run_stages(&self, url: &str, session: Option<&str>) -> Result<AnalysisResult> {
        let quota = self.config.competitor_quota;
        let mut completed: Vec<Stage> = Vec::new();

        // --- Discovery ---
        self.publish(
            session,
            Stage::Discovery,
            "Analyzing your website",
            DISCOVERY_PROGRESS,
            &completed,
        )
        .await;

        // The fatal gate: no primary profile, no analysis.
        let primary_data =
            self.extractor
                .extract(url)
                .await
                .map_err(|e| AnalysisError::PrimarySite {
                    reason: e.to_string(),
                })?;

        let profile = BusinessProfile {
            website: bare_domain(url),
            data: primary_data.clone(),
        };

        let candidates = match self
            .discovery
            .discover(&profile, &[], self.config.discovery_count)
            .await
        {
            Ok(candidates) => candidates,
            Err(e) => {
                tracing::warn!(error = %e, "discovery failed, continuing without candidates");
                Vec::new()
            }
        };
        completed.push(Stage::Discovery);

        // --- Verification ---
        self.publish(
            session,
            Stage::Verification,
            "Verifying competitor websites",
            VERIFICATION_PROGRESS,
            &completed,
        )
        .await;

        let (mut verified, mut seen) = self.verify_candidates(candidates, quota).await;

        if verified.len() < quota {
            // One supplemental round, excluding everything already surfaced.
            match self
                .discovery
                .discover(&profile, &seen, self.config.discovery_count)
                .await
            {
                Ok(supplement) => {
                    let fresh: Vec<Candidate> = supplement
                        .into_iter()
                        .filter(|c| !seen.contains(&c.website))
                        .collect();
                    let (more, more_seen) =
                        self.verify_candidates(fresh, quota - verified.len()).await;
                    verified.extend(more);
                    seen.extend(more_seen);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "supplemental discovery failed");
                }
            }
        }

        if verified.len() < quota {
            tracing::info!(
                verified = verified.len(),
                quota,
                "finishing below quota, candidate pool exhausted"
            );
        }
        completed.push(Stage::Verification);

        // --- Extraction ---
        self.publish(
            session,
            Stage::Extraction,
            "Extracting shipping policies",
            EXTRACTION_PROGRESS_START,
            &completed,
        )
        .await;

        let executor = ExtractionExecutor::new(self.config.batch.clone());
        let observer = ExtractionProgress {
            channel: self.progress.clone(),
            session_id: session.map(String::from),
            completed: completed.clone(),
        };
        let mut competitors = executor
            .run(
                verified,
                self.extractor.as_ref(),
                self.enricher.as_ref(),
                &observer,
            )
            .await;

        // Independent, non-batched backfill pass for the primary site.
        let primary_data = self.enricher.enrich(url, primary_data).await;
        completed.push(Stage::Extraction);

        // --- Intelligence ---
        self.publish(
            session,
            Stage::Intelligence,
            "Normalizing shipping thresholds",
            INTELLIGENCE_PROGRESS,
            &completed,
        )
        .await;

        for competitor in &mut competitors {
            if let Some(extracted) = &competitor.extracted {
                competitor.threshold = extract_threshold(extracted).as_amount();
            }
        }
        let primary_threshold = extract_threshold(&primary_data).as_amount();
        completed.push(Stage::Intelligence);

        // --- Synthesis ---
        self.publish(
            session,
            Stage::Synthesis,
            "Generating business analysis",
            SYNTHESIS_PROGRESS,
            &completed,
        )
        .await;

        let primary_site = build_primary_site(url, primary_data, primary_threshold);
        let context = SynthesisContext {
            primary_site: primary_site.clone(),
            competitors: competitors.clone(),
        };
        let narrative = self
            .synthesize_or_fallback(SynthesisKind::Analysis, &context)
            .await;
        let recommendations = self
            .synthesize_or_fallback(SynthesisKind::Recommendations, &context)
            .await;
        completed.push(Stage::Synthesis);

        // --- Complete ---
        let thresholds: Vec<Option<i64>> = competitors.iter().map(|c| c.threshold).collect();
        let result = AnalysisResult {
            analysis_id: Uuid::new_v4(),
            primary_site,
            competitors,
            aggregate_metrics: aggregate_metrics(&thresholds),
            narrative,
            recommendations,
            completed_at: Utc::now(),
        };

        if let Some(store) = &self.store {
            if let Err(e) = store.persist(&result).await {
                tracing::warn!(error = %e, "failed to persist analysis result");
            }
        }

        completed.push(Stage::Complete);
        if let Some(session_id) = session {
            self.progress
                .close(
                    session_id,
                    ProgressEvent::complete(result.clone(), completed),
                )
                .await;
        }

        tracing::info!(
            analysis_id = %result.analysis_id,
            competitors = result.competitors.len(),
            "analysis complete"
        );
        Ok(result)
    }

    /// Verify candidates in discovery order until `needed` pass.
    ///
    /// Returns the verified competitors and every website surfaced by this
    /// wave (verified or not), for exclusion in supplemental discovery.
    async fn verify_candidates(
        &self,
        candidates: Vec<Candidate>,
        needed: usize,
    ) -> (Vec<Competitor>, Vec<String>) {
        let seen: Vec<String> = candidates.iter().map(|c| c.website.clone()).collect();
        let mut verified = Vec::new();

        for candidate in candidates {
            if verified.len() >= needed {
                break;
            }
            if self.verifier.verify(&candidate.website).await {
                let mut competitor = Competitor::from_candidate(candidate);
                competitor.verified = true;
                verified.push(competitor);
            } else {
                tracing::debug!(website = %candidate.website, "candidate unreachable, skipping");
            }
        }

        (verified, seen)
    }

    async fn synthesize_or_fallback(
        &self,
        kind: SynthesisKind,
        context: &SynthesisContext,
    ) -> String {
        match self.synthesizer.synthesize(kind, context).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, ?kind, "synthesis failed, substituting fallback");
                SYNTHESIS_FALLBACK.to_string()
            }
        }
    }

    async fn publish(
        &self,
        session: Option<&str>,
        stage: Stage,
        message: &str,
        progress: u8,
        completed: &[Stage],
    ) {
        if let Some(session_id) = session {
            self.progress
                .publish(
                    session_id,
                    ProgressEvent::progress(stage, message, progress, completed.to_vec()),
                )
                .await;
        }
    }
}

/// Maps extraction counts onto the 25–70% progress window.
struct ExtractionProgress {
    channel: ProgressChannel,
    session_id: Option<String>,
    completed: Vec<Stage>,
}

#[async_trait::async_trait]
impl ProgressObserver for ExtractionProgress {
    async fn on_item_complete(&self, completed_count: usize, total: usize) {
        let Some(session_id) = &self.session_id else {
            return;
        };
        let span = EXTRACTION_PROGRESS_SPAN as usize * completed_count / total.max(1);
        self.channel
            .publish(
                session_id,
                ProgressEvent::progress(
                    Stage::Extraction,
                    format!("Analyzed {} of {} competitors", completed_count, total),
                    EXTRACTION_PROGRESS_START + span as u8,
                    self.completed.clone(),
                ),
            )
            .await;
    }
}

fn build_primary_site(url: &str, data: StructuredData, threshold: Option<i64>) -> SiteProfile {
    let website = bare_domain(url);
    SiteProfile {
        name: data.business_name.clone().unwrap_or_else(|| website.clone()),
        website,
        products_summary: data.products_summary.clone().unwrap_or_default(),
        threshold,
        extracted: Some(data),
        extraction_error: None,
    }
}

/// Normalize caller input to a scheme-qualified URL before any network use.
pub fn normalize_request_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::InvalidRequest {
            reason: "website_url must not be empty".to_string(),
        });
    }
    Ok(ensure_scheme(trimmed))
}
