//! Testing utilities including mock collaborators.
//!
//! Deterministic, configurable implementations of every trait seam plus the
//! reachability probe, with call tracking for assertions. Useful for testing
//! applications built on this library without real LLM or network calls.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AnalysisError, Result};
use crate::traits::{
    CandidateDiscovery, ProfileEnricher, ResultStore, StructuredExtractor, SynthesisContext,
    SynthesisKind, Synthesizer,
};
use crate::types::{AnalysisResult, BusinessProfile, Candidate, StructuredData};
use crate::verifier::ReachabilityProbe;

/// Convenience constructor for test candidates.
pub fn candidate(name: &str, website: &str) -> Candidate {
    Candidate {
        name: name.to_string(),
        website: website.to_string(),
        products_summary: String::new(),
    }
}

// =============================================================================
// MockProbe
// =============================================================================

/// Reachability probe answering from a fixed URL table.
#[derive(Default)]
pub struct MockProbe {
    reachable: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a URL as answering 2xx.
    pub fn reachable(mut self, url: &str) -> Self {
        self.reachable.insert(url.to_string());
        self
    }

    /// URLs probed, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReachabilityProbe for MockProbe {
    async fn probe(&self, url: &str) -> bool {
        self.calls.lock().unwrap().push(url.to_string());
        self.reachable.contains(url)
    }
}

// =============================================================================
// MockDiscovery
// =============================================================================

/// Record of a discovery call.
#[derive(Debug, Clone)]
pub struct DiscoveryCall {
    pub excluding: Vec<String>,
    pub count: usize,
}

/// Discovery collaborator returning scripted candidate waves.
///
/// Each call pops the next wave; an exhausted script yields empty lists.
#[derive(Default)]
pub struct MockDiscovery {
    waves: Mutex<VecDeque<Vec<Candidate>>>,
    calls: Mutex<Vec<DiscoveryCall>>,
    fail: bool,
}

impl MockDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a wave of candidates for the next call.
    pub fn with_wave(self, wave: Vec<Candidate>) -> Self {
        self.waves.lock().unwrap().push_back(wave);
        self
    }

    /// Make every call fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> Vec<DiscoveryCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandidateDiscovery for MockDiscovery {
    async fn discover(
        &self,
        _context: &BusinessProfile,
        excluding: &[String],
        count: usize,
    ) -> Result<Vec<Candidate>> {
        self.calls.lock().unwrap().push(DiscoveryCall {
            excluding: excluding.to_vec(),
            count,
        });

        if self.fail {
            return Err(AnalysisError::Discovery("scripted discovery failure".into()));
        }

        Ok(self.waves.lock().unwrap().pop_front().unwrap_or_default())
    }
}

// =============================================================================
// MockExtractor
// =============================================================================

/// Extraction collaborator with per-URL canned payloads and failures.
///
/// URLs without a scripted entry succeed with an empty payload.
#[derive(Default)]
pub struct MockExtractor {
    payloads: HashMap<String, StructuredData>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, url: &str, data: StructuredData) -> Self {
        self.payloads.insert(url.to_string(), data);
        self
    }

    pub fn with_failure(mut self, url: &str, reason: &str) -> Self {
        self.failures.insert(url.to_string(), reason.to_string());
        self
    }

    /// URLs extracted, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl StructuredExtractor for MockExtractor {
    async fn extract(&self, url: &str) -> Result<StructuredData> {
        self.calls.lock().unwrap().push(url.to_string());

        if let Some(reason) = self.failures.get(url) {
            return Err(AnalysisError::Extraction {
                url: url.to_string(),
                reason: reason.clone(),
            });
        }

        Ok(self.payloads.get(url).cloned().unwrap_or_default())
    }
}

// =============================================================================
// MockEnricher
// =============================================================================

/// Enricher that optionally backfills a business name.
#[derive(Default)]
pub struct MockEnricher {
    business_name: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl MockEnricher {
    /// Enricher that returns the partial payload unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Enricher that fills a missing `business_name`.
    pub fn with_business_name(name: &str) -> Self {
        Self {
            business_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileEnricher for MockEnricher {
    async fn enrich(&self, url: &str, partial: StructuredData) -> StructuredData {
        self.calls.lock().unwrap().push(url.to_string());
        partial.merge_missing(StructuredData {
            business_name: self.business_name.clone(),
            ..Default::default()
        })
    }
}

// =============================================================================
// MockSynthesizer
// =============================================================================

/// Synthesizer with fixed prose per kind; optionally failing.
pub struct MockSynthesizer {
    analysis: String,
    recommendations: String,
    fail: bool,
    calls: Mutex<Vec<SynthesisKind>>,
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self {
            analysis: "Mock analysis".to_string(),
            recommendations: "Mock recommendations".to_string(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<SynthesisKind> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, kind: SynthesisKind, _context: &SynthesisContext) -> Result<String> {
        self.calls.lock().unwrap().push(kind);

        if self.fail {
            return Err(AnalysisError::Synthesis("scripted synthesis failure".into()));
        }

        Ok(match kind {
            SynthesisKind::Analysis => self.analysis.clone(),
            SynthesisKind::Recommendations => self.recommendations.clone(),
        })
    }
}

// =============================================================================
// MockStore
// =============================================================================

/// Result store capturing persisted results; optionally failing.
#[derive(Default)]
pub struct MockStore {
    persisted: Mutex<Vec<AnalysisResult>>,
    fail: bool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn persisted(&self) -> Vec<AnalysisResult> {
        self.persisted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultStore for MockStore {
    async fn persist(&self, result: &AnalysisResult) -> Result<()> {
        if self.fail {
            return Err(AnalysisError::Storage("scripted storage failure".into()));
        }
        self.persisted.lock().unwrap().push(result.clone());
        Ok(())
    }
}
