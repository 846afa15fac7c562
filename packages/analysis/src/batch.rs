//! Batched extraction over verified competitors.
//!
//! Batches exist to bound load on the external extraction collaborator and
//! to create natural checkpoints for progress reporting. Processing is
//! deliberately sequential within and across batches — the delays below are
//! the backpressure knobs, not an incidental limitation.

use std::time::Duration;

use async_trait::async_trait;

use crate::traits::{ProfileEnricher, StructuredExtractor};
use crate::types::Competitor;

/// Rate-limiting knobs for the executor, injected rather than hard-coded
/// so tests run with zero delay.
#[derive(Debug, Clone)]
pub struct BatchPolicy {
    /// Candidates per batch.
    pub batch_size: usize,

    /// Sleep before starting every batch after the first.
    pub inter_batch_delay: Duration,

    /// Sleep after each candidate, success or failure.
    pub per_item_delay: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            batch_size: 3,
            inter_batch_delay: Duration::from_secs(2),
            per_item_delay: Duration::from_millis(500),
        }
    }
}

impl BatchPolicy {
    /// Zero-delay policy for tests.
    pub fn immediate() -> Self {
        Self {
            batch_size: 3,
            inter_batch_delay: Duration::ZERO,
            per_item_delay: Duration::ZERO,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// Narrow progress seam: the executor reports counts, not percentages —
/// mapping counts onto a session's progress range belongs to the caller.
#[async_trait]
pub trait ProgressObserver: Send + Sync {
    async fn on_item_complete(&self, completed: usize, total: usize);
}

/// Observer that discards all updates.
pub struct NoopObserver;

#[async_trait]
impl ProgressObserver for NoopObserver {
    async fn on_item_complete(&self, _completed: usize, _total: usize) {}
}

/// Runs the external extraction call over a list of competitors in bounded,
/// rate-limited batches, isolating per-item failure.
pub struct ExtractionExecutor {
    policy: BatchPolicy,
}

impl ExtractionExecutor {
    pub fn new(policy: BatchPolicy) -> Self {
        Self { policy }
    }

    /// Extract structured data for each competitor.
    ///
    /// Guarantees: output length equals input length, ordering is
    /// preserved, and a single competitor's failure never aborts the batch
    /// or the run — it is recorded on that record and processing continues.
    pub async fn run(
        &self,
        competitors: Vec<Competitor>,
        extractor: &dyn StructuredExtractor,
        enricher: &dyn ProfileEnricher,
        observer: &dyn ProgressObserver,
    ) -> Vec<Competitor> {
        let total = competitors.len();
        let batch_size = self.policy.batch_size.max(1);
        let mut out = Vec::with_capacity(total);

        for (index, mut competitor) in competitors.into_iter().enumerate() {
            if index > 0 && index % batch_size == 0 {
                tokio::time::sleep(self.policy.inter_batch_delay).await;
            }

            let url = competitor.url();
            match extractor.extract(&url).await {
                Ok(data) => {
                    // Backfill whatever the extraction left blank.
                    let enriched = enricher.enrich(&url, data).await;
                    competitor.extracted = Some(enriched);
                }
                Err(e) => {
                    tracing::warn!(
                        website = %competitor.website,
                        error = %e,
                        "competitor extraction failed, continuing"
                    );
                    competitor.extracted = None;
                    competitor.extraction_error = Some(e.to_string());
                }
            }

            out.push(competitor);
            observer.on_item_complete(out.len(), total).await;

            if out.len() < total {
                tokio::time::sleep(self.policy.per_item_delay).await;
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::testing::{MockEnricher, MockExtractor};
    use crate::types::{Candidate, StructuredData};

    fn competitors(domains: &[&str]) -> Vec<Competitor> {
        domains
            .iter()
            .map(|d| {
                Competitor::from_candidate(Candidate {
                    name: d.to_string(),
                    website: d.to_string(),
                    products_summary: String::new(),
                })
            })
            .collect()
    }

    struct RecordingObserver {
        updates: Mutex<Vec<(usize, usize)>>,
    }

    #[async_trait]
    impl ProgressObserver for RecordingObserver {
        async fn on_item_complete(&self, completed: usize, total: usize) {
            self.updates.lock().unwrap().push((completed, total));
        }
    }

    #[tokio::test]
    async fn failures_are_isolated_per_item() {
        let extractor = MockExtractor::new()
            .with_failure("https://b.com", "blocked")
            .with_failure("https://d.com", "timeout");
        let enricher = MockEnricher::identity();
        let executor = ExtractionExecutor::new(BatchPolicy::immediate());

        let out = executor
            .run(
                competitors(&["a.com", "b.com", "c.com", "d.com", "e.com"]),
                &extractor,
                &enricher,
                &NoopObserver,
            )
            .await;

        assert_eq!(out.len(), 5);
        assert!(out[0].extracted.is_some());
        assert!(out[2].extracted.is_some());
        assert!(out[4].extracted.is_some());

        assert!(out[1].extracted.is_none());
        assert!(out[1].extraction_error.as_deref().unwrap().contains("blocked"));
        assert!(out[3].extracted.is_none());
        assert!(out[3].extraction_error.is_some());
    }

    #[tokio::test]
    async fn order_and_length_are_preserved() {
        let extractor = MockExtractor::new();
        let enricher = MockEnricher::identity();
        let executor = ExtractionExecutor::new(BatchPolicy::immediate().with_batch_size(2));

        let out = executor
            .run(
                competitors(&["a.com", "b.com", "c.com"]),
                &extractor,
                &enricher,
                &NoopObserver,
            )
            .await;

        let websites: Vec<&str> = out.iter().map(|c| c.website.as_str()).collect();
        assert_eq!(websites, vec!["a.com", "b.com", "c.com"]);
    }

    #[tokio::test]
    async fn observer_sees_every_item_in_order() {
        let extractor = MockExtractor::new().with_failure("https://b.com", "nope");
        let enricher = MockEnricher::identity();
        let executor = ExtractionExecutor::new(BatchPolicy::immediate());
        let observer = RecordingObserver {
            updates: Mutex::new(Vec::new()),
        };

        executor
            .run(
                competitors(&["a.com", "b.com", "c.com"]),
                &extractor,
                &enricher,
                &observer,
            )
            .await;

        assert_eq!(
            observer.updates.into_inner().unwrap(),
            vec![(1, 3), (2, 3), (3, 3)]
        );
    }

    #[tokio::test]
    async fn enrichment_backfills_extracted_payload() {
        let extractor = MockExtractor::new().with_payload(
            "https://a.com",
            StructuredData {
                shipping_policy: Some("Free shipping".into()),
                ..Default::default()
            },
        );
        let enricher = MockEnricher::with_business_name("Acme");
        let executor = ExtractionExecutor::new(BatchPolicy::immediate());

        let out = executor
            .run(competitors(&["a.com"]), &extractor, &enricher, &NoopObserver)
            .await;

        let extracted = out[0].extracted.as_ref().unwrap();
        assert_eq!(extracted.business_name.as_deref(), Some("Acme"));
        assert_eq!(extracted.shipping_policy.as_deref(), Some("Free shipping"));
    }

    #[tokio::test]
    async fn empty_input_yields_empty_output() {
        let extractor = MockExtractor::new();
        let enricher = MockEnricher::identity();
        let executor = ExtractionExecutor::new(BatchPolicy::immediate());

        let out = executor
            .run(Vec::new(), &extractor, &enricher, &NoopObserver)
            .await;
        assert!(out.is_empty());
    }
}
