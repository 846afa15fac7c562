//! Reachability verification for candidate competitor domains.
//!
//! A lightweight existence probe used purely as a filter: any failure —
//! timeout, DNS, blocked HEAD, non-2xx/3xx — is swallowed and converted to
//! `false`. Domains that fail on the bare host get one retry with a `www.`
//! prefix before being rejected.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

/// Probe timeout. Candidates are plentiful; slow hosts are not worth waiting on.
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// The network seam, kept narrow so verification logic is testable offline.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    /// True when the URL answers with a 2xx/3xx.
    async fn probe(&self, url: &str) -> bool;
}

/// Production probe: a HEAD request over reqwest.
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new() -> Self {
        // Browser-like UA; bot-hostile storefronts reject the default.
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .user_agent(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            )
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProbe {
    async fn probe(&self, url: &str) -> bool {
        match self.client.head(url).send().await {
            Ok(response) => {
                let status = response.status();
                status.is_success() || status.is_redirection()
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "probe failed");
                false
            }
        }
    }
}

/// Verifies that a candidate domain resolves to a live site.
#[derive(Clone)]
pub struct DomainVerifier {
    probe: Arc<dyn ReachabilityProbe>,
}

impl DomainVerifier {
    pub fn new() -> Self {
        Self::with_probe(Arc::new(HttpProbe::new()))
    }

    pub fn with_probe(probe: Arc<dyn ReachabilityProbe>) -> Self {
        Self { probe }
    }

    /// Probe `https://{domain}`, then retry once with a `www.` prefix
    /// (only when not already present). Never errors.
    pub async fn verify(&self, domain: &str) -> bool {
        let domain = domain
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');

        if domain.is_empty() {
            return false;
        }

        if self.probe.probe(&format!("https://{}", domain)).await {
            return true;
        }

        if domain.starts_with("www.") {
            return false;
        }

        self.probe.probe(&format!("https://www.{}", domain)).await
    }
}

impl Default for DomainVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProbe;

    #[tokio::test]
    async fn bare_domain_success_skips_fallback() {
        let probe = Arc::new(MockProbe::new().reachable("https://example.com"));
        let verifier = DomainVerifier::with_probe(probe.clone());

        assert!(verifier.verify("example.com").await);
        assert_eq!(probe.calls(), vec!["https://example.com"]);
    }

    #[tokio::test]
    async fn falls_back_to_www_variant() {
        let probe = Arc::new(MockProbe::new().reachable("https://www.example.com"));
        let verifier = DomainVerifier::with_probe(probe.clone());

        assert!(verifier.verify("example.com").await);
        assert_eq!(
            probe.calls(),
            vec!["https://example.com", "https://www.example.com"]
        );
    }

    #[tokio::test]
    async fn unreachable_on_both_variants() {
        let probe = Arc::new(MockProbe::new());
        let verifier = DomainVerifier::with_probe(probe);

        assert!(!verifier.verify("example.com").await);
    }

    #[tokio::test]
    async fn www_prefix_is_not_doubled() {
        let probe = Arc::new(MockProbe::new());
        let verifier = DomainVerifier::with_probe(probe.clone());

        assert!(!verifier.verify("www.example.com").await);
        assert_eq!(probe.calls(), vec!["https://www.example.com"]);
    }

    #[tokio::test]
    async fn scheme_prefixed_input_is_normalized() {
        let probe = Arc::new(MockProbe::new().reachable("https://example.com"));
        let verifier = DomainVerifier::with_probe(probe);

        assert!(verifier.verify("https://example.com/").await);
    }
}
