//! Business-facing payloads: candidates from discovery and the structured
//! data returned by the extraction collaborator.

use serde::{Deserialize, Serialize};
use url::Url;

/// Structured shipping/business fields extracted from a live page.
///
/// The upstream extraction step is an LLM, so every field is optional and
/// `threshold_amount` arrives as a JSON number *or* a string — callers must
/// go through [`crate::threshold::extract_threshold`] rather than reading
/// it directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products_summary: Option<String>,

    /// Free-text shipping policy as stated on the site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_policy: Option<String>,

    /// Raw free-shipping threshold as extracted. Number or string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold_amount: Option<serde_json::Value>,
}

impl StructuredData {
    /// Backfill missing fields from another payload, keeping existing values.
    pub fn merge_missing(mut self, fallback: StructuredData) -> StructuredData {
        self.business_name = self.business_name.or(fallback.business_name);
        self.products_summary = self.products_summary.or(fallback.products_summary);
        self.shipping_policy = self.shipping_policy.or(fallback.shipping_policy);
        self.threshold_amount = self.threshold_amount.or(fallback.threshold_amount);
        self
    }
}

/// A competitor business surfaced by discovery, not yet verified reachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,

    /// Bare domain, no scheme.
    pub website: String,

    #[serde(default)]
    pub products_summary: String,
}

/// The primary site's extracted profile, used as discovery context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessProfile {
    /// Bare domain of the site being analyzed.
    pub website: String,

    pub data: StructuredData,
}

/// Prepend `https://` when the input carries no scheme.
///
/// `http://` inputs are left untouched.
pub fn ensure_scheme(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Reduce a URL or domain string to its bare host.
pub fn bare_domain(url: &str) -> String {
    let trimmed = url.trim();
    if let Ok(parsed) = Url::parse(trimmed) {
        if let Some(host) = parsed.host_str() {
            return host.to_string();
        }
    }
    // Scheme-less input; take the host portion by hand.
    trimmed
        .split_once('/')
        .map(|(host, _)| host)
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_scheme_prepends_https() {
        assert_eq!(ensure_scheme("example.com"), "https://example.com");
    }

    #[test]
    fn ensure_scheme_leaves_http_untouched() {
        assert_eq!(ensure_scheme("http://example.com"), "http://example.com");
        assert_eq!(ensure_scheme("https://example.com"), "https://example.com");
    }

    #[test]
    fn bare_domain_strips_scheme_and_path() {
        assert_eq!(bare_domain("https://example.com/shipping"), "example.com");
        assert_eq!(bare_domain("example.com"), "example.com");
    }

    #[test]
    fn merge_missing_keeps_existing_fields() {
        let partial = StructuredData {
            business_name: Some("Acme".into()),
            ..Default::default()
        };
        let fallback = StructuredData {
            business_name: Some("Other".into()),
            products_summary: Some("widgets".into()),
            ..Default::default()
        };

        let merged = partial.merge_missing(fallback);
        assert_eq!(merged.business_name.as_deref(), Some("Acme"));
        assert_eq!(merged.products_summary.as_deref(), Some("widgets"));
    }
}
