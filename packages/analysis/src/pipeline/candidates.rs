//! Candidate list parsing — the untrusted-LLM-text boundary.
//!
//! Discovery responses arrive as model-generated JSON: sometimes a bare
//! array, sometimes wrapped in a `competitors` object, frequently fenced in
//! markdown. This module is the one place that shape-coerces them. Callers
//! fall back to an empty list on parse failure.

use serde::Deserialize;

use crate::error::Result;
use crate::types::{bare_domain, Candidate};

#[derive(Debug, Deserialize)]
struct CandidateList {
    #[serde(default)]
    competitors: Vec<RawCandidate>,
}

/// Field names the model actually produces, not the ones we asked for.
#[derive(Debug, Deserialize)]
struct RawCandidate {
    #[serde(default)]
    name: Option<String>,

    #[serde(default, alias = "url", alias = "domain")]
    website: Option<String>,

    #[serde(default, alias = "products", alias = "description")]
    products_summary: Option<String>,
}

/// Parse a discovery response into candidates.
///
/// Accepts a bare JSON array or an object with a `competitors` key, either
/// optionally wrapped in markdown code fences. Entries without a usable
/// domain are dropped; schemes are stripped so websites are bare domains.
pub fn parse_candidates(raw: &str) -> Result<Vec<Candidate>> {
    let body = strip_code_fences(raw);

    let raws: Vec<RawCandidate> = match serde_json::from_str::<Vec<RawCandidate>>(body) {
        Ok(list) => list,
        Err(_) => serde_json::from_str::<CandidateList>(body)?.competitors,
    };

    Ok(raws.into_iter().filter_map(normalize).collect())
}

fn normalize(raw: RawCandidate) -> Option<Candidate> {
    let website = bare_domain(raw.website?.trim());
    if website.is_empty() || !website.contains('.') {
        return None;
    }

    let name = raw
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| website.clone());

    Some(Candidate {
        name,
        website,
        products_summary: raw.products_summary.unwrap_or_default(),
    })
}

/// Strip a leading/trailing markdown code fence, with or without a language tag.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag line ("json", etc.), then the closing fence.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.rsplit_once("```")
        .map(|(body, _)| body)
        .unwrap_or(body)
        .trim()
}
