//! OpenAI-backed collaborators: discovery, enrichment, and synthesis.
//!
//! A reference implementation over raw chat completions. Business logic
//! (what to prompt for) lives here; the analysis core only sees the trait
//! seams.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use analysis::pipeline::strip_code_fences;
use analysis::{
    parse_candidates, AnalysisError, BusinessProfile, Candidate, CandidateDiscovery,
    ProfileEnricher, StructuredData, SynthesisContext, SynthesisKind, Synthesizer,
};

const DISCOVERY_SYSTEM: &str = "You are a market researcher. You respond only with JSON.";

const ENRICH_SYSTEM: &str = "You fill in missing business profile fields. You respond only with \
     a JSON object with the keys business_name, products_summary and shipping_policy.";

const SYNTHESIS_SYSTEM: &str = "You are an e-commerce consultant writing for a store owner \
     comparing free-shipping thresholds against competitors.";

/// OpenAI chat-completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

impl OpenAiClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Set the chat model (default: gpt-4o).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.2,
        };

        tracing::debug!(model = %self.model, prompt_length = user.len(), "calling OpenAI");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .context("Failed to send chat request to OpenAI")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("OpenAI API error {}: {}", status, body);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("OpenAI returned an empty completion")
    }
}

fn discovery_prompt(context: &BusinessProfile, excluding: &[String], count: usize) -> String {
    let mut prompt = format!(
        "Find {} direct competitors of the online store at {}.",
        count, context.website
    );
    if let Some(products) = &context.data.products_summary {
        prompt.push_str(&format!(" It sells: {}.", products));
    }
    if !excluding.is_empty() {
        prompt.push_str(&format!(
            " Do not include any of these: {}.",
            excluding.join(", ")
        ));
    }
    prompt.push_str(
        " Respond with a JSON array of objects with the keys \
         name, website (bare domain) and products_summary.",
    );
    prompt
}

#[async_trait]
impl CandidateDiscovery for OpenAiClient {
    async fn discover(
        &self,
        context: &BusinessProfile,
        excluding: &[String],
        count: usize,
    ) -> analysis::Result<Vec<Candidate>> {
        let prompt = discovery_prompt(context, excluding, count);
        let response = self
            .chat(DISCOVERY_SYSTEM, &prompt)
            .await
            .map_err(|e| AnalysisError::Discovery(e.into()))?;

        match parse_candidates(&response) {
            Ok(candidates) => {
                tracing::info!(count = candidates.len(), "discovery returned candidates");
                Ok(candidates)
            }
            Err(e) => {
                // Untrusted model output; an unparseable list is just an empty one.
                tracing::warn!(error = %e, "discovery response did not parse");
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl ProfileEnricher for OpenAiClient {
    async fn enrich(&self, url: &str, partial: StructuredData) -> StructuredData {
        let complete = partial.business_name.is_some()
            && partial.products_summary.is_some()
            && partial.shipping_policy.is_some();
        if complete {
            return partial;
        }

        let prompt = format!(
            "The store at {} has this partial profile: {}. \
             Fill in only the missing fields from what you know of the business.",
            url,
            serde_json::to_string(&partial).unwrap_or_default()
        );

        match self.chat(ENRICH_SYSTEM, &prompt).await {
            Ok(response) => {
                match serde_json::from_str::<StructuredData>(strip_code_fences(&response)) {
                    Ok(backfill) => partial.merge_missing(backfill),
                    Err(e) => {
                        tracing::debug!(url, error = %e, "enrichment response did not parse");
                        partial
                    }
                }
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "enrichment call failed");
                partial
            }
        }
    }
}

#[async_trait]
impl Synthesizer for OpenAiClient {
    async fn synthesize(
        &self,
        kind: SynthesisKind,
        context: &SynthesisContext,
    ) -> analysis::Result<String> {
        let instruction = match kind {
            SynthesisKind::Analysis => {
                "Write a short business analysis of how this store's shipping \
                 incentive compares to its competitors."
            }
            SynthesisKind::Recommendations => {
                "Write concrete recommendations for this store's free-shipping \
                 threshold based on the competitive data."
            }
        };
        let prompt = format!(
            "{}\n\nData:\n{}",
            instruction,
            serde_json::to_string_pretty(context).unwrap_or_default()
        );

        self.chat(SYNTHESIS_SYSTEM, &prompt)
            .await
            .map_err(|e| AnalysisError::Synthesis(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_prompt_carries_exclusions_and_count() {
        let context = BusinessProfile {
            website: "primary.com".to_string(),
            data: StructuredData {
                products_summary: Some("handmade candles".to_string()),
                ..Default::default()
            },
        };
        let prompt = discovery_prompt(&context, &["seen.com".to_string()], 15);

        assert!(prompt.contains("15 direct competitors"));
        assert!(prompt.contains("handmade candles"));
        assert!(prompt.contains("seen.com"));
    }
}
