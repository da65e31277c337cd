// Hosted classifiers via the HuggingFace inference API.
//
// Same models as the local ONNX backend, run remotely. Useful where the
// ONNX runtime can't be installed. Every call is rate limited on the
// client side; failures (HTTP errors, bad payloads) are returned as errors
// and become ServiceUnavailable at the signal-extraction seam.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rate_limiter::RateLimiter;
use super::traits::{EntityRecognizer, EntitySpan, Sentiment, SentimentClassifier};
use crate::output::truncate_chars;

pub const DEFAULT_INFERENCE_URL: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_SENTIMENT_MODEL: &str = "distilbert-base-uncased-finetuned-sst-2-english";
pub const DEFAULT_NER_MODEL: &str = "dbmdz/bert-large-cased-finetuned-conll03-english";

/// Shared HTTP client for hosted models.
pub struct InferenceClient {
    client: Client,
    base_url: String,
    api_token: String,
    rate_limiter: RateLimiter,
}

impl InferenceClient {
    pub fn new(base_url: &str, api_token: String, requests_per_second: f64) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            rate_limiter: RateLimiter::new(requests_per_second),
        }
    }

    async fn infer<T: DeserializeOwned>(&self, model: &str, request: &InferenceRequest<'_>) -> Result<T> {
        self.rate_limiter.acquire().await;

        let url = format!("{}/{}", self.base_url, model);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(request)
            .send()
            .await
            .with_context(|| format!("Failed to call inference API for {model}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Inference API returned {} for {}: {}", status, model, body);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse inference response for {model}"))
    }
}

// --- Inference API request/response types ---

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<InferenceParameters>,
    options: InferenceOptions,
}

#[derive(Serialize)]
struct InferenceParameters {
    aggregation_strategy: &'static str,
}

#[derive(Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

#[derive(Deserialize, Debug, Clone)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Text classification comes back either nested per input or flat.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationResponse {
    fn top_label(self) -> Option<LabelScore> {
        let scores = match self {
            ClassificationResponse::Nested(mut batches) => {
                if batches.is_empty() {
                    return None;
                }
                batches.swap_remove(0)
            }
            ClassificationResponse::Flat(scores) => scores,
        };
        scores.into_iter().max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// Hosted DistilBERT SST-2 sentiment.
pub struct HostedSentimentClassifier {
    client: Arc<InferenceClient>,
    model: String,
}

impl HostedSentimentClassifier {
    pub fn new(client: Arc<InferenceClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl SentimentClassifier for HostedSentimentClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment> {
        let request = InferenceRequest {
            inputs: text,
            parameters: None,
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let response: ClassificationResponse = self.client.infer(&self.model, &request).await?;
        let top = response
            .top_label()
            .context("Inference API returned no sentiment labels")?;
        let sentiment = Sentiment::from_label(&top.label)
            .with_context(|| format!("Unexpected sentiment label: {}", top.label))?;

        debug!(
            sentiment = sentiment.as_str(),
            score = top.score,
            text_preview = %truncate_chars(text, 50),
            "Hosted sentiment classified"
        );

        Ok(sentiment)
    }
}

/// Hosted CoNLL-03 entity recognition with server-side simple aggregation.
pub struct HostedEntityRecognizer {
    client: Arc<InferenceClient>,
    model: String,
}

impl HostedEntityRecognizer {
    pub fn new(client: Arc<InferenceClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl EntityRecognizer for HostedEntityRecognizer {
    async fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let request = InferenceRequest {
            inputs: text,
            parameters: Some(InferenceParameters {
                aggregation_strategy: "simple",
            }),
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let spans: Vec<EntitySpan> = self.client.infer(&self.model, &request).await?;

        debug!(
            spans = spans.len(),
            text_preview = %truncate_chars(text, 50),
            "Hosted entities recognized"
        );

        Ok(spans)
    }
}
