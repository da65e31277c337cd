// Local ONNX classifiers — sentiment and named-entity recognition.
//
// Both run entirely on the local CPU. The sentiment model is DistilBERT
// fine-tuned on SST-2 (two classes, no neutral). The entity model is a BERT
// token classifier fine-tuned on CoNLL-03 (PER, ORG, LOC, MISC in BIO form).
//
// Each model directory holds `model.onnx`, `tokenizer.json` and the
// HuggingFace `config.json`, whose `id2label` map gives the output order.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::debug;

use super::aggregate::{aggregate_simple, TokenPrediction};
use super::download::{MODEL_CONFIG_FILE, MODEL_FILE, TOKENIZER_FILE};
use super::traits::{EntityRecognizer, EntitySpan, Sentiment, SentimentClassifier};
use crate::output::truncate_chars;

/// The subset of a HuggingFace `config.json` we need.
#[derive(Deserialize)]
struct ModelConfig {
    id2label: HashMap<String, String>,
}

/// Position embeddings of both BERT models stop at 512 tokens.
const MAX_SEQUENCE_LENGTH: usize = 512;

/// Output labels in index order, read from `config.json`.
fn load_labels(model_dir: &Path) -> Result<Vec<String>> {
    let path = model_dir.join(MODEL_CONFIG_FILE);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ModelConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse id2label from {}", path.display()))?;
    labels_in_order(config.id2label)
}

fn labels_in_order(id2label: HashMap<String, String>) -> Result<Vec<String>> {
    let mut indexed = id2label
        .into_iter()
        .map(|(id, label)| {
            id.parse::<usize>()
                .map(|i| (i, label))
                .with_context(|| format!("Non-numeric label id: {id}"))
        })
        .collect::<Result<Vec<_>>>()?;
    indexed.sort_by_key(|(i, _)| *i);

    for (expected, (i, _)) in indexed.iter().enumerate() {
        if *i != expected {
            anyhow::bail!("id2label is not contiguous: missing id {expected}");
        }
    }

    Ok(indexed.into_iter().map(|(_, label)| label).collect())
}

/// Load session, tokenizer and labels, failing early with a download hint.
fn load_model(model_dir: &Path, what: &str) -> Result<(Session, Tokenizer, Vec<String>)> {
    for file in [MODEL_FILE, TOKENIZER_FILE, MODEL_CONFIG_FILE] {
        let path = model_dir.join(file);
        if !path.exists() {
            anyhow::bail!(
                "{what} file not found: {}\nRun `moderator download-model` to download it.",
                path.display()
            );
        }
    }

    let model_path = model_dir.join(MODEL_FILE);
    let session = Session::builder()
        .context("Failed to create ONNX session builder")?
        .commit_from_file(&model_path)
        .with_context(|| format!("Failed to load {what} model from {}", model_path.display()))?;

    let mut tokenizer = Tokenizer::from_file(model_dir.join(TOKENIZER_FILE))
        .map_err(|e| anyhow::anyhow!("Failed to load {what} tokenizer: {}", e))?;
    truncate_to_model_limit(&mut tokenizer)?;

    let labels = load_labels(model_dir)?;

    debug!(labels = labels.len(), "Loaded {what} model from {}", model_dir.display());

    Ok((session, tokenizer, labels))
}

/// Cap encodings (special tokens included) at the model's sequence limit.
fn truncate_to_model_limit(tokenizer: &mut Tokenizer) -> Result<()> {
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: MAX_SEQUENCE_LENGTH,
            ..Default::default()
        }))
        .map_err(|e| anyhow::anyhow!("Failed to enable truncation: {}", e))?;
    Ok(())
}

fn argmax(row: &[f32]) -> Option<usize> {
    row.iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
}

/// Numerically stable softmax.
fn softmax(row: &[f32]) -> Vec<f32> {
    let max = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = row.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// DistilBERT SST-2 sentiment classifier.
pub struct OnnxSentimentClassifier {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    labels: Arc<Vec<String>>,
}

impl OnnxSentimentClassifier {
    /// Load from a directory containing model.onnx, tokenizer.json and config.json.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let (session, tokenizer, labels) = load_model(model_dir, "Sentiment")?;
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            labels: Arc::new(labels),
        })
    }
}

#[async_trait]
impl SentimentClassifier for OnnxSentimentClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment> {
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let labels = Arc::clone(&self.labels);
        let text = text.to_string();

        // Tokenization and inference are CPU-bound
        tokio::task::spawn_blocking(move || {
            let encoding = tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

            let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
            let mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect();
            let shape = [1_i64, ids.len() as i64];

            let input_ids = Tensor::from_array((shape, ids))
                .context("Failed to create input_ids tensor")?;
            let attention_mask = Tensor::from_array((shape, mask))
                .context("Failed to create attention_mask tensor")?;

            let logits = {
                let mut session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

                let outputs = session
                    .run(ort::inputs! {
                        "input_ids" => input_ids,
                        "attention_mask" => attention_mask
                    })
                    .context("ONNX inference failed")?;

                // Shape: [1, num_labels]
                let (_shape, data) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract output tensor")?;
                data.to_vec()
            };

            let top = argmax(&logits).context("Sentiment model returned no logits")?;
            let label = labels
                .get(top)
                .with_context(|| format!("No label for output index {top}"))?;
            let sentiment = Sentiment::from_label(label)
                .with_context(|| format!("Unexpected sentiment label: {label}"))?;

            debug!(
                sentiment = sentiment.as_str(),
                text_preview = %truncate_chars(&text, 50),
                "ONNX classified sentiment"
            );

            Ok(sentiment)
        })
        .await
        .context("spawn_blocking panicked")?
    }
}

/// BERT CoNLL-03 token classifier with simple aggregation.
pub struct OnnxEntityRecognizer {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    labels: Arc<Vec<String>>,
}

impl OnnxEntityRecognizer {
    /// Load from a directory containing model.onnx, tokenizer.json and config.json.
    pub fn load(model_dir: &Path) -> Result<Self> {
        let (session, tokenizer, labels) = load_model(model_dir, "Entity")?;
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            labels: Arc::new(labels),
        })
    }
}

#[async_trait]
impl EntityRecognizer for OnnxEntityRecognizer {
    async fn recognize(&self, text: &str) -> Result<Vec<EntitySpan>> {
        let session = Arc::clone(&self.session);
        let tokenizer = Arc::clone(&self.tokenizer);
        let labels = Arc::clone(&self.labels);
        let text = text.to_string();

        tokio::task::spawn_blocking(move || {
            let encoding = tokenizer
                .encode(text.as_str(), true)
                .map_err(|e| anyhow::anyhow!("Tokenization failed: {}", e))?;

            let seq_len = encoding.get_ids().len();
            let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
            let mask: Vec<i64> = encoding
                .get_attention_mask()
                .iter()
                .map(|&m| m as i64)
                .collect();
            let type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();
            let shape = [1_i64, seq_len as i64];

            let input_ids = Tensor::from_array((shape, ids))
                .context("Failed to create input_ids tensor")?;
            let attention_mask = Tensor::from_array((shape, mask))
                .context("Failed to create attention_mask tensor")?;
            let token_type_ids = Tensor::from_array((shape, type_ids))
                .context("Failed to create token_type_ids tensor")?;

            let logits = {
                let mut session = session
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Session lock poisoned: {}", e))?;

                let outputs = session
                    .run(ort::inputs! {
                        "input_ids" => input_ids,
                        "attention_mask" => attention_mask,
                        "token_type_ids" => token_type_ids
                    })
                    .context("ONNX inference failed")?;

                // Shape: [1, seq_len, num_labels]
                let (_shape, data) = outputs[0]
                    .try_extract_tensor::<f32>()
                    .context("Failed to extract output tensor")?;
                data.to_vec()
            };

            let num_labels = labels.len();
            if logits.len() != seq_len * num_labels {
                anyhow::bail!(
                    "Entity model returned {} logits, expected {} tokens x {} labels",
                    logits.len(),
                    seq_len,
                    num_labels
                );
            }

            let special = encoding.get_special_tokens_mask();
            let offsets = encoding.get_offsets();

            let mut predictions = Vec::with_capacity(seq_len);
            for i in 0..seq_len {
                if special.get(i).copied().unwrap_or(0) == 1 {
                    continue;
                }
                let probs = softmax(&logits[i * num_labels..(i + 1) * num_labels]);
                let Some(top) = argmax(&probs) else {
                    continue;
                };
                let (start, end) = offsets[i];
                predictions.push(TokenPrediction {
                    label: labels[top].clone(),
                    score: probs[top],
                    start,
                    end,
                });
            }

            let spans = aggregate_simple(&text, &predictions);

            debug!(
                spans = spans.len(),
                persons = spans.iter().filter(|s| s.is_person()).count(),
                text_preview = %truncate_chars(&text, 50),
                "ONNX recognized entities"
            );

            Ok(spans)
        })
        .await
        .context("spawn_blocking panicked")?
    }
}
