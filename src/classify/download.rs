// Model download helper for the ONNX classifiers.
//
// Downloads two models from HuggingFace:
// 1. DistilBERT SST-2 — binary sentiment (~260MB)
// 2. BERT CoNLL-03 — named-entity recognition (~430MB)
//
// Files are stored in a platform-appropriate directory
// (~/.local/share/moderator/models/ on Linux) so they persist across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// HuggingFace repo for the sentiment model (ONNX export).
const SENTIMENT_HF_URL: &str =
    "https://huggingface.co/optimum/distilbert-base-uncased-finetuned-sst-2-english/resolve/main";

/// HuggingFace repo for the entity model (ONNX export of dslim/bert-base-NER).
/// The hosted backend defaults to the larger dbmdz CoNLL-03 model, so the two
/// backends can disagree on borderline names.
const NER_HF_URL: &str = "https://huggingface.co/optimum/bert-base-NER/resolve/main";

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";
pub const MODEL_CONFIG_FILE: &str = "config.json";

/// Returns the default directory for storing model files.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("moderator")
        .join("models")
}

/// Subdirectory within model_dir for the sentiment model.
pub fn sentiment_model_dir(base: &Path) -> PathBuf {
    base.join("sentiment")
}

/// Subdirectory within model_dir for the entity model.
pub fn ner_model_dir(base: &Path) -> PathBuf {
    base.join("ner")
}

/// Check whether all files for one model exist in `dir`.
pub fn model_files_present(dir: &Path) -> bool {
    [MODEL_FILE, TOKENIZER_FILE, MODEL_CONFIG_FILE]
        .iter()
        .all(|f| dir.join(f).exists())
}

/// Download both models. Skips files that already exist.
pub async fn download_models(base: &Path) -> Result<()> {
    println!("\nSentiment model (distilbert-base-uncased-finetuned-sst-2-english):");
    download_model(SENTIMENT_HF_URL, &sentiment_model_dir(base), "~260 MB").await?;

    println!("\nEntity model (bert-base-NER, CoNLL-03):");
    download_model(NER_HF_URL, &ner_model_dir(base), "~430 MB").await?;

    Ok(())
}

async fn download_model(repo_url: &str, dir: &Path, model_size: &str) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    for file in [MODEL_CONFIG_FILE, TOKENIZER_FILE, MODEL_FILE] {
        let dest = dir.join(file);
        if dest.exists() {
            info!(file, "Model file already exists, skipping");
            println!("  {file} (already exists)");
            continue;
        }

        let is_model = file == MODEL_FILE;
        if is_model {
            println!("  Downloading {file} ({model_size})...");
        } else {
            println!("  Downloading {file}...");
        }
        download_file(&format!("{repo_url}/{file}"), &dest, is_model).await?;
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = if show_progress {
        let pb = match response.content_length() {
            Some(size) => {
                let pb = ProgressBar::new(size);
                pb.set_style(
                    ProgressStyle::default_bar()
                        .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                        .expect("valid template")
                        .progress_chars("=> "),
                );
                pb
            }
            None => {
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("    {spinner} {bytes}")
                        .expect("valid template"),
                );
                pb
            }
        };
        Some(pb)
    } else {
        None
    };

    let bytes = response
        .bytes()
        .await
        .context("Failed to read response body")?;

    if let Some(ref pb) = pb {
        pb.set_position(bytes.len() as u64);
    }

    std::fs::write(dest, &bytes).with_context(|| format!("Failed to write {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model_dir_is_under_moderator() {
        let dir = default_model_dir();
        let path_str = dir.to_string_lossy();
        assert!(
            path_str.contains("moderator") && path_str.contains("models"),
            "Expected path containing moderator/models, got: {path_str}"
        );
    }

    #[test]
    fn test_model_subdirectories() {
        let base = PathBuf::from("/tmp/test-models");
        assert_eq!(sentiment_model_dir(&base), base.join("sentiment"));
        assert_eq!(ner_model_dir(&base), base.join("ner"));
    }

    #[test]
    fn test_model_files_present_false_when_empty() {
        let dir = std::env::temp_dir().join("moderator-test-nonexistent");
        assert!(!model_files_present(&dir));
    }

    #[test]
    fn test_model_files_present_true_when_files_exist() {
        let dir = std::env::temp_dir().join("moderator-download-test");
        std::fs::create_dir_all(&dir).unwrap();
        for file in [MODEL_FILE, TOKENIZER_FILE, MODEL_CONFIG_FILE] {
            std::fs::write(dir.join(file), b"fake").unwrap();
        }

        assert!(model_files_present(&dir));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
