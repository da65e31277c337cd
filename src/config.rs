use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::classify::download;
use crate::classify::inference::{
    DEFAULT_INFERENCE_URL, DEFAULT_NER_MODEL, DEFAULT_SENTIMENT_MODEL,
};
use crate::policy::DEFAULT_GUIDELINES;

/// Which classifier backend to use.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierBackend {
    /// Local ONNX models (default) — no API token, no rate limits
    Onnx,
    /// HuggingFace hosted inference — requires HF_API_TOKEN
    Inference,
}

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy.
pub struct Config {
    pub classifier_backend: ClassifierBackend,
    /// Directory containing the `sentiment/` and `ner/` ONNX model folders
    pub model_dir: PathBuf,
    pub hf_api_token: String,
    pub inference_url: String,
    pub sentiment_model: String,
    pub ner_model: String,
    /// Client-side cap on hosted calls per second (0 disables the cap)
    pub inference_rps: f64,
    /// Replaces the built-in default guidelines when set
    pub guidelines_file: Option<PathBuf>,
    pub port: u16,
    pub bind: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        let classifier_backend = match env::var("MODERATOR_CLASSIFIER").as_deref() {
            Ok("inference") => ClassifierBackend::Inference,
            // "onnx" or unset both default to ONNX
            _ => ClassifierBackend::Onnx,
        };

        let model_dir = env::var("MODERATOR_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| download::default_model_dir());

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            Err(_) => 5050,
        };

        let inference_rps = match env::var("HF_MAX_RPS") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("HF_MAX_RPS must be a number, got {raw:?}"))?,
            Err(_) => 1.0,
        };

        Ok(Self {
            classifier_backend,
            model_dir,
            hf_api_token: env::var("HF_API_TOKEN").unwrap_or_default(),
            inference_url: env::var("HF_INFERENCE_URL")
                .unwrap_or_else(|_| DEFAULT_INFERENCE_URL.to_string()),
            sentiment_model: env::var("HF_SENTIMENT_MODEL")
                .unwrap_or_else(|_| DEFAULT_SENTIMENT_MODEL.to_string()),
            ner_model: env::var("HF_NER_MODEL").unwrap_or_else(|_| DEFAULT_NER_MODEL.to_string()),
            inference_rps,
            guidelines_file: env::var("MODERATOR_GUIDELINES_FILE").ok().map(PathBuf::from),
            port,
            bind: env::var("MODERATOR_BIND").unwrap_or_else(|_| "0.0.0.0".to_string()),
        })
    }

    /// Validate that the chosen backend has what it needs.
    ///
    /// For ONNX only the sentiment model is mandatory: without the entity
    /// model, personal-name checks report the recognizer as unavailable.
    pub fn require_classifier(&self) -> Result<()> {
        match self.classifier_backend {
            ClassifierBackend::Onnx => {
                let dir = download::sentiment_model_dir(&self.model_dir);
                if !download::model_files_present(&dir) {
                    anyhow::bail!(
                        "ONNX sentiment model not found in {}\n\
                         Run `moderator download-model` to download it.\n\
                         Or set MODERATOR_CLASSIFIER=inference to use the hosted API instead.",
                        dir.display()
                    );
                }
                Ok(())
            }
            ClassifierBackend::Inference => {
                if self.hf_api_token.is_empty() {
                    anyhow::bail!(
                        "HF_API_TOKEN not set. Add it to your .env file.\n\
                         See .env.example for the required variables."
                    );
                }
                Ok(())
            }
        }
    }

    /// The guidelines used when a caller doesn't supply any.
    pub fn default_guidelines(&self) -> Result<String> {
        match &self.guidelines_file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read guidelines file {}", path.display())),
            None => Ok(DEFAULT_GUIDELINES.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            classifier_backend: ClassifierBackend::Inference,
            model_dir: PathBuf::from("/nonexistent/moderator-models"),
            hf_api_token: String::new(),
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            sentiment_model: DEFAULT_SENTIMENT_MODEL.to_string(),
            ner_model: DEFAULT_NER_MODEL.to_string(),
            inference_rps: 1.0,
            guidelines_file: None,
            port: 5050,
            bind: "127.0.0.1".to_string(),
        }
    }

    #[test]
    fn test_inference_requires_token() {
        let mut config = base_config();
        assert!(config.require_classifier().is_err());
        config.hf_api_token = "hf_test".to_string();
        assert!(config.require_classifier().is_ok());
    }

    #[test]
    fn test_onnx_requires_model_files() {
        let config = Config {
            classifier_backend: ClassifierBackend::Onnx,
            ..base_config()
        };
        let err = config.require_classifier().unwrap_err();
        assert!(err.to_string().contains("download-model"));
    }

    #[test]
    fn test_default_guidelines_builtin() {
        let config = base_config();
        assert_eq!(config.default_guidelines().unwrap(), DEFAULT_GUIDELINES);
    }

    #[test]
    fn test_default_guidelines_from_file() {
        let path = std::env::temp_dir().join("moderator-guidelines-test.txt");
        std::fs::write(&path, "block words: kiwi").unwrap();
        let config = Config {
            guidelines_file: Some(path.clone()),
            ..base_config()
        };
        assert_eq!(config.default_guidelines().unwrap(), "block words: kiwi");
        std::fs::remove_file(&path).unwrap();
    }
}
