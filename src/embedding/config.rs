use std::path::PathBuf;

use crate::constants::{DEFAULT_EMBEDDING_DIM, DEFAULT_MAX_SEQ_LEN};

use super::error::EncodingError;

/// Sentence-encoder configuration.
///
/// Use [`EncoderConfig::stub`] for tests/deployments without model files.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Directory containing `config.json`, `model.safetensors`, `tokenizer.json`.
    pub model_dir: PathBuf,
    /// Output embedding dimension.
    pub embedding_dim: usize,
    /// Max token count; longer inputs are rejected (callers truncate first).
    pub max_seq_len: usize,
    /// Run with the deterministic hash-seeded backend instead of a model.
    pub testing_stub: bool,
}

impl EncoderConfig {
    /// Config for a real model directory.
    pub fn new(model_dir: PathBuf) -> Self {
        Self {
            model_dir,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            testing_stub: false,
        }
    }

    /// Config for the stub backend (no files required).
    pub fn stub() -> Self {
        Self {
            model_dir: PathBuf::new(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            max_seq_len: DEFAULT_MAX_SEQ_LEN,
            testing_stub: true,
        }
    }

    /// Overrides the embedding dimension.
    pub fn embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    /// Overrides the max sequence length.
    pub fn max_seq_len(mut self, len: usize) -> Self {
        self.max_seq_len = len;
        self
    }

    pub fn validate(&self) -> Result<(), EncodingError> {
        if self.embedding_dim == 0 {
            return Err(EncodingError::InvalidConfig {
                reason: "embedding_dim must be greater than zero".to_string(),
            });
        }
        if self.max_seq_len == 0 {
            return Err(EncodingError::InvalidConfig {
                reason: "max_seq_len must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn weights_path(&self) -> PathBuf {
        self.model_dir.join("model.safetensors")
    }

    pub fn bert_config_path(&self) -> PathBuf {
        self.model_dir.join("config.json")
    }

    pub fn tokenizer_path(&self) -> PathBuf {
        self.model_dir.join("tokenizer.json")
    }

    pub fn model_available(&self) -> bool {
        self.weights_path().is_file() && self.bert_config_path().is_file()
    }

    pub fn tokenizer_available(&self) -> bool {
        self.tokenizer_path().is_file()
    }
}
