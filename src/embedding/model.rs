use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config};
use std::path::Path;

/// BERT-family sentence encoder with mean pooling over token states.
pub(crate) struct BertForEmbedding {
    bert: BertModel,
    hidden_size: usize,
}

impl BertForEmbedding {
    pub(crate) fn load<P: AsRef<Path>>(
        model_dir: P,
        device: &Device,
    ) -> candle_core::Result<Self> {
        let model_dir = model_dir.as_ref();
        let config_path = model_dir.join("config.json");
        let weights_path = model_dir.join("model.safetensors");

        let config_content = std::fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| candle_core::Error::Msg(format!("Failed to parse config: {}", e)))?;

        let vb =
            unsafe { VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, device)? };

        let bert = if vb.contains_tensor("bert.embeddings.word_embeddings.weight") {
            BertModel::load(vb.pp("bert"), &config)?
        } else {
            BertModel::load(vb.clone(), &config)?
        };

        Ok(Self {
            bert,
            hidden_size: config.hidden_size,
        })
    }

    pub(crate) fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// Mean-pools hidden states into one sentence vector.
    ///
    /// `input_ids` shape: `[1, seq_len]`; result shape: `[hidden_size]`.
    pub(crate) fn forward_pooled(
        &self,
        input_ids: &Tensor,
        token_type_ids: &Tensor,
    ) -> candle_core::Result<Vec<f32>> {
        let hidden_states = self.bert.forward(input_ids, token_type_ids, None)?;
        let pooled = hidden_states.mean(1)?.squeeze(0)?;
        pooled.to_vec1::<f32>()
    }
}
