// ============================================================
// Layer 5 — Positional Token Embedder
// ============================================================
// Shared by the encoder and the decoder:
//
//   embedded[b, i] = token_table[tokens[b, i]] + position_table[i]
//
// followed by dropout. Positions are learned (not sinusoidal),
// so the position table bounds the longest sequence the model
// can ever see.

use burn::{
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig},
    prelude::*,
};

use crate::ml::error::{ModelError, ModelResult};

#[derive(Config, Debug)]
pub struct PositionalEmbedderConfig {
    pub vocab_size: usize,
    pub emb_dim:    usize,
    #[config(default = 100)]
    pub max_length: usize,
    #[config(default = 0.25)]
    pub dropout:    f64,
}

impl PositionalEmbedderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> PositionalTokenEmbedder<B> {
        PositionalTokenEmbedder {
            tok_embedding: EmbeddingConfig::new(self.vocab_size, self.emb_dim).init(device),
            pos_embedding: EmbeddingConfig::new(self.max_length, self.emb_dim).init(device),
            dropout:       DropoutConfig::new(self.dropout).init(),
            max_length:    self.max_length,
        }
    }
}

#[derive(Module, Debug)]
pub struct PositionalTokenEmbedder<B: Backend> {
    pub tok_embedding: Embedding<B>,
    pub pos_embedding: Embedding<B>,
    pub dropout:       Dropout,
    pub max_length:    usize,
}

/// Both views of an embedded sequence, `[batch, len, emb_dim]` each.
#[derive(Debug, Clone)]
pub struct Embedded<B: Backend> {
    /// token + position, before dropout
    pub raw:     Tensor<B, 3>,
    /// `raw` after dropout (identical outside training)
    pub dropped: Tensor<B, 3>,
}

impl<B: Backend> PositionalTokenEmbedder<B> {
    /// tokens: [batch, len] → Embedded with tensors [batch, len, emb_dim]
    pub fn forward(&self, tokens: Tensor<B, 2, Int>) -> ModelResult<Embedded<B>> {
        let [batch_size, seq_len] = tokens.dims();

        if seq_len > self.max_length {
            return Err(ModelError::config(format!(
                "sequence length {seq_len} exceeds the position table size {}",
                self.max_length
            )));
        }

        let device    = tokens.device();
        let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &device)
            .unsqueeze::<2>()
            .expand([batch_size, seq_len]);

        let raw = self.tok_embedding.forward(tokens) + self.pos_embedding.forward(positions);
        let dropped = self.dropout.forward(raw.clone());

        Ok(Embedded { raw, dropped })
    }
}
