// ============================================================
// Layer 5 — Attention Bridge
// ============================================================
// Inserted after the GLU of every decoder block:
//
//   query     = (hid2emb(gated) + embedded) · √0.5     [b, trg, emb]
//   energy    = query · encoder_conved^T               [b, trg, src]
//   attention = softmax(energy, over src)
//   attended  = emb2hid(attention · encoder_combined)  [b, trg, hid]
//   output    = (gated + attended) · √0.5              [b, hid, trg]
//
// Keys are the encoder's `conved`, values its `combined`.
// One bridge (one pair of projections) serves every block.

use burn::{
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::activation::softmax,
};

use crate::ml::conv_block::SCALE;
use crate::ml::encoder::EncoderOutput;

#[derive(Config, Debug)]
pub struct AttentionBridgeConfig {
    pub emb_dim: usize,
    pub hid_dim: usize,
}

impl AttentionBridgeConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> AttentionBridge<B> {
        AttentionBridge {
            hid2emb: LinearConfig::new(self.hid_dim, self.emb_dim).init(device),
            emb2hid: LinearConfig::new(self.emb_dim, self.hid_dim).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct AttentionBridge<B: Backend> {
    pub hid2emb: Linear<B>,
    pub emb2hid: Linear<B>,
}

pub struct BridgeOutput<B: Backend> {
    /// Gated output with the attended context mixed in — [batch, hid, trg_len]
    pub hidden:    Tensor<B, 3>,
    /// Rows are distributions over source positions — [batch, trg_len, src_len]
    pub attention: Tensor<B, 3>,
}

impl<B: Backend> AttentionBridge<B> {
    /// * `embedded` - dropout-less token+position embedding, [batch, trg_len, emb]
    /// * `gated`    - GLU output of the current block, [batch, hid, trg_len]
    /// * `encoder`  - encoder conved/combined, [batch, src_len, emb]
    pub fn forward(
        &self,
        embedded: Tensor<B, 3>,
        gated:    Tensor<B, 3>,
        encoder:  &EncoderOutput<B>,
    ) -> BridgeOutput<B> {
        let gated_emb = self.hid2emb.forward(gated.clone().swap_dims(1, 2));
        let query     = (gated_emb + embedded) * SCALE;

        let energy    = query.matmul(encoder.conved.clone().swap_dims(1, 2));
        let attention = softmax(energy, 2);

        let attended = attention.clone().matmul(encoder.combined.clone());
        let attended = self.emb2hid.forward(attended);

        let hidden = (gated + attended.swap_dims(1, 2)) * SCALE;

        BridgeOutput { hidden, attention }
    }
}
