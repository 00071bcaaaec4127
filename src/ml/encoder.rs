// ============================================================
// Layer 5 — Convolutional Encoder
// ============================================================
//   tokens ─▶ embed ─▶ emb2hid ─▶ [N × gated conv + residual] ─▶ hid2emb ─▶ conved
//                 │                                                     │
//                 └──────────────── (conved + embedded) · √0.5 ◀────────┘ combined
//
// Convolutions are padded symmetrically by (k−1)/2, so every
// block keeps the source length unchanged. This needs an odd
// kernel; even kernels are rejected at construction.

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
};

use crate::ml::conv_block::{GatedConv, GatedConvConfig, SCALE};
use crate::ml::embedding::{PositionalEmbedderConfig, PositionalTokenEmbedder};
use crate::ml::error::{ModelError, ModelResult};

#[derive(Config, Debug)]
pub struct ConvEncoderConfig {
    pub input_dim:   usize,
    pub emb_dim:     usize,
    pub hid_dim:     usize,
    pub n_layers:    usize,
    pub kernel_size: usize,
    #[config(default = 0.25)]
    pub dropout:     f64,
    #[config(default = 100)]
    pub max_length:  usize,
}

impl ConvEncoderConfig {
    pub fn validate(&self) -> ModelResult<()> {
        if self.kernel_size % 2 == 0 {
            return Err(ModelError::config(format!(
                "encoder kernel size must be odd, got {}",
                self.kernel_size
            )));
        }
        if self.n_layers == 0 {
            return Err(ModelError::config("encoder needs at least one block"));
        }
        if self.input_dim == 0 || self.emb_dim == 0 || self.hid_dim == 0 || self.max_length == 0 {
            return Err(ModelError::config("encoder dimensions must be non-zero"));
        }
        if !(0.0..=1.0).contains(&self.dropout) {
            return Err(ModelError::config(format!(
                "encoder dropout must be in [0, 1], got {}",
                self.dropout
            )));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ModelResult<ConvEncoder<B>> {
        self.validate()?;

        let embedder = PositionalEmbedderConfig::new(self.input_dim, self.emb_dim)
            .with_max_length(self.max_length)
            .with_dropout(self.dropout)
            .init(device);

        let convs = (0..self.n_layers)
            .map(|_| {
                GatedConvConfig::new(self.hid_dim, self.kernel_size)
                    .with_padding((self.kernel_size - 1) / 2)
                    .init(device)
            })
            .collect();

        Ok(ConvEncoder {
            embedder,
            emb2hid: LinearConfig::new(self.emb_dim, self.hid_dim).init(device),
            hid2emb: LinearConfig::new(self.hid_dim, self.emb_dim).init(device),
            convs,
            dropout: DropoutConfig::new(self.dropout).init(),
        })
    }
}

#[derive(Module, Debug)]
pub struct ConvEncoder<B: Backend> {
    pub embedder: PositionalTokenEmbedder<B>,
    pub emb2hid:  Linear<B>,
    pub hid2emb:  Linear<B>,
    pub convs:    Vec<GatedConv<B>>,
    pub dropout:  Dropout,
}

/// Encoder results, both `[batch, src_len, emb_dim]`. Read-only for
/// every decoder block and position.
#[derive(Debug, Clone)]
pub struct EncoderOutput<B: Backend> {
    pub conved:   Tensor<B, 3>,
    pub combined: Tensor<B, 3>,
}

impl<B: Backend> ConvEncoder<B> {
    /// src: [batch, src_len] → conved, combined: [batch, src_len, emb_dim]
    pub fn forward(&self, src: Tensor<B, 2, Int>) -> ModelResult<EncoderOutput<B>> {
        let embedded = self.embedder.forward(src)?.dropped;

        // [batch, src_len, emb] → [batch, hid, src_len]
        let conv_input = self.emb2hid.forward(embedded.clone()).swap_dims(1, 2);

        let conved = self.convs.iter().fold(conv_input, |input, conv| {
            let gated = conv.forward(self.dropout.forward(input.clone()));
            (gated + input) * SCALE
        });

        let conved   = self.hid2emb.forward(conved.swap_dims(1, 2));
        let combined = (conved.clone() + embedded) * SCALE;

        Ok(EncoderOutput { conved, combined })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn src(len: usize, device: &<TestBackend as Backend>::Device) -> Tensor<TestBackend, 2, Int> {
        let ids: Vec<i32> = (0..len as i32).map(|i| 2 + i % 8).collect();
        Tensor::<TestBackend, 1, Int>::from_ints(ids.as_slice(), device).reshape([1, len])
    }

    #[test]
    fn test_length_preserved_for_odd_kernels() {
        let device = Default::default();
        for kernel_size in [1usize, 3, 5, 7] {
            let encoder = ConvEncoderConfig::new(12, 8, 16, 2, kernel_size)
                .init::<TestBackend>(&device)
                .unwrap();
            for len in [1usize, 4, 11] {
                let out = encoder.forward(src(len, &device)).unwrap();
                assert_eq!(out.conved.dims(), [1, len, 8], "kernel {kernel_size}, len {len}");
                assert_eq!(out.combined.dims(), [1, len, 8]);
            }
        }
    }

    #[test]
    fn test_even_kernel_rejected() {
        let device = Default::default();
        let result = ConvEncoderConfig::new(12, 8, 16, 2, 4).init::<TestBackend>(&device);
        assert!(matches!(result, Err(ModelError::Configuration(_))));
    }

    #[test]
    fn test_dropout_out_of_range_rejected() {
        let device = Default::default();
        for dropout in [1.5, -0.1, f64::NAN] {
            let result = ConvEncoderConfig::new(12, 8, 16, 2, 3)
                .with_dropout(dropout)
                .init::<TestBackend>(&device);
            assert!(matches!(result, Err(ModelError::Configuration(_))), "dropout {dropout}");
        }
    }

    #[test]
    fn test_zero_layers_rejected() {
        let cfg = ConvEncoderConfig::new(12, 8, 16, 0, 3);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_deterministic_outside_training() {
        let device  = Default::default();
        let encoder = ConvEncoderConfig::new(12, 8, 16, 3, 3)
            .with_dropout(0.5)
            .init::<TestBackend>(&device)
            .unwrap();

        let a = encoder.forward(src(6, &device)).unwrap();
        let b = encoder.forward(src(6, &device)).unwrap();
        let diff: f32 = (a.combined - b.combined).abs().max().into_scalar().elem();
        assert_eq!(diff, 0.0);
    }
}
