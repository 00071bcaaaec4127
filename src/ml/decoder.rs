// ============================================================
// Layer 5 — Convolutional Decoder
// ============================================================
// Same gated-convolution stack as the encoder with two changes:
//
//   1. Causal padding. Each block input is prefixed with k−1
//      fill columns and convolved without further padding, so
//      output position i only sees inputs 0..=i:
//
//        fill fill x0 x1 x2 x3        (k = 3)
//        └──┬───┘
//           y0
//
//   2. After the GLU, the attention bridge mixes in a context
//      vector computed from the encoder outputs.
//
// The whole shifted target is decoded in one parallel pass.

use burn::{
    nn::{Dropout, DropoutConfig, Linear, LinearConfig},
    prelude::*,
};

use crate::ml::attention::{AttentionBridge, AttentionBridgeConfig};
use crate::ml::conv_block::{GatedConv, GatedConvConfig, SCALE};
use crate::ml::embedding::{PositionalEmbedderConfig, PositionalTokenEmbedder};
use crate::ml::encoder::EncoderOutput;
use crate::ml::error::{ModelError, ModelResult};

#[derive(Config, Debug)]
pub struct ConvDecoderConfig {
    pub output_dim:  usize,
    pub emb_dim:     usize,
    pub hid_dim:     usize,
    pub n_layers:    usize,
    pub kernel_size: usize,
    pub trg_pad_idx: usize,
    #[config(default = 0.25)]
    pub dropout:     f64,
    #[config(default = 100)]
    pub max_length:  usize,
    /// Fill causal padding with zeros instead of the pad index value.
    #[config(default = false)]
    pub zero_causal_fill: bool,
}

impl ConvDecoderConfig {
    /// Any kernel size ≥ 1 works: causal padding does not need symmetry.
    pub fn validate(&self) -> ModelResult<()> {
        if self.kernel_size == 0 {
            return Err(ModelError::config("decoder kernel size must be at least 1"));
        }
        if self.n_layers == 0 {
            return Err(ModelError::config("decoder needs at least one block"));
        }
        if self.output_dim == 0 || self.emb_dim == 0 || self.hid_dim == 0 || self.max_length == 0 {
            return Err(ModelError::config("decoder dimensions must be non-zero"));
        }
        if self.trg_pad_idx >= self.output_dim {
            return Err(ModelError::config(format!(
                "target pad index {} is outside the output vocabulary ({})",
                self.trg_pad_idx, self.output_dim
            )));
        }
        if !(0.0..=1.0).contains(&self.dropout) {
            return Err(ModelError::config(format!(
                "decoder dropout must be in [0, 1], got {}",
                self.dropout
            )));
        }
        Ok(())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ModelResult<ConvDecoder<B>> {
        self.validate()?;

        let embedder = PositionalEmbedderConfig::new(self.output_dim, self.emb_dim)
            .with_max_length(self.max_length)
            .with_dropout(self.dropout)
            .init(device);

        let convs = (0..self.n_layers)
            .map(|_| GatedConvConfig::new(self.hid_dim, self.kernel_size).init(device))
            .collect();

        Ok(ConvDecoder {
            embedder,
            emb2hid:     LinearConfig::new(self.emb_dim, self.hid_dim).init(device),
            hid2emb:     LinearConfig::new(self.hid_dim, self.emb_dim).init(device),
            bridge:      AttentionBridgeConfig::new(self.emb_dim, self.hid_dim).init(device),
            convs,
            fc_out:      LinearConfig::new(self.emb_dim, self.output_dim).init(device),
            dropout:     DropoutConfig::new(self.dropout).init(),
            kernel_size: self.kernel_size,
            trg_pad_idx: self.trg_pad_idx,
            zero_fill:   self.zero_causal_fill,
        })
    }
}

#[derive(Module, Debug)]
pub struct ConvDecoder<B: Backend> {
    pub embedder:    PositionalTokenEmbedder<B>,
    pub emb2hid:     Linear<B>,
    pub hid2emb:     Linear<B>,
    pub bridge:      AttentionBridge<B>,
    pub convs:       Vec<GatedConv<B>>,
    pub fc_out:      Linear<B>,
    pub dropout:     Dropout,
    pub kernel_size: usize,
    pub trg_pad_idx: usize,
    pub zero_fill:   bool,
}

#[derive(Debug, Clone)]
pub struct DecoderOutput<B: Backend> {
    /// [batch, trg_len, output_dim]
    pub logits:    Tensor<B, 3>,
    /// Final block's attention — [batch, trg_len, src_len]
    pub attention: Tensor<B, 3>,
}

impl<B: Backend> ConvDecoder<B> {
    /// trg: [batch, trg_len] → logits [batch, trg_len, output_dim],
    /// attention [batch, trg_len, src_len]
    pub fn forward(
        &self,
        trg:     Tensor<B, 2, Int>,
        encoder: &EncoderOutput<B>,
    ) -> ModelResult<DecoderOutput<B>> {
        let embedded = self.embedder.forward(trg)?;
        self.check_encoder(&embedded.raw, encoder)?;

        // [batch, trg_len, emb] → [batch, hid, trg_len]
        let conv_input = self.emb2hid.forward(embedded.dropped).swap_dims(1, 2);

        let (conved, attention) = self.convs.iter().fold(
            (conv_input, None),
            |(input, _), conv| {
                let input  = self.dropout.forward(input);
                let gated  = conv.forward(self.causal_pad(input.clone()));
                let bridge = self.bridge.forward(embedded.raw.clone(), gated, encoder);
                ((bridge.hidden + input) * SCALE, Some(bridge.attention))
            },
        );
        let attention = attention.ok_or_else(|| ModelError::config("decoder has no blocks"))?;

        let conved = self.hid2emb.forward(conved.swap_dims(1, 2));
        let logits = self.fc_out.forward(self.dropout.forward(conved));

        Ok(DecoderOutput { logits, attention })
    }

    /// Prefix k−1 fill columns along the length axis.
    fn causal_pad(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        if self.kernel_size <= 1 {
            return x;
        }
        let [batch_size, hid_dim, _] = x.dims();
        let fill = if self.zero_fill { 0.0 } else { self.trg_pad_idx as f32 };
        let padding = Tensor::<B, 3>::full([batch_size, hid_dim, self.kernel_size - 1], fill, &x.device());
        Tensor::cat(vec![padding, x], 2)
    }

    fn check_encoder(&self, embedded: &Tensor<B, 3>, encoder: &EncoderOutput<B>) -> ModelResult<()> {
        let [batch_size, _, emb_dim] = embedded.dims();
        let conved   = encoder.conved.dims();
        let combined = encoder.combined.dims();

        if conved[0] != batch_size || conved[2] != emb_dim {
            return Err(ModelError::ShapeMismatch {
                context:  "decoder: encoder conved",
                expected: vec![batch_size, conved[1], emb_dim],
                actual:   conved.to_vec(),
            });
        }
        if combined != conved {
            return Err(ModelError::ShapeMismatch {
                context:  "decoder: encoder combined",
                expected: conved.to_vec(),
                actual:   combined.to_vec(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::encoder::ConvEncoderConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;
    type Device = <TestBackend as Backend>::Device;

    const PAD: usize = 1;

    fn ids(values: &[i32], device: &Device) -> Tensor<TestBackend, 2, Int> {
        Tensor::<TestBackend, 1, Int>::from_ints(values, device).reshape([1, values.len()])
    }

    fn encoded(device: &Device) -> EncoderOutput<TestBackend> {
        ConvEncoderConfig::new(15, 8, 12, 2, 3)
            .init::<TestBackend>(device)
            .unwrap()
            .forward(ids(&[2, 7, 9, 11, 3], device))
            .unwrap()
    }

    fn decoder(kernel_size: usize, zero_fill: bool, device: &Device) -> ConvDecoder<TestBackend> {
        ConvDecoderConfig::new(20, 8, 12, 3, kernel_size, PAD)
            .with_zero_causal_fill(zero_fill)
            .init(device)
            .unwrap()
    }

    fn prefix_logits(out: &DecoderOutput<TestBackend>, upto: usize) -> Vec<f32> {
        let [_, _, vocab] = out.logits.dims();
        out.logits
            .clone()
            .slice([0..1, 0..upto + 1, 0..vocab])
            .into_data()
            .to_vec()
            .unwrap()
    }

    #[test]
    fn test_output_shapes() {
        let device  = Default::default();
        let encoder = encoded(&device);
        let out = decoder(3, false, &device)
            .forward(ids(&[2, 4, 5], &device), &encoder)
            .unwrap();

        assert_eq!(out.logits.dims(), [1, 3, 20]);
        assert_eq!(out.attention.dims(), [1, 3, 5]);
    }

    #[test]
    fn test_position_ignores_future_tokens() {
        let device  = Default::default();
        let encoder = encoded(&device);
        let target  = [2, 4, 5, 6, 7, 8];

        for kernel_size in [2usize, 3, 5] {
            for zero_fill in [false, true] {
                let decoder  = decoder(kernel_size, zero_fill, &device);
                let baseline = decoder.forward(ids(&target, &device), &encoder).unwrap();

                for i in 0..target.len() - 1 {
                    let mut changed = target;
                    for (j, token) in changed.iter_mut().enumerate().skip(i + 1) {
                        *token = 10 + j as i32;
                    }
                    let out = decoder.forward(ids(&changed, &device), &encoder).unwrap();

                    let expected = prefix_logits(&baseline, i);
                    let actual   = prefix_logits(&out, i);
                    for (a, b) in expected.iter().zip(actual.iter()) {
                        assert!(
                            (a - b).abs() < 1e-5,
                            "kernel {kernel_size}, position {i}: {a} vs {b}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_changing_current_token_changes_its_logits() {
        let device  = Default::default();
        let encoder = encoded(&device);
        let decoder = decoder(3, false, &device);

        let a = decoder.forward(ids(&[2, 4, 5], &device), &encoder).unwrap();
        let b = decoder.forward(ids(&[2, 4, 9], &device), &encoder).unwrap();
        let diff: f32 = (a.logits.slice([0..1, 2..3, 0..20]) - b.logits.slice([0..1, 2..3, 0..20]))
            .abs()
            .max()
            .into_scalar()
            .elem();
        assert!(diff > 0.0);
    }

    #[test]
    fn test_even_kernel_accepted() {
        let device = Default::default();
        assert!(ConvDecoderConfig::new(20, 8, 12, 2, 4, PAD)
            .init::<TestBackend>(&device)
            .is_ok());
    }

    #[test]
    fn test_pad_index_outside_vocab_rejected() {
        let cfg = ConvDecoderConfig::new(20, 8, 12, 2, 3, 20);
        assert!(matches!(cfg.validate(), Err(ModelError::Configuration(_))));
    }

    #[test]
    fn test_dropout_out_of_range_rejected() {
        let device = Default::default();
        let result = ConvDecoderConfig::new(20, 8, 12, 2, 3, PAD)
            .with_dropout(1.5)
            .init::<TestBackend>(&device);
        assert!(matches!(result, Err(ModelError::Configuration(_))));
    }

    #[test]
    fn test_attention_rows_sum_to_one() {
        let device  = Default::default();
        let encoder = encoded(&device);
        let out = decoder(3, false, &device)
            .forward(ids(&[2, 4, 5, 6], &device), &encoder)
            .unwrap();

        let sums: Vec<f32> = out.attention.sum_dim(2).into_data().to_vec().unwrap();
        assert!(sums.iter().all(|s| (s - 1.0).abs() < 1e-5));
    }

    #[test]
    fn test_encoder_batch_mismatch_rejected() {
        let device  = Default::default();
        let encoder = encoded(&device);
        let trg = Tensor::<TestBackend, 1, Int>::from_ints([2, 4, 2, 4], &device).reshape([2, 2]);

        let err = decoder(3, false, &device).forward(trg, &encoder).unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_encoder_width_mismatch_rejected() {
        let device  = Default::default();
        let encoder = ConvEncoderConfig::new(15, 6, 12, 1, 3)
            .init::<TestBackend>(&device)
            .unwrap()
            .forward(ids(&[2, 7, 3], &device))
            .unwrap();

        let err = decoder(3, false, &device)
            .forward(ids(&[2, 4], &device), &encoder)
            .unwrap_err();
        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }
}
