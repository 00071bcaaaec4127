// ============================================================
// Layer 5 — Greedy Inferencer
// ============================================================
// Translation is autoregressive even though training is not:
// encode the source once, then repeatedly decode the growing
// prefix and append the argmax of the last position until
// <eos> or the length limit.
use anyhow::Result;
use burn::prelude::*;

use crate::data::dataset::TranslationDataset;
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::error::{ModelError, ModelResult};
use crate::ml::evaluator::{evaluate_dataset, EvalSummary};
use crate::ml::seq2seq::{Seq2Seq, Seq2SeqConfig};

type InferBackend = burn::backend::Wgpu;

/// Result of greedy decoding one sentence.
#[derive(Debug, Clone, PartialEq)]
pub struct GreedyTranslation {
    /// Generated ids after <sos>; ends with <eos> when it was produced.
    pub ids:       Vec<u32>,
    /// attention[i][j]: weight of source position j when producing ids[i].
    pub attention: Vec<Vec<f32>>,
}

pub struct GreedyDecoder {
    pub sos_idx: u32,
    pub eos_idx: u32,
    pub max_len: usize,
}

impl GreedyDecoder {
    pub fn new(sos_idx: u32, eos_idx: u32, max_len: usize) -> Self {
        Self { sos_idx, eos_idx, max_len }
    }

    /// src_ids: full source sequence including <sos>/<eos>.
    pub fn translate<B: Backend>(
        &self,
        model:   &Seq2Seq<B>,
        src_ids: &[u32],
        device:  &B::Device,
    ) -> ModelResult<GreedyTranslation> {
        let src_flat: Vec<i32> = src_ids.iter().map(|&x| x as i32).collect();
        let src = Tensor::<B, 1, Int>::from_ints(src_flat.as_slice(), device)
            .reshape([1, src_flat.len()]);
        let encoded = model.encode(src)?;

        // The decoder input is the prefix, which may never outgrow the
        // position table.
        let max_len = self.max_len.min(model.max_length());

        let mut prefix    = vec![self.sos_idx as i32];
        let mut attention = None;

        for _ in 0..max_len {
            let trg = Tensor::<B, 1, Int>::from_ints(prefix.as_slice(), device)
                .reshape([1, prefix.len()]);
            let out = model.decoder.forward(trg, &encoded)?;
            let [_, len, vocab] = out.logits.dims();

            let next = out
                .logits
                .slice([0..1, len - 1..len, 0..vocab])
                .argmax(2)
                .reshape([1])
                .into_scalar()
                .elem::<i64>() as i32;

            attention = Some(out.attention);
            prefix.push(next);

            if next == self.eos_idx as i32 {
                break;
            }
        }

        let ids: Vec<u32> = prefix[1..].iter().map(|&x| x as u32).collect();
        let attention = match attention {
            Some(attention) => attention_rows(attention)?,
            None            => Vec::new(),
        };

        tracing::debug!("Greedy decode produced {} tokens", ids.len());
        Ok(GreedyTranslation { ids, attention })
    }
}

// ─── Inferencer ───────────────────────────────────────────────────────────────
/// The best checkpoint restored on the GPU, ready to translate
/// and evaluate. Dropout is inactive on a non-autodiff backend.
pub struct Inferencer {
    model:   Seq2Seq<InferBackend>,
    config:  Seq2SeqConfig,
    decoder: GreedyDecoder,
    device:  burn::backend::wgpu::WgpuDevice,
}

impl Inferencer {
    pub fn from_checkpoint(
        ckpt:    &CheckpointManager,
        sos_idx: u32,
        eos_idx: u32,
        max_len: usize,
    ) -> Result<Self> {
        if !ckpt.has_best::<InferBackend>() {
            anyhow::bail!("No trained checkpoint found. Run 'train' first.");
        }

        let device = burn::backend::wgpu::WgpuDevice::default();
        let (model, config) = ckpt.restore::<InferBackend>(&device)?;

        tracing::info!(
            "Inferencer ready: src vocab {}, trg vocab {}, max_len {}",
            config.input_dim, config.output_dim, max_len,
        );

        Ok(Self {
            model,
            config,
            decoder: GreedyDecoder::new(sos_idx, eos_idx, max_len),
            device,
        })
    }

    pub fn config(&self) -> &Seq2SeqConfig {
        &self.config
    }

    /// Source sentences longer than this cannot be encoded.
    pub fn max_source_len(&self) -> usize {
        self.model.max_length()
    }

    pub fn translate_ids(&self, src_ids: &[u32]) -> ModelResult<GreedyTranslation> {
        self.decoder.translate(&self.model, src_ids, &self.device)
    }

    pub fn evaluate(&self, dataset: TranslationDataset, batch_size: usize) -> ModelResult<EvalSummary> {
        evaluate_dataset(&self.model, dataset, batch_size, &self.device)
    }
}

/// [1, trg_len, src_len] → trg_len rows of src_len weights
fn attention_rows<B: Backend>(attention: Tensor<B, 3>) -> ModelResult<Vec<Vec<f32>>> {
    let [_, trg_len, src_len] = attention.dims();
    let flat: Vec<f32> = attention
        .into_data()
        .to_vec()
        .map_err(|e| ModelError::Data(format!("{e:?}")))?;

    Ok((0..trg_len)
        .map(|i| flat[i * src_len..(i + 1) * src_len].to_vec())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::seq2seq::Seq2SeqConfig;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn model(device: &<TestBackend as Backend>::Device) -> Seq2Seq<TestBackend> {
        Seq2SeqConfig::new(10, 12, 1)
            .with_emb_dim(8)
            .with_hid_dim(16)
            .with_enc_layers(1)
            .with_dec_layers(2)
            .init(device)
            .unwrap()
    }

    #[test]
    fn test_respects_max_len() {
        let device = Default::default();
        let model  = model(&device);
        // an eos index the model can never emit
        let decoder = GreedyDecoder::new(2, 99, 6);

        let out = decoder.translate(&model, &[2, 5, 6, 3], &device).unwrap();
        assert_eq!(out.ids.len(), 6);
    }

    #[test]
    fn test_attention_row_per_generated_token() {
        let device  = Default::default();
        let model   = model(&device);
        let decoder = GreedyDecoder::new(2, 3, 5);

        let out = decoder.translate(&model, &[2, 5, 6, 7, 3], &device).unwrap();
        assert_eq!(out.attention.len(), out.ids.len());
        for row in &out.attention {
            assert_eq!(row.len(), 5);
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_stops_at_eos() {
        let device = Default::default();
        let model  = model(&device);
        let src    = [2, 5, 6, 3];

        let free = GreedyDecoder::new(2, 99, 8).translate(&model, &src, &device).unwrap();
        let first = free.ids[0];

        // greedy decoding is deterministic, so declaring the first token
        // the end marker must stop right after it
        let out = GreedyDecoder::new(2, first, 8).translate(&model, &src, &device).unwrap();
        assert_eq!(out.ids, vec![first]);
        assert_eq!(out.attention.len(), 1);
    }

    #[test]
    fn test_output_truncated_after_first_eos() {
        let device = Default::default();
        let model  = model(&device);
        let src    = [2, 4, 7, 3];

        let free = GreedyDecoder::new(2, 99, 8).translate(&model, &src, &device).unwrap();
        let eos  = free.ids[free.ids.len() - 1];
        let stop = free.ids.iter().position(|&id| id == eos).unwrap();

        let out = GreedyDecoder::new(2, eos, 8).translate(&model, &src, &device).unwrap();
        assert_eq!(out.ids, free.ids[..=stop].to_vec());
    }

    #[test]
    fn test_limit_capped_by_position_table() {
        let device = Default::default();
        let model  = Seq2SeqConfig::new(10, 12, 1)
            .with_emb_dim(8)
            .with_hid_dim(16)
            .with_enc_layers(1)
            .with_dec_layers(1)
            .with_max_length(4)
            .init::<TestBackend>(&device)
            .unwrap();

        let out = GreedyDecoder::new(2, 99, 50)
            .translate(&model, &[2, 5, 3], &device)
            .unwrap();
        assert_eq!(out.ids.len(), 4);
    }

    #[test]
    fn test_deterministic() {
        let device  = Default::default();
        let model   = model(&device);
        let decoder = GreedyDecoder::new(2, 3, 8);

        let a = decoder.translate(&model, &[2, 4, 5, 3], &device).unwrap();
        let b = decoder.translate(&model, &[2, 4, 5, 3], &device).unwrap();
        assert_eq!(a, b);
    }
}
