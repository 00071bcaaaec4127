// ============================================================
// Layer 4 — Translation Batcher
// ============================================================
// Implements Burn's Batcher trait: stacks a Vec of samples into
// two index tensors, each padded with the pad index up to the
// longest sequence on its side of the batch.
//
//   src: [batch, max_src_len]      trg: [batch, max_trg_len]
//
// This is the whole shape contract the model consumes.

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TranslationSample;

#[derive(Debug, Clone)]
pub struct TranslationBatch<B: Backend> {
    /// [batch_size, max_src_len]
    pub src: Tensor<B, 2, Int>,
    /// [batch_size, max_trg_len], `<sos> … <eos> <pad>…`
    pub trg: Tensor<B, 2, Int>,
}

#[derive(Clone, Debug)]
pub struct TranslationBatcher<B: Backend> {
    pub device:  B::Device,
    pub pad_idx: u32,
}

impl<B: Backend> TranslationBatcher<B> {
    pub fn new(device: B::Device, pad_idx: u32) -> Self {
        Self { device, pad_idx }
    }

    /// Flatten the sequences row by row, padding each to the longest.
    fn stack(&self, rows: &[&[u32]]) -> Tensor<B, 2, Int> {
        let max_len = rows.iter().map(|r| r.len()).max().unwrap_or(0);

        let flat: Vec<i32> = rows
            .iter()
            .flat_map(|row| {
                row.iter()
                    .copied()
                    .chain(std::iter::repeat(self.pad_idx).take(max_len - row.len()))
                    .map(|x| x as i32)
            })
            .collect();

        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([rows.len(), max_len])
    }
}

impl<B: Backend> Batcher<TranslationSample, TranslationBatch<B>> for TranslationBatcher<B> {
    fn batch(&self, items: Vec<TranslationSample>) -> TranslationBatch<B> {
        let src_rows: Vec<&[u32]> = items.iter().map(|s| s.src_ids.as_slice()).collect();
        let trg_rows: Vec<&[u32]> = items.iter().map(|s| s.trg_ids.as_slice()).collect();

        TranslationBatch {
            src: self.stack(&src_rows),
            trg: self.stack(&trg_rows),
        }
    }
}
