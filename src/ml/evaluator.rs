// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Average pad-masked loss over a data loader, without gradients.
// Used for the per-epoch validation pass and the final test pass.

use std::sync::Arc;

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    prelude::*,
};

use crate::data::batcher::{TranslationBatch, TranslationBatcher};
use crate::data::dataset::TranslationDataset;
use crate::ml::error::ModelResult;
use crate::ml::seq2seq::Seq2Seq;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalSummary {
    pub loss:    f64,
    pub batches: usize,
}

impl EvalSummary {
    pub fn perplexity(&self) -> f64 {
        self.loss.exp()
    }
}

pub fn evaluate<B: Backend>(
    model:  &Seq2Seq<B>,
    loader: &Arc<dyn DataLoader<TranslationBatch<B>>>,
) -> ModelResult<EvalSummary> {
    let mut loss_sum = 0.0f64;
    let mut batches  = 0usize;

    for batch in loader.iter() {
        let (loss, _) = model.forward_loss(batch.src, batch.trg)?;
        loss_sum += loss.into_scalar().elem::<f64>();
        batches  += 1;
    }

    let loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
    Ok(EvalSummary { loss, batches })
}

/// Batch `dataset` in order and evaluate it.
pub fn evaluate_dataset<B: Backend>(
    model:      &Seq2Seq<B>,
    dataset:    TranslationDataset,
    batch_size: usize,
    device:     &B::Device,
) -> ModelResult<EvalSummary> {
    let loader = DataLoaderBuilder::new(
        TranslationBatcher::<B>::new(device.clone(), model.trg_pad_idx as u32),
    )
        .batch_size(batch_size)
        .build(dataset);
    evaluate(model, &loader)
}
