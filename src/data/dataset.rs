// ============================================================
// Layer 4 — Translation Dataset
// ============================================================
// Implements Burn's Dataset trait over encoded sentence pairs.
// Samples are stored unpadded; the batcher pads each batch to
// its own longest sequence.

use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One encoded sentence pair, both sides wrapped as `<sos> … <eos>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationSample {
    pub src_ids: Vec<u32>,
    pub trg_ids: Vec<u32>,
}

impl TranslationSample {
    pub fn new(src_ids: Vec<u32>, trg_ids: Vec<u32>) -> Self {
        Self { src_ids, trg_ids }
    }

    /// The decoder sees trg_ids[..len-1], so a target may be one token
    /// longer than the position table.
    pub fn fits(&self, max_length: usize) -> bool {
        self.src_ids.len() <= max_length
            && self.trg_ids.len() <= max_length + 1
            && self.trg_ids.len() >= 2
    }
}

#[derive(Debug)]
pub struct TranslationDataset {
    samples: Vec<TranslationSample>,
}

impl TranslationDataset {
    pub fn new(samples: Vec<TranslationSample>) -> Self { Self { samples } }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<TranslationSample> for TranslationDataset {
    fn get(&self, index: usize) -> Option<TranslationSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
