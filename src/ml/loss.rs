// ============================================================
// Layer 5 — Masked Cross-Entropy
// ============================================================
// Mean negative log-likelihood over the non-pad targets only.
// Burn's CrossEntropyLoss zeroes pad positions but still divides
// by the full count, pads included.

use burn::{prelude::*, tensor::activation::log_softmax};

/// * `logits`  - [n, vocab]
/// * `targets` - [n]
///
/// Returns a single-element tensor; 0 when every target is padding.
pub fn masked_cross_entropy<B: Backend>(
    logits:  Tensor<B, 2>,
    targets: Tensor<B, 1, Int>,
    pad_idx: usize,
) -> Tensor<B, 1> {
    let [n, _] = logits.dims();

    let log_probs = log_softmax(logits, 1);
    let picked    = log_probs.gather(1, targets.clone().reshape([n, 1])).reshape([n]);

    let keep  = targets.not_equal_elem(pad_idx as i64).float();
    let count = keep.clone().sum().clamp_min(1.0);

    (picked * keep).sum().neg() / count
}
