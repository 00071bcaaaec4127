// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All model code lives here. Apart from the Dataset/Batcher
// impls in the data layer, no other layer builds tensors.
//
//   embedding.rs   — token + learned position embeddings
//   conv_block.rs  — GLU-gated 1-D convolution, residual scale
//   encoder.rs     — stack of padded convolution blocks
//   attention.rs   — decoder-to-encoder attention bridge
//   decoder.rs     — causal convolution blocks + output projection
//   seq2seq.rs     — encoder/decoder composition, teacher-forced loss
//   loss.rs        — cross-entropy that ignores <pad> targets
//   error.rs       — ModelError (configuration / shape failures)
//
//   trainer.rs     — epoch loop, Adam, gradient clipping, checkpoints
//   evaluator.rs   — average loss over a loader
//   inferencer.rs  — greedy decoding with attention capture
//
// Reference: Gehring et al. (2017) Convolutional Sequence to
//            Sequence Learning

pub mod error;

pub mod embedding;
pub mod conv_block;
pub mod encoder;
pub mod attention;
pub mod decoder;
pub mod seq2seq;
pub mod loss;

/// Full training loop with validation and checkpointing
pub mod trainer;

/// Loss / perplexity over a data loader
pub mod evaluator;

/// Greedy translation from a restored checkpoint
pub mod inferencer;
