// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands `train`, `translate` and `evaluate`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the convolutional translator on a parallel corpus
    Train(TrainArgs),

    /// Translate one sentence with a trained checkpoint
    Translate(TranslateArgs),

    /// Report loss, perplexity and BLEU on a corpus split
    Evaluate(EvaluateArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory holding `{split}.{lang}` files (train, val, test)
    #[arg(long, default_value = "data/multi30k")]
    pub data_dir: String,

    /// Directory to save checkpoints, tokenizers and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Source language file extension
    #[arg(long, default_value = "de")]
    pub src_lang: String,

    /// Target language file extension
    #[arg(long, default_value = "en")]
    pub trg_lang: String,

    #[arg(long, default_value_t = 128)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 10)]
    pub epochs: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 5e-4)]
    pub lr: f64,

    /// Maximum global gradient norm
    #[arg(long, default_value_t = 0.1)]
    pub clip: f64,

    /// Embedding width of tokens and positions
    #[arg(long, default_value_t = 256)]
    pub emb_dim: usize,

    /// Channel width inside the convolution blocks
    #[arg(long, default_value_t = 512)]
    pub hid_dim: usize,

    #[arg(long, default_value_t = 10)]
    pub enc_layers: usize,

    #[arg(long, default_value_t = 10)]
    pub dec_layers: usize,

    /// Encoder kernel width, must be odd
    #[arg(long, default_value_t = 3)]
    pub enc_kernel_size: usize,

    #[arg(long, default_value_t = 3)]
    pub dec_kernel_size: usize,

    #[arg(long, default_value_t = 0.25)]
    pub dropout: f64,

    /// Size of the position table; longer pairs are dropped
    #[arg(long, default_value_t = 100)]
    pub max_length: usize,

    /// Words rarer than this in the training split become <unk>
    #[arg(long, default_value_t = 2)]
    pub min_freq: usize,

    /// Share of training pairs held out when there is no val split
    #[arg(long, default_value_t = 0.1)]
    pub valid_fraction: f64,

    #[arg(long, default_value_t = 1234)]
    pub seed: u64,

    /// Fill the decoder's causal padding with zeros instead of the pad index
    #[arg(long)]
    pub zero_causal_fill: bool,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:         a.data_dir,
            checkpoint_dir:   a.checkpoint_dir,
            src_lang:         a.src_lang,
            trg_lang:         a.trg_lang,
            batch_size:       a.batch_size,
            epochs:           a.epochs,
            lr:               a.lr,
            clip:             a.clip,
            emb_dim:          a.emb_dim,
            hid_dim:          a.hid_dim,
            enc_layers:       a.enc_layers,
            dec_layers:       a.dec_layers,
            enc_kernel_size:  a.enc_kernel_size,
            dec_kernel_size:  a.dec_kernel_size,
            dropout:          a.dropout,
            max_length:       a.max_length,
            min_freq:         a.min_freq,
            valid_fraction:   a.valid_fraction,
            seed:             a.seed,
            zero_causal_fill: a.zero_causal_fill,
        }
    }
}

/// All arguments for the `translate` command
#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Sentence in the source language
    #[arg(long)]
    pub sentence: String,

    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Maximum number of generated tokens
    #[arg(long, default_value_t = 50)]
    pub max_len: usize,

    /// Write the attention matrix to this CSV file
    #[arg(long)]
    pub export_attention: Option<String>,
}

/// All arguments for the `evaluate` command
#[derive(Args, Debug)]
pub struct EvaluateArgs {
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Corpus directory; defaults to the one used for training
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Which split to score
    #[arg(long, default_value = "test")]
    pub split: String,

    /// Maximum number of generated tokens per sentence
    #[arg(long, default_value_t = 50)]
    pub max_len: usize,
}
