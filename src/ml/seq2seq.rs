// ============================================================
// Layer 5 — Seq2Seq Composition
// ============================================================
// Runs the encoder once over the source and the decoder once
// over the whole target prefix. There is no autoregressive loop
// at train time: the decoder sees every gold prefix at once, so
// teacher forcing is implicitly always on.
//
//   trg            = <sos> two men <eos>
//   decoder input  = <sos> two men          (trg[:, :-1])
//   gold output    =       two men <eos>    (trg[:, 1:])

use burn::prelude::*;

use crate::ml::decoder::{ConvDecoder, ConvDecoderConfig};
use crate::ml::encoder::{ConvEncoder, ConvEncoderConfig, EncoderOutput};
use crate::ml::error::{ModelError, ModelResult};
use crate::ml::loss::masked_cross_entropy;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct Seq2SeqConfig {
    pub input_dim:       usize,
    pub output_dim:      usize,
    pub trg_pad_idx:     usize,
    #[config(default = 256)]
    pub emb_dim:         usize,
    #[config(default = 512)]
    pub hid_dim:         usize,
    #[config(default = 10)]
    pub enc_layers:      usize,
    #[config(default = 10)]
    pub dec_layers:      usize,
    #[config(default = 3)]
    pub enc_kernel_size: usize,
    #[config(default = 3)]
    pub dec_kernel_size: usize,
    #[config(default = 0.25)]
    pub dropout:         f64,
    #[config(default = 100)]
    pub max_length:      usize,
    #[config(default = false)]
    pub zero_causal_fill: bool,
}

impl Seq2SeqConfig {
    pub fn encoder_config(&self) -> ConvEncoderConfig {
        ConvEncoderConfig::new(
            self.input_dim, self.emb_dim, self.hid_dim,
            self.enc_layers, self.enc_kernel_size,
        )
        .with_dropout(self.dropout)
        .with_max_length(self.max_length)
    }

    pub fn decoder_config(&self) -> ConvDecoderConfig {
        ConvDecoderConfig::new(
            self.output_dim, self.emb_dim, self.hid_dim,
            self.dec_layers, self.dec_kernel_size, self.trg_pad_idx,
        )
        .with_dropout(self.dropout)
        .with_max_length(self.max_length)
        .with_zero_causal_fill(self.zero_causal_fill)
    }

    pub fn validate(&self) -> ModelResult<()> {
        self.encoder_config().validate()?;
        self.decoder_config().validate()
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> ModelResult<Seq2Seq<B>> {
        Ok(Seq2Seq {
            encoder:     self.encoder_config().init(device)?,
            decoder:     self.decoder_config().init(device)?,
            trg_pad_idx: self.trg_pad_idx,
        })
    }
}

#[derive(Module, Debug)]
pub struct Seq2Seq<B: Backend> {
    pub encoder:     ConvEncoder<B>,
    pub decoder:     ConvDecoder<B>,
    pub trg_pad_idx: usize,
}

#[derive(Debug, Clone)]
pub struct Seq2SeqOutput<B: Backend> {
    /// [batch, trg_len, output_dim]
    pub logits:    Tensor<B, 3>,
    /// [batch, trg_len, src_len]
    pub attention: Tensor<B, 3>,
}

impl<B: Backend> Seq2Seq<B> {
    /// src: [batch, src_len], trg: [batch, trg_len] with the final token
    /// already removed.
    pub fn forward(
        &self,
        src: Tensor<B, 2, Int>,
        trg: Tensor<B, 2, Int>,
    ) -> ModelResult<Seq2SeqOutput<B>> {
        let encoded = self.encode(src)?;
        let decoded = self.decoder.forward(trg, &encoded)?;
        Ok(Seq2SeqOutput { logits: decoded.logits, attention: decoded.attention })
    }

    pub fn encode(&self, src: Tensor<B, 2, Int>) -> ModelResult<EncoderOutput<B>> {
        self.encoder.forward(src)
    }

    /// trg: full target `<sos> … <eos> <pad>…`. Returns the pad-masked
    /// cross-entropy of predicting trg[:, 1:] from trg[:, :-1].
    pub fn forward_loss(
        &self,
        src: Tensor<B, 2, Int>,
        trg: Tensor<B, 2, Int>,
    ) -> ModelResult<(Tensor<B, 1>, Seq2SeqOutput<B>)> {
        let [batch_size, trg_len] = trg.dims();
        if trg_len < 2 {
            return Err(ModelError::ShapeMismatch {
                context:  "seq2seq: target needs at least <sos> and one more token",
                expected: vec![batch_size, 2],
                actual:   vec![batch_size, trg_len],
            });
        }
        let src_batch = src.dims()[0];
        if src_batch != batch_size {
            return Err(ModelError::ShapeMismatch {
                context:  "seq2seq: source/target batch",
                expected: vec![batch_size],
                actual:   vec![src_batch],
            });
        }

        let trg_input  = trg.clone().slice([0..batch_size, 0..trg_len - 1]);
        let trg_output = trg.slice([0..batch_size, 1..trg_len]);

        let output = self.forward(src, trg_input)?;
        let [_, out_len, vocab] = output.logits.dims();

        let loss = masked_cross_entropy(
            output.logits.clone().reshape([batch_size * out_len, vocab]),
            trg_output.reshape([batch_size * out_len]),
            self.trg_pad_idx,
        );

        Ok((loss, output))
    }

    pub fn max_length(&self) -> usize {
        self.decoder.embedder.max_length
    }
}
