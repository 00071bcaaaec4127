// ============================================================
// Layer 5 — Gated Convolution Block
// ============================================================
// One convolutional block of the stack:
//
//   [batch, hid, len] ──Conv1d──▶ [batch, 2·hid, len'] ──GLU──▶ [batch, hid, len']
//
// The encoder pads symmetrically inside the convolution
// (len' = len); the decoder pads causally before calling the
// block and asks for no padding here.

use burn::{
    nn::{
        conv::{Conv1d, Conv1dConfig},
        PaddingConfig1d,
    },
    prelude::*,
    tensor::activation::sigmoid,
};

/// √0.5, applied after every residual sum in the encoder, decoder and
/// attention bridge.
pub const SCALE: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Gated linear unit over `dim`: first half ⊙ sigmoid(second half).
/// The output has half as many entries along `dim` as the input.
pub fn glu<B: Backend, const D: usize>(x: Tensor<B, D>, dim: usize) -> Tensor<B, D> {
    let half  = x.dims()[dim] / 2;
    let value = x.clone().narrow(dim, 0, half);
    let gate  = x.narrow(dim, half, half);
    value * sigmoid(gate)
}

#[derive(Config, Debug)]
pub struct GatedConvConfig {
    pub hid_dim:     usize,
    pub kernel_size: usize,
    /// Zero-padding added on each side by the convolution itself.
    #[config(default = 0)]
    pub padding:     usize,
}

impl GatedConvConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> GatedConv<B> {
        let padding = if self.padding == 0 {
            PaddingConfig1d::Valid
        } else {
            PaddingConfig1d::Explicit(self.padding)
        };
        let conv = Conv1dConfig::new(self.hid_dim, 2 * self.hid_dim, self.kernel_size)
            .with_padding(padding)
            .init(device);
        GatedConv { conv }
    }
}

#[derive(Module, Debug)]
pub struct GatedConv<B: Backend> {
    pub conv: Conv1d<B>,
}

impl<B: Backend> GatedConv<B> {
    /// x: [batch, hid, len] → [batch, hid, len + 2·padding − kernel + 1]
    pub fn forward(&self, x: Tensor<B, 3>) -> Tensor<B, 3> {
        glu(self.conv.forward(x), 1)
    }
}
