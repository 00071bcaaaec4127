// ============================================================
// Layer 5 — Model Errors
// ============================================================
// Failures detected by the model layer before or during a
// forward pass. Every variant aborts the current pass.

use thiserror::Error;

pub type ModelResult<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    /// Invalid hyperparameters, or an input the configuration cannot serve
    /// (e.g. a sequence longer than the position table).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Tensors meeting at a block boundary disagree on batch, length or width.
    #[error("shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context:  &'static str,
        expected: Vec<usize>,
        actual:   Vec<usize>,
    },

    /// Reading tensor values back to the host failed.
    #[error("tensor data error: {0}")]
    Data(String),
}

impl ModelError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
