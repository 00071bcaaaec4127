// ============================================================
// Layer 3 — Special Tokens
// ============================================================
// Both vocabularies reserve the same four ids. The model
// relies on PAD_IDX for causal padding and loss masking.

pub const UNK_TOKEN: &str = "<unk>";
pub const PAD_TOKEN: &str = "<pad>";
pub const SOS_TOKEN: &str = "<sos>";
pub const EOS_TOKEN: &str = "<eos>";

pub const UNK_IDX: u32 = 0;
pub const PAD_IDX: u32 = 1;
pub const SOS_IDX: u32 = 2;
pub const EOS_IDX: u32 = 3;

/// Indexed by id.
pub const SPECIAL_TOKENS: [&str; 4] = [UNK_TOKEN, PAD_TOKEN, SOS_TOKEN, EOS_TOKEN];
