// ============================================================
// Layer 6 — Attention Export
// ============================================================
// Writes the decoder's attention matrix for one translation
// to a CSV file: one row per generated token, one column per
// source token.
//
//   trg\src,<sos>,zwei,männer,<eos>
//   two,0.912345,0.041200,0.030011,0.016444
//   men,...

use anyhow::{Context, Result};
use std::{fs, path::Path};

/// `attention[i][j]` is the weight of source token j for generated token i.
pub fn export_attention_csv(
    path:       &Path,
    src_tokens: &[String],
    trg_tokens: &[String],
    attention:  &[Vec<f32>],
) -> Result<()> {
    if attention.len() != trg_tokens.len() {
        anyhow::bail!(
            "Attention has {} rows but {} generated tokens",
            attention.len(), trg_tokens.len()
        );
    }
    if let Some(row) = attention.iter().find(|r| r.len() != src_tokens.len()) {
        anyhow::bail!(
            "Attention row has {} columns but {} source tokens",
            row.len(), src_tokens.len()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok();
    }

    let mut csv = String::from("trg\\src");
    for tok in src_tokens {
        csv.push(',');
        csv.push_str(&escape(tok));
    }
    csv.push('\n');

    for (tok, row) in trg_tokens.iter().zip(attention) {
        csv.push_str(&escape(tok));
        for w in row {
            csv.push_str(&format!(",{:.6}", w));
        }
        csv.push('\n');
    }

    fs::write(path, csv)
        .with_context(|| format!("Cannot write attention CSV '{}'", path.display()))?;
    tracing::info!("Attention matrix exported to '{}'", path.display());
    Ok(())
}

// Tokens can be "," or contain quotes.
fn escape(tok: &str) -> String {
    if tok.contains(',') || tok.contains('"') {
        format!("\"{}\"", tok.replace('"', "\"\""))
    } else {
        tok.to_string()
    }
}
