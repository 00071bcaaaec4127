// ============================================================
// Layer 4 — Parallel Corpus Loader
// ============================================================
// Reads line-aligned plain-text files, one sentence per line:
//
//   data/
//     train.de   train.en
//     val.de     val.en      (optional)
//     test.de    test.en
//
// Line i of `{split}.{src}` translates to line i of `{split}.{trg}`.
// A missing pair of files means the split is absent; a pair whose
// line counts differ is an error. Lines blank on either side are
// skipped.

use anyhow::{Context, Result};
use std::{fs, path::{Path, PathBuf}};

use crate::domain::sentence_pair::SentencePair;
use crate::domain::traits::CorpusSource;

pub struct ParallelCorpusLoader {
    dir:      PathBuf,
    src_lang: String,
    trg_lang: String,
}

impl ParallelCorpusLoader {
    pub fn new(
        dir:      impl Into<String>,
        src_lang: impl Into<String>,
        trg_lang: impl Into<String>,
    ) -> Self {
        Self {
            dir:      PathBuf::from(dir.into()),
            src_lang: src_lang.into(),
            trg_lang: trg_lang.into(),
        }
    }

    fn file(&self, split: &str, lang: &str) -> PathBuf {
        self.dir.join(format!("{split}.{lang}"))
    }
}

impl CorpusSource for ParallelCorpusLoader {
    fn load_split(&self, split: &str) -> Result<Option<Vec<SentencePair>>> {
        let src_path = self.file(split, &self.src_lang);
        let trg_path = self.file(split, &self.trg_lang);

        match (src_path.exists(), trg_path.exists()) {
            (false, false) => {
                tracing::debug!("No '{}' split in '{}'", split, self.dir.display());
                return Ok(None);
            }
            (true, false) | (false, true) => {
                anyhow::bail!(
                    "Split '{}' is incomplete: need both '{}' and '{}'",
                    split, src_path.display(), trg_path.display()
                );
            }
            (true, true) => {}
        }

        let src_lines = read_lines(&src_path)?;
        let trg_lines = read_lines(&trg_path)?;

        if src_lines.len() != trg_lines.len() {
            anyhow::bail!(
                "Split '{}' is not line-aligned: {} has {} lines, {} has {}",
                split,
                src_path.display(), src_lines.len(),
                trg_path.display(), trg_lines.len()
            );
        }

        let total = src_lines.len();
        let pairs: Vec<SentencePair> = src_lines
            .into_iter()
            .zip(trg_lines)
            .map(|(s, t)| SentencePair::new(s, t))
            .filter(|p| !p.is_empty())
            .collect();

        if pairs.len() < total {
            tracing::warn!(
                "Skipped {} blank lines in split '{}'",
                total - pairs.len(), split
            );
        }
        tracing::info!("Loaded {} sentence pairs for split '{}'", pairs.len(), split);
        Ok(Some(pairs))
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn corpus_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("conv_seq2seq_corpus_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_loads_aligned_pairs() {
        let dir = corpus_dir("aligned");
        fs::write(dir.join("train.de"), "zwei männer\nein hund\n").unwrap();
        fs::write(dir.join("train.en"), "two men\na dog\n").unwrap();

        let loader = ParallelCorpusLoader::new(dir.to_string_lossy(), "de", "en");
        let pairs  = loader.load_split("train").unwrap().unwrap();

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1], SentencePair::new("ein hund", "a dog"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_split_is_none() {
        let dir    = corpus_dir("missing");
        let loader = ParallelCorpusLoader::new(dir.to_string_lossy(), "de", "en");
        assert!(loader.load_split("val").unwrap().is_none());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_misaligned_split_fails() {
        let dir = corpus_dir("misaligned");
        fs::write(dir.join("test.de"), "a\nb\nc\n").unwrap();
        fs::write(dir.join("test.en"), "a\nb\n").unwrap();

        let loader = ParallelCorpusLoader::new(dir.to_string_lossy(), "de", "en");
        assert!(loader.load_split("test").is_err());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_half_present_split_fails() {
        let dir = corpus_dir("half");
        fs::write(dir.join("val.de"), "a\n").unwrap();

        let loader = ParallelCorpusLoader::new(dir.to_string_lossy(), "de", "en");
        assert!(loader.load_split("val").is_err());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_blank_lines_skipped() {
        let dir = corpus_dir("blank");
        fs::write(dir.join("train.de"), "eins\n\ndrei\n").unwrap();
        fs::write(dir.join("train.en"), "one\ntwo\nthree\n").unwrap();

        let loader = ParallelCorpusLoader::new(dir.to_string_lossy(), "de", "en");
        let pairs  = loader.load_split("train").unwrap().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[1].trg, "three");

        fs::remove_dir_all(&dir).ok();
    }
}
