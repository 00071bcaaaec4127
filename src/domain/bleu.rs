// ============================================================
// Layer 3 — Corpus BLEU
// ============================================================
// BLEU-4 over a whole corpus, one reference per candidate:
//
//   p_n  = Σ clipped n-gram matches / Σ candidate n-grams   (n = 1..4)
//   BP   = 1                 if c > r
//          exp(1 - r / c)    otherwise
//   BLEU = BP · exp(¼ Σ ln p_n)
//
// c and r are total candidate and reference lengths. A zero
// precision at any order gives a score of 0.

use std::collections::HashMap;

pub const MAX_ORDER: usize = 4;

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if tokens.len() >= n {
        for gram in tokens.windows(n) {
            *counts.entry(gram).or_insert(0) += 1;
        }
    }
    counts
}

/// Score in [0, 1]. `candidates[i]` is compared against `references[i]`;
/// extra entries on either side are ignored.
pub fn corpus_bleu(candidates: &[Vec<String>], references: &[Vec<String>]) -> f64 {
    let mut matches = [0usize; MAX_ORDER];
    let mut totals  = [0usize; MAX_ORDER];
    let mut cand_len = 0usize;
    let mut ref_len  = 0usize;

    for (cand, reference) in candidates.iter().zip(references) {
        cand_len += cand.len();
        ref_len  += reference.len();

        for n in 1..=MAX_ORDER {
            let ref_counts = ngram_counts(reference, n);
            for (gram, count) in ngram_counts(cand, n) {
                let clip = ref_counts.get(gram).copied().unwrap_or(0);
                matches[n - 1] += count.min(clip);
            }
            totals[n - 1] += cand.len().saturating_sub(n - 1);
        }
    }

    if cand_len == 0 {
        return 0.0;
    }

    let mut log_precision = 0.0f64;
    for n in 0..MAX_ORDER {
        if matches[n] == 0 || totals[n] == 0 {
            return 0.0;
        }
        log_precision += (matches[n] as f64 / totals[n] as f64).ln();
    }
    log_precision /= MAX_ORDER as f64;

    let brevity = if cand_len > ref_len {
        1.0
    } else {
        (1.0 - ref_len as f64 / cand_len as f64).exp()
    };

    brevity * log_precision.exp()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn test_identical_corpus_scores_one() {
        let refs = vec![toks("two young men are outside near many bushes ."), toks("a man is fencing with a sword .")];
        let score = corpus_bleu(&refs, &refs);
        assert!((score - 1.0).abs() < 1e-12, "score {score}");
    }

    #[test]
    fn test_no_four_gram_match_scores_zero() {
        let cand = vec![toks("two men are outside")];
        let refs = vec![toks("two men stand outside")];
        assert_eq!(corpus_bleu(&cand, &refs), 0.0);
    }

    #[test]
    fn test_repeated_words_are_clipped() {
        // unclipped, every unigram and bigram of the candidate would match
        let reference = toks("the cat sat on the mat with the dog");
        let cand      = toks("the cat sat on the mat with the dog the the the");

        let score = corpus_bleu(&[cand], &[reference]);
        // p1 = 9/12, p2 = 8/11, p3 = 7/10, p4 = 6/9, no brevity penalty
        let expected = ((9.0f64 / 12.0).ln() + (8.0f64 / 11.0).ln()
            + (7.0f64 / 10.0).ln() + (6.0f64 / 9.0).ln()) / 4.0;
        assert!((score - expected.exp()).abs() < 1e-12, "score {score}");
    }

    #[test]
    fn test_short_candidate_is_penalised() {
        let reference = toks("a black dog runs across the wet grass .");
        let cand_full = vec![reference.clone()];
        let cand_short = vec![toks("a black dog runs across")];

        let full  = corpus_bleu(&cand_full, &[reference.clone()]);
        let short = corpus_bleu(&cand_short, &[reference]);
        // all n-gram precisions are 1; only brevity differs
        assert!((full - 1.0).abs() < 1e-12);
        assert!((short - (1.0f64 - 9.0 / 5.0).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_empty_candidates_score_zero() {
        assert_eq!(corpus_bleu(&[], &[]), 0.0);
        assert_eq!(corpus_bleu(&[Vec::new()], &[toks("a dog")]), 0.0);
    }
}
