// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Used only when the corpus ships without a validation split:
// shuffles the training pairs and moves a fraction of them into
// a validation set.
//
// The shuffle draws from the caller's seeded generator, so the
// same seed always produces the same split.
//
// Reference: rand crate documentation (SliceRandom)

use rand::{seq::SliceRandom, Rng};

/// Shuffle `samples` and split into (train, validation), where the
/// validation part holds `valid_fraction` of the items (rounded).
pub fn split_train_val<T, R: Rng + ?Sized>(
    mut samples:    Vec<T>,
    valid_fraction: f64,
    rng:            &mut R,
) -> (Vec<T>, Vec<T>) {
    samples.shuffle(rng);

    let total    = samples.len();
    let n_valid  = ((total as f64) * valid_fraction.clamp(0.0, 1.0)).round() as usize;
    let split_at = total - n_valid.min(total);

    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_correct_split_sizes() {
        let mut rng           = StdRng::seed_from_u64(1234);
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(items, 0.1, &mut rng);
        assert_eq!(train.len(), 90);
        assert_eq!(val.len(),   10);
    }

    #[test]
    fn test_all_items_preserved() {
        let mut rng           = StdRng::seed_from_u64(7);
        let items: Vec<usize> = (0..50).collect();
        let (train, val)      = split_train_val(items, 0.3, &mut rng);

        let mut all: Vec<usize> = train.into_iter().chain(val).collect();
        all.sort_unstable();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let items: Vec<usize> = (0..40).collect();
        let a = split_train_val(items.clone(), 0.25, &mut StdRng::seed_from_u64(99));
        let b = split_train_val(items,         0.25, &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_dataset() {
        let mut rng           = StdRng::seed_from_u64(0);
        let items: Vec<usize> = Vec::new();
        let (train, val)      = split_train_val(items, 0.2, &mut rng);
        assert!(train.is_empty());
        assert!(val.is_empty());
    }

    #[test]
    fn test_zero_fraction_keeps_everything_for_training() {
        let mut rng           = StdRng::seed_from_u64(0);
        let items: Vec<usize> = (0..10).collect();
        let (train, val)      = split_train_val(items, 0.0, &mut rng);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }
}
