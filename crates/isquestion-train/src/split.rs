//! Seeded train/test splits and cross-validation folds

use isquestion_core::{Error, Label, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Shuffle `0..n` with `seed` and hold out `ceil(n * test_size)` positions.
///
/// Returns `(train, test)` index lists; both are non-empty.
pub fn train_test_split(n: usize, test_size: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(Error::config(format!(
            "test_size must be in (0, 1), got {}",
            test_size
        )));
    }

    let n_test = (n as f64 * test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(Error::config(format!(
            "cannot hold out {} of {} samples",
            n_test, n
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut StdRng::seed_from_u64(seed));

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Stratified k-fold assignment.
///
/// Samples of each class are dealt round-robin over the folds in their
/// original order, so every fold keeps roughly the class balance of the
/// whole set. Returns one `(train, validation)` pair per fold.
pub fn stratified_folds(labels: &[Label], k: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
    if k < 2 {
        return Err(Error::config("cross-validation needs at least 2 folds"));
    }
    for label in [Label::Question, Label::NotQuestion] {
        let count = labels.iter().filter(|&&l| l == label).count();
        if count < k {
            return Err(Error::config(format!(
                "class {} has {} samples, fewer than {} folds",
                label, count, k
            )));
        }
    }

    let mut fold_of = vec![0usize; labels.len()];
    let mut next = [0usize; 2];
    for (i, label) in labels.iter().enumerate() {
        let class = usize::from(label.class());
        fold_of[i] = next[class] % k;
        next[class] += 1;
    }

    Ok((0..k)
        .map(|fold| {
            let (validation, train): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&i| fold_of[i] == fold);
            (train, validation)
        })
        .collect())
}
