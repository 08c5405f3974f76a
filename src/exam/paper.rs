use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::exam::{WordId, WordItem};

/// Number of times a word is repeated in the weighted expansion pool.
///
/// Words without recorded misses appear once; otherwise the weight grows by
/// one for every `divisor` misses, so a single unlucky answer barely moves
/// the distribution.
pub fn repetition_weight(error_count: i64, divisor: i64) -> usize {
    if error_count <= 0 {
        return 1;
    }
    let divisor = divisor.max(1);
    1 + (error_count / divisor) as usize
}

/// Picks up to `count` distinct words uniformly at random.
///
/// When the pool is not larger than `count` the whole pool comes back in
/// shuffled order.
pub fn build_paper<R>(pool: &[WordItem], count: i64, rng: &mut R) -> Vec<WordItem>
where
    R: Rng + ?Sized,
{
    if count <= 0 || pool.is_empty() {
        return Vec::new();
    }

    let mut words = pool.to_vec();
    words.shuffle(rng);
    words.truncate(count as usize);
    words
}

/// Builds a paper biased toward words the learner has missed.
///
/// Each word is repeated [`repetition_weight`] times, the expansion is
/// shuffled and the first `count` entries are taken. The same word may
/// therefore appear more than once on a weighted paper.
pub fn build_weighted_paper<R>(
    pool: &[WordItem],
    error_counts: &HashMap<WordId, i64>,
    count: i64,
    divisor: i64,
    rng: &mut R,
) -> Vec<WordItem>
where
    R: Rng + ?Sized,
{
    if count <= 0 || pool.is_empty() {
        return Vec::new();
    }

    let mut expanded = expand_pool(pool, error_counts, divisor);
    expanded.shuffle(rng);
    expanded.truncate(count as usize);
    expanded
}

pub(crate) fn expand_pool(
    pool: &[WordItem],
    error_counts: &HashMap<WordId, i64>,
    divisor: i64,
) -> Vec<WordItem> {
    let mut expanded = Vec::with_capacity(pool.len());
    for word in pool {
        let errors = error_counts.get(&word.id).copied().unwrap_or(0);
        let weight = repetition_weight(errors, divisor);
        expanded.extend(std::iter::repeat(word).take(weight).cloned());
    }
    expanded
}
