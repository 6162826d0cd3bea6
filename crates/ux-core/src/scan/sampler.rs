use std::collections::VecDeque;
use std::sync::Mutex;

use rand::Rng;

/// Source of randomness for the scan engine.
///
/// Injectable so tests can supply a fixed sequence instead of the real
/// generator.
pub trait Sampler: Send + Sync {
    /// Uniform random integer in the inclusive range `[lo, hi]`.
    fn score_between(&self, lo: u8, hi: u8) -> u8;

    /// `k` distinct indices drawn without replacement from `0..n`, in random
    /// order.
    fn pick(&self, n: usize, k: usize) -> Vec<usize>;
}

/// Production sampler backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSampler;

impl Sampler for ThreadRngSampler {
    fn score_between(&self, lo: u8, hi: u8) -> u8 {
        rand::thread_rng().gen_range(lo..=hi)
    }

    fn pick(&self, n: usize, k: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut rand::thread_rng(), n, k).into_vec()
    }
}

/// Deterministic sampler replaying a fixed script of scores and index picks.
pub struct ScriptedSampler {
    scores: Mutex<VecDeque<u8>>,
    picks: Vec<usize>,
}

impl ScriptedSampler {
    pub fn new(scores: &[u8], picks: &[usize]) -> Self {
        Self {
            scores: Mutex::new(scores.iter().copied().collect()),
            picks: picks.to_vec(),
        }
    }
}

impl Sampler for ScriptedSampler {
    fn score_between(&self, lo: u8, hi: u8) -> u8 {
        let mut scores = self.scores.lock().expect("sampler script lock poisoned");
        scores.pop_front().unwrap_or(lo).clamp(lo, hi)
    }

    fn pick(&self, n: usize, k: usize) -> Vec<usize> {
        self.picks
            .iter()
            .copied()
            .filter(|i| *i < n)
            .take(k)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn thread_rng_respects_inclusive_bounds() {
        let sampler = ThreadRngSampler;
        for _ in 0..200 {
            let v = sampler.score_between(75, 98);
            assert!((75..=98).contains(&v));
        }
    }

    #[test]
    fn thread_rng_picks_distinct_indices() {
        let sampler = ThreadRngSampler;
        for _ in 0..50 {
            let picked = sampler.pick(4, 3);
            assert_eq!(picked.len(), 3);
            let unique: HashSet<usize> = picked.iter().copied().collect();
            assert_eq!(unique.len(), 3);
            assert!(picked.iter().all(|i| *i < 4));
        }
    }

    #[test]
    fn scripted_sampler_replays_scores_in_order() {
        let sampler = ScriptedSampler::new(&[80, 70, 90], &[1, 0, 2]);
        assert_eq!(sampler.score_between(0, 100), 80);
        assert_eq!(sampler.score_between(0, 100), 70);
        assert_eq!(sampler.score_between(0, 100), 90);
        // Exhausted script falls back to the lower bound.
        assert_eq!(sampler.score_between(42, 100), 42);
    }

    #[test]
    fn scripted_sampler_clamps_out_of_range_scores() {
        let sampler = ScriptedSampler::new(&[200], &[]);
        assert_eq!(sampler.score_between(75, 98), 98);
    }

    #[test]
    fn scripted_sampler_filters_picks_to_range() {
        let sampler = ScriptedSampler::new(&[], &[7, 2, 0, 1]);
        assert_eq!(sampler.pick(4, 3), vec![2, 0, 1]);
    }
}
