use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Draws how long each requester keeps its room.
pub struct HoldTimeSampler {
    min_hold: Duration,
    max_hold: Duration,
    random: StdRng,
}

impl HoldTimeSampler {
    pub fn new(min_hold: Duration, max_hold: Duration, seed: Option<u64>) -> Self {
        assert!(min_hold <= max_hold);
        Self {
            min_hold,
            max_hold,
            random: match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            },
        }
    }

    pub fn sample(&mut self) -> Duration {
        if self.min_hold == self.max_hold {
            return self.min_hold;
        }
        self.random.gen_range(self.min_hold..=self.max_hold)
    }

    pub fn sample_many(&mut self, count: usize) -> Vec<Duration> {
        (0..count).map(|_| self.sample()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::HoldTimeSampler;
    use std::time::Duration;

    #[test]
    fn test_samples_in_range() {
        let min = Duration::from_millis(10);
        let max = Duration::from_millis(50);
        let mut sampler = HoldTimeSampler::new(min, max, Some(7));
        for hold in sampler.sample_many(100) {
            assert!(hold >= min && hold <= max);
        }
    }

    #[test]
    fn test_seed_is_reproducible() {
        let first = HoldTimeSampler::new(Duration::ZERO, Duration::from_secs(5), Some(42)).sample_many(10);
        let second = HoldTimeSampler::new(Duration::ZERO, Duration::from_secs(5), Some(42)).sample_many(10);
        assert_eq!(first, second);

        let fixed = HoldTimeSampler::new(Duration::ZERO, Duration::ZERO, None).sample_many(3);
        assert_eq!(fixed, vec![Duration::ZERO; 3]);
    }
}
