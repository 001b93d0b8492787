//! Focus score tracking

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Per-tick score delta source
///
/// The default implementation simulates focus drift; real telemetry (for
/// example the gaze counters) can be plugged in instead.
pub trait ScoreSource: Send {
    fn step(&mut self) -> i32;
}

/// Simulated focus drift: a random step in `-2..=2` per tick
pub struct RandomWalkSource {
    rng: StdRng,
}

impl RandomWalkSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl ScoreSource for RandomWalkSource {
    fn step(&mut self) -> i32 {
        self.rng.gen_range(-2..=2)
    }
}

/// Focus score clamped to 0..=100
pub struct FocusTracker {
    score: i32,
    source: Box<dyn ScoreSource>,
}

impl FocusTracker {
    /// Create a tracker at full focus
    pub fn new(source: Box<dyn ScoreSource>) -> Self {
        Self { score: 100, source }
    }

    /// Apply one step from the source
    pub fn tick(&mut self) {
        let delta = self.source.step();
        self.score = (self.score + delta).clamp(0, 100);
    }

    /// Current score
    pub fn score(&self) -> u32 {
        self.score as u32
    }

    /// Back to full focus
    pub fn reset(&mut self) {
        self.score = 100;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Steady(i32);
    impl ScoreSource for Steady {
        fn step(&mut self) -> i32 {
            self.0
        }
    }

    #[test]
    fn test_score_clamps_at_zero() {
        let mut tracker = FocusTracker::new(Box::new(Steady(-30)));
        for _ in 0..10 {
            tracker.tick();
        }
        assert_eq!(tracker.score(), 0);
    }

    #[test]
    fn test_score_clamps_at_hundred() {
        let mut tracker = FocusTracker::new(Box::new(Steady(5)));
        tracker.tick();
        assert_eq!(tracker.score(), 100);
    }

    #[test]
    fn test_random_walk_stays_in_band() {
        let mut source = RandomWalkSource::new(1);
        for _ in 0..1000 {
            let delta = source.step();
            assert!((-2..=2).contains(&delta));
        }
    }

    #[test]
    fn test_reset() {
        let mut tracker = FocusTracker::new(Box::new(Steady(-10)));
        tracker.tick();
        assert_eq!(tracker.score(), 90);
        tracker.reset();
        assert_eq!(tracker.score(), 100);
    }
}
