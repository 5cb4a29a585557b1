//! Phase cycle timing
//!
//! [`PhaseCycle`] is the state carried by the background loop of a traffic
//! light: the current phase, the time accumulated since the last flip and the
//! randomly drawn length of the current phase. It is driven purely by the
//! instants passed to [`PhaseCycle::tick`], which keeps it testable without
//! threads.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};

use super::types::{Phase, MAX_CYCLE_DURATION, MIN_CYCLE_DURATION};

/// Supplies the length of each phase
pub trait CycleSource: Send {
    fn next_cycle(&mut self) -> Duration;
}

impl<F> CycleSource for F
where
    F: FnMut() -> Duration + Send,
{
    fn next_cycle(&mut self) -> Duration {
        self()
    }
}

/// Phase lengths drawn uniformly, in whole microseconds, from `[min, max]`
pub struct RandomCycle {
    rng: StdRng,
    min_micros: u64,
    max_micros: u64,
}

impl Default for RandomCycle {
    fn default() -> Self {
        Self::new(MIN_CYCLE_DURATION, MAX_CYCLE_DURATION)
    }
}

impl RandomCycle {
    fn new_internal(rng: StdRng, min: Duration, max: Duration) -> Self {
        let min_micros = min.as_micros() as u64;
        let max_micros = (max.as_micros() as u64).max(min_micros);
        Self {
            rng,
            min_micros,
            max_micros,
        }
    }

    /// Create a source seeded from OS entropy
    pub fn new(min: Duration, max: Duration) -> Self {
        Self::new_internal(StdRng::from_os_rng(), min, max)
    }

    /// Create a source with a fixed seed for reproducible runs
    pub fn with_seed(min: Duration, max: Duration, seed: u64) -> Self {
        Self::new_internal(StdRng::seed_from_u64(seed), min, max)
    }
}

impl CycleSource for RandomCycle {
    fn next_cycle(&mut self) -> Duration {
        Duration::from_micros(self.rng.random_range(self.min_micros..=self.max_micros))
    }
}

/// Every phase lasts exactly the same time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCycle(pub Duration);

impl CycleSource for FixedCycle {
    fn next_cycle(&mut self) -> Duration {
        self.0
    }
}

/// Flip state machine of a single light
pub struct PhaseCycle<S> {
    phase: Phase,
    elapsed: Duration,
    target: Duration,
    last_tick: Instant,
    source: S,
}

impl<S: CycleSource> PhaseCycle<S> {
    /// Start a cycle in `initial`, measuring from `now`
    pub fn new(initial: Phase, mut source: S, now: Instant) -> Self {
        let target = source.next_cycle();
        Self {
            phase: initial,
            elapsed: Duration::ZERO,
            target,
            last_tick: now,
            source,
        }
    }

    /// Accumulate the time since the previous tick and flip once the drawn
    /// phase length is reached
    ///
    /// Returns the new phase if this tick flipped the light.
    pub fn tick(&mut self, now: Instant) -> Option<Phase> {
        self.elapsed += now.saturating_duration_since(self.last_tick);
        self.last_tick = now;

        if self.elapsed < self.target {
            return None;
        }

        self.phase = self.phase.flipped();
        self.elapsed = Duration::ZERO;
        self.target = self.source.next_cycle();
        Some(self.phase)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Time accumulated in the current phase
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Length drawn for the current phase
    pub fn target(&self) -> Duration {
        self.target
    }
}
