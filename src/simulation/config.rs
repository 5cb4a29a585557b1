//! Traffic light configuration
//!
//! Defaults reproduce the classic light: 4 to 6 second phases, a 1 ms loop
//! tick and an unbounded LIFO queue. Builder methods override single fields.

use anyhow::{ensure, Result};
use std::time::Duration;

use super::types::{
    OverflowPolicy, Phase, ReceiveOrder, MAX_CYCLE_DURATION, MIN_CYCLE_DURATION, TICK_INTERVAL,
};

/// Settings for a [`TrafficLight`](super::TrafficLight)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightConfig {
    /// Phase the light starts in
    pub initial_phase: Phase,
    /// Shortest phase length
    pub min_cycle: Duration,
    /// Longest phase length
    pub max_cycle: Duration,
    /// Sleep between loop iterations
    pub tick_interval: Duration,
    /// Order in which waiters receive published phases
    pub receive_order: ReceiveOrder,
    /// Optional bound on buffered phases (unbounded when `None`)
    pub queue_capacity: Option<usize>,
    /// Applied when a bounded queue is full
    pub overflow: OverflowPolicy,
    /// Seed for the cycle length generator, OS entropy when `None`
    pub seed: Option<u64>,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            initial_phase: Phase::Red,
            min_cycle: MIN_CYCLE_DURATION,
            max_cycle: MAX_CYCLE_DURATION,
            tick_interval: TICK_INTERVAL,
            receive_order: ReceiveOrder::Lifo,
            queue_capacity: None,
            overflow: OverflowPolicy::DropOldest,
            seed: None,
        }
    }
}

impl LightConfig {
    pub fn initial_phase(mut self, phase: Phase) -> Self {
        self.initial_phase = phase;
        self
    }

    pub fn cycle_range(mut self, min: Duration, max: Duration) -> Self {
        self.min_cycle = min;
        self.max_cycle = max;
        self
    }

    pub fn tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn receive_order(mut self, order: ReceiveOrder) -> Self {
        self.receive_order = order;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize, overflow: OverflowPolicy) -> Self {
        self.queue_capacity = Some(capacity);
        self.overflow = overflow;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the settings are usable by a running light
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.min_cycle.is_zero(),
            "minimum cycle duration must be greater than zero"
        );
        ensure!(
            self.min_cycle <= self.max_cycle,
            "minimum cycle duration {:?} exceeds maximum {:?}",
            self.min_cycle,
            self.max_cycle
        );
        ensure!(
            !self.tick_interval.is_zero(),
            "tick interval must be greater than zero"
        );
        ensure!(
            self.queue_capacity != Some(0),
            "queue capacity must be at least 1"
        );
        Ok(())
    }
}
