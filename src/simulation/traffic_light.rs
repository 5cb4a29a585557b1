//! Traffic light logic for the simulation
//!
//! A light flips between red and green on a background thread and publishes
//! its phase into a [`MessageQueue`] on every loop tick. Vehicles block in
//! [`TrafficLight::wait_for_green`] until a green phase comes off the queue.

use anyhow::{bail, Result};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::clock::{Clock, SystemClock};
use super::config::LightConfig;
use super::cycle::{CycleSource, PhaseCycle, RandomCycle};
use super::message_queue::MessageQueue;
use super::threads::SimThreads;
use super::types::Phase;

/// State shared between the light's handles and its loop thread
struct Shared {
    phase: AtomicU8,
    queue: MessageQueue<Phase>,
    running: AtomicBool,
    stopped: AtomicBool,
    flips: AtomicU64,
}

impl Shared {
    fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    fn set_phase(&self, phase: Phase) {
        self.phase.store(phase.as_u8(), Ordering::Release);
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// A traffic light cycling between red and green
///
/// Cloning gives another handle to the same light.
#[derive(Clone)]
pub struct TrafficLight {
    shared: Arc<Shared>,
    clock: Arc<dyn Clock>,
    config: LightConfig,
}

impl Default for TrafficLight {
    fn default() -> Self {
        Self::new()
    }
}

impl TrafficLight {
    fn new_internal(config: LightConfig, clock: Arc<dyn Clock>) -> Self {
        let mut queue = MessageQueue::with_order(config.receive_order);
        if let Some(capacity) = config.queue_capacity {
            queue = queue.with_capacity(capacity, config.overflow);
        }

        let shared = Shared {
            phase: AtomicU8::new(config.initial_phase.as_u8()),
            queue,
            running: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            flips: AtomicU64::new(0),
        };

        Self {
            shared: Arc::new(shared),
            clock,
            config,
        }
    }

    /// Create a red light with 4 to 6 second phases on the system clock
    pub fn new() -> Self {
        Self::new_internal(LightConfig::default(), Arc::new(SystemClock))
    }

    /// Create a light from a validated configuration
    pub fn with_config(config: LightConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new_internal(config, Arc::new(SystemClock)))
    }

    /// Create a light driven by the given clock
    pub fn with_clock(config: LightConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self::new_internal(config, clock))
    }

    pub fn config(&self) -> &LightConfig {
        &self.config
    }

    /// Snapshot of the current phase, never blocks
    pub fn current_phase(&self) -> Phase {
        self.shared.phase()
    }

    /// Number of flips since the light started cycling
    pub fn flip_count(&self) -> u64 {
        self.shared.flips.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }

    /// The queue the light publishes its phase into
    pub fn queue(&self) -> &MessageQueue<Phase> {
        &self.shared.queue
    }

    /// Start cycling on a background thread with randomly drawn phase lengths
    ///
    /// The generator is seeded once, from the configured seed if there is one.
    pub fn simulate(&self, threads: &mut SimThreads) -> Result<()> {
        let (min, max) = (self.config.min_cycle, self.config.max_cycle);
        let source = match self.config.seed {
            Some(seed) => RandomCycle::with_seed(min, max, seed),
            None => RandomCycle::new(min, max),
        };
        self.simulate_with(threads, source)
    }

    /// Start cycling on a background thread with phase lengths from `source`
    ///
    /// The thread is registered with `threads`. Calling this on a light that
    /// is already cycling does nothing.
    pub fn simulate_with<S>(&self, threads: &mut SimThreads, source: S) -> Result<()>
    where
        S: CycleSource + 'static,
    {
        if self.is_stopped() {
            bail!("Cannot simulate a traffic light that has been stopped");
        }
        if self.shared.running.swap(true, Ordering::AcqRel) {
            warn!("Traffic light is already cycling, ignoring simulate()");
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let clock = Arc::clone(&self.clock);
        let tick_interval = self.config.tick_interval;
        let spawned = threads.spawn("traffic-light", move || {
            cycle_through_phases(&shared, clock.as_ref(), tick_interval, source);
        });

        if spawned.is_err() {
            self.shared.running.store(false, Ordering::Release);
        }
        spawned
    }

    /// Block until a green phase is received from the queue
    ///
    /// Red phases are discarded. A green that was published earlier and is
    /// still buffered also counts. Fails if the light is stopped first.
    pub fn wait_for_green(&self) -> Result<()> {
        while !self.is_stopped() {
            match self.shared.queue.receive() {
                Some(Phase::Green) => return Ok(()),
                Some(Phase::Red) => continue,
                None => break,
            }
        }
        bail!("Traffic light stopped before turning green")
    }

    /// Stop the background loop and release every waiter
    pub fn stop(&self) {
        if self.shared.stopped.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shared.queue.close();
        debug!("Traffic light stop requested");
    }
}

/// Body of the background thread: flip on timer, publish every tick
fn cycle_through_phases<S: CycleSource>(
    shared: &Shared,
    clock: &dyn Clock,
    tick_interval: Duration,
    source: S,
) {
    let mut cycle = PhaseCycle::new(shared.phase(), source, clock.now());
    debug!(
        "Traffic light cycling from {}, first flip after {:?}",
        cycle.phase(),
        cycle.target()
    );

    while !shared.is_stopped() {
        if let Some(phase) = cycle.tick(clock.now()) {
            shared.set_phase(phase);
            shared.flips.fetch_add(1, Ordering::AcqRel);
            info!(
                "Traffic light turned {}, next flip after {:?}",
                phase,
                cycle.target()
            );
        }

        // Published on every tick, not only on change
        shared.queue.send(cycle.phase());

        clock.sleep(tick_interval);
    }

    shared.running.store(false, Ordering::Release);
    debug!(
        "Traffic light loop exited after {} flips",
        shared.flips.load(Ordering::Acquire)
    );
}
