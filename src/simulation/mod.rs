//! Traffic light simulation core
//!
//! A blocking handoff queue and a traffic light built on top of it. The light
//! flips between red and green on a background thread and publishes its phase
//! into the queue on every tick; vehicles block until a green comes through.

mod clock;
mod config;
mod cycle;
mod message_queue;
mod threads;
mod traffic_light;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LightConfig;
pub use cycle::{CycleSource, FixedCycle, PhaseCycle, RandomCycle};
pub use message_queue::MessageQueue;
pub use threads::SimThreads;
pub use traffic_light::TrafficLight;
pub use types::{
    OverflowPolicy, Phase, ReceiveOrder, MAX_CYCLE_DURATION, MIN_CYCLE_DURATION, TICK_INTERVAL,
};
