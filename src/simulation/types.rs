//! Core types for the traffic light simulation
//!
//! These are plain value types shared by the queue, the phase loop and the CLI.

use std::fmt;
use std::time::Duration;

/// Shortest time a light stays in one phase (4 seconds)
pub const MIN_CYCLE_DURATION: Duration = Duration::from_micros(4_000_000);

/// Longest time a light stays in one phase (6 seconds)
pub const MAX_CYCLE_DURATION: Duration = Duration::from_micros(6_000_000);

/// Sleep between two iterations of the phase loop
pub const TICK_INTERVAL: Duration = Duration::from_millis(1);

/// The state of a traffic light
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Red,
    Green,
}

impl Phase {
    /// The phase the light switches to on its next flip
    pub fn flipped(self) -> Self {
        match self {
            Phase::Red => Phase::Green,
            Phase::Green => Phase::Red,
        }
    }

    pub fn is_green(self) -> bool {
        self == Phase::Green
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Phase::Red => 0,
            Phase::Green => 1,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        if value == 0 {
            Phase::Red
        } else {
            Phase::Green
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Red => write!(f, "red"),
            Phase::Green => write!(f, "green"),
        }
    }
}

/// Which buffered value a queue hands out first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReceiveOrder {
    /// Most recently sent value first
    #[default]
    Lifo,
    /// Oldest value first
    Fifo,
}

/// What a bounded queue does with a send that finds it full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OverflowPolicy {
    /// Evict the oldest buffered value to make room
    #[default]
    DropOldest,
    /// Reject the value being sent
    DropNewest,
    /// Suspend the sender until a receiver frees a slot
    Block,
}
