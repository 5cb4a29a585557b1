//! Traffic Light Simulation Library
//!
//! A concurrent traffic light that hands its phase to waiting threads through
//! a blocking message queue.

pub mod simulation;
