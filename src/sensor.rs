// src/sensor.rs

//! # Sensor Side
//!
//! Per-sample processing that runs in the sensor interrupt: gyro filtering,
//! heading-hold integration and the per-cycle sums handed to the engine.

pub mod accumulator;
pub use accumulator::*;
pub mod filter;
pub use filter::*;
pub mod shared;
pub use shared::*;
