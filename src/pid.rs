// src/pid.rs

//! # PID Terms
//!
//! Compute functions and control data for the individual correction terms.
//! The engine combines them per axis and per profile.

pub mod gyro;
pub use gyro::*;
pub mod level;
pub use level::*;
