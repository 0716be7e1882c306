// src/lib.rs

//! # VTOL Flight Stabilization Core
//!
//! A `no_std`, no-alloc sensor accumulator and dual-profile PID engine for
//! VTOL (vertical take-off and landing) flight controllers that transition
//! between hover and forward flight.
//!
//! Two contexts cooperate:
//!
//! - The sensor interrupt feeds every gyro/accelerometer sample into a
//!   [`SharedAccumulator`], which filters the gyro, advances the heading-hold
//!   integrals and keeps per-cycle sums.
//! - The main loop takes one [`CycleSnapshot`] per control cycle and hands it
//!   to the [`PidEngine`], which computes the corrections of both flight
//!   profiles for the mixer to blend.
//!
//! ```
//! use vtol_stabilization::{
//!     AccumulatorSettings, CycleInputs, FlightConfig, PidEngine, Profile, Sample,
//!     SharedAccumulator,
//! };
//!
//! static SENSORS: SharedAccumulator = SharedAccumulator::new();
//!
//! let config = FlightConfig::default();
//! SENSORS.configure(AccumulatorSettings::from(&config));
//! let mut engine = PidEngine::with_config(config);
//!
//! // Sensor interrupt.
//! SENSORS.accumulate(&Sample {
//!     gyro: [64, 0, 0],
//!     elapsed_ticks: 3571,
//!     ..Default::default()
//! });
//!
//! // Main loop.
//! let outputs = engine.calculate(&SENSORS.take_cycle(), &CycleInputs::new(0, 0));
//! assert_eq!(150, outputs.profile(Profile::P1).gyro[0]);
//! ```

#![no_std]
#![deny(missing_docs)]

pub mod axis;
pub mod config;
pub mod engine;
pub mod pid;
pub mod scale;
pub mod sensor;
pub mod status;

#[doc(inline)]
pub use axis::{Axis, AxisSticks, PerAxis, PerProfile, Profile};
#[doc(inline)]
pub use config::{AxisGains, DerivativeMode, FlightConfig, GainSet, ProfileGains};
#[doc(inline)]
pub use engine::*;
#[doc(inline)]
pub use sensor::{
    AccumulatorSettings, CycleSnapshot, CycleSums, GyroLpf, Sample, SensorAccumulator,
    SharedAccumulator, TimingMode,
};
#[doc(inline)]
pub use status::{Anomalies, Anomaly, Diagnostics};

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod test_utils;
