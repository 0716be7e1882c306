// src/sensor/shared.rs

//! # Interrupt Hand-Off
//!
//! The accumulator is written from the sensor interrupt and drained from the
//! main loop. [`SharedAccumulator`] wraps it in a critical-section mutex so
//! that a cycle is always taken as one consistent snapshot: no sample is
//! lost between reading the sums and clearing them, and none is counted
//! twice.
//!
//! The interrupt-side settings live behind the same lock, so a
//! reconfiguration from the main loop is seen atomically by the next sample.
//!
//! ```
//! use vtol_stabilization::{AccumulatorSettings, Sample, SharedAccumulator};
//!
//! static SENSORS: SharedAccumulator = SharedAccumulator::new();
//!
//! SENSORS.configure(AccumulatorSettings::new());
//! SENSORS.accumulate(&Sample {
//!     gyro: [4, 0, 0],
//!     ..Default::default()
//! });
//! let snapshot = SENSORS.take_cycle();
//! assert_eq!(1, snapshot.sums.samples);
//! ```

use core::cell::RefCell;

use critical_section::Mutex;

use crate::axis::{PerAxis, PerProfile};
use crate::sensor::accumulator::{AccumulatorSettings, CycleSnapshot, Sample, SensorAccumulator};

struct Shared {
    accumulator: SensorAccumulator,
    settings: AccumulatorSettings,
}

/// A [`SensorAccumulator`] that can live in a `static` shared with an interrupt.
pub struct SharedAccumulator {
    inner: Mutex<RefCell<Shared>>,
}

impl SharedAccumulator {
    /// Creates an empty accumulator with inert settings.
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Shared {
                accumulator: SensorAccumulator::new(),
                settings: AccumulatorSettings::new(),
            })),
        }
    }

    /// Replaces the interrupt-side settings.
    pub fn configure(&self, settings: AccumulatorSettings) {
        critical_section::with(|cs| {
            self.inner.borrow(cs).borrow_mut().settings = settings;
        });
    }

    /// Folds one sample in. Call from the sensor interrupt.
    pub fn accumulate(&self, sample: &Sample) {
        critical_section::with(|cs| {
            let mut shared = self.inner.borrow(cs).borrow_mut();
            let shared = &mut *shared;
            shared.accumulator.accumulate(sample, &shared.settings);
        });
    }

    /// Takes the finished cycle and resets the sums. Call from the main loop.
    pub fn take_cycle(&self) -> CycleSnapshot {
        critical_section::with(|cs| self.inner.borrow(cs).borrow_mut().accumulator.take_cycle())
    }

    /// Clears the heading-hold integrals.
    pub fn reset_integrals(&self) {
        critical_section::with(|cs| {
            self.inner.borrow(cs).borrow_mut().accumulator.reset_integrals();
        });
    }

    /// Latest filtered gyro values, for sensor displays.
    pub fn filtered_gyro(&self) -> PerAxis<i16> {
        critical_section::with(|cs| self.inner.borrow(cs).borrow().accumulator.gyro())
    }

    /// Current heading-hold integrals, for sensor displays.
    pub fn integral(&self) -> PerProfile<PerAxis<i32>> {
        critical_section::with(|cs| self.inner.borrow(cs).borrow().accumulator.integral())
    }
}

impl Default for SharedAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
