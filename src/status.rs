// src/status.rs

//! # Anomaly Reporting
//!
//! The control loop never returns an error and never stops. Anything unusual
//! is handled locally and reported here instead: each cycle yields the set
//! of anomalies it recovered from, and [`Diagnostics`] keeps running counts
//! for whatever displays or logs them.

use core::fmt;

use bitflags::bitflags;

/// A condition the core detected and recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anomaly {
    /// The engine ran without any sample since the previous cycle.
    StaleSampleData,
    /// A configured value was outside its designed range and was clamped.
    ConfigOutOfRange,
    /// A result did not fit its output type and was saturated.
    NumericOverflow,
}

impl Anomaly {
    /// Every anomaly, in flag order.
    pub const ALL: [Anomaly; 3] = [
        Anomaly::StaleSampleData,
        Anomaly::ConfigOutOfRange,
        Anomaly::NumericOverflow,
    ];

    /// The flag corresponding to this anomaly.
    pub const fn flag(self) -> Anomalies {
        match self {
            Anomaly::StaleSampleData => Anomalies::STALE_SAMPLE_DATA,
            Anomaly::ConfigOutOfRange => Anomalies::CONFIG_OUT_OF_RANGE,
            Anomaly::NumericOverflow => Anomalies::NUMERIC_OVERFLOW,
        }
    }
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            Anomaly::StaleSampleData => "no gyro samples this cycle",
            Anomaly::ConfigOutOfRange => "configuration value out of range",
            Anomaly::NumericOverflow => "numeric overflow saturated",
        };
        f.write_str(text)
    }
}

bitflags! {
    /// Set of anomalies raised during one operation.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct Anomalies: u8 {
        /// See [`Anomaly::StaleSampleData`].
        const STALE_SAMPLE_DATA = 1 << 0;
        /// See [`Anomaly::ConfigOutOfRange`].
        const CONFIG_OUT_OF_RANGE = 1 << 1;
        /// See [`Anomaly::NumericOverflow`].
        const NUMERIC_OVERFLOW = 1 << 2;
    }
}

/// Running anomaly counters plus the anomalies of the latest cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// Anomalies raised by the most recent cycle.
    pub last: Anomalies,
    /// Cycles that ran on reused averages.
    pub stale_cycles: u32,
    /// Configurations that needed clamping.
    pub config_clamps: u32,
    /// Cycles in which at least one value saturated.
    pub overflows: u32,
    /// Completed control cycles.
    pub cycles: u32,
}

impl Diagnostics {
    /// Records the anomalies of one completed cycle.
    pub fn record_cycle(&mut self, anomalies: Anomalies) {
        self.cycles = self.cycles.wrapping_add(1);
        self.last = anomalies;
        if anomalies.contains(Anomalies::STALE_SAMPLE_DATA) {
            self.stale_cycles = self.stale_cycles.saturating_add(1);
        }
        if anomalies.contains(Anomalies::NUMERIC_OVERFLOW) {
            self.overflows = self.overflows.saturating_add(1);
        }
    }

    /// Records the outcome of sanitizing a configuration.
    pub fn record_config(&mut self, anomalies: Anomalies) {
        if anomalies.contains(Anomalies::CONFIG_OUT_OF_RANGE) {
            self.config_clamps = self.config_clamps.saturating_add(1);
        }
    }

    /// Whether the latest cycle raised the given anomaly.
    pub fn raised(&self, anomaly: Anomaly) -> bool {
        self.last.contains(anomaly.flag())
    }
}
