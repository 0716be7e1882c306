// src/config.rs

//! # Flight Configuration
//!
//! Read-only view of the tuning parameters consumed by the accumulator and
//! the engine. The configuration may change between any two cycles (live
//! tuning), so both components take a fresh snapshot instead of holding on
//! to values. Storage, menus and migration of these values belong to the
//! configuration subsystem; this module only defines their shape, their
//! designed ranges and the factory defaults.

use serde::{Deserialize, Serialize};

use crate::axis::{Axis, PerAxis, PerProfile, Profile};
use crate::scale::{
    I_CONSTRAIN_PER_PERCENT, I_LIMIT_PER_PERCENT, MAX_GAIN, MAX_I_CONSTRAIN, MAX_I_OUTPUT_LIMIT,
    MAX_LIMIT_PERCENT, MAX_STICK_RATE,
};
use crate::sensor::filter::{GyroLpf, TimingMode};
use crate::status::Anomalies;

/// How the D-term derivative is obtained each cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivativeMode {
    /// Mean of the per-sample differences accumulated by the sensor side.
    #[default]
    AveragedRawDifference,
    /// This cycle's averaged rate minus the previous cycle's averaged rate.
    DifferenceOfAverages,
}

/// Gains and limits of one axis in one profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisGains {
    /// Proportional gain, 0 to 127.
    pub p: i8,
    /// Integral gain, 0 to 127.
    pub i: i8,
    /// Accelerometer gain, -127 to 127. The yaw slot holds the vertical (Z) gain.
    pub acc: i8,
    /// Heading-hold stick authority, 0 (divide by 64) to 4 (divide by 4).
    pub stick_rate: u8,
    /// Bound of the integral state itself, applied every sample.
    pub i_constrain: i32,
    /// Bound of the I-term after its gain, applied every cycle.
    pub i_limit: i32,
}

impl AxisGains {
    /// Creates axis gains with both I-term bounds derived from a menu percentage.
    pub fn new(p: i8, i: i8, limit_percent: u8, stick_rate: u8, acc: i8) -> Self {
        let mut gains = Self {
            p,
            i,
            acc,
            stick_rate,
            i_constrain: 0,
            i_limit: 0,
        };
        gains.set_limit_percent(limit_percent);
        gains
    }

    /// Derives the raw I-term bounds from a 0 to 125 percent limit.
    pub fn set_limit_percent(&mut self, percent: u8) {
        let percent = percent.min(MAX_LIMIT_PERCENT) as i32;
        self.i_limit = percent * I_LIMIT_PER_PERCENT;
        self.i_constrain = percent * I_CONSTRAIN_PER_PERCENT;
    }

    fn sanitize(&mut self) -> bool {
        let before = *self;
        self.p = self.p.clamp(0, MAX_GAIN);
        self.i = self.i.clamp(0, MAX_GAIN);
        self.acc = self.acc.clamp(-MAX_GAIN, MAX_GAIN);
        self.stick_rate = self.stick_rate.min(MAX_STICK_RATE);
        self.i_constrain = self.i_constrain.clamp(0, MAX_I_CONSTRAIN);
        self.i_limit = self.i_limit.clamp(0, MAX_I_OUTPUT_LIMIT);
        before != *self
    }
}

/// Everything one flight profile is tuned with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileGains {
    /// Per-axis gains.
    pub axes: PerAxis<AxisGains>,
    /// Accelerometer trims for Roll and Pitch, in attitude angle units.
    pub level_trim: [i16; 2],
    /// Gyro yaw trim, seeded into the yaw P-term.
    pub yaw_trim: i8,
}

impl ProfileGains {
    /// Gains of the given axis.
    pub fn axis(&self, axis: Axis) -> &AxisGains {
        &self.axes[axis.index()]
    }
}

/// Complete per-cycle gain snapshot for both profiles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GainSet {
    /// Gains of P1 and P2.
    pub profiles: PerProfile<ProfileGains>,
    /// Derivative gains, shared between profiles. Yaw has no D-term.
    pub d_gain: PerAxis<i8>,
}

impl GainSet {
    /// Gains of the given profile.
    pub fn profile(&self, profile: Profile) -> &ProfileGains {
        &self.profiles[profile.index()]
    }

    /// Clamps every value into its designed range.
    ///
    /// Returns [`Anomalies::CONFIG_OUT_OF_RANGE`] if anything had to change.
    pub fn sanitize(&mut self) -> Anomalies {
        let mut clamped = false;
        for profile in self.profiles.iter_mut() {
            for axis in profile.axes.iter_mut() {
                clamped |= axis.sanitize();
            }
        }
        for (index, d) in self.d_gain.iter_mut().enumerate() {
            let sane = if index == Axis::Yaw.index() { 0 } else { (*d).clamp(0, MAX_GAIN) };
            clamped |= sane != *d;
            *d = sane;
        }
        if clamped {
            Anomalies::CONFIG_OUT_OF_RANGE
        } else {
            Anomalies::empty()
        }
    }
}

/// Configuration consumed by the sensor accumulator and the PID engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightConfig {
    /// Software gyro low-pass filter.
    pub gyro_lpf: GyroLpf,
    /// Sample timing, which selects the filter table.
    pub timing: TimingMode,
    /// D-term derivative strategy.
    pub derivative: DerivativeMode,
    /// Gains and limits.
    pub gains: GainSet,
}

impl FlightConfig {
    /// Clamps every value into its designed range. See [`GainSet::sanitize`].
    pub fn sanitize(&mut self) -> Anomalies {
        self.gains.sanitize()
    }
}

impl Default for FlightConfig {
    /// Factory defaults: the quad preset, gyro filter off, high-speed timing.
    fn default() -> Self {
        let hover = ProfileGains {
            axes: [
                AxisGains::new(50, 10, 10, 2, 10),
                AxisGains::new(50, 10, 10, 2, 10),
                AxisGains::new(60, 40, 25, 2, 50),
            ],
            ..Default::default()
        };
        let forward = ProfileGains {
            axes: [
                AxisGains::new(40, 19, 14, 3, 1),
                AxisGains::new(40, 19, 14, 3, 1),
                AxisGains::new(60, 40, 25, 3, 30),
            ],
            ..Default::default()
        };
        Self {
            gyro_lpf: GyroLpf::NoFilter,
            timing: TimingMode::HighSpeed,
            derivative: DerivativeMode::AveragedRawDifference,
            gains: GainSet {
                profiles: [hover, forward],
                d_gain: [0; 3],
            },
        }
    }
}
