// src/sensor/accumulator.rs

//! # Sensor Accumulator
//!
//! Runs once per sensor interrupt. Sensor samples arrive faster than the
//! control loop and at a rate that depends on the operating mode, so each
//! sample is folded into running sums that the PID engine averages once per
//! cycle. The heading-hold integral is advanced here as well, scaled by the
//! measured loop period so that it integrates wall-clock time rather than
//! sample count.
//!
//! Nothing in this module allocates, blocks, logs or produces output.

use crate::axis::{AxisSticks, PerAxis, PerProfile, FLIGHT_PROFILES, NUMBER_OF_AXES};
use crate::config::FlightConfig;
use crate::scale::{
    constrain, MAX_I_CONSTRAIN, MAX_STICK_RATE, NOMINAL_LOOP_TICKS, STICK_SHIFT_AT_RATE_ZERO,
};
use crate::sensor::filter::GyroFilter;

/// One sensor interrupt worth of input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sample {
    /// Raw angular rate per axis.
    pub gyro: PerAxis<i16>,
    /// Raw vertical acceleration.
    pub acc_vert: i16,
    /// Pilot sticks mapped onto the axes.
    pub sticks: AxisSticks,
    /// Timer ticks measured for the current control cycle.
    pub elapsed_ticks: u32,
}

/// Interrupt-side projection of the flight configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccumulatorSettings {
    /// Gyro filter time constant, `None` when filtering is off.
    pub time_constant: Option<f32>,
    /// Stick rate code per profile and axis.
    pub stick_rate: PerProfile<PerAxis<u8>>,
    /// Integral constrain limit per profile and axis.
    pub i_constrain: PerProfile<PerAxis<i32>>,
}

impl AccumulatorSettings {
    /// Settings with no filtering, no stick authority and no integral room.
    pub const fn new() -> Self {
        Self {
            time_constant: None,
            stick_rate: [[0; NUMBER_OF_AXES]; FLIGHT_PROFILES],
            i_constrain: [[0; NUMBER_OF_AXES]; FLIGHT_PROFILES],
        }
    }
}

impl Default for AccumulatorSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&FlightConfig> for AccumulatorSettings {
    fn from(config: &FlightConfig) -> Self {
        let profiles = config.gains.profiles;
        Self {
            time_constant: config.gyro_lpf.time_constant(config.timing),
            stick_rate: profiles.map(|profile| {
                profile.axes.map(|axis| axis.stick_rate.min(MAX_STICK_RATE))
            }),
            i_constrain: profiles.map(|profile| {
                profile.axes.map(|axis| axis.i_constrain.clamp(0, MAX_I_CONSTRAIN))
            }),
        }
    }
}

/// Running sums of one control cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSums {
    /// Sum of filtered gyro values per axis.
    pub gyro: PerAxis<i32>,
    /// Sum of sample-to-sample filtered gyro differences per axis.
    pub derivative: PerAxis<i32>,
    /// Sum of raw vertical acceleration.
    pub acc_vert: i32,
    /// Number of samples folded into the sums.
    pub samples: u16,
    /// The counter filled up or a sum hit its bound; later samples were left out.
    pub saturated: bool,
}

/// Everything the engine needs from the sensor side for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSnapshot {
    /// Sums of the cycle that just ended.
    pub sums: CycleSums,
    /// Heading-hold integral per profile and axis at the end of the cycle.
    pub integral: PerProfile<PerAxis<i32>>,
}

/// Per-sample state: filter, heading-hold integrals and cycle sums.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorAccumulator {
    filter: GyroFilter,
    gyro: PerAxis<i16>,
    previous: PerAxis<i16>,
    integral: PerProfile<PerAxis<i32>>,
    sums: CycleSums,
}

impl SensorAccumulator {
    /// Creates an accumulator at rest.
    pub const fn new() -> Self {
        Self {
            filter: GyroFilter::new(),
            gyro: [0; NUMBER_OF_AXES],
            previous: [0; NUMBER_OF_AXES],
            integral: [[0; NUMBER_OF_AXES]; FLIGHT_PROFILES],
            sums: CycleSums {
                gyro: [0; NUMBER_OF_AXES],
                derivative: [0; NUMBER_OF_AXES],
                acc_vert: 0,
                samples: 0,
                saturated: false,
            },
        }
    }

    /// Folds one sensor sample into the filter, the integrals and the cycle sums.
    ///
    /// Once the sample counter is full the sample still drives the filter
    /// and the integrals, but is left out of the sums so that they keep
    /// matching the count. The cycle is then marked as saturated.
    pub fn accumulate(&mut self, sample: &Sample, settings: &AccumulatorSettings) {
        let factor = sample.elapsed_ticks as f32 / NOMINAL_LOOP_TICKS;
        let counted = self.sums.samples < u16::MAX;
        let mut saturated = !counted;

        for axis in 0..NUMBER_OF_AXES {
            let gyro = self.filter.apply(axis, sample.gyro[axis], settings.time_constant);
            self.gyro[axis] = gyro;

            let stick = sample.sticks.0[axis] as i32;
            for profile in 0..FLIGHT_PROFILES {
                let rate = settings.stick_rate[profile][axis].min(MAX_STICK_RATE);
                let bias = stick >> (STICK_SHIFT_AT_RATE_ZERO - rate);
                // Float to int casts saturate, so a stalled loop cannot wrap.
                let step = ((gyro as i32 + bias) as f32 * factor) as i32;
                let integral = &mut self.integral[profile][axis];
                *integral = constrain(
                    integral.saturating_add(step),
                    settings.i_constrain[profile][axis],
                );
            }

            let delta = gyro as i32 - self.previous[axis] as i32;
            self.previous[axis] = gyro;
            if counted {
                let sums = &mut self.sums;
                saturated |= add_saturating(&mut sums.gyro[axis], gyro as i32);
                saturated |= add_saturating(&mut sums.derivative[axis], delta);
            }
        }

        if counted {
            saturated |= add_saturating(&mut self.sums.acc_vert, sample.acc_vert as i32);
            self.sums.samples += 1;
        }
        self.sums.saturated |= saturated;
    }

    /// Hands over the finished cycle and starts an empty one.
    ///
    /// The integral state is copied, not reset.
    pub fn take_cycle(&mut self) -> CycleSnapshot {
        CycleSnapshot {
            sums: core::mem::take(&mut self.sums),
            integral: self.integral,
        }
    }

    /// Clears the heading-hold memory. For use on the ground only.
    pub fn reset_integrals(&mut self) {
        self.integral = [[0; NUMBER_OF_AXES]; FLIGHT_PROFILES];
    }

    /// Latest filtered gyro value per axis.
    pub fn gyro(&self) -> PerAxis<i16> {
        self.gyro
    }

    /// Current heading-hold integral per profile and axis.
    pub fn integral(&self) -> PerProfile<PerAxis<i32>> {
        self.integral
    }

    /// Sums of the cycle in progress.
    pub fn sums(&self) -> &CycleSums {
        &self.sums
    }
}

fn add_saturating(sum: &mut i32, value: i32) -> bool {
    match sum.checked_add(value) {
        Some(total) => {
            *sum = total;
            false
        }
        None => {
            *sum = sum.saturating_add(value);
            true
        }
    }
}
