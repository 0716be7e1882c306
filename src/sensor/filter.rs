// src/sensor/filter.rs

//! # Gyro Low-Pass Filter
//!
//! One-pole IIR smoothing of the raw angular rate, applied per axis at
//! sample cadence. The filter is expressed as a time constant `k`:
//!
//! `smooth = (smooth * (k - 1) + raw) / k`
//!
//! so `k = 1` is a pass-through. The time constants approximate
//! `1 + fs / (2 * pi * fc)` for the sample rate of each timing mode.

use serde::{Deserialize, Serialize};

use crate::axis::PerAxis;

/// Cutoff selection for the software gyro filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GyroLpf {
    /// 5 Hz cutoff.
    Hz5 = 0,
    /// 10 Hz cutoff.
    Hz10 = 1,
    /// 21 Hz cutoff.
    Hz21 = 2,
    /// 44 Hz cutoff.
    Hz44 = 3,
    /// 94 Hz cutoff.
    Hz94 = 4,
    /// 184 Hz cutoff.
    Hz184 = 5,
    /// 260 Hz cutoff.
    Hz260 = 6,
    /// Raw gyro values pass through unfiltered.
    #[default]
    NoFilter = 7,
}

impl GyroLpf {
    /// Maps a stored filter index onto a cutoff. Unknown indices yield `None`.
    pub fn from_index(index: u8) -> Option<Self> {
        Some(match index {
            0 => Self::Hz5,
            1 => Self::Hz10,
            2 => Self::Hz21,
            3 => Self::Hz44,
            4 => Self::Hz94,
            5 => Self::Hz184,
            6 => Self::Hz260,
            7 => Self::NoFilter,
            _ => return None,
        })
    }

    /// Time constant `k` for this cutoff, or `None` when filtering is off.
    pub fn time_constant(self, timing: TimingMode) -> Option<f32> {
        let table = match timing {
            TimingMode::Normal => &LPF_LOOKUP,
            TimingMode::HighSpeed => &LPF_LOOKUP_HS,
        };
        match self {
            Self::NoFilter => None,
            cutoff => Some(table[cutoff as usize]),
        }
    }
}

/// Sample timing of the system, which selects the filter table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimingMode {
    /// Standard servo rate, samples around 500 Hz.
    Normal,
    /// High-speed servo rate, samples around 2 kHz.
    #[default]
    HighSpeed,
}

// 5Hz, 10Hz, 21Hz, 44Hz, 94Hz, 184Hz, 260Hz
const LPF_LOOKUP: [f32; 7] = [16.92, 8.96, 4.79, 2.81, 1.85, 1.43, 1.31];
const LPF_LOOKUP_HS: [f32; 7] = [64.66, 32.83, 16.16, 8.23, 4.39, 2.73, 2.22];

/// Per-axis filter state; persists for the life of the accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GyroFilter {
    smooth: PerAxis<f32>,
}

impl GyroFilter {
    /// Creates a filter with all outputs at rest.
    pub const fn new() -> Self {
        Self { smooth: [0.0; 3] }
    }

    /// Filters one raw reading and returns the smoothed value truncated to `i16`.
    ///
    /// With `time_constant` of `None` the raw reading is stored and returned.
    pub fn apply(&mut self, axis: usize, raw: i16, time_constant: Option<f32>) -> i16 {
        let raw = raw as f32;
        let smooth = &mut self.smooth[axis];
        *smooth = match time_constant {
            Some(k) => (*smooth * (k - 1.0) + raw) / k,
            None => raw,
        };
        // Float to int casts saturate and truncate toward zero.
        *smooth as i16
    }

    /// Current smoothed value of an axis.
    pub fn smoothed(&self, axis: usize) -> f32 {
        self.smooth[axis]
    }
}
