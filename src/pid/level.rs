// src/pid/level.rs

//! # Accelerometer Terms
//!
//! Proportional-only corrections derived from the accelerometer: auto-level
//! on Roll and Pitch, and vertical (height) damping in the Yaw slot.

use crate::scale::{constrain, LEVEL_SHIFT, MAX_ZGAIN, Z_ACC_SHIFT};

/// Leveling correction for one of Roll or Pitch.
///
/// `((angle - trim) * gain) >> 8`, where `angle` is the current attitude
/// estimate and `trim` the configured accelerometer trim.
pub fn level_correction(angle: i16, trim: i16, gain: i8) -> i32 {
    ((angle as i32 - trim as i32) * gain as i32) >> LEVEL_SHIFT
}

/// Vertical acceleration correction, bounded to `+/-MAX_ZGAIN`.
///
/// The averaged acceleration is negated so that a climb pushes back down.
pub fn vertical_correction(acc_average: i32, z_gain: i8) -> i32 {
    let correction = acc_average.saturating_neg().saturating_mul(z_gain as i32) >> Z_ACC_SHIFT;
    constrain(correction, MAX_ZGAIN)
}
