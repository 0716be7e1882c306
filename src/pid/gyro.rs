// src/pid/gyro.rs

//! # Gyro PID Term
//!
//! Compute callback and control data for the integer gyro PID term. The
//! controller's gains are pre-scaled by the engine (`kp = P * 3`, `ki = 1`,
//! `kd = D * 2`) so that the callback only has to supply the raw inputs:
//!
//! - P input: the averaged angular rate of the cycle.
//! - I input: the heading-hold integral times the I gain, shifted down by
//!   [`I_TERM_SHIFT`] and clamped to the I-term output limit.
//! - D input: the derivative selected by [`DerivativeMode`].
//!
//! The controller stores the P input as its `error`, so
//! [`DerivativeMode::DifferenceOfAverages`] reads the previous cycle's
//! averaged rate from there.

use piddiy::PidController;

use crate::config::DerivativeMode;
use crate::scale::{constrain, I_TERM_SHIFT};

/// Control data for the gyro PID compute callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GyroTermData {
    /// Averaged filtered angular rate of the cycle.
    pub rate: i32,
    /// Averaged per-sample rate difference of the cycle.
    pub derivative: i32,
    /// Heading-hold integral of this axis and profile.
    pub integral: i32,
    /// I gain applied to the integral.
    pub i_gain: i32,
    /// Symmetric bound of the I-term after its gain.
    pub i_limit: i32,
    /// Derivative strategy.
    pub mode: DerivativeMode,
}

/// Gyro PID compute callback.
pub fn compute_gyro(
    pid: &mut PidController<i32, GyroTermData>,
    data: GyroTermData,
) -> (i32, i32, i32) {
    let integral = constrain(
        data.integral.saturating_mul(data.i_gain) >> I_TERM_SHIFT,
        data.i_limit,
    );
    let derivative = match data.mode {
        DerivativeMode::AveragedRawDifference => data.derivative,
        DerivativeMode::DifferenceOfAverages => data.rate - pid.error,
    };

    (data.rate, integral, derivative)
}
