// src/scale.rs

//! # Fixed-Point Scale Factors
//!
//! Every shift and multiplier of the integer PID pipeline lives here under a
//! name, together with the designed maxima of the configurable inputs. The
//! compile-time checks at the bottom of this module prove that the `i32`
//! intermediates cannot overflow once the configuration has been sanitized.
//!
//! Servo output spans +/-1250 around center after the mixer rescales the
//! PID result by 1/64, so the largest useful pre-scale value is +/-80,000.

use num_traits::{Bounded, NumCast};

/// Timer 1 frequency; elapsed time is measured in these ticks.
pub const TIMER_TICKS_PER_SECOND: u32 = 2_500_000;

/// Reference control loop rate the integral scaling is normalized to.
pub const NOMINAL_LOOP_HZ: u32 = 700;

/// Timer ticks of the reference 700 Hz control cycle.
pub const NOMINAL_LOOP_TICKS: f32 = (TIMER_TICKS_PER_SECOND / NOMINAL_LOOP_HZ) as f32;

/// Largest stick rate code, the fastest heading-hold authority (divide by 4).
pub const MAX_STICK_RATE: u8 = 4;

/// Right shift applied to the stick for rate code zero (divide by 64).
///
/// Code `n` shifts by `4 - (n - 2)`, i.e. `STICK_SHIFT_AT_RATE_ZERO - n`.
pub const STICK_SHIFT_AT_RATE_ZERO: u8 = 6;

/// Multiplier applied to the seeded P accumulator.
pub const P_TERM_MULTIPLIER: i32 = 3;

/// Right shift applied to the I-term after the gain (divide by 32).
pub const I_TERM_SHIFT: u32 = 5;

/// Multiplier applied to the D-term after the gain.
pub const D_TERM_MULTIPLIER: i32 = 2;

/// Left shift applied to the yaw trim before seeding the yaw P accumulator.
pub const YAW_TRIM_SHIFT: u32 = 6;

/// Right shift from the summed P+I+D value to the gyro correction (divide by 64).
pub const PID_SCALE: u32 = 6;

/// Right shift from the trimmed angle times gain to the leveling correction.
pub const LEVEL_SHIFT: u32 = 8;

/// Right shift moderating the vertical acceleration correction (divide by 16).
pub const Z_ACC_SHIFT: u32 = 4;

/// Symmetric bound of the vertical acceleration (height damping) correction.
pub const MAX_ZGAIN: i32 = 500;

/// Largest magnitude of any configured gain.
pub const MAX_GAIN: i8 = 127;

/// Largest menu I-term limit, in percent of full authority.
pub const MAX_LIMIT_PERCENT: u8 = 125;

/// Raw I-term output limit per percent: 125% maps onto the full +/-80,000.
pub const I_LIMIT_PER_PERCENT: i32 = 640;

/// Raw I-term constrain limit per percent: 125% maps just under +/-20,157,
/// the integral that reaches full authority at the maximum I gain.
pub const I_CONSTRAIN_PER_PERCENT: i32 = 161;

/// Largest accepted I-term output limit.
pub const MAX_I_OUTPUT_LIMIT: i32 = MAX_LIMIT_PERCENT as i32 * I_LIMIT_PER_PERCENT;

/// Largest accepted I-term constrain limit; the integral times any gain fits `i32`.
pub const MAX_I_CONSTRAIN: i32 = i32::MAX / MAX_GAIN as i32;

/// Narrows `value` into `T`, saturating at the bounds of `T`.
///
/// Returns `Ok` when the value fits and `Err` holding the saturated value
/// when it does not, so that callers can record the overflow.
pub fn saturate<T>(value: i32) -> Result<T, T>
where
    T: Bounded + NumCast,
{
    match <T as NumCast>::from(value) {
        Some(narrowed) => Ok(narrowed),
        None if value < 0 => Err(T::min_value()),
        None => Err(T::max_value()),
    }
}

/// Clamps `value` into `[-limit, +limit]`.
///
/// A negative `limit` is treated as its magnitude.
pub fn constrain(value: i32, limit: i32) -> i32 {
    let limit = limit.saturating_abs();
    if value > limit {
        limit
    } else if value < -limit {
        -limit
    } else {
        value
    }
}

// Headroom of the per-axis gyro sum with every input at its sanitized extreme.
const MAX_RATE: i64 = -(i16::MIN as i64);
const MAX_DERIVATIVE: i64 = i16::MAX as i64 - i16::MIN as i64;
const MAX_SEED: i64 = -(i8::MIN as i64) << YAW_TRIM_SHIFT;
const MAX_P_TERM: i64 = (MAX_SEED + MAX_RATE * MAX_GAIN as i64) * P_TERM_MULTIPLIER as i64;
const MAX_D_TERM: i64 = MAX_DERIVATIVE * MAX_GAIN as i64 * D_TERM_MULTIPLIER as i64;
const _: () = assert!(MAX_P_TERM + MAX_D_TERM + MAX_I_OUTPUT_LIMIT as i64 <= i32::MAX as i64);
const _: () = assert!(MAX_I_CONSTRAIN as i64 * MAX_GAIN as i64 <= i32::MAX as i64);
const _: () = assert!(MAX_DERIVATIVE * MAX_GAIN as i64 <= i32::MAX as i64);
