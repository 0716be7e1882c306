// src/test_utils.rs

//! This module contains utilities for testing.

/// A constant defining the tolerance within which floating-point values
/// are considered close enough to be equal.
pub const TEST_TOLERANCE: f32 = 1e-5;

/// Elapsed timer ticks of one nominal 700 Hz control cycle.
pub const NOMINAL_TICKS: u32 = 3571;

/// Checks if two floating point numbers are close enough to be considered
/// equal.
///
/// # Arguments
/// * `target` - The target value.
/// * `value` - The value to compare against the target.
///
/// # Returns
/// `true` if the absolute difference between `target` and `value` is less than
/// `TEST_TOLERANCE`, otherwise `false`.
pub fn value_close(target: f32, value: f32) -> bool {
    (target - value).abs() < TEST_TOLERANCE
}

/// Checks if two fixed-point integers are within `tolerance` of each other.
///
/// # Arguments
/// * `target` - The target value.
/// * `value` - The value to compare against the target.
/// * `tolerance` - The largest accepted absolute difference.
///
/// # Returns
/// `true` if the absolute difference between `target` and `value` does not
/// exceed `tolerance`, otherwise `false`.
pub fn int_close(target: i32, value: i32, tolerance: i32) -> bool {
    (target as i64 - value as i64).abs() <= tolerance as i64
}
