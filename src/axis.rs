// src/axis.rs

//! # Axes and Flight Profiles
//!
//! Index types shared by the accumulator, the engine and the configuration.
//! Every per-axis quantity is stored as a `[T; 3]` ordered Roll, Pitch, Yaw
//! and every per-profile quantity as a `[T; 2]` ordered P1, P2.

use serde::{Deserialize, Serialize};

/// Number of controlled axes (Roll, Pitch, Yaw).
pub const NUMBER_OF_AXES: usize = 3;

/// Number of flight profiles computed in parallel every cycle.
pub const FLIGHT_PROFILES: usize = 2;

/// One value per axis, ordered Roll, Pitch, Yaw.
pub type PerAxis<T> = [T; NUMBER_OF_AXES];

/// One value per flight profile, ordered P1, P2.
pub type PerProfile<T> = [T; FLIGHT_PROFILES];

/// A rotational axis of the airframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Rotation about the longitudinal axis.
    Roll = 0,
    /// Rotation about the lateral axis.
    Pitch = 1,
    /// Rotation about the vertical axis.
    Yaw = 2,
}

impl Axis {
    /// All axes in storage order.
    pub const ALL: [Axis; NUMBER_OF_AXES] = [Axis::Roll, Axis::Pitch, Axis::Yaw];

    /// Storage index of this axis.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Roll and Pitch carry an attitude angle and a leveling term; Yaw does not.
    pub const fn is_levelled(self) -> bool {
        !matches!(self, Axis::Yaw)
    }
}

/// One of the two independently tuned flight profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Profile {
    /// First profile, typically hover.
    P1 = 0,
    /// Second profile, typically forward flight.
    P2 = 1,
}

impl Profile {
    /// Both profiles in storage order.
    pub const ALL: [Profile; FLIGHT_PROFILES] = [Profile::P1, Profile::P2];

    /// Storage index of this profile.
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Pilot stick values already mapped onto the physical axes.
///
/// Gyro polarity on the board is right roll, up pitch and left yaw positive
/// while the sticks report right roll, down elevator and right yaw positive.
/// Only the aileron therefore needs to be reversed to oppose its gyro.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisSticks(pub PerAxis<i16>);

impl AxisSticks {
    /// Maps decoded RC aileron, elevator and rudder values onto the axes.
    pub fn from_rc(aileron: i16, elevator: i16, rudder: i16) -> Self {
        Self([aileron.saturating_neg(), elevator, rudder])
    }

    /// Stick value for the given axis.
    pub fn get(&self, axis: Axis) -> i16 {
        self.0[axis.index()]
    }
}
