//! # Equipment interfaces
//!
//! Capabilities the autonomous routine needs from the robot's hardware. The routine never talks
//! to a vendor SDK directly, each physical output is reached through one of these traits and is
//! owned by exactly one component.

use crate::path::{Path, Pose};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Path following engine.
pub trait Follower {
    /// Start following the path. If `hold_end` is set the follower keeps correcting onto the end
    /// pose after it arrives.
    fn follow_path(&mut self, path: &Path, hold_end: bool);

    /// Returns true while the follower is still travelling along a path.
    fn is_busy(&self) -> bool;

    /// Limit the drive power, between 0 and 1.
    fn set_max_power(&mut self, power: f64);

    /// Current pose estimate.
    fn get_pose(&self) -> Pose;

    /// Update localisation and drive outputs, must be called once per cycle.
    fn update(&mut self);
}

/// Motor under closed loop velocity control.
pub trait VelocityMotor {
    fn set_velocity(&mut self, velocity: f64);

    fn get_velocity(&self) -> f64;
}

/// Positional servo.
pub trait Servo {
    /// Set the servo position, which must be within `[0, 1]`.
    fn set_position(&mut self, position: f64);
}

/// Motor under open loop power control.
pub trait PowerMotor {
    /// Set the motor power, which must be within `[-1, 1]`.
    fn set_power(&mut self, power: f64);

    fn get_power(&self) -> f64;
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T: Follower + ?Sized> Follower for Box<T> {
    fn follow_path(&mut self, path: &Path, hold_end: bool) {
        (**self).follow_path(path, hold_end)
    }

    fn is_busy(&self) -> bool {
        (**self).is_busy()
    }

    fn set_max_power(&mut self, power: f64) {
        (**self).set_max_power(power)
    }

    fn get_pose(&self) -> Pose {
        (**self).get_pose()
    }

    fn update(&mut self) {
        (**self).update()
    }
}

impl<T: VelocityMotor + ?Sized> VelocityMotor for Box<T> {
    fn set_velocity(&mut self, velocity: f64) {
        (**self).set_velocity(velocity)
    }

    fn get_velocity(&self) -> f64 {
        (**self).get_velocity()
    }
}

impl<T: Servo + ?Sized> Servo for Box<T> {
    fn set_position(&mut self, position: f64) {
        (**self).set_position(position)
    }
}

impl<T: PowerMotor + ?Sized> PowerMotor for Box<T> {
    fn set_power(&mut self, power: f64) {
        (**self).set_power(power)
    }

    fn get_power(&self) -> f64 {
        (**self).get_power()
    }
}
