//! # Shooter and intake
//!
//! Owners of the flywheel pair and of the intake roller.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;

use crate::eqpt::{PowerMotor, VelocityMotor};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Dual flywheel shooter.
pub struct Shooter<M> {
    left: M,
    right: M,
    target_velocity: f64,
}

/// Single roller intake.
pub struct Intake<P> {
    roller: P,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<M: VelocityMotor> Shooter<M> {
    pub fn new(left: M, right: M, target_velocity: f64) -> Self {
        Self {
            left,
            right,
            target_velocity,
        }
    }

    /// Demand the target velocity on both flywheels.
    pub fn spin_up(&mut self) {
        debug!("Flywheels spinning up to {}", self.target_velocity);
        self.set_velocity(self.target_velocity);
    }

    /// Demand zero velocity on both flywheels.
    pub fn shutdown(&mut self) {
        debug!("Flywheels shut down");
        self.set_velocity(0.0);
    }

    /// Command a zero velocity demand, then re-assert the target velocity in the same call.
    pub fn cycle_velocity(&mut self) {
        debug!("Flywheel velocity cycled");
        self.set_velocity(0.0);
        self.set_velocity(self.target_velocity);
    }

    /// Measured (left, right) flywheel velocities.
    pub fn velocities(&self) -> (f64, f64) {
        (self.left.get_velocity(), self.right.get_velocity())
    }

    fn set_velocity(&mut self, velocity: f64) {
        self.left.set_velocity(velocity);
        self.right.set_velocity(velocity);
    }
}

impl<P: PowerMotor> Intake<P> {
    pub fn new(roller: P) -> Self {
        Self { roller }
    }

    pub fn set_running(&mut self, running: bool) {
        self.roller.set_power(if running { 1.0 } else { 0.0 });
    }

    pub fn power(&self) -> f64 {
        self.roller.get_power()
    }
}
