//! # Autonomous Routine Parameters
//!
//! Timings, speeds and actuator poses used by the autonomous routine. The defaults are the
//! competition values, a TOML file in `params/` may override any of them.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoParams {
    /// Period of one control cycle of the executable.
    ///
    /// Units: milliseconds
    pub cycle_period_ms: f64,

    /// Velocity demanded of both flywheels while spun up.
    ///
    /// Units: encoder ticks/second
    pub flywheel_target_velocity: f64,

    /// Time the flywheels are given to reach speed before the first shot of a volley.
    ///
    /// Units: milliseconds
    pub flywheel_spinup_ms: f64,

    /// Time between consecutive shots, allowing the flywheel to restabilise.
    ///
    /// Units: milliseconds
    pub flywheel_recovery_ms: f64,

    /// Time the flicker is held extended before retracting.
    ///
    /// Units: milliseconds
    pub flicker_extend_ms: f64,

    /// Time waited after the last shot before the volley is considered complete.
    ///
    /// Units: milliseconds
    pub post_shot_delay_ms: f64,

    /// Once this many balls (or fewer, but not zero) remain, the flywheel velocity is cycled when
    /// the flicker next retracts.
    pub velocity_dip_threshold: u32,

    /// Number of balls loaded for each volley.
    pub ball_count: u32,

    /// Follower maximum power used while sweeping a row with the intake running.
    pub intake_sweep_speed: f64,

    /// Follower maximum power used for all other paths.
    pub full_speed: f64,

    /// Servo poses for the left flicker.
    pub left_flicker: FlickerPoses,

    /// Servo poses for the right flicker.
    pub right_flicker: FlickerPoses,
}

/// Retracted and extended positions of one flicker servo, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlickerPoses {
    pub retracted: f64,
    pub extended: f64,
}

/// A parameter which failed validation.
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    #[error("{0} must be a finite, non-negative duration, found {1} ms")]
    InvalidDuration(&'static str, f64),

    #[error("{0} must be within [0, 1], found {1}")]
    OutOfUnitRange(&'static str, f64),

    #[error("The cycle period must be greater than zero, found {0} ms")]
    InvalidCyclePeriod(f64),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for AutoParams {
    fn default() -> Self {
        Self {
            cycle_period_ms: 20.0,
            flywheel_target_velocity: 1200.0,
            flywheel_spinup_ms: 1000.0,
            flywheel_recovery_ms: 1200.0,
            flicker_extend_ms: 200.0,
            post_shot_delay_ms: 300.0,
            velocity_dip_threshold: 2,
            ball_count: 3,
            intake_sweep_speed: 0.45,
            full_speed: 1.0,
            left_flicker: FlickerPoses {
                retracted: 0.677,
                extended: 0.78,
            },
            right_flicker: FlickerPoses {
                retracted: 0.515,
                extended: 0.384,
            },
        }
    }
}

impl AutoParams {
    /// Check that every parameter is within its physical range.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if !(self.cycle_period_ms > 0.0) {
            return Err(ParamsError::InvalidCyclePeriod(self.cycle_period_ms));
        }

        let durations = [
            ("flywheel_spinup_ms", self.flywheel_spinup_ms),
            ("flywheel_recovery_ms", self.flywheel_recovery_ms),
            ("flicker_extend_ms", self.flicker_extend_ms),
            ("post_shot_delay_ms", self.post_shot_delay_ms),
        ];
        for &(name, value) in durations.iter() {
            if !value.is_finite() || value < 0.0 {
                return Err(ParamsError::InvalidDuration(name, value));
            }
        }

        let unit_values = [
            ("intake_sweep_speed", self.intake_sweep_speed),
            ("full_speed", self.full_speed),
            ("left_flicker.retracted", self.left_flicker.retracted),
            ("left_flicker.extended", self.left_flicker.extended),
            ("right_flicker.retracted", self.right_flicker.retracted),
            ("right_flicker.extended", self.right_flicker.extended),
        ];
        for &(name, value) in unit_values.iter() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ParamsError::OutOfUnitRange(name, value));
            }
        }

        Ok(())
    }
}
