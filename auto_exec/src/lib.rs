//! # Autonomous routine library.
//!
//! This library allows the executable (and the tests) to access the components of the
//! autonomous routine.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Autonomy manager - runs the routine's steps one cycle at a time
pub mod auto_mgr;

/// Equipment interfaces - the hardware capabilities the routine drives
pub mod eqpt;

/// Flicker actuator - pushes balls into the flywheels
pub mod flicker;

/// Timed latch - elapsed time threshold used by all timed behaviour
pub mod latch;

/// Parameters of the routine
pub mod params;

/// Poses and straight line paths in the field frame
pub mod path;

/// The blue alliance routine
pub mod routine;

/// Shooter and intake - the flywheels and intake roller
pub mod shooter;

/// Shot sequencer - fires a magazine of balls with the correct spacing
pub mod shot_seq;

/// Simulated hardware
pub mod sim;

/// Step sequencer - generic ordered step runner
pub mod step_seq;
