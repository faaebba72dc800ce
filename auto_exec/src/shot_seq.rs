//! # Shot sequencer
//!
//! Fires a magazine of balls through the flicker:
//!
//! ```text
//! SpinningUp --spin-up expired--> fire --> Waiting --recovery expired--> fire --> Waiting ...
//! Waiting --magazine empty--> PostShotSettle --settle expired--> Done
//! ```
//!
//! The first shot waits for the (longer) spin-up delay, every following shot for the recovery
//! delay since the previous one. Starting with an empty magazine goes straight to the settle.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    eqpt::Servo,
    flicker::{DeferredAction, FlickerActuator},
    latch::TimedLatch,
    params::AutoParams,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Delays and thresholds used by the [`ShotSequencer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotTimings {
    pub spinup_ms: f64,
    pub recovery_ms: f64,
    pub settle_ms: f64,

    /// Once a shot leaves this many balls or fewer (but not zero) the flywheel velocity is
    /// cycled at the next flicker retraction.
    pub velocity_dip_threshold: u32,
}

#[derive(Debug, Clone)]
pub struct ShotSequencer {
    timings: ShotTimings,

    phase: ShotPhase,

    balls_remaining: u32,

    shots_fired: u32,

    spinup_latch: TimedLatch,
    recovery_latch: TimedLatch,
    settle_latch: TimedLatch,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotPhase {
    /// No volley has been started
    Idle,

    /// Waiting for the flywheels to reach speed before the first shot
    SpinningUp,

    /// Waiting for the flywheels to recover between shots
    Waiting,

    /// Waiting after the final shot
    PostShotSettle,

    Done,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl From<&AutoParams> for ShotTimings {
    fn from(params: &AutoParams) -> Self {
        Self {
            spinup_ms: params.flywheel_spinup_ms,
            recovery_ms: params.flywheel_recovery_ms,
            settle_ms: params.post_shot_delay_ms,
            velocity_dip_threshold: params.velocity_dip_threshold,
        }
    }
}

impl ShotSequencer {
    pub fn new(timings: ShotTimings) -> Self {
        Self {
            timings,
            phase: ShotPhase::Idle,
            balls_remaining: 0,
            shots_fired: 0,
            spinup_latch: TimedLatch::new(timings.spinup_ms),
            recovery_latch: TimedLatch::new(timings.recovery_ms),
            settle_latch: TimedLatch::new(timings.settle_ms),
        }
    }

    /// Start a new volley of `ball_count` shots, discarding any volley in progress.
    pub fn start(&mut self, now_ms: f64, ball_count: u32) {
        self.shots_fired = 0;
        self.balls_remaining = ball_count;

        if ball_count > 0 {
            self.spinup_latch.start(now_ms);
            self.phase = ShotPhase::SpinningUp;
        } else {
            self.settle_latch.start(now_ms);
            self.phase = ShotPhase::PostShotSettle;
        }

        debug!("Volley of {} started at {:.0} ms", ball_count, now_ms);
    }

    /// Cyclic processing. Returns true if a shot was fired during this cycle.
    ///
    /// A shot is only taken while the flicker is retracted, so each extension pushes one ball.
    pub fn tick<S: Servo>(&mut self, now_ms: f64, flicker: &mut FlickerActuator<S>) -> bool {
        match self.phase {
            ShotPhase::SpinningUp => {
                if self.spinup_latch.is_expired(now_ms) && !flicker.is_extended() {
                    self.fire(now_ms, flicker);
                    self.phase = ShotPhase::Waiting;
                    return true;
                }
            }
            ShotPhase::Waiting => {
                if self.balls_remaining == 0 {
                    self.settle_latch.start(now_ms);
                    self.phase = ShotPhase::PostShotSettle;
                } else if self.recovery_latch.is_expired(now_ms) && !flicker.is_extended() {
                    self.fire(now_ms, flicker);
                    return true;
                }
            }
            ShotPhase::PostShotSettle => {
                if self.settle_latch.is_expired(now_ms) {
                    debug!(
                        "Volley complete at {:.0} ms, {} shots fired",
                        now_ms, self.shots_fired
                    );
                    self.phase = ShotPhase::Done;
                }
            }
            ShotPhase::Idle | ShotPhase::Done => (),
        }

        false
    }

    pub fn is_done(&self) -> bool {
        self.phase == ShotPhase::Done
    }

    pub fn phase(&self) -> ShotPhase {
        self.phase
    }

    pub fn balls_remaining(&self) -> u32 {
        self.balls_remaining
    }

    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    fn fire<S: Servo>(&mut self, now_ms: f64, flicker: &mut FlickerActuator<S>) {
        flicker.extend(now_ms);

        self.balls_remaining = self.balls_remaining.saturating_sub(1);
        self.shots_fired += 1;
        self.recovery_latch.start(now_ms);

        if self.balls_remaining > 0 && self.balls_remaining <= self.timings.velocity_dip_threshold
        {
            flicker.request_deferred(DeferredAction::CycleFlywheel);
        }

        debug!(
            "Shot {} fired at {:.0} ms, {} remaining",
            self.shots_fired, now_ms, self.balls_remaining
        );
    }
}
