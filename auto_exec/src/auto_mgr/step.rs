//! # Autonomous routine steps

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;

use super::AutoCtx;
use crate::{path::Path, step_seq::Step};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A step of the autonomous routine.
#[derive(Debug, Clone)]
pub enum AutoStep {
    /// Drive a path, complete once the follower has arrived.
    Follow {
        label: String,
        path: Path,
        max_power: f64,
        on_enter: Vec<EnterAction>,
    },

    /// Fire a full volley, complete once the shot sequencer has settled.
    ShootAll {
        label: String,
        ball_count: u32,
        on_enter: Vec<EnterAction>,
    },

    /// Final step, stops the intake and completes immediately.
    Park { label: String },
}

/// Actuator commands a step may issue when it is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterAction {
    SpinUpFlywheel,
    ShutdownFlywheel,
    IntakeOn,
    IntakeOff,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AutoStep {
    pub fn follow(label: &str, path: Path, max_power: f64, on_enter: Vec<EnterAction>) -> Self {
        AutoStep::Follow {
            label: label.into(),
            path,
            max_power,
            on_enter,
        }
    }

    pub fn shoot_all(label: &str, ball_count: u32, on_enter: Vec<EnterAction>) -> Self {
        AutoStep::ShootAll {
            label: label.into(),
            ball_count,
            on_enter,
        }
    }

    pub fn park(label: &str) -> Self {
        AutoStep::Park {
            label: label.into(),
        }
    }

    /// Actions run when the step is entered.
    pub fn on_enter(&self) -> &[EnterAction] {
        match self {
            AutoStep::Follow { on_enter, .. } | AutoStep::ShootAll { on_enter, .. } => {
                on_enter.as_slice()
            }
            AutoStep::Park { .. } => &[],
        }
    }
}

impl Step<AutoCtx> for AutoStep {
    fn enter(&mut self, ctx: &mut AutoCtx, now_ms: f64) {
        match self {
            AutoStep::Follow {
                path,
                max_power,
                on_enter,
                ..
            } => {
                ctx.follower.set_max_power(*max_power);
                ctx.follower.follow_path(path, true);
                for action in on_enter.iter() {
                    ctx.apply(*action);
                }
            }
            AutoStep::ShootAll {
                ball_count,
                on_enter,
                ..
            } => {
                for action in on_enter.iter() {
                    ctx.apply(*action);
                }
                ctx.shots.start(now_ms, *ball_count);
            }
            AutoStep::Park { .. } => (),
        }

        debug!("Entered step \"{}\" at {:.0} ms", self.label(), now_ms);
    }

    fn is_done(&mut self, ctx: &mut AutoCtx, now_ms: f64) -> bool {
        match self {
            AutoStep::Follow { .. } => !ctx.follower.is_busy(),
            AutoStep::ShootAll { .. } => {
                ctx.shots.tick(now_ms, &mut ctx.flicker);
                ctx.shots.is_done()
            }
            AutoStep::Park { .. } => {
                ctx.intake.set_running(false);
                true
            }
        }
    }

    fn label(&self) -> &str {
        match self {
            AutoStep::Follow { label, .. }
            | AutoStep::ShootAll { label, .. }
            | AutoStep::Park { label } => label,
        }
    }
}
