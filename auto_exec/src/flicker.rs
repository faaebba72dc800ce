//! # Flicker actuator
//!
//! The flicker is a pair of servos that briefly extend to push a ball into the spinning
//! flywheels and then retract. It is a two state machine, [`FlickerState::Retracted`] and
//! [`FlickerState::Extended`], timed by a [`TimedLatch`].
//!
//! A [`DeferredAction`] may be requested at any time. It is held until the next retraction and
//! then handed back to the caller of [`FlickerActuator::tick`] exactly once. The flicker does not
//! perform the action itself since the outputs it touches belong to other components.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, trace};

use crate::{eqpt::Servo, latch::TimedLatch, params::FlickerPoses};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct FlickerActuator<S> {
    servos: Vec<(S, FlickerPoses)>,

    state: FlickerState,

    /// Started on extension, retraction happens once it expires
    extend_latch: TimedLatch,

    pending: Option<DeferredAction>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlickerState {
    Retracted,
    Extended,
}

/// Actions which can be deferred until the flicker next retracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    /// Drop the flywheel velocity demand to zero, then restore the target velocity.
    CycleFlywheel,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<S: Servo> FlickerActuator<S> {
    /// Create a new flicker from its servos and their poses, all servos are commanded to their
    /// retracted pose.
    pub fn new(servos: Vec<(S, FlickerPoses)>, extend_ms: f64) -> Self {
        let mut flicker = Self {
            servos,
            state: FlickerState::Retracted,
            extend_latch: TimedLatch::new(extend_ms),
            pending: None,
        };

        flicker.retract_now();

        flicker
    }

    /// Extend the flicker. Ignored while already extended, in which case the retraction time is
    /// not moved and `false` is returned.
    pub fn extend(&mut self, now_ms: f64) -> bool {
        if self.state == FlickerState::Extended {
            debug!("Flicker already extended, extend request ignored");
            return false;
        }

        for (servo, poses) in self.servos.iter_mut() {
            servo.set_position(clamp_unit(poses.extended));
        }

        self.extend_latch.start(now_ms);
        self.state = FlickerState::Extended;

        trace!("Flicker extended at {:.0} ms", now_ms);

        true
    }

    /// Cyclic processing, must be called every cycle whatever the routine is doing.
    ///
    /// Returns the pending deferred action on the cycle the flicker retracts, if there is one.
    pub fn tick(&mut self, now_ms: f64) -> Option<DeferredAction> {
        if self.state != FlickerState::Extended || !self.extend_latch.is_expired(now_ms) {
            return None;
        }

        self.command_retracted();
        self.state = FlickerState::Retracted;

        trace!("Flicker retracted at {:.0} ms", now_ms);

        self.pending.take()
    }

    /// Request an action to be returned at the next retraction. A second request before then
    /// replaces the first.
    pub fn request_deferred(&mut self, action: DeferredAction) {
        self.pending = Some(action);
    }

    /// Immediately retract, dropping any pending action.
    pub fn retract_now(&mut self) {
        self.command_retracted();
        self.state = FlickerState::Retracted;
        self.pending = None;
    }

    pub fn state(&self) -> FlickerState {
        self.state
    }

    pub fn is_extended(&self) -> bool {
        self.state == FlickerState::Extended
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Time until the flicker retracts, `None` when retracted.
    pub fn remaining_ms(&self, now_ms: f64) -> Option<f64> {
        match self.state {
            FlickerState::Extended => Some(self.extend_latch.remaining_ms(now_ms)),
            FlickerState::Retracted => None,
        }
    }

    fn command_retracted(&mut self) {
        for (servo, poses) in self.servos.iter_mut() {
            servo.set_position(clamp_unit(poses.retracted));
        }
    }
}

fn clamp_unit(position: f64) -> f64 {
    position.max(0.0).min(1.0)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::SimServo;

    const LEFT: FlickerPoses = FlickerPoses {
        retracted: 0.677,
        extended: 0.78,
    };
    const RIGHT: FlickerPoses = FlickerPoses {
        retracted: 0.515,
        extended: 0.384,
    };

    fn flicker() -> (FlickerActuator<SimServo>, SimServo, SimServo) {
        let left = SimServo::new();
        let right = SimServo::new();
        let f = FlickerActuator::new(vec![(left.clone(), LEFT), (right.clone(), RIGHT)], 200.0);
        (f, left, right)
    }

    #[test]
    fn test_extend_then_retract_once() {
        let (mut f, left, right) = flicker();
        assert_eq!(left.position(), LEFT.retracted);
        assert_eq!(right.position(), RIGHT.retracted);

        assert!(f.extend(1000.0));
        assert!(f.is_extended());
        assert_eq!(left.position(), LEFT.extended);
        assert_eq!(right.position(), RIGHT.extended);

        // Shorter than the extend time keeps it out
        for t in (1000..1200).step_by(20) {
            f.tick(t as f64);
            assert!(f.is_extended());
        }

        f.tick(1200.0);
        assert_eq!(f.state(), FlickerState::Retracted);
        assert_eq!(left.position(), LEFT.retracted);

        // Further ticks do not command the servos again
        let commands = left.num_commands();
        for t in (1220..2000).step_by(20) {
            f.tick(t as f64);
        }
        assert_eq!(left.num_commands(), commands);
    }

    #[test]
    fn test_reentrant_extend_ignored() {
        let (mut f, _, _) = flicker();
        assert!(f.extend(0.0));
        assert!(!f.extend(150.0));

        // Retraction still happens relative to the first extension
        assert_eq!(f.remaining_ms(150.0), Some(50.0));
        f.tick(200.0);
        assert!(!f.is_extended());
        assert_eq!(f.remaining_ms(200.0), None);
    }

    #[test]
    fn test_deferred_action_on_retraction() {
        let (mut f, _, _) = flicker();
        f.extend(0.0);
        f.request_deferred(DeferredAction::CycleFlywheel);

        assert_eq!(f.tick(100.0), None);
        assert_eq!(f.tick(199.0), None);
        assert!(f.has_pending());
        assert_eq!(f.tick(200.0), Some(DeferredAction::CycleFlywheel));
        assert!(!f.has_pending());
        assert_eq!(f.tick(220.0), None);

        // Next cycle without a request yields nothing
        f.extend(300.0);
        assert_eq!(f.tick(500.0), None);
    }

    #[test]
    fn test_deferred_action_waits_for_next_cycle() {
        let (mut f, _, _) = flicker();

        // Requested while retracted, so held until the next retraction
        f.request_deferred(DeferredAction::CycleFlywheel);
        assert_eq!(f.tick(1000.0), None);

        f.extend(1000.0);
        assert_eq!(f.tick(1200.0), Some(DeferredAction::CycleFlywheel));
    }

    #[test]
    fn test_retract_now_drops_pending() {
        let (mut f, left, _) = flicker();
        f.extend(0.0);
        f.request_deferred(DeferredAction::CycleFlywheel);

        f.retract_now();
        assert!(!f.is_extended());
        assert!(!f.has_pending());
        assert_eq!(left.position(), LEFT.retracted);
        assert_eq!(f.tick(500.0), None);
    }
}
