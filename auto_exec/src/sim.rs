//! # Simulated hardware
//!
//! Stand-ins for the robot's hardware, used by the executable when no real robot is attached and
//! by the tests. Every device is a cheap handle onto shared state, so a clone kept outside the
//! routine observes exactly what the routine commanded.
//!
//! The models are deliberately ideal: motors reach their demand instantly and the follower drives
//! along the path at a constant speed scaled by its max power.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use crate::{
    eqpt::{Follower, PowerMotor, Servo, VelocityMotor},
    path::{Path, Pose},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Speed of the simulated follower at full power.
///
/// Units: inches/second
pub const SIM_FULL_SPEED_INS: f64 = 50.0;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Simulation time source shared between the executable and the simulated devices.
#[derive(Debug, Clone, Default)]
pub struct SimClock(Rc<Cell<f64>>);

#[derive(Debug, Clone, Default)]
pub struct SimServo {
    position: Rc<Cell<f64>>,
    num_commands: Rc<Cell<usize>>,
}

#[derive(Debug, Clone, Default)]
pub struct SimVelocityMotor {
    /// Every velocity demand in the order it was made
    demands: Rc<RefCell<Vec<f64>>>,
}

#[derive(Debug, Clone, Default)]
pub struct SimPowerMotor {
    power: Rc<Cell<f64>>,
}

#[derive(Debug, Clone)]
pub struct SimFollower {
    clock: SimClock,
    state: Rc<RefCell<SimFollowerState>>,
}

#[derive(Debug)]
struct SimFollowerState {
    pose: Pose,
    max_power: f64,
    active: Option<ActivePath>,
    num_paths: usize,
}

#[derive(Debug)]
struct ActivePath {
    path: Path,
    start_ms: f64,
    arrived: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ms(&self, now_ms: f64) {
        self.0.set(now_ms)
    }

    pub fn now_ms(&self) -> f64 {
        self.0.get()
    }
}

impl SimServo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self) -> f64 {
        self.position.get()
    }

    /// Number of position commands received.
    pub fn num_commands(&self) -> usize {
        self.num_commands.get()
    }
}

impl Servo for SimServo {
    fn set_position(&mut self, position: f64) {
        self.position.set(position.max(0.0).min(1.0));
        self.num_commands.set(self.num_commands.get() + 1);
    }
}

impl SimVelocityMotor {
    pub fn new() -> Self {
        Self::default()
    }

    /// All velocity demands made so far.
    pub fn demands(&self) -> Vec<f64> {
        self.demands.borrow().clone()
    }
}

impl VelocityMotor for SimVelocityMotor {
    fn set_velocity(&mut self, velocity: f64) {
        self.demands.borrow_mut().push(velocity);
    }

    fn get_velocity(&self) -> f64 {
        self.demands.borrow().last().copied().unwrap_or(0.0)
    }
}

impl SimPowerMotor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PowerMotor for SimPowerMotor {
    fn set_power(&mut self, power: f64) {
        self.power.set(power.max(-1.0).min(1.0))
    }

    fn get_power(&self) -> f64 {
        self.power.get()
    }
}

impl SimFollower {
    pub fn new(clock: SimClock, start_pose: Pose) -> Self {
        Self {
            clock,
            state: Rc::new(RefCell::new(SimFollowerState {
                pose: start_pose,
                max_power: 1.0,
                active: None,
                num_paths: 0,
            })),
        }
    }

    /// Number of paths the follower has been asked to follow.
    pub fn num_paths(&self) -> usize {
        self.state.borrow().num_paths
    }

    pub fn max_power(&self) -> f64 {
        self.state.borrow().max_power
    }

    /// Time needed to drive the path at the given max power.
    pub fn travel_time_ms(path: &Path, max_power: f64) -> f64 {
        let speed_ins = SIM_FULL_SPEED_INS * max_power;
        if speed_ins <= 0.0 {
            return std::f64::INFINITY;
        }
        path.length_in() / speed_ins * 1000.0
    }
}

impl Follower for SimFollower {
    fn follow_path(&mut self, path: &Path, _hold_end: bool) {
        let mut state = self.state.borrow_mut();
        state.active = Some(ActivePath {
            path: *path,
            start_ms: self.clock.now_ms(),
            arrived: false,
        });
        state.num_paths += 1;
    }

    fn is_busy(&self) -> bool {
        match self.state.borrow().active {
            Some(ref a) => !a.arrived,
            None => false,
        }
    }

    fn set_max_power(&mut self, power: f64) {
        self.state.borrow_mut().max_power = power.max(0.0).min(1.0);
    }

    fn get_pose(&self) -> Pose {
        self.state.borrow().pose
    }

    fn update(&mut self) {
        let now_ms = self.clock.now_ms();
        let mut state = self.state.borrow_mut();
        let max_power = state.max_power;

        let pose = match state.active {
            Some(ref mut a) if !a.arrived => {
                let travel_ms = Self::travel_time_ms(&a.path, max_power);
                let elapsed_ms = now_ms - a.start_ms;

                if elapsed_ms >= travel_ms {
                    a.arrived = true;
                    a.path.end
                } else {
                    a.path.pose_at(elapsed_ms / travel_ms)
                }
            }
            _ => return,
        };

        state.pose = pose;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_sim_follower_travel() {
        let clock = SimClock::new();
        let mut follower = SimFollower::new(clock.clone(), Pose::new(0.0, 0.0, 0.0));

        // 100 in at half power takes 4 s
        let path = Path::line((0.0, 0.0), (100.0, 0.0), 0.0, 90.0);
        follower.set_max_power(0.5);
        follower.follow_path(&path, true);
        assert!(follower.is_busy());

        clock.set_ms(2000.0);
        follower.update();
        assert!(follower.is_busy());
        assert!((follower.get_pose().x() - 50.0).abs() < 1e-9);

        clock.set_ms(4000.0);
        follower.update();
        assert!(!follower.is_busy());
        assert_eq!(follower.get_pose(), path.end);
        assert_eq!(follower.num_paths(), 1);
    }

    #[test]
    fn test_sim_motors() {
        let mut wheel = SimVelocityMotor::new();
        let handle = wheel.clone();
        wheel.set_velocity(1200.0);
        wheel.set_velocity(0.0);
        assert_eq!(handle.demands(), vec![1200.0, 0.0]);
        assert_eq!(handle.get_velocity(), 0.0);

        let mut roller = SimPowerMotor::new();
        roller.set_power(3.0);
        assert_eq!(roller.get_power(), 1.0);
    }
}
