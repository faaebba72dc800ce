//! # AutoMgr module
//!
//! This module implements the [`AutoMgr`], which runs the autonomous routine one cycle at a time.
//! Each cycle it:
//!
//! 1. updates the path follower,
//! 2. ticks the flicker, applying any deferred action it hands back to the shooter,
//! 3. ticks the [`StepSequencer`], whose shooting steps drive the [`ShotSequencer`],
//! 4. produces an [`AutoTm`] snapshot.
//!
//! Everything the steps act on lives in the [`AutoCtx`], which owns each piece of hardware
//! through exactly one component.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod step;
pub mod tm;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::path::Path;

use log::{info, warn};
use util::module::State;

pub use self::{
    step::{AutoStep, EnterAction},
    tm::{AutoTm, LogTmSink, TmSink},
};
use crate::{
    eqpt::{Follower, PowerMotor, Servo, VelocityMotor},
    flicker::{DeferredAction, FlickerActuator},
    params::{AutoParams, ParamsError},
    shooter::{Intake, Shooter},
    shot_seq::{ShotSequencer, ShotTimings},
    step_seq::{SeqEvent, SequencerError, Step, StepSequencer},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Autonomy Manager
///
/// Owns the routine's step sequence and everything the steps act on.
pub struct AutoMgr {
    params: AutoParams,

    ctx: AutoCtx,

    sequencer: StepSequencer<AutoStep>,

    /// Time at which the autonomous period started, `None` before `init`.
    start_ms: Option<f64>,

    aborted: bool,
}

/// The hardware handed to the [`AutoMgr`].
pub struct Hardware {
    pub follower: Box<dyn Follower>,
    pub left_flywheel: Box<dyn VelocityMotor>,
    pub right_flywheel: Box<dyn VelocityMotor>,
    pub left_flicker: Box<dyn Servo>,
    pub right_flicker: Box<dyn Servo>,
    pub intake: Box<dyn PowerMotor>,
}

/// Everything the routine's steps act on.
pub struct AutoCtx {
    pub follower: Box<dyn Follower>,
    pub shooter: Shooter<Box<dyn VelocityMotor>>,
    pub flicker: FlickerActuator<Box<dyn Servo>>,
    pub intake: Intake<Box<dyn PowerMotor>>,
    pub shots: ShotSequencer,
}

/// Input data for one cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoInput {
    /// Current time, on the same clock as the start time given to `init`.
    ///
    /// Units: milliseconds
    pub time_ms: f64,
}

/// Status report for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoStatus {
    /// What the step sequencer did this cycle
    pub event: SeqEvent,

    /// Deferred action applied on this cycle, if the flicker retracted with one pending
    pub deferred_action: Option<DeferredAction>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors that can occur in the autonomy manager.
#[derive(Debug, thiserror::Error)]
pub enum AutoMgrError {
    #[error("Failed to load AutoParams: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid AutoParams: {0}")]
    InvalidParams(ParamsError),

    #[error("Cannot build the step sequence: {0}")]
    SequencerError(SequencerError),

    #[error("The autonomous period has not been started")]
    NotStarted,

    #[error("The autonomous period has already been started")]
    AlreadyStarted,

    #[error("The routine has been aborted and cannot be started")]
    Aborted,
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Load and validate the routine's parameters, from `path` if given or from `auto.toml` in the
/// software root's params directory otherwise.
pub fn load_params(path: Option<&Path>) -> Result<AutoParams, AutoMgrError> {
    let params: AutoParams = match path {
        Some(p) => util::params::load_from_path(p),
        None => util::params::load("auto.toml"),
    }
    .map_err(AutoMgrError::ParamLoadError)?;

    params.validate().map_err(AutoMgrError::InvalidParams)?;

    Ok(params)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl AutoMgr {
    /// Create a new manager running the given steps. The flickers are retracted immediately, no
    /// other output is commanded until `init`.
    pub fn new(
        params: AutoParams,
        hardware: Hardware,
        steps: Vec<AutoStep>,
    ) -> Result<Self, AutoMgrError> {
        params.validate().map_err(AutoMgrError::InvalidParams)?;

        let sequencer = StepSequencer::new(steps).map_err(AutoMgrError::SequencerError)?;

        let ctx = AutoCtx {
            follower: hardware.follower,
            shooter: Shooter::new(
                hardware.left_flywheel,
                hardware.right_flywheel,
                params.flywheel_target_velocity,
            ),
            flicker: FlickerActuator::new(
                vec![
                    (hardware.left_flicker, params.left_flicker),
                    (hardware.right_flicker, params.right_flicker),
                ],
                params.flicker_extend_ms,
            ),
            intake: Intake::new(hardware.intake),
            shots: ShotSequencer::new(ShotTimings::from(&params)),
        };

        info!("AutoMgr initialised with {} steps", sequencer.len());

        Ok(Self {
            params,
            ctx,
            sequencer,
            start_ms: None,
            aborted: false,
        })
    }

    /// Stop the routine: flywheels and intake off, flicker retracted, follower power removed. No
    /// further steps are run.
    pub fn abort(&mut self) {
        if self.sequencer.is_finished() {
            return;
        }

        warn!(
            "Autonomous routine aborted during step \"{}\"",
            self.sequencer.current().label()
        );

        self.ctx.shooter.shutdown();
        self.ctx.intake.set_running(false);
        self.ctx.flicker.retract_now();
        self.ctx.follower.set_max_power(0.0);
        self.sequencer.finish();
        self.aborted = true;
    }

    pub fn is_finished(&self) -> bool {
        self.sequencer.is_finished()
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn ctx(&self) -> &AutoCtx {
        &self.ctx
    }

    pub fn sequencer(&self) -> &StepSequencer<AutoStep> {
        &self.sequencer
    }

    pub fn params(&self) -> &AutoParams {
        &self.params
    }

    /// Build the telemetry snapshot for the given time.
    pub fn tm(&self, now_ms: f64) -> AutoTm {
        let pose = self.ctx.follower.get_pose();
        let (left_vel, right_vel) = self.ctx.shooter.velocities();

        AutoTm {
            time_ms: now_ms,
            step_number: self.sequencer.current_index() + 1,
            num_steps: self.sequencer.len(),
            step_label: self.sequencer.current().label().to_string(),
            step_elapsed_s: self.sequencer.step_elapsed_ms(now_ms) * 0.001,
            total_elapsed_s: (now_ms - self.start_ms.unwrap_or(now_ms)) * 0.001,
            finished: self.sequencer.is_finished(),
            x_in: pose.x(),
            y_in: pose.y(),
            heading_deg: pose.heading_deg(),
            left_flywheel_velocity: left_vel,
            right_flywheel_velocity: right_vel,
            balls_remaining: self.ctx.shots.balls_remaining(),
            shots_fired: self.ctx.shots.shots_fired(),
            shot_phase: self.ctx.shots.phase(),
            intake_power: self.ctx.intake.power(),
            flicker_remaining_s: self.ctx.flicker.remaining_ms(now_ms).map(|ms| ms * 0.001),
        }
    }
}

impl State for AutoMgr {
    /// Start time of the autonomous period in milliseconds.
    type InitData = f64;
    type InitError = AutoMgrError;

    type InputData = AutoInput;
    type OutputData = AutoTm;
    type StatusReport = AutoStatus;
    type ProcError = AutoMgrError;

    /// Start the autonomous period, spinning the flywheels up straight away so they are at speed
    /// for the first volley.
    fn init(&mut self, start_ms: Self::InitData) -> Result<(), Self::InitError> {
        if self.aborted || self.sequencer.is_finished() {
            return Err(AutoMgrError::Aborted);
        }
        if self.start_ms.is_some() {
            return Err(AutoMgrError::AlreadyStarted);
        }

        self.start_ms = Some(start_ms);
        self.sequencer.start(start_ms);
        self.ctx.shooter.spin_up();

        info!(
            "Autonomous period started, first step \"{}\"",
            self.sequencer.current().label()
        );

        Ok(())
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        if self.start_ms.is_none() {
            return Err(AutoMgrError::NotStarted);
        }
        let now_ms = input_data.time_ms;

        self.ctx.follower.update();

        // The flicker runs whatever step is active
        let deferred_action = self.ctx.flicker.tick(now_ms);
        if let Some(action) = deferred_action {
            self.ctx.apply_deferred(action);
        }

        let event = self.sequencer.tick(&mut self.ctx, now_ms);

        match event {
            SeqEvent::Advanced { from, to } => info!(
                "AutoMgr step change [{}/{}]: \"{}\" -> \"{}\"",
                to + 1,
                self.sequencer.len(),
                self.sequencer.steps()[from].label(),
                self.sequencer.steps()[to].label()
            ),
            SeqEvent::Finished => info!(
                "Autonomous routine complete after {:.1} s",
                (now_ms - self.start_ms.unwrap_or(now_ms)) * 0.001
            ),
            SeqEvent::Running | SeqEvent::Idle => (),
        }

        Ok((
            self.tm(now_ms),
            AutoStatus {
                event,
                deferred_action,
            },
        ))
    }
}

impl AutoCtx {
    /// Apply a step's on-enter action.
    pub fn apply(&mut self, action: EnterAction) {
        match action {
            EnterAction::SpinUpFlywheel => self.shooter.spin_up(),
            EnterAction::ShutdownFlywheel => self.shooter.shutdown(),
            EnterAction::IntakeOn => self.intake.set_running(true),
            EnterAction::IntakeOff => self.intake.set_running(false),
        }
    }

    /// Apply an action the flicker deferred until its retraction.
    pub fn apply_deferred(&mut self, action: DeferredAction) {
        match action {
            DeferredAction::CycleFlywheel => self.shooter.cycle_velocity(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        path::{Path, Pose},
        shot_seq::ShotPhase,
        sim::{SimClock, SimFollower, SimPowerMotor, SimServo, SimVelocityMotor},
    };

    const TICK_MS: f64 = 20.0;

    struct Rig {
        clock: SimClock,
        follower: SimFollower,
        left_flywheel: SimVelocityMotor,
        left_flicker: SimServo,
        intake: SimPowerMotor,
    }

    fn rig_and_mgr(steps: Vec<AutoStep>) -> (Rig, AutoMgr) {
        let clock = SimClock::new();
        let rig = Rig {
            clock: clock.clone(),
            follower: SimFollower::new(clock, Pose::new(48.0, 96.0, 135.0)),
            left_flywheel: SimVelocityMotor::new(),
            left_flicker: SimServo::new(),
            intake: SimPowerMotor::new(),
        };

        let hardware = Hardware {
            follower: Box::new(rig.follower.clone()),
            left_flywheel: Box::new(rig.left_flywheel.clone()),
            right_flywheel: Box::new(SimVelocityMotor::new()),
            left_flicker: Box::new(rig.left_flicker.clone()),
            right_flicker: Box::new(SimServo::new()),
            intake: Box::new(rig.intake.clone()),
        };

        let mgr = AutoMgr::new(AutoParams::default(), hardware, steps).unwrap();

        (rig, mgr)
    }

    fn step_at(rig: &Rig, mgr: &mut AutoMgr, now_ms: f64) -> (AutoTm, AutoStatus) {
        rig.clock.set_ms(now_ms);
        mgr.proc(&AutoInput { time_ms: now_ms }).unwrap()
    }

    /// 100 in at full power, 2 s for the simulated follower
    fn move_path() -> Path {
        Path::line((48.0, 96.0), (148.0, 96.0), 135.0, 135.0)
    }

    #[test]
    fn test_shoot_then_move() {
        let (rig, mut mgr) = rig_and_mgr(vec![
            AutoStep::shoot_all("Shoot", 3, vec![]),
            AutoStep::follow("Move", move_path(), 1.0, vec![]),
        ]);
        mgr.init(0.0).unwrap();

        let mut t = 0.0;
        let mut advanced_at = None;
        while t <= 3800.0 {
            let (tm, status) = step_at(&rig, &mut mgr, t);
            if status.event == (SeqEvent::Advanced { from: 0, to: 1 }) {
                assert_eq!(tm.shots_fired, 3);
                assert_eq!(tm.shot_phase, ShotPhase::Done);
                advanced_at = Some(t);
            }
            t += TICK_MS;
        }

        // Spin-up, two recoveries, the tick noticing the empty magazine, then the settle
        assert_eq!(advanced_at, Some(1000.0 + 2.0 * 1200.0 + TICK_MS + 300.0));

        // The move step was entered exactly once on the following tick
        assert_eq!(rig.follower.num_paths(), 1);
        assert_eq!(mgr.sequencer().current_index(), 1);
        while !mgr.is_finished() {
            step_at(&rig, &mut mgr, t);
            t += TICK_MS;
            assert!(t < 10_000.0);
        }
        assert_eq!(rig.follower.num_paths(), 1);
        assert_eq!(mgr.sequencer().current_index(), 1);
    }

    #[test]
    fn test_flywheel_cycled_at_retraction() {
        let (rig, mut mgr) = rig_and_mgr(vec![
            AutoStep::shoot_all("Shoot", 3, vec![]),
            AutoStep::park("Parked"),
        ]);
        mgr.init(0.0).unwrap();
        assert_eq!(rig.left_flywheel.demands(), vec![1200.0]);

        let mut retractions = Vec::new();
        let mut t = 0.0;
        while !mgr.is_finished() {
            let (_, status) = step_at(&rig, &mut mgr, t);
            if status.deferred_action.is_some() {
                retractions.push(t);
            }
            t += TICK_MS;
        }

        // Retractions after the first two shots, none after the last
        assert_eq!(retractions, vec![1200.0, 2400.0]);
        assert_eq!(
            rig.left_flywheel.demands(),
            vec![1200.0, 0.0, 1200.0, 0.0, 1200.0]
        );
        assert!((rig.left_flicker.position() - 0.677).abs() < 1e-12);
    }

    #[test]
    fn test_enter_actions_and_park() {
        let (rig, mut mgr) = rig_and_mgr(vec![
            AutoStep::follow(
                "Setup",
                move_path(),
                0.45,
                vec![EnterAction::ShutdownFlywheel, EnterAction::IntakeOn],
            ),
            AutoStep::park("Parked"),
        ]);
        mgr.init(0.0).unwrap();

        let (tm, _) = step_at(&rig, &mut mgr, 0.0);
        assert_eq!(tm.intake_power, 1.0);
        assert_eq!(rig.follower.max_power(), 0.45);
        assert_eq!(rig.left_flywheel.demands(), vec![1200.0, 0.0]);

        let mut t = 0.0;
        let mut last = None;
        while !mgr.is_finished() {
            last = Some(step_at(&rig, &mut mgr, t));
            t += TICK_MS;
        }
        let (tm, status) = last.unwrap();
        assert_eq!(status.event, SeqEvent::Finished);
        assert!(tm.finished);
        assert_eq!(tm.step_number, 2);
        assert_eq!(rig.intake.get_power(), 0.0);
    }

    #[test]
    fn test_abort_stops_outputs() {
        let (rig, mut mgr) = rig_and_mgr(vec![
            AutoStep::shoot_all("Shoot", 3, vec![EnterAction::IntakeOn]),
            AutoStep::park("Parked"),
        ]);
        mgr.init(0.0).unwrap();

        step_at(&rig, &mut mgr, 0.0);
        step_at(&rig, &mut mgr, 1000.0);
        assert_eq!(rig.left_flicker.position(), 0.78);

        mgr.abort();
        assert!(mgr.is_finished());
        assert!(mgr.is_aborted());
        assert_eq!(rig.left_flywheel.demands().last(), Some(&0.0));
        assert_eq!(rig.intake.get_power(), 0.0);
        assert!((rig.left_flicker.position() - 0.677).abs() < 1e-12);
        assert_eq!(rig.follower.max_power(), 0.0);

        let (_, status) = step_at(&rig, &mut mgr, 1020.0);
        assert_eq!(status.event, SeqEvent::Idle);
    }

    #[test]
    fn test_abort_before_start_stays_stopped() {
        let (rig, mut mgr) = rig_and_mgr(vec![
            AutoStep::shoot_all("Shoot", 3, vec![]),
            AutoStep::park("Parked"),
        ]);
        mgr.abort();
        assert_eq!(rig.left_flywheel.demands(), vec![0.0]);

        // The flywheels are never spun up
        assert!(matches!(mgr.init(0.0), Err(AutoMgrError::Aborted)));
        assert_eq!(rig.left_flywheel.demands(), vec![0.0]);
        assert!(matches!(
            mgr.proc(&AutoInput { time_ms: 20.0 }),
            Err(AutoMgrError::NotStarted)
        ));
    }

    #[test]
    fn test_init_after_abort_rejected() {
        let (rig, mut mgr) = rig_and_mgr(vec![
            AutoStep::shoot_all("Shoot", 3, vec![]),
            AutoStep::park("Parked"),
        ]);
        mgr.init(0.0).unwrap();
        step_at(&rig, &mut mgr, 0.0);
        mgr.abort();
        let demands = rig.left_flywheel.demands();
        assert_eq!(demands.last(), Some(&0.0));

        assert!(matches!(mgr.init(100.0), Err(AutoMgrError::Aborted)));
        assert_eq!(rig.left_flywheel.demands(), demands);
        assert!(mgr.is_finished());
    }

    #[test]
    fn test_lifecycle_errors() {
        let (rig, mut mgr) = rig_and_mgr(vec![AutoStep::park("Parked")]);

        assert!(matches!(
            mgr.proc(&AutoInput { time_ms: 0.0 }),
            Err(AutoMgrError::NotStarted)
        ));

        mgr.init(0.0).unwrap();
        assert!(matches!(mgr.init(10.0), Err(AutoMgrError::AlreadyStarted)));

        let (_, status) = step_at(&rig, &mut mgr, 20.0);
        assert_eq!(status.event, SeqEvent::Finished);
    }

    #[test]
    fn test_load_params_from_file() {
        let path = std::env::temp_dir().join(format!(
            "auto_exec_params_test_{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "ball_count = 2\nflicker_extend_ms = 150.0\n").unwrap();

        let params = load_params(Some(path.as_path())).unwrap();
        assert_eq!(params.ball_count, 2);
        assert_eq!(params.flicker_extend_ms, 150.0);
        assert_eq!(params.flywheel_spinup_ms, 1000.0);

        std::fs::write(&path, "flywheel_recovery_ms = -5.0\n").unwrap();
        assert!(matches!(
            load_params(Some(path.as_path())),
            Err(AutoMgrError::InvalidParams(_))
        ));

        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            load_params(Some(path.as_path())),
            Err(AutoMgrError::ParamLoadError(_))
        ));
    }

    #[test]
    fn test_empty_steps_rejected() {
        let clock = SimClock::new();
        let hardware = Hardware {
            follower: Box::new(SimFollower::new(clock, Pose::default())),
            left_flywheel: Box::new(SimVelocityMotor::new()),
            right_flywheel: Box::new(SimVelocityMotor::new()),
            left_flicker: Box::new(SimServo::new()),
            right_flicker: Box::new(SimServo::new()),
            intake: Box::new(SimPowerMotor::new()),
        };

        assert!(matches!(
            AutoMgr::new(AutoParams::default(), hardware, vec![]),
            Err(AutoMgrError::SequencerError(SequencerError::EmptySequence))
        ));
    }
}
