//! # Step sequencer
//!
//! Drives an ordered list of steps to completion, one at a time. Each cycle the active step is
//! entered (once per occupancy) and polled for completion, when it completes the sequencer moves
//! to the next step. Steps are never retried or revisited. Once the final step completes the
//! sequencer is finished and further cycles do nothing.
//!
//! A step's completion poll may have side effects, which is how composite steps (such as shooting
//! a volley) get their cyclic processing.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// One step of a sequence, acting on a context of type `C`.
pub trait Step<C> {
    /// Called once when the step becomes active.
    fn enter(&mut self, ctx: &mut C, now_ms: f64);

    /// Called every cycle while the step is active, including the cycle it was entered on.
    fn is_done(&mut self, ctx: &mut C, now_ms: f64) -> bool;

    fn label(&self) -> &str;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct StepSequencer<S> {
    steps: Vec<S>,

    /// Index of the active step, always a valid index into `steps`
    index: usize,

    /// Whether the active step has been entered
    entered: bool,

    finished: bool,

    /// Time at which the active step became active
    step_start_ms: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    #[error("A sequence must contain at least one step")]
    EmptySequence,
}

/// Outcome of one sequencer cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeqEvent {
    /// The active step is still running
    Running,

    /// The step at `from` completed and `to` is now active
    Advanced { from: usize, to: usize },

    /// The final step completed on this cycle
    Finished,

    /// The sequence had already finished, nothing was done
    Idle,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<S> StepSequencer<S> {
    /// Create a new sequencer. The list of steps may not be empty.
    pub fn new(steps: Vec<S>) -> Result<Self, SequencerError> {
        if steps.is_empty() {
            return Err(SequencerError::EmptySequence);
        }

        Ok(Self {
            steps,
            index: 0,
            entered: false,
            finished: false,
            step_start_ms: 0.0,
        })
    }

    /// Set the start time of the first step, called once when the run begins.
    pub fn start(&mut self, now_ms: f64) {
        self.step_start_ms = now_ms;
    }

    /// Cyclic processing.
    pub fn tick<C>(&mut self, ctx: &mut C, now_ms: f64) -> SeqEvent
    where
        S: Step<C>,
    {
        if self.finished {
            return SeqEvent::Idle;
        }

        let step = &mut self.steps[self.index];

        if !self.entered {
            step.enter(ctx, now_ms);
            self.entered = true;
        }

        if !step.is_done(ctx, now_ms) {
            return SeqEvent::Running;
        }

        if self.index + 1 >= self.steps.len() {
            self.finished = true;
            return SeqEvent::Finished;
        }

        let from = self.index;
        self.index += 1;
        self.entered = false;
        self.step_start_ms = now_ms;

        SeqEvent::Advanced {
            from,
            to: self.index,
        }
    }

    /// Stop the sequence where it is, no further steps will be entered or polled.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &S {
        &self.steps[self.index]
    }

    pub fn steps(&self) -> &[S] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Time the active step has been active for.
    pub fn step_elapsed_ms(&self, now_ms: f64) -> f64 {
        now_ms - self.step_start_ms
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Step which completes once it has been polled `ticks` times.
    struct CountingStep {
        label: String,
        ticks: usize,
    }

    /// Records what the steps did.
    #[derive(Default)]
    struct Log {
        enters: Vec<String>,
        polls: Vec<String>,
    }

    impl Step<Log> for CountingStep {
        fn enter(&mut self, ctx: &mut Log, _now_ms: f64) {
            ctx.enters.push(self.label.clone());
        }

        fn is_done(&mut self, ctx: &mut Log, _now_ms: f64) -> bool {
            ctx.polls.push(self.label.clone());
            ctx.polls.iter().filter(|l| **l == self.label).count() >= self.ticks
        }

        fn label(&self) -> &str {
            &self.label
        }
    }

    fn step(label: &str, ticks: usize) -> CountingStep {
        CountingStep {
            label: label.into(),
            ticks,
        }
    }

    #[test]
    fn test_empty_sequence_rejected() {
        assert!(matches!(
            StepSequencer::<CountingStep>::new(vec![]),
            Err(SequencerError::EmptySequence)
        ));
    }

    #[test]
    fn test_steps_entered_once_and_advanced() {
        let mut seq = StepSequencer::new(vec![step("a", 3), step("b", 1), step("c", 2)]).unwrap();
        let mut log = Log::default();
        let mut events = Vec::new();

        for t in 0..10 {
            events.push(seq.tick(&mut log, t as f64 * 20.0));
        }

        assert_eq!(log.enters, vec!["a", "b", "c"]);
        assert_eq!(log.polls, vec!["a", "a", "a", "b", "c", "c"]);
        assert_eq!(
            events[..6],
            [
                SeqEvent::Running,
                SeqEvent::Running,
                SeqEvent::Advanced { from: 0, to: 1 },
                SeqEvent::Advanced { from: 1, to: 2 },
                SeqEvent::Running,
                SeqEvent::Finished,
            ]
        );
        assert!(events[6..].iter().all(|e| *e == SeqEvent::Idle));

        // Never past the final index
        assert_eq!(seq.current_index(), 2);
        assert!(seq.is_finished());
        assert_eq!(seq.current().label(), "c");
    }

    #[test]
    fn test_step_elapsed_resets_on_advance() {
        let mut seq = StepSequencer::new(vec![step("a", 2), step("b", 5)]).unwrap();
        let mut log = Log::default();

        seq.start(100.0);
        seq.tick(&mut log, 100.0);
        assert_eq!(seq.step_elapsed_ms(120.0), 20.0);

        seq.tick(&mut log, 140.0);
        assert_eq!(seq.current_index(), 1);
        assert_eq!(seq.step_elapsed_ms(200.0), 60.0);
    }

    #[test]
    fn test_finish_stops_sequence() {
        let mut seq = StepSequencer::new(vec![step("a", 100), step("b", 1)]).unwrap();
        let mut log = Log::default();

        seq.tick(&mut log, 0.0);
        seq.finish();
        assert_eq!(seq.tick(&mut log, 20.0), SeqEvent::Idle);
        assert_eq!(log.polls.len(), 1);
        assert_eq!(seq.current_index(), 0);
    }

    #[test]
    fn test_single_step_sequence() {
        let mut seq = StepSequencer::new(vec![step("only", 1)]).unwrap();
        let mut log = Log::default();

        assert_eq!(seq.tick(&mut log, 0.0), SeqEvent::Finished);
        assert_eq!(seq.tick(&mut log, 20.0), SeqEvent::Idle);
        assert_eq!(log.enters, vec!["only"]);
    }
}
