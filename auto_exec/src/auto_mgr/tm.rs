//! # Telemetry for the autonomous routine

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use log::info;
use serde::{Deserialize, Serialize};
use util::logger::TM_TARGET;

use crate::shot_seq::ShotPhase;

// -----------------------------------------------------------------------------------------------
// CONSTANTS
// -----------------------------------------------------------------------------------------------

const SEPARATOR: &str = "──────────────────────────────";

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

/// Line based telemetry output, flushed once per cycle.
pub trait TmSink {
    fn add_line(&mut self, line: String);

    /// Publish the lines added since the last update.
    fn update(&mut self);
}

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Snapshot of the routine's state, produced every cycle.
///
/// Kept flat so it can be archived as one CSV row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoTm {
    pub time_ms: f64,

    /// One based number of the active step
    pub step_number: usize,
    pub num_steps: usize,
    pub step_label: String,
    pub step_elapsed_s: f64,
    pub total_elapsed_s: f64,
    pub finished: bool,

    pub x_in: f64,
    pub y_in: f64,
    pub heading_deg: f64,

    pub left_flywheel_velocity: f64,
    pub right_flywheel_velocity: f64,

    pub balls_remaining: u32,
    pub shots_fired: u32,
    pub shot_phase: ShotPhase,

    pub intake_power: f64,

    /// Time until the flicker retracts, `None` if it is retracted
    pub flicker_remaining_s: Option<f64>,
}

/// Sink which publishes each cycle's lines to the log under the telemetry target.
#[derive(Debug, Default)]
pub struct LogTmSink {
    lines: Vec<String>,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl AutoTm {
    /// Human readable rendering of the snapshot.
    pub fn lines(&self) -> Vec<String> {
        let flicker = match self.flicker_remaining_s {
            Some(s) => format!("EXTENDED {:.2}s left", s),
            None => String::from("retracted"),
        };

        vec![
            format!(
                "STEP  [{}/{}] {}{}",
                self.step_number,
                self.num_steps,
                self.step_label,
                if self.finished { " (finished)" } else { "" }
            ),
            format!(
                "TIME  step={:.1}s   total={:.1}s",
                self.step_elapsed_s, self.total_elapsed_s
            ),
            String::from(SEPARATOR),
            format!(
                "POS   x={:.1}  y={:.1}  hdg={:.1}°",
                self.x_in, self.y_in, self.heading_deg
            ),
            String::from(SEPARATOR),
            format!(
                "WHEEL L={:.0}  R={:.0}      BALLS left={}  fired={}",
                self.left_flywheel_velocity,
                self.right_flywheel_velocity,
                self.balls_remaining,
                self.shots_fired
            ),
            format!(
                "INTK  {:.0}%              FLICK {}",
                self.intake_power * 100.0,
                flicker
            ),
        ]
    }

    /// Add every line to the sink and flush it.
    pub fn publish(&self, sink: &mut dyn TmSink) {
        for line in self.lines() {
            sink.add_line(line);
        }
        sink.update();
    }
}

impl LogTmSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines waiting for the next update.
    pub fn pending(&self) -> &[String] {
        &self.lines
    }
}

impl TmSink for LogTmSink {
    fn add_line(&mut self, line: String) {
        self.lines.push(line);
    }

    fn update(&mut self) {
        for line in self.lines.drain(..) {
            info!(target: TM_TARGET, "{}", line);
        }
    }
}
