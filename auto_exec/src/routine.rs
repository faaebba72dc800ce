//! # Blue alliance routine
//!
//! Shoots the preloaded balls, then collects and shoots the three rows of balls along the blue
//! wall before parking:
//!
//! ```text
//! Shoot 1 -> Row 1 -> Shoot 2 -> Row 2 -> Shoot 3 -> Row 3 -> Park
//! ```
//!
//! Each row is three steps: drive to the start of the row with the intake running, sweep along
//! it slowly, then return to the shooting pose while the flywheels spin up.
//!
//! Coordinates are field inches, headings are degrees.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use crate::{
    auto_mgr::{AutoStep, EnterAction},
    params::AutoParams,
    path::{Path, Pose},
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Shooting position, also where the robot starts.
const SHOOT_POS: (f64, f64) = (48.0, 96.0);
const SHOOT_HEADING_DEG: f64 = 135.0;

/// Heading held while collecting a row.
const ROW_HEADING_DEG: f64 = 90.0;

/// X coordinate of the intake-side and far ends of every row.
const ROW_START_X: f64 = 42.0;
const ROW_END_X: f64 = 18.0;

/// Y coordinates of the three rows, closest first.
const ROW_Y: [f64; 3] = [85.0, 60.0, 35.0];

const PARK_POS: (f64, f64) = (105.5, 33.0);
const PARK_HEADING_DEG: f64 = 0.0;

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Pose the robot is placed at before the routine starts.
pub fn start_pose() -> Pose {
    Pose::new(SHOOT_POS.0, SHOOT_POS.1, SHOOT_HEADING_DEG)
}

/// Build the steps of the blue alliance routine.
pub fn blue_routine(params: &AutoParams) -> Vec<AutoStep> {
    let mut steps = Vec::with_capacity(13);

    for (i, &row_y) in ROW_Y.iter().enumerate() {
        let row = i + 1;

        steps.push(AutoStep::shoot_all(
            &format!("Shoot {}", row),
            params.ball_count,
            vec![EnterAction::IntakeOff],
        ));

        steps.push(AutoStep::follow(
            &format!("Setup -> Row {}", row),
            Path::line(
                SHOOT_POS,
                (ROW_START_X, row_y),
                SHOOT_HEADING_DEG,
                ROW_HEADING_DEG,
            ),
            params.full_speed,
            vec![EnterAction::ShutdownFlywheel, EnterAction::IntakeOn],
        ));

        steps.push(AutoStep::follow(
            &format!("Pickup Row {}", row),
            Path::line(
                (ROW_START_X, row_y),
                (ROW_END_X, row_y),
                ROW_HEADING_DEG,
                ROW_HEADING_DEG,
            ),
            params.intake_sweep_speed,
            vec![],
        ));

        // The last row is followed by parking rather than another volley
        if row < ROW_Y.len() {
            steps.push(AutoStep::follow(
                &format!("Return -> Shoot {}", row + 1),
                Path::line(
                    (ROW_END_X, row_y),
                    SHOOT_POS,
                    ROW_HEADING_DEG,
                    SHOOT_HEADING_DEG,
                ),
                params.full_speed,
                vec![EnterAction::SpinUpFlywheel],
            ));
        }
    }

    let last_row_y = ROW_Y[ROW_Y.len() - 1];
    steps.push(AutoStep::follow(
        "Park",
        Path::line(
            (ROW_END_X, last_row_y),
            PARK_POS,
            ROW_HEADING_DEG,
            PARK_HEADING_DEG,
        ),
        params.full_speed,
        vec![EnterAction::ShutdownFlywheel],
    ));
    steps.push(AutoStep::park("Parked"));

    steps
}
