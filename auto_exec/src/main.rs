//! Autonomous routine executable entry point.
//!
//! # Architecture
//!
//! The executable:
//!
//!     - Initialises the session and logging
//!     - Loads the routine parameters
//!     - Builds the hardware and the autonomy manager
//!     - Main loop, once per cycle period:
//!         - Autonomy processing
//!         - Telemetry output and archiving
//!     - Saves the final telemetry into the session
//!
//! No robot is attached to this executable, so the hardware is simulated and driven from the
//! session clock.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use structopt::StructOpt;

// Internal
use auto_lib::{
    auto_mgr::{self, AutoInput, AutoMgr, Hardware, LogTmSink},
    routine,
    sim::{SimClock, SimFollower, SimPowerMotor, SimServo, SimVelocityMotor},
};
use util::{
    archive::Archiver,
    logger::{logger_init, LevelFilter},
    module::State,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "auto_exec", about = "Runs the autonomous routine")]
struct Opt {
    /// Parameter file to use instead of `params/auto.toml` in the software root
    #[structopt(short, long, parse(from_os_str))]
    params: Option<PathBuf>,

    /// The routine is aborted if it has not finished after this long
    #[structopt(long, default_value = "30")]
    max_duration_s: f64,

    /// Do not print the per-cycle telemetry
    #[structopt(short, long)]
    quiet: bool,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("auto_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let tm_level = if opt.quiet {
        LevelFilter::Off
    } else {
        LevelFilter::Info
    };
    logger_init(LevelFilter::Debug, tm_level, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Autonomous Routine Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let params =
        auto_mgr::load_params(opt.params.as_deref()).wrap_err("Could not load auto params")?;
    let cycle_period = Duration::from_secs_f64(params.cycle_period_ms * 0.001);

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    let clock = SimClock::new();
    let hardware = Hardware {
        follower: Box::new(SimFollower::new(clock.clone(), routine::start_pose())),
        left_flywheel: Box::new(SimVelocityMotor::new()),
        right_flywheel: Box::new(SimVelocityMotor::new()),
        left_flicker: Box::new(SimServo::new()),
        right_flicker: Box::new(SimServo::new()),
        intake: Box::new(SimPowerMotor::new()),
    };

    let steps = routine::blue_routine(&params);
    let mut auto_mgr =
        AutoMgr::new(params, hardware, steps).wrap_err("Failed to initialise AutoMgr")?;

    let mut tm_sink = LogTmSink::new();
    let mut tm_archiver =
        Archiver::from_path(&session, "auto_tm.csv").wrap_err("Failed to create the tm archive")?;

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    // The routine runs on the session clock
    let start_ms = session::get_elapsed_millis();
    auto_mgr.init(start_ms).wrap_err("Failed to start AutoMgr")?;

    info!("Begining main loop\n");

    let mut last_tm = None;

    while !auto_mgr.is_finished() {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        let time_ms = session::get_elapsed_millis();
        clock.set_ms(time_ms);

        if time_ms - start_ms > opt.max_duration_s * 1000.0 {
            warn!(
                "Routine still running after {:.1} s, aborting",
                opt.max_duration_s
            );
            auto_mgr.abort();
            last_tm = Some(auto_mgr.tm(time_ms));
            break;
        }

        // ---- AUTONOMY PROCESSING ----

        match auto_mgr.proc(&AutoInput { time_ms }) {
            Ok((tm, _)) => {
                tm.publish(&mut tm_sink);

                if let Err(e) = tm_archiver.serialise(&tm) {
                    warn!("Could not archive AutoTm: {}", e);
                }

                last_tm = Some(tm);
            }
            Err(e) => warn!("Error during AutoMgr processing: {}", e),
        }

        // ---- CYCLE MANAGEMENT ----

        // Get cycle duration
        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => thread::sleep(d),
            None => warn!(
                "Cycle overran by {:.06} s",
                cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
            ),
        }
    }

    // ---- SHUTDOWN ----

    info!(
        "Routine ended after {:.1} s, {} tm records archived",
        (session::get_elapsed_millis() - start_ms) * 0.001,
        tm_archiver.num_records()
    );

    if let Some(tm) = last_tm {
        session
            .save_json("final_tm.json", &tm)
            .wrap_err("Failed to save the final telemetry")?;
    }

    Ok(())
}
