//! Lever Works headless runner
//!
//! Loads Tiled levels from a directory and steps the session at 60 Hz with
//! a fixed movement intent. Useful for smoke-testing level files.
//!
//! Usage: `lever-works <levels-dir> [first-level] [--tuning FILE]
//! [--frames N] [--walk left|right] [--jump]`

use std::process::ExitCode;

use futures::executor::block_on;

use lever_works::input::{InputFrame, MovementIntent};
use lever_works::level::DirectoryLevelSource;
use lever_works::session::{GameSession, GameStatus};
use lever_works::timer::FrameTimer;
use lever_works::tuning::Tuning;

const HOST_FPS: f64 = 60.0;

struct Options {
    levels: String,
    first_level: Option<String>,
    tuning: Option<String>,
    frames: u64,
    intent: InputFrame,
}

fn parse_args() -> Result<Options, String> {
    let mut args = std::env::args().skip(1);
    let mut options = Options {
        levels: String::new(),
        first_level: None,
        tuning: None,
        frames: 60 * 30,
        intent: InputFrame::default(),
    };
    let mut positional = Vec::new();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--tuning" => options.tuning = Some(args.next().ok_or("--tuning needs a file")?),
            "--frames" => {
                let value = args.next().ok_or("--frames needs a count")?;
                options.frames = value
                    .parse()
                    .map_err(|_| format!("invalid frame count `{value}`"))?;
            }
            "--walk" => match args.next().as_deref() {
                Some("left") => options.intent.left = true,
                Some("right") => options.intent.right = true,
                other => return Err(format!("--walk expects left or right, got {other:?}")),
            },
            "--jump" => options.intent.jump = true,
            _ => positional.push(arg),
        }
    }
    let mut positional = positional.into_iter();
    options.levels = positional.next().ok_or("missing levels directory")?;
    options.first_level = positional.next();
    Ok(options)
}

fn run(options: Options) -> Result<(), String> {
    let tuning = match &options.tuning {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(|e| format!("{path}: {e}"))?;
            Tuning::from_json(&json).map_err(|e| format!("{path}: {e}"))?
        }
        None => Tuning::default(),
    };
    let source = DirectoryLevelSource::new(&options.levels);
    let mut session = match options.first_level {
        Some(level) => GameSession::starting_at(tuning, level),
        None => GameSession::new(tuning),
    };

    log::debug!("Holding direction {}", options.intent.direction());
    let mut timer = FrameTimer::new(0.0);
    for frame in 1..=options.frames {
        if session.pending_level().is_some() {
            block_on(session.load_pending(&source)).map_err(|e| e.to_string())?;
            // Loading time never counts as play time
            timer.reset(frame as f64 / HOST_FPS);
        }
        let dt = timer.tick(frame as f64 / HOST_FPS);
        session.update(dt, &options.intent);
        if session.status() == GameStatus::GameOver {
            break;
        }
    }

    let frames = session.world().map_or(0, |w| w.frame());
    match (session.status(), session.completed()) {
        (GameStatus::GameOver, true) => log::info!("All levels completed"),
        (GameStatus::GameOver, false) => log::info!("Game over"),
        (status, _) => log::info!(
            "Stopped in {:?} on level {:?} after {frames} frames, {} lives left",
            status,
            session.level_name().unwrap_or("-"),
            session.lives()
        ),
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Lever Works (headless) starting...");

    let result = parse_args().and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
