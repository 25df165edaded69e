use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{Level, error, info, warn};

use sim_visualizer::font::{HUD_FONT_SIZE, HudFont};
use sim_visualizer::window;
use sim_visualizer::{ShutdownReason, ViewerConfig, Visualizer};

const USAGE: &str = "
Welcome to the No Rendering Mode Visualizer

    ESC          : quit
    Left drag    : pan
    Mouse wheel  : zoom
";

fn run(
    config: &ViewerConfig,
    interrupted: &AtomicBool,
) -> Result<ShutdownReason, rootcause::Report> {
    use rootcause::prelude::*;

    let font = match &config.font {
        Some(path) => Some(HudFont::load(path, HUD_FONT_SIZE).context("Failed to load HUD font")?),
        None => HudFont::discover(HUD_FONT_SIZE),
    };
    let mut visualizer =
        Visualizer::connect(config, font).context("Failed connecting to simulator server")?;
    let reason = window::run(&mut visualizer, interrupted).context("Visualizer stopped")?;
    Ok(reason)
}

fn main() {
    let matches = match ViewerConfig::cli().get_matches_safe() {
        Ok(matches) => matches,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            eprintln!("{e}");
            process::exit(2);
        }
    };
    let config = match ViewerConfig::from_matches(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(2);
        }
    };

    let level = if config.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .init();

    info!("listening to server {}", config.address());
    println!("{USAGE}");

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Release)) {
        warn!("cannot handle Ctrl-C: {e}");
    }

    match run(&config, &interrupted) {
        Ok(ShutdownReason::Interrupted) => println!("\nCancelled by user. Bye!"),
        Ok(ShutdownReason::UserQuit) => {}
        Err(report) => {
            error!("{report}");
            process::exit(1);
        }
    }
}
