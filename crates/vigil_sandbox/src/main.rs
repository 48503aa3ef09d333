//! Vigil Sandbox
//!
//! Headless run of the courtyard scene at a fixed 60 Hz. Every state change
//! of the player, the guard, the security camera and the alarm is logged.
//!
//! Run with: cargo run -p vigil_sandbox -- [config.toml]
//!
//! The config path may also come from `VIGIL_CONFIG`. Without one the
//! built-in defaults are used.

mod scene;
mod script;

use scene::Scene;
use script::Script;
use vigil_character::{load_config, GameConfig};

const TICK_RATE: f32 = 60.0;
/// When the scripted run clears the alarm
const ALL_CLEAR_AT: f64 = 9.5;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("Sandbox failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_game_config()?;
    let mut scene = Scene::new(config)?;
    let mut script = Script::courtyard();

    let dt = 1.0 / TICK_RATE;
    let mut cleared = false;
    while scene.now() < script.duration() {
        let (input, look) = script.frame(scene.now());
        scene.step(input, look, dt)?;

        if !cleared && scene.now() >= ALL_CLEAR_AT {
            scene.all_clear();
            cleared = true;
        }
    }

    scene.log_summary();
    Ok(())
}

fn load_game_config() -> Result<GameConfig, Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("VIGIL_CONFIG").ok());

    match path {
        Some(path) => {
            log::info!("Loading config from {}", path);
            Ok(load_config(&path)?)
        }
        None => {
            log::info!("No config given, using defaults");
            Ok(GameConfig::default())
        }
    }
}
