//! Skyraid
//!
//! Helicopter combat over a height-map island. Without a window the game
//! runs headless: it leaves the lobby, holds the fire key and steers for the
//! configured number of frames, then reports what happened.

mod assets;
mod billboard;
mod bullet;
mod config;
mod error;
mod framework;
mod lobby;
mod objects;
mod player;
mod scene;
mod skybox;
mod terrain;
mod villain;
mod water;

use skyraid_engine::foundation::logging;
use skyraid_engine::prelude::*;
use skyraid_engine::render::HeadlessBackend;

use crate::config::GameConfig;
use crate::framework::GameFramework;

/// Configuration file read from the working directory
const CONFIG_FILE: &str = "skyraid.toml";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("info");
    log::info!("Starting Skyraid");

    let config = GameConfig::load_or_default(CONFIG_FILE)?;
    let backend = HeadlessBackend::new(config.window.swap_chain_buffers);
    let mut framework = GameFramework::new(&config, ShaderRegistry::with_all_kinds(), backend);
    framework.on_create()?;
    framework.on_resize(config.window.width, config.window.height)?;

    let script = [
        (1, InputEvent::KeyDown(config.controls.start_game)),
        (2, InputEvent::KeyUp(config.controls.start_game)),
        (30, InputEvent::KeyDown(Key::W)),
        (60, InputEvent::KeyDown(config.controls.fire)),
        (240, InputEvent::KeyUp(Key::W)),
        (360, InputEvent::KeyUp(config.controls.fire)),
    ];

    let dt = config.window.fixed_time_step;
    for frame in 0..config.window.headless_frames {
        for (_, event) in script.iter().filter(|(at, _)| *at == frame) {
            framework.on_input(*event)?;
        }
        if !framework.is_running() {
            break;
        }
        if dt > 0.0 {
            framework.advance_fixed(dt)?;
        } else {
            framework.frame_advance()?;
        }
    }

    let stats = framework.backend().stats();
    log::info!(
        "Ran {} frames ({:.1} s): {} shots, {} villains left, {} bullets in flight, {} draws submitted",
        stats.frames_presented,
        framework.timer().total_time(),
        framework.shots_fired(),
        framework.game().live_villains(),
        framework.game().bullet_count(),
        stats.draws_submitted,
    );

    framework.on_destroy()?;
    Ok(())
}
