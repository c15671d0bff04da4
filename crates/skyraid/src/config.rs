//! Game configuration
//!
//! Every section has defaults matching the shipped assets, so a missing or
//! partial `skyraid.toml` still gives a playable game.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use skyraid_engine::config::Config;
use skyraid_engine::input::Key;

/// Game configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Window and frame settings
    pub window: WindowConfig,

    /// World building settings
    pub scene: SceneConfig,

    /// Gameplay settings
    pub gameplay: GameplayConfig,

    /// Key bindings
    pub controls: ControlsConfig,
}

impl Config for GameConfig {}

/// Window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Client width in pixels
    pub width: u32,

    /// Client height in pixels
    pub height: u32,

    /// Swap-chain buffers (frames in flight)
    pub swap_chain_buffers: usize,

    /// Frames to run without a window
    pub headless_frames: u32,

    /// Time step for headless frames, in seconds; zero or less uses the wall clock
    pub fixed_time_step: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            swap_chain_buffers: 2,
            headless_frames: 600,
            fixed_time_step: 1.0 / 60.0,
        }
    }
}

/// Scene configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Directory the asset paths below are relative to
    pub asset_root: PathBuf,

    /// Substitute generated assets for missing files
    pub allow_placeholder_assets: bool,

    /// Raw 8-bit height map
    pub terrain_file: PathBuf,

    /// Height map samples along x
    pub terrain_width: usize,

    /// Height map samples along z
    pub terrain_length: usize,

    /// Samples per terrain patch side
    pub terrain_block: usize,

    /// World units per sample (x, height, z)
    pub terrain_scale: [f32; 3],

    /// Terrain base color
    pub terrain_color: [f32; 4],

    /// Water grid vertices per side
    pub water_size: usize,

    /// World units per water vertex (x, y, z)
    pub water_scale: [f32; 3],

    /// Water surface altitude
    pub water_height: f32,

    /// Wave phase speed in radians per second
    pub wave_speed: f32,

    /// Water texture
    pub water_texture: PathBuf,

    /// Skybox texture
    pub skybox_texture: PathBuf,

    /// Skybox cube edge length
    pub skybox_size: f32,

    /// Hierarchical model flown by villains
    pub villain_model: PathBuf,

    /// Texture applied to the villain model
    pub villain_texture: PathBuf,

    /// Hierarchical model flown by the player
    pub player_model: PathBuf,

    /// Villain spawn points; one slot per entry
    pub villain_spawns: Vec<[f32; 3]>,

    /// Name of the main rotor frame in the villain model
    pub main_rotor_frame: String,

    /// Name of the tail rotor frame in the villain model
    pub tail_rotor_frame: String,

    /// Rotor spin in degrees per second
    pub rotor_speed: f32,

    /// Roam targets are picked within this distance of the spawn point
    pub roam_radius: f32,

    /// Roaming speed in units per second
    pub roam_speed: f32,

    /// Descent speed of a shot-down villain in units per second
    pub fall_speed: f32,

    /// Below this altitude a falling villain is removed
    pub min_altitude: f32,

    /// Bullet speed in units per second
    pub bullet_speed: f32,

    /// Bullet cube size (width, height, depth)
    pub bullet_size: [f32; 3],

    /// Bullets leaving [0, play_area] on x or z are removed
    pub play_area: f32,

    /// Billboard texture
    pub billboard_texture: PathBuf,

    /// Trees scattered over the terrain
    pub billboard_count: usize,

    /// Lobby title texture
    pub title_texture: PathBuf,

    /// Beacon tower position (x, z); its light orbits it
    pub beacon_position: [f32; 2],

    /// Seed for roam targets and billboard placement
    pub rng_seed: u64,

    /// Animate villains a second time while rendering, as the first release did
    pub render_reanimates_villains: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            asset_root: PathBuf::from("."),
            allow_placeholder_assets: true,
            terrain_file: PathBuf::from("Image/terrain.raw"),
            terrain_width: 257,
            terrain_length: 257,
            terrain_block: 9,
            terrain_scale: [4.0, 6.0, 4.0],
            terrain_color: [0.6, 0.5, 0.2, 0.0],
            water_size: 128,
            water_scale: [8.0, 1.0, 8.0],
            water_height: 60.0,
            wave_speed: 0.5,
            water_texture: PathBuf::from("Image/Water.dds"),
            skybox_texture: PathBuf::from("Image/SkyBox.dds"),
            skybox_size: 20.0,
            villain_model: PathBuf::from("Model/helicopter.bin"),
            villain_texture: PathBuf::from("drone.dds"),
            player_model: PathBuf::from("Model/airplane.bin"),
            villain_spawns: vec![
                [621.0, 180.0, 474.0],
                [532.0, 163.0, 639.0],
                [388.0, 163.0, 681.0],
                [306.0, 161.0, 598.0],
                [328.0, 163.0, 701.0],
                [165.0, 153.0, 408.0],
            ],
            main_rotor_frame: String::from("Rotor"),
            tail_rotor_frame: String::from("Back_Rotor"),
            rotor_speed: 720.0,
            roam_radius: 100.0,
            roam_speed: 10.0,
            fall_speed: 20.0,
            min_altitude: 30.0,
            bullet_speed: 100.0,
            bullet_size: [0.4, 0.4, 1.0],
            play_area: 900.0,
            billboard_texture: PathBuf::from("Image/Tree.dds"),
            billboard_count: 200,
            title_texture: PathBuf::from("Image/Title.dds"),
            beacon_position: [450.0, 450.0],
            rng_seed: 0x5EED,
            render_reanimates_villains: false,
        }
    }
}

/// Gameplay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    /// Minimum seconds between shots
    pub shoot_cooldown: f32,

    /// Player acceleration in units per second
    pub player_speed: f32,

    /// Player top speed
    pub player_max_speed: f32,

    /// Velocity lost per second when no key is held
    pub player_friction: f32,

    /// Degrees of rotation per pixel of mouse drag
    pub mouse_sensitivity: f32,

    /// Player start (x, z); altitude comes from the terrain
    pub player_start: [f32; 2],

    /// Minimum clearance above the terrain
    pub hover_height: f32,

    /// Camera offset in the player's frame (right, up, look)
    pub camera_offset: [f32; 3],

    /// Seconds the camera lags behind the player
    pub camera_time_lag: f32,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            shoot_cooldown: 0.2,
            player_speed: 40.0,
            player_max_speed: 60.0,
            player_friction: 50.0,
            mouse_sensitivity: 1.0 / 3.0,
            player_start: [625.0, 425.0],
            hover_height: 3.0,
            camera_offset: [0.0, 5.0, -10.0],
            camera_time_lag: 0.0,
        }
    }
}

/// Controls configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Fire key (held, rate limited by the cooldown)
    pub fire: Key,

    /// Switches terrain between tessellated and flat patches
    pub toggle_tessellation: Key,

    /// Shows or hides the billboard trees
    pub toggle_billboards: Key,

    /// Leaves the lobby
    pub start_game: Key,

    /// Closes the game
    pub quit: Key,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            fire: Key::Space,
            toggle_tessellation: Key::T,
            toggle_billboards: Key::B,
            start_game: Key::Enter,
            quit: Key::Escape,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyraid_engine::config::Format;

    #[test]
    fn test_defaults_match_shipped_world() {
        let config = GameConfig::default();
        assert_eq!(config.scene.villain_spawns.len(), 6);
        assert_eq!(config.scene.terrain_width, 257);
        assert!(!config.scene.render_reanimates_villains);
        assert_eq!(config.controls.fire, Key::Space);
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let text = r#"
            [scene]
            villain_spawns = [[10.0, 45.0, 12.0]]
            render_reanimates_villains = true

            [controls]
            fire = "Control"
        "#;
        let config = GameConfig::from_str_with_format(text, Format::Toml).unwrap();
        assert_eq!(config.scene.villain_spawns, vec![[10.0, 45.0, 12.0]]);
        assert!(config.scene.render_reanimates_villains);
        assert_eq!(config.controls.fire, Key::Control);
        assert_eq!(config.scene.play_area, 900.0);
        assert_eq!(config.window.swap_chain_buffers, 2);
    }
}
