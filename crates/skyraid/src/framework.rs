//! Frame driver
//!
//! Owns the backend, timer, camera and input state and runs one frame per
//! call:
//!
//! ```text
//! tick -> input (fire with cooldown) -> animate -> camera follow
//!      -> begin_frame -> render -> submit -> present -> move_to_next_frame
//! ```

use skyraid_engine::input::InputState;
use skyraid_engine::prelude::*;

use crate::config::{ControlsConfig, GameConfig};
use crate::error::GameError;
use crate::lobby::LobbyScene;
use crate::scene::{GameScene, Scene, SceneSlot, Transition};

/// Drives the active scene against a [`RenderBackend`]
pub struct GameFramework<B: RenderBackend> {
    backend: B,
    timer: Timer,
    lobby: LobbyScene,
    game: GameScene,
    active: SceneSlot,
    input: InputState,
    camera: Camera,
    commands: CommandList,
    controls: ControlsConfig,
    shoot_cooldown: f32,
    shoot_timer: f32,
    shots_fired: u64,
    running: bool,
}

impl<B: RenderBackend> GameFramework<B> {
    /// Set up the scenes and camera; nothing is built until [`on_create`](Self::on_create)
    pub fn new(config: &GameConfig, shaders: ShaderRegistry, backend: B) -> Self {
        let window = &config.window;
        let mut camera = Camera::default();
        camera.set_viewport(window.width, window.height);
        camera.offset = Vec3::from(config.gameplay.camera_offset);
        camera.time_lag = config.gameplay.camera_time_lag;

        Self {
            backend,
            timer: Timer::new(),
            lobby: LobbyScene::new(config.clone(), &shaders),
            game: GameScene::new(config.clone(), shaders),
            active: SceneSlot::Lobby,
            input: InputState::new(),
            camera,
            commands: CommandList::new(),
            controls: config.controls.clone(),
            shoot_cooldown: config.gameplay.shoot_cooldown,
            shoot_timer: 0.0,
            shots_fired: 0,
            running: true,
        }
    }

    /// Build the starting scene
    pub fn on_create(&mut self) -> Result<(), GameError> {
        log::info!(
            "Starting with {} swap-chain buffers",
            self.backend.buffer_count()
        );
        self.scene_mut(self.active).build_objects()
    }

    /// Release every scene after the GPU has drained
    pub fn on_destroy(&mut self) -> Result<(), GameError> {
        self.backend.wait_for_gpu()?;
        if self.game.is_built() {
            self.game.release_objects()?;
        }
        self.lobby.release_objects()?;
        log::info!("Framework destroyed after {} frames", self.timer.frame_count());
        Ok(())
    }

    /// Route one window event to the input state and the active scene
    pub fn on_input(&mut self, event: InputEvent) -> Result<(), GameError> {
        self.input.apply(&event);
        let scene = self.scene_mut(self.active);
        let transition = match event {
            InputEvent::KeyDown(key) => scene.on_keyboard(key, true),
            InputEvent::KeyUp(key) => scene.on_keyboard(key, false),
            InputEvent::MouseDown { button, .. } => scene.on_mouse(button, true),
            InputEvent::MouseUp { button, .. } => scene.on_mouse(button, false),
            InputEvent::MouseMove { .. } => Transition::Stay,
        };
        self.apply_transition(transition)
    }

    /// Swap-chain size changed
    pub fn on_resize(&mut self, width: u32, height: u32) -> Result<(), GameError> {
        self.backend.resize(width, height)?;
        self.camera.set_viewport(width, height);
        Ok(())
    }

    /// Run one frame timed by the wall clock
    pub fn frame_advance(&mut self) -> Result<(), GameError> {
        self.timer.tick();
        self.run_frame(self.timer.delta_time())
    }

    /// Run one frame of exactly `dt` seconds
    pub fn advance_fixed(&mut self, dt: f32) -> Result<(), GameError> {
        self.timer.tick_fixed(dt);
        self.run_frame(self.timer.delta_time())
    }

    /// False once a scene asked to quit
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Scene currently driven
    pub const fn active(&self) -> SceneSlot {
        self.active
    }

    /// The game scene
    pub const fn game(&self) -> &GameScene {
        &self.game
    }

    /// The backend
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Frame timer
    pub const fn timer(&self) -> &Timer {
        &self.timer
    }

    /// Shots created so far
    pub const fn shots_fired(&self) -> u64 {
        self.shots_fired
    }

    fn scene_mut(&mut self, slot: SceneSlot) -> &mut dyn Scene {
        match slot {
            SceneSlot::Lobby => &mut self.lobby,
            SceneSlot::Game => &mut self.game,
        }
    }

    fn apply_transition(&mut self, transition: Transition) -> Result<(), GameError> {
        match transition {
            Transition::Stay => {}
            Transition::Quit => {
                log::info!("Quit requested");
                self.running = false;
            }
            Transition::Switch(slot) if slot != self.active => {
                log::info!("Switching from {:?} to {slot:?}", self.active);
                self.backend.wait_for_gpu()?;
                // The old scene stays live until the new one is built.
                if let Err(err) = self.scene_mut(slot).build_objects() {
                    log::error!("Building {slot:?} failed, staying in {:?}: {err}", self.active);
                    self.scene_mut(slot).release_objects()?;
                    return Err(err);
                }
                self.scene_mut(self.active).release_objects()?;
                self.active = slot;
            }
            Transition::Switch(_) => {}
        }
        Ok(())
    }

    fn run_frame(&mut self, dt: f32) -> Result<(), GameError> {
        let scene: &mut dyn Scene = match self.active {
            SceneSlot::Lobby => &mut self.lobby,
            SceneSlot::Game => &mut self.game,
        };

        scene.process_input(&mut self.input, dt);
        self.shoot_timer = (self.shoot_timer - dt).max(0.0);
        if self.input.keyboard.is_down(self.controls.fire)
            && self.shoot_timer <= 0.0
            && scene.create_bullet()?
        {
            self.shoot_timer = self.shoot_cooldown;
            self.shots_fired += 1;
        }

        scene.animate_objects(dt)?;
        if let Some((position, basis)) = scene.player_frame() {
            self.camera.follow(position, basis, dt);
        }

        self.backend.begin_frame()?;
        self.commands.clear();
        scene.render(&self.camera, &mut self.commands)?;
        log::trace!(
            "Frame {}: {} commands, {} draws",
            self.timer.frame_count(),
            self.commands.len(),
            self.commands.draw_count()
        );
        self.backend.submit(&self.commands)?;
        self.backend.present()?;
        self.backend.move_to_next_frame()?;
        Ok(())
    }
}
