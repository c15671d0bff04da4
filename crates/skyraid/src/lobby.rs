//! Title screen

use skyraid_engine::prelude::*;
use skyraid_engine::render::ShaderId;

use crate::assets::AssetLoader;
use crate::config::GameConfig;
use crate::error::GameError;
use crate::scene::{Scene, SceneSlot, Transition};

/// Full-screen title image; any start input enters the game
pub struct LobbyScene {
    config: GameConfig,
    ui: Option<ShaderId>,
    resources: ResourceManager,
    title: Option<TextureId>,
}

impl LobbyScene {
    /// Lobby drawn with the registry's UI pipeline
    pub fn new(config: GameConfig, shaders: &ShaderRegistry) -> Self {
        Self {
            config,
            ui: shaders.get(ShaderKind::Ui),
            resources: ResourceManager::new(),
            title: None,
        }
    }

    /// Title texture, once built
    pub const fn title(&self) -> Option<TextureId> {
        self.title
    }
}

impl Scene for LobbyScene {
    fn build_objects(&mut self) -> Result<(), GameError> {
        self.release_objects()?;
        let loader = AssetLoader::new(&self.config.scene);
        let texture = loader.texture(&self.config.scene.title_texture, [20, 30, 60, 255])?;
        let id = self.resources.add_texture(texture);
        self.resources.add_ref_texture(id)?;
        self.title = Some(id);
        Ok(())
    }

    fn release_objects(&mut self) -> Result<(), GameError> {
        if let Some(title) = self.title.take() {
            self.resources.release_texture(title)?;
        }
        Ok(())
    }

    fn animate_objects(&mut self, _dt: f32) -> Result<(), GameError> {
        Ok(())
    }

    fn render(&mut self, camera: &Camera, commands: &mut CommandList) -> Result<(), GameError> {
        commands.push(RenderCommand::SetRootSignature);
        commands.push(RenderCommand::SetCamera(camera.constants()));
        if let Some(ui) = self.ui {
            commands.push(RenderCommand::SetPipeline(ui));
        }
        let viewport = camera.viewport();
        commands.push(RenderCommand::DrawUi {
            texture: self.title,
            rect: [viewport.x, viewport.y, viewport.width, viewport.height],
        });
        Ok(())
    }

    fn on_keyboard(&mut self, key: Key, pressed: bool) -> Transition {
        let controls = &self.config.controls;
        match key {
            _ if !pressed => Transition::Stay,
            k if k == controls.start_game => Transition::Switch(SceneSlot::Game),
            k if k == controls.quit => Transition::Quit,
            _ => Transition::Stay,
        }
    }

    fn on_mouse(&mut self, button: MouseButton, pressed: bool) -> Transition {
        if pressed && button == MouseButton::Left {
            Transition::Switch(SceneSlot::Game)
        } else {
            Transition::Stay
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn lobby() -> LobbyScene {
        let mut config = GameConfig::default();
        config.scene.asset_root = PathBuf::from("no/such/assets");
        LobbyScene::new(config, &ShaderRegistry::with_all_kinds())
    }

    #[test]
    fn test_renders_title_over_viewport() {
        let mut lobby = lobby();
        lobby.build_objects().unwrap();
        let mut camera = Camera::default();
        camera.set_viewport(800, 600);

        let mut commands = CommandList::new();
        lobby.render(&camera, &mut commands).unwrap();
        assert_eq!(commands.len(), 4);
        assert_eq!(
            commands.as_slice()[3],
            RenderCommand::DrawUi {
                texture: lobby.title(),
                rect: [0.0, 0.0, 800.0, 600.0],
            }
        );

        lobby.release_objects().unwrap();
        assert_eq!(lobby.resources.live_counts(), (0, 0, 0));
    }

    #[test]
    fn test_start_inputs_switch_to_game() {
        let mut lobby = lobby();
        assert_eq!(lobby.on_keyboard(Key::Enter, false), Transition::Stay);
        assert_eq!(lobby.on_keyboard(Key::Enter, true), Transition::Switch(SceneSlot::Game));
        assert_eq!(lobby.on_mouse(MouseButton::Right, true), Transition::Stay);
        assert_eq!(lobby.on_mouse(MouseButton::Left, true), Transition::Switch(SceneSlot::Game));
        assert_eq!(lobby.on_keyboard(Key::Escape, true), Transition::Quit);
    }
}
