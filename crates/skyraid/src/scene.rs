//! The game scene
//!
//! [`GameScene`] owns the world and runs the per-frame contract:
//!
//! ```text
//! animate_objects(dt)   villains (remove fallen), player, trees, props, headlight, water
//! render(camera)        root signature, camera, lights, sky, terrain, player, props,
//!                       villains, bullets, trees, stencil clear, water
//! ```
//!
//! Bullets are advanced and drawn inside `render`; their collision results
//! are collected in list order and the list is compacted afterwards.

use rand::rngs::StdRng;
use rand::SeedableRng;
use skyraid_engine::assets::{ModelData, Texture};
use skyraid_engine::input::InputState;
use skyraid_engine::prelude::*;

use crate::assets::{airplane_model, helicopter_model, AssetLoader};
use crate::billboard::BillboardBatch;
use crate::bullet::{Bullet, BulletTemplate};
use crate::config::{GameConfig, SceneConfig};
use crate::error::GameError;
use crate::objects::{AnimateContext, GameObject, Prop, RenderContext};
use crate::player::{Player, PlayerParams};
use crate::skybox::Skybox;
use crate::terrain::{HeightMap, Terrain};
use crate::villain::{Villain, VillainParams};
use crate::water::Water;

/// Light slot that follows the player
pub const HEADLIGHT: usize = 1;

/// Tree quad size (width, height)
const TREE_SIZE: (f32, f32) = (8.0, 12.0);

/// Which scene the framework is driving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneSlot {
    /// Title screen
    Lobby,
    /// The game world
    Game,
}

/// What a scene asks the framework to do after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Keep running the current scene
    Stay,
    /// Switch to another scene
    Switch(SceneSlot),
    /// Close the game
    Quit,
}

/// A scene driven by the framework once per frame
pub trait Scene {
    /// Create every object; called when the scene becomes active
    fn build_objects(&mut self) -> Result<(), GameError>;

    /// Destroy every object and give back all asset references
    fn release_objects(&mut self) -> Result<(), GameError>;

    /// Advance the simulation by `dt` seconds
    fn animate_objects(&mut self, dt: f32) -> Result<(), GameError>;

    /// Record this frame's commands
    fn render(&mut self, camera: &Camera, commands: &mut CommandList) -> Result<(), GameError>;

    /// Apply held keys and mouse drag
    fn process_input(&mut self, _input: &mut InputState, _dt: f32) {}

    /// A key went down or up
    fn on_keyboard(&mut self, _key: Key, _pressed: bool) -> Transition {
        Transition::Stay
    }

    /// A mouse button went down or up
    fn on_mouse(&mut self, _button: MouseButton, _pressed: bool) -> Transition {
        Transition::Stay
    }

    /// Fire a shot from the player; false when the scene has nothing to fire
    fn create_bullet(&mut self) -> Result<bool, GameError> {
        Ok(false)
    }

    /// Player position and (right, up, look) basis, for the camera
    fn player_frame(&self) -> Option<(Vec3, [Vec3; 3])> {
        None
    }
}

/// The light table the world starts with
pub fn default_lights() -> Lights {
    let attenuation = Vec3::new(1.0, 0.01, 0.0001);
    let mut lights = Lights::new();
    lights.global_ambient = Vec4::new(0.15, 0.15, 0.15, 1.0);

    lights.set(
        0,
        Light::spot(
            Vec3::new(-50.0, 20.0, -5.0),
            Vec3::new(0.0, 0.0, 1.0),
            500.0,
            attenuation,
            8.0,
            20.0,
            40.0,
            Vec4::new(0.1, 0.1, 0.1, 1.0),
            Vec4::new(0.4, 0.4, 0.4, 1.0),
            Vec4::new(0.3, 0.3, 0.3, 0.0),
        ),
    );
    lights.set(
        HEADLIGHT,
        Light::directional(
            Vec3::new(1.0, 0.0, 0.0),
            Vec4::new(0.3, 0.3, 0.3, 1.0),
            Vec4::new(0.8, 0.8, 0.8, 1.0),
            Vec4::new(0.4, 0.4, 0.4, 0.0),
        ),
    );
    lights.set(
        2,
        Light::spot(
            Vec3::new(50.0, 30.0, 30.0),
            Vec3::new(0.0, 1.0, 1.0),
            600.0,
            attenuation,
            8.0,
            30.0,
            90.0,
            Vec4::new(0.3, 0.3, 0.3, 1.0),
            Vec4::new(0.3, 0.7, 0.0, 1.0),
            Vec4::new(0.3, 0.3, 0.3, 0.0),
        ),
    );
    lights
}

/// Everything read from disk to build the world
#[derive(Debug)]
pub struct SceneAssets {
    /// Terrain samples
    pub heightmap: HeightMap,
    /// Model flown by villains
    pub villain_model: ModelData,
    /// Model flown by the player
    pub player_model: ModelData,
    /// Applied to every villain material
    pub villain_texture: Option<Texture>,
    /// Water surface
    pub water_texture: Option<Texture>,
    /// Sky cube
    pub skybox_texture: Option<Texture>,
    /// Tree quads
    pub billboard_texture: Option<Texture>,
}

impl SceneAssets {
    /// Load the configured files, falling back to placeholders when allowed
    pub fn load(config: &SceneConfig) -> Result<Self, GameError> {
        let loader = AssetLoader::new(config);
        Ok(Self {
            heightmap: loader.heightmap(&config.terrain_file, config.terrain_width, config.terrain_length)?,
            villain_model: loader.model(&config.villain_model, || {
                helicopter_model(&config.main_rotor_frame, &config.tail_rotor_frame)
            })?,
            player_model: loader.model(&config.player_model, airplane_model)?,
            villain_texture: Some(loader.texture(&config.villain_texture, [90, 100, 60, 255])?),
            water_texture: Some(loader.texture(&config.water_texture, [40, 90, 160, 180])?),
            skybox_texture: Some(loader.texture(&config.skybox_texture, [120, 170, 230, 255])?),
            billboard_texture: Some(loader.texture(&config.billboard_texture, [30, 110, 40, 255])?),
        })
    }
}

struct GameWorld {
    graph: SceneGraph,
    resources: ResourceManager,
    terrain: Terrain,
    water: Water,
    skybox: Skybox,
    player: Player,
    villains: Vec<Option<Villain>>,
    bullets: Vec<Bullet>,
    billboards: BillboardBatch,
    props: Vec<Prop>,
    bullet_template: BulletTemplate,
    villain_template: ModelTemplate,
    player_template: ModelTemplate,
}

impl GameWorld {
    /// Collision test for one bullet; hitting a villain sets it falling
    fn bullet_collision(&mut self, index: usize, play_area: f32) -> bool {
        let Some(bullet) = self.bullets.get(index) else {
            return false;
        };
        let position = bullet.position(&self.graph);
        if self.terrain.height(position.x, position.z) > position.y {
            return true;
        }
        let bounds = 0.0..=play_area;
        if !bounds.contains(&position.x) || !bounds.contains(&position.z) {
            return true;
        }

        let Some(shot) = bullet.collision_box(&self.graph, &self.resources) else {
            return false;
        };
        for (slot, villain) in self.villains.iter_mut().enumerate() {
            let Some(villain) = villain else {
                continue;
            };
            if villain.is_falling() {
                continue;
            }
            let hit = villain
                .collision_box(&self.graph, &self.resources)
                .is_some_and(|target| target.intersects(&shot));
            if hit {
                villain.set_falling();
                log::info!("Villain {slot} shot down at {:.1?}", villain.position(&self.graph));
                return true;
            }
        }
        false
    }

    fn top_level_props(&self) -> impl Iterator<Item = &Prop> {
        self.props.iter().filter(|p| self.graph.parent(p.node()).is_none())
    }

    /// Tear everything down; returns the assets still alive afterwards
    fn release(self) -> Result<(usize, usize, usize), GameError> {
        let Self {
            mut graph,
            mut resources,
            terrain,
            water,
            skybox,
            player,
            villains,
            bullets,
            billboards,
            props,
            bullet_template,
            villain_template,
            player_template,
        } = self;

        for bullet in bullets {
            bullet.destroy(&mut graph, &mut resources)?;
        }
        for villain in villains.into_iter().flatten() {
            villain.destroy(&mut graph, &mut resources)?;
        }
        let prop_roots: Vec<NodeId> = props
            .iter()
            .map(Prop::node)
            .filter(|&id| graph.parent(id).is_none())
            .collect();
        let roots = [terrain.root(), water.root(), skybox.root(), player.root()];
        for root in roots.into_iter().flatten().chain(prop_roots) {
            graph.destroy(root, &mut resources)?;
        }

        bullet_template.release(&mut resources)?;
        villain_template.release(&mut resources)?;
        player_template.release(&mut resources)?;
        billboards.release(&mut resources)?;
        Ok(resources.live_counts())
    }
}

/// Beacon tower with a spinning lamp and an orbiting marker
fn build_beacon(
    graph: &mut SceneGraph,
    resources: &mut ResourceManager,
    terrain: &Terrain,
    [x, z]: [f32; 2],
) -> Result<Vec<Prop>, GameError> {
    let steel = resources.add_material(Material::colored("BeaconSteel", Vec4::new(0.5, 0.5, 0.55, 1.0)))?;
    let lamp = resources.add_material(Material::colored("BeaconLamp", Vec4::new(1.0, 0.2, 0.1, 1.0)))?;

    let mesh = resources.add_mesh(Mesh::cube("BeaconTower", 2.0, 20.0, 2.0));
    let tower = Prop::new(graph, resources, "BeaconTower", mesh, steel, Motion::Static)?;
    graph.set_position(tower.node(), Vec3::new(x, terrain.height(x, z) + 10.0, z));

    let mesh = resources.add_mesh(Mesh::cube("BeaconLamp", 3.0, 1.0, 3.0));
    let spinner = Prop::new(
        graph,
        resources,
        "BeaconLamp",
        mesh,
        lamp,
        Motion::Rotating {
            axis: Vec3::y(),
            degrees_per_second: 90.0,
        },
    )?;
    graph.attach(tower.node(), spinner.node())?;
    graph.set_position(spinner.node(), Vec3::new(0.0, 10.5, 0.0));

    let mesh = resources.add_mesh(Mesh::cube("BeaconMarker", 1.0, 1.0, 1.0));
    let marker = Prop::new(
        graph,
        resources,
        "BeaconMarker",
        mesh,
        steel,
        Motion::Revolving {
            axis: Vec3::y(),
            degrees_per_second: 45.0,
        },
    )?;
    graph.attach(tower.node(), marker.node())?;
    graph.set_position(marker.node(), Vec3::new(8.0, 12.0, 0.0));

    Ok(vec![tower, spinner, marker])
}

/// The playable world
pub struct GameScene {
    config: GameConfig,
    shaders: ShaderRegistry,
    lights: Lights,
    rng: StdRng,
    last_dt: f32,
    world: Option<GameWorld>,
}

impl GameScene {
    /// Empty scene; nothing exists until [`Scene::build_objects`]
    pub fn new(config: GameConfig, shaders: ShaderRegistry) -> Self {
        let rng = StdRng::seed_from_u64(config.scene.rng_seed);
        Self {
            config,
            shaders,
            lights: default_lights(),
            rng,
            last_dt: 0.0,
            world: None,
        }
    }

    /// Build the world from already loaded assets
    pub fn build_from_assets(&mut self, assets: SceneAssets) -> Result<(), GameError> {
        if self.world.is_some() {
            self.release_objects()?;
        }
        let scene = &self.config.scene;
        let mut graph = SceneGraph::new();
        let mut resources = ResourceManager::new();
        let illuminated = self.shaders.require(ShaderKind::Illuminated)?;

        let mut terrain = Terrain::new(
            assets.heightmap,
            scene.terrain_block,
            Vec3::from(scene.terrain_scale),
            Vec4::from(scene.terrain_color),
            &mut graph,
            &mut resources,
        )?;

        let water_texture = assets.water_texture.map(|t| resources.add_texture(t));
        let mut water = Water::new(
            &mut graph,
            &mut resources,
            scene.water_size,
            Vec3::from(scene.water_scale),
            scene.water_height,
            scene.wave_speed,
            water_texture,
        )?;

        let skybox_texture = assets.skybox_texture.map(|t| resources.add_texture(t));
        let mut skybox = Skybox::new(&mut graph, &mut resources, scene.skybox_size, skybox_texture)?;

        let mut villain_template = ModelTemplate::register(&assets.villain_model, &mut resources, Some(illuminated))?;
        let villain_texture = assets.villain_texture.map(|t| resources.add_texture(t));
        villain_template.set_texture(villain_texture, &mut resources)?;
        let params = VillainParams::from_config(scene);
        let mut villains = Vec::with_capacity(scene.villain_spawns.len());
        for &spawn in &scene.villain_spawns {
            let villain = Villain::new(&mut graph, &mut resources, &villain_template, Vec3::from(spawn), params.clone())?;
            villains.push(Some(villain));
        }

        let player_template = ModelTemplate::register(&assets.player_model, &mut resources, Some(illuminated))?;
        let mut player = Player::new(
            &mut graph,
            &mut resources,
            &player_template,
            PlayerParams::from_config(&self.config.gameplay),
        )?;

        let bullet_template = BulletTemplate::new(
            &mut resources,
            Vec3::from(scene.bullet_size),
            scene.bullet_speed,
            Some(self.shaders.require(ShaderKind::Diffused)?),
        )?;

        let billboard_texture = assets.billboard_texture.map(|t| resources.add_texture(t));
        let mut billboards = BillboardBatch::new(&mut resources, TREE_SIZE.0, TREE_SIZE.1, billboard_texture)?;
        billboards.scatter(scene.billboard_count, &terrain, &mut self.rng);

        let mut props = build_beacon(&mut graph, &mut resources, &terrain, scene.beacon_position)?;

        terrain.build_materials(&graph, &mut resources, &self.shaders)?;
        water.build_materials(&graph, &mut resources, &self.shaders)?;
        skybox.build_materials(&graph, &mut resources, &self.shaders)?;
        player.build_materials(&graph, &mut resources, &self.shaders)?;
        billboards.build_materials(&graph, &mut resources, &self.shaders)?;
        for villain in villains.iter_mut().flatten() {
            villain.build_materials(&graph, &mut resources, &self.shaders)?;
        }
        for prop in &mut props {
            prop.build_materials(&graph, &mut resources, &self.shaders)?;
        }

        let mut ctx = AnimateContext {
            graph: &mut graph,
            terrain: &terrain,
            rng: &mut self.rng,
            dt: 0.0,
        };
        player.on_initialize(&mut ctx);
        for villain in villains.iter_mut().flatten() {
            villain.on_initialize(&mut ctx);
        }

        let (meshes, textures, materials) = resources.live_counts();
        log::info!(
            "Game scene built: {} villains, {} trees, {} terrain patches, {meshes} meshes, {textures} textures, {materials} materials",
            villains.len(),
            billboards.trees().len(),
            terrain.patch_count(),
        );

        self.lights = default_lights();
        self.world = Some(GameWorld {
            graph,
            resources,
            terrain,
            water,
            skybox,
            player,
            villains,
            bullets: Vec::new(),
            billboards,
            props,
            bullet_template,
            villain_template,
            player_template,
        });
        Ok(())
    }

    /// Whether the world exists
    pub fn is_built(&self) -> bool {
        self.world.is_some()
    }

    /// Current light table
    pub const fn lights(&self) -> &Lights {
        &self.lights
    }

    /// Bullets in flight
    pub fn bullet_count(&self) -> usize {
        self.world.as_ref().map_or(0, |w| w.bullets.len())
    }

    /// Villain slots that still hold a villain
    pub fn live_villains(&self) -> usize {
        self.world.as_ref().map_or(0, |w| w.villains.iter().flatten().count())
    }

    /// Collision test for the bullet at `index`
    ///
    /// True when the bullet is under the terrain, outside the play area, or
    /// inside a villain that is not already falling. In the last case the
    /// first such villain in slot order is set falling.
    pub fn bullet_collision(&mut self, index: usize) -> bool {
        let play_area = self.config.scene.play_area;
        self.world
            .as_mut()
            .is_some_and(|world| world.bullet_collision(index, play_area))
    }
}

impl Scene for GameScene {
    fn build_objects(&mut self) -> Result<(), GameError> {
        let assets = SceneAssets::load(&self.config.scene)?;
        self.build_from_assets(assets)
    }

    fn release_objects(&mut self) -> Result<(), GameError> {
        let Some(world) = self.world.take() else {
            return Ok(());
        };
        let (meshes, textures, materials) = world.release()?;
        if meshes + textures + materials > 0 {
            log::warn!("Game scene released with {meshes} meshes, {textures} textures, {materials} materials still alive");
        } else {
            log::info!("Game scene released");
        }
        Ok(())
    }

    fn animate_objects(&mut self, dt: f32) -> Result<(), GameError> {
        self.last_dt = dt;
        let min_altitude = self.config.scene.min_altitude;
        let Some(world) = self.world.as_mut() else {
            return Ok(());
        };
        let GameWorld {
            graph,
            resources,
            terrain,
            water,
            player,
            villains,
            billboards,
            props,
            ..
        } = world;
        let mut ctx = AnimateContext {
            graph,
            terrain,
            rng: &mut self.rng,
            dt,
        };

        for (index, slot) in villains.iter_mut().enumerate() {
            let Some(villain) = slot else {
                continue;
            };
            villain.animate(&mut ctx);
            if villain.should_be_removed(ctx.graph, ctx.terrain, min_altitude) {
                if let Some(villain) = slot.take() {
                    log::info!("Villain {index} crashed at {:.1?}", villain.position(ctx.graph));
                    villain.destroy(ctx.graph, resources)?;
                }
            }
        }

        player.animate(&mut ctx);
        billboards.animate(&mut ctx);
        for prop in props.iter_mut() {
            if ctx.graph.parent(prop.node()).is_none() {
                prop.animate(&mut ctx);
            }
        }

        if let Some(headlight) = self.lights.get_mut(HEADLIGHT) {
            headlight.position = player.position(ctx.graph);
            headlight.direction = player.look(ctx.graph);
        }

        water.animate(&mut ctx);
        Ok(())
    }

    fn render(&mut self, camera: &Camera, commands: &mut CommandList) -> Result<(), GameError> {
        let play_area = self.config.scene.play_area;
        let Some(world) = self.world.as_mut() else {
            return Ok(());
        };
        world.skybox.follow(&mut world.graph, camera.position());

        if self.config.scene.render_reanimates_villains {
            let mut ctx = AnimateContext {
                graph: &mut world.graph,
                terrain: &world.terrain,
                rng: &mut self.rng,
                dt: self.last_dt,
            };
            for villain in world.villains.iter_mut().flatten() {
                villain.animate(&mut ctx);
            }
        }
        for bullet in &world.bullets {
            bullet.advance(&mut world.graph, self.last_dt);
        }

        commands.push(RenderCommand::SetRootSignature);
        commands.push(RenderCommand::SetCamera(camera.constants()));
        commands.push(RenderCommand::UpdateLights(Box::new(self.lights.to_raw())));

        let mut ctx = RenderContext::new(&world.graph, &world.resources, commands);
        world.skybox.render(&mut ctx);
        world.terrain.render(&mut ctx);
        world.player.render(&mut ctx);
        for prop in world.top_level_props() {
            prop.render(&mut ctx);
        }
        for villain in world.villains.iter().flatten() {
            villain.render(&mut ctx);
        }
        for bullet in &world.bullets {
            bullet.render(&mut ctx);
        }
        world.billboards.render(&mut ctx);
        ctx.commands.push(RenderCommand::ClearStencil);
        world.water.render(&mut ctx);

        let hits: Vec<bool> = (0..world.bullets.len())
            .map(|index| world.bullet_collision(index, play_area))
            .collect();
        if hits.contains(&true) {
            let bullets = std::mem::take(&mut world.bullets);
            for (bullet, hit) in bullets.into_iter().zip(hits) {
                if hit {
                    bullet.destroy(&mut world.graph, &mut world.resources)?;
                } else {
                    world.bullets.push(bullet);
                }
            }
        }
        Ok(())
    }

    fn process_input(&mut self, input: &mut InputState, dt: f32) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        let gameplay = &self.config.gameplay;
        let direction = input.keyboard.direction();
        world.player.move_by(&world.graph, direction, gameplay.player_speed * dt);

        let (dx, dy) = input.take_drag();
        if dx != 0.0 || dy != 0.0 {
            let (pitch, turn) = (dy * gameplay.mouse_sensitivity, dx * gameplay.mouse_sensitivity);
            if input.keyboard.is_down(Key::Control) {
                world.player.rotate(&mut world.graph, pitch, 0.0, -turn);
            } else {
                world.player.rotate(&mut world.graph, pitch, turn, 0.0);
            }
        }
    }

    fn on_keyboard(&mut self, key: Key, pressed: bool) -> Transition {
        let controls = &self.config.controls;
        if !pressed {
            return Transition::Stay;
        }
        if key == controls.quit {
            return Transition::Quit;
        }
        let Some(world) = self.world.as_mut() else {
            return Transition::Stay;
        };
        if key == controls.toggle_tessellation {
            let mode = world.terrain.toggle_tessellation();
            log::info!("Terrain drawn {mode:?}");
        } else if key == controls.toggle_billboards {
            world.billboards.toggle_visible();
        }
        Transition::Stay
    }

    fn create_bullet(&mut self) -> Result<bool, GameError> {
        let Some(world) = self.world.as_mut() else {
            return Ok(false);
        };
        let transform = world.graph.local(world.player.node());
        let bullet = Bullet::spawn(&mut world.graph, &mut world.resources, &world.bullet_template, transform)?;
        log::debug!("Bullet fired from {:.1?}", bullet.position(&world.graph));
        world.bullets.push(bullet);
        Ok(true)
    }

    fn player_frame(&self) -> Option<(Vec3, [Vec3; 3])> {
        let world = self.world.as_ref()?;
        Some((world.player.position(&world.graph), world.player.basis(&world.graph)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TessellationMode;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn small_config(spawns: Vec<[f32; 3]>) -> GameConfig {
        let mut config = GameConfig::default();
        config.scene.terrain_width = 9;
        config.scene.terrain_length = 9;
        config.scene.terrain_scale = [20.0, 1.0, 20.0];
        config.scene.water_size = 4;
        config.scene.billboard_count = 5;
        config.scene.villain_spawns = spawns;
        config.scene.beacon_position = [100.0, 100.0];
        config.gameplay.player_start = [60.0, 60.0];
        config
    }

    fn assets(ground: u8) -> SceneAssets {
        SceneAssets {
            heightmap: HeightMap::flat(9, 9, ground),
            villain_model: helicopter_model("Rotor", "Back_Rotor"),
            player_model: airplane_model(),
            villain_texture: Some(Texture::solid("drone", [90, 100, 60, 255])),
            water_texture: None,
            skybox_texture: Some(Texture::solid("sky", [120, 170, 230, 255])),
            billboard_texture: None,
        }
    }

    fn scene_with(ground: u8, spawns: Vec<[f32; 3]>) -> GameScene {
        let mut scene = GameScene::new(small_config(spawns), ShaderRegistry::with_all_kinds());
        scene.build_from_assets(assets(ground)).unwrap();
        scene
    }

    fn world(scene: &mut GameScene) -> &mut GameWorld {
        scene.world.as_mut().unwrap()
    }

    fn villain_node(scene: &mut GameScene, slot: usize) -> NodeId {
        world(scene).villains[slot].as_ref().and_then(GameObject::root).unwrap()
    }

    fn bullet_at(scene: &mut GameScene, position: Vec3) -> usize {
        scene.create_bullet().unwrap();
        let world = world(scene);
        let bullet = world.bullets.last().unwrap().node();
        world.graph.set_position(bullet, position);
        world.bullets.len() - 1
    }

    #[test]
    fn test_bullet_shoots_down_villain_end_to_end() {
        let mut scene = scene_with(5, vec![[10.0, 45.0, 12.0]]);
        let camera = Camera::default();
        {
            let world = world(&mut scene);
            let player = world.player.node();
            world.graph.set_position(player, Vec3::new(10.0, 50.0, 10.0));
            world.graph.look_towards(player, Vec3::new(10.0, 45.0, 12.0), Vec3::y());
        }
        assert_relative_eq!(world(&mut scene).terrain.height(10.0, 12.0), 5.0);

        scene.create_bullet().unwrap();
        assert_eq!(scene.bullet_count(), 1);

        let mut hit_frame = None;
        for frame in 0..6 {
            scene.animate_objects(DT).unwrap();
            let mut commands = CommandList::new();
            scene.render(&camera, &mut commands).unwrap();

            let falling = world(&mut scene).villains[0].as_ref().unwrap().is_falling();
            if falling {
                assert_eq!(scene.bullet_count(), 0, "bullet removed the frame it hits");
                hit_frame = Some(frame);
                break;
            }
            assert_eq!(scene.bullet_count(), 1);
        }
        assert!(hit_frame.is_some_and(|f| f >= 1), "hit after a few frames, got {hit_frame:?}");
        assert_eq!(scene.live_villains(), 1);
    }

    #[test]
    fn test_falling_villain_below_floor_is_removed() {
        let mut scene = scene_with(5, vec![[50.0, 29.0, 50.0], [60.0, 100.0, 60.0]]);
        world(&mut scene).villains[0].as_mut().unwrap().set_falling();

        scene.animate_objects(DT).unwrap();
        assert!(world(&mut scene).villains[0].is_none());
        assert_eq!(scene.live_villains(), 1);

        // The slot stays empty.
        scene.animate_objects(DT).unwrap();
        assert!(world(&mut scene).villains[0].is_none());
    }

    #[test]
    fn test_falling_villain_removal_depends_on_terrain() {
        let mut scene = scene_with(60, vec![[50.0, 50.0, 50.0]]);
        world(&mut scene).villains[0].as_mut().unwrap().set_falling();
        scene.animate_objects(DT).unwrap();
        assert_eq!(scene.live_villains(), 0);

        let mut scene = scene_with(10, vec![[50.0, 50.0, 50.0]]);
        world(&mut scene).villains[0].as_mut().unwrap().set_falling();
        scene.animate_objects(DT).unwrap();
        assert_eq!(scene.live_villains(), 1);
    }

    #[test]
    fn test_roaming_villain_is_never_removed() {
        let mut scene = scene_with(5, vec![[50.0, 29.0, 50.0]]);
        scene.animate_objects(DT).unwrap();
        assert_eq!(scene.live_villains(), 1);
    }

    #[test]
    fn test_bullet_under_terrain_or_out_of_bounds_collides() {
        let mut scene = scene_with(5, Vec::new());
        let buried = bullet_at(&mut scene, Vec3::new(20.0, 3.0, 20.0));
        assert!(scene.bullet_collision(buried));

        let outside = bullet_at(&mut scene, Vec3::new(905.0, 50.0, 10.0));
        assert!(scene.bullet_collision(outside));

        let clear = bullet_at(&mut scene, Vec3::new(20.0, 50.0, 20.0));
        assert!(!scene.bullet_collision(clear));
        assert!(!scene.bullet_collision(99));
    }

    #[test]
    fn test_bullet_sets_first_live_villain_falling() {
        let mut scene = scene_with(5, vec![[40.0, 60.0, 40.0], [40.0, 60.0, 40.0]]);
        let node = villain_node(&mut scene, 0);
        let target = world(&mut scene).graph.position(node);
        let bullet = bullet_at(&mut scene, target);

        assert!(scene.bullet_collision(bullet));
        let villains = &world(&mut scene).villains;
        assert!(villains[0].as_ref().unwrap().is_falling());
        assert!(!villains[1].as_ref().unwrap().is_falling());
    }

    #[test]
    fn test_falling_villain_does_not_stop_bullets() {
        let mut scene = scene_with(5, vec![[40.0, 60.0, 40.0]]);
        let node = villain_node(&mut scene, 0);
        let target = world(&mut scene).graph.position(node);
        world(&mut scene).villains[0].as_mut().unwrap().set_falling();
        let bullet = bullet_at(&mut scene, target);

        assert!(!scene.bullet_collision(bullet));
        assert!(!scene.bullet_collision(bullet));
        assert!(world(&mut scene).villains[0].as_ref().unwrap().is_falling());
    }

    #[test]
    fn test_two_bullets_on_one_villain_in_one_frame() {
        let mut scene = scene_with(5, vec![[40.0, 60.0, 40.0]]);
        let node = villain_node(&mut scene, 0);
        let target = world(&mut scene).graph.position(node);
        let first = bullet_at(&mut scene, target);
        let second = bullet_at(&mut scene, target);
        let second_node = world(&mut scene).bullets[second].node();
        assert_eq!((first, second), (0, 1));

        // Nothing animated yet, so bullets stay put during render.
        let mut commands = CommandList::new();
        scene.render(&Camera::default(), &mut commands).unwrap();

        // The first bullet takes the hit; the second passes the falling villain.
        assert_eq!(scene.bullet_count(), 1);
        let world = world(&mut scene);
        assert_eq!(world.bullets[0].node(), second_node);
        assert!(world.villains[0].as_ref().unwrap().is_falling());
        assert_eq!(scene.live_villains(), 1);
    }

    #[test]
    fn test_render_records_frame_in_order() {
        let mut scene = scene_with(5, vec![[40.0, 60.0, 40.0]]);
        let shaders = ShaderRegistry::with_all_kinds();
        let camera = Camera::default();
        scene.animate_objects(DT).unwrap();
        let mut commands = CommandList::new();
        scene.render(&camera, &mut commands).unwrap();

        let list = commands.as_slice();
        assert_eq!(list[0], RenderCommand::SetRootSignature);
        assert!(matches!(list[1], RenderCommand::SetCamera(_)));
        assert!(matches!(list[2], RenderCommand::UpdateLights(_)));
        assert_eq!(
            list[3],
            RenderCommand::SetPipeline(shaders.get(ShaderKind::Skybox).unwrap())
        );

        let terrain = commands
            .position(|c| matches!(c, RenderCommand::DrawTerrainPatch { tessellation: Some(_), .. }))
            .unwrap();
        let trees = commands.position(|c| matches!(c, RenderCommand::DrawInstanced { .. })).unwrap();
        let clear = commands.position(|c| *c == RenderCommand::ClearStencil).unwrap();
        let stencil = commands.position(|c| *c == RenderCommand::SetStencilRef(1)).unwrap();
        assert!(4 < terrain && terrain < trees && trees < clear && clear < stencil);
        assert!(matches!(list.last(), Some(RenderCommand::DrawMesh { .. })));
    }

    #[test]
    fn test_headlight_follows_player() {
        let mut scene = scene_with(5, Vec::new());
        {
            let world = world(&mut scene);
            let player = world.player.node();
            world.graph.set_position(player, Vec3::new(30.0, 40.0, 50.0));
            world.graph.look_towards(player, Vec3::new(130.0, 40.0, 50.0), Vec3::y());
        }
        scene.animate_objects(DT).unwrap();

        let headlight = scene.lights().get(HEADLIGHT).unwrap();
        assert_relative_eq!(headlight.position, Vec3::new(30.0, 40.0, 50.0), epsilon = 1e-4);
        assert_relative_eq!(headlight.direction, Vec3::x(), epsilon = 1e-4);
        assert_relative_eq!(scene.lights().global_ambient.x, 0.15);
    }

    #[test]
    fn test_keys_toggle_terrain_and_trees() {
        let mut scene = scene_with(5, Vec::new());
        assert_eq!(scene.on_keyboard(Key::T, true), Transition::Stay);
        assert_eq!(world(&mut scene).terrain.mode(), TessellationMode::Flat);
        scene.on_keyboard(Key::T, false);
        assert_eq!(world(&mut scene).terrain.mode(), TessellationMode::Flat);

        scene.on_keyboard(Key::B, true);
        assert!(!world(&mut scene).billboards.is_visible());
        assert_eq!(scene.on_keyboard(Key::Escape, true), Transition::Quit);
    }

    #[test]
    fn test_release_returns_every_asset() {
        let mut scene = scene_with(5, vec![[40.0, 60.0, 40.0], [80.0, 60.0, 80.0]]);
        scene.create_bullet().unwrap();
        scene.animate_objects(DT).unwrap();

        let world = scene.world.take().unwrap();
        assert!(world.resources.live_counts().0 > 0);
        assert_eq!(world.release().unwrap(), (0, 0, 0));
    }
}
