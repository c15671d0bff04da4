//! Enemy helicopters
//!
//! A villain roams between random points near its spawn until a bullet hits
//! it. From then on it is falling: it no longer steers or takes hits, and
//! the scene removes it once it drops below the minimum altitude or into
//! the ground.

use rand::Rng;
use skyraid_engine::prelude::*;

use crate::config::SceneConfig;
use crate::objects::{AnimateContext, GameObject, ObjectKind};
use crate::terrain::Terrain;

/// A target closer than this counts as reached
const ARRIVAL_DISTANCE: f32 = 1.0;

/// Behavior of a live villain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VillainState {
    /// Flying between random targets
    Roaming,
    /// Shot down
    Falling,
}

/// Tuning shared by all villains
#[derive(Debug, Clone)]
pub struct VillainParams {
    /// Targets are picked within this distance of the spawn point
    pub roam_radius: f32,
    /// Roaming speed
    pub roam_speed: f32,
    /// Descent speed once falling
    pub fall_speed: f32,
    /// Rotor spin in degrees per second
    pub rotor_speed: f32,
    /// Main rotor frame name
    pub main_rotor_frame: String,
    /// Tail rotor frame name
    pub tail_rotor_frame: String,
}

impl VillainParams {
    /// Take the villain settings from the scene configuration
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            roam_radius: config.roam_radius,
            roam_speed: config.roam_speed,
            fall_speed: config.fall_speed,
            rotor_speed: config.rotor_speed,
            main_rotor_frame: config.main_rotor_frame.clone(),
            tail_rotor_frame: config.tail_rotor_frame.clone(),
        }
    }
}

/// Enemy helicopter
#[derive(Debug)]
pub struct Villain {
    root: NodeId,
    model: NodeId,
    state: VillainState,
    spawn: Vec3,
    target: Vec3,
    params: VillainParams,
}

impl Villain {
    /// Wrap a fresh instance of `template`; call `on_initialize` before animating
    pub fn new(
        graph: &mut SceneGraph,
        resources: &mut ResourceManager,
        template: &ModelTemplate,
        spawn: Vec3,
        params: VillainParams,
    ) -> Result<Self, SceneError> {
        let root = graph.create_node("Villain");
        let model = template.instantiate(graph, resources)?;
        graph.attach(root, model)?;
        Ok(Self {
            root,
            model,
            state: VillainState::Roaming,
            spawn,
            target: spawn,
            params,
        })
    }

    /// Current state
    pub const fn state(&self) -> VillainState {
        self.state
    }

    /// Whether the villain has been shot down
    pub fn is_falling(&self) -> bool {
        self.state == VillainState::Falling
    }

    /// Mark as shot down; false if it already was
    pub fn set_falling(&mut self) -> bool {
        if self.is_falling() {
            return false;
        }
        self.state = VillainState::Falling;
        true
    }

    /// Current roam target
    pub const fn target(&self) -> Vec3 {
        self.target
    }

    /// World position
    pub fn position(&self, graph: &SceneGraph) -> Vec3 {
        graph.position(self.root)
    }

    /// Collision proxy: the first mesh of the model
    pub fn collision_box(&self, graph: &SceneGraph, resources: &ResourceManager) -> Option<OrientedBox> {
        graph.subtree_box(self.root, resources)
    }

    /// Whether a falling villain has hit the floor or the ground
    pub fn should_be_removed(&self, graph: &SceneGraph, terrain: &Terrain, min_altitude: f32) -> bool {
        let position = self.position(graph);
        self.is_falling() && (position.y < min_altitude || position.y < terrain.height(position.x, position.z))
    }

    /// Remove the villain's nodes and drop its references
    pub fn destroy(self, graph: &mut SceneGraph, resources: &mut ResourceManager) -> Result<(), SceneError> {
        graph.destroy(self.root, resources).map(drop)
    }

    fn pick_target(&mut self, rng: &mut impl Rng) {
        let radius = self.params.roam_radius.abs();
        self.target = self.spawn
            + Vec3::new(rng.gen_range(-radius..=radius), 0.0, rng.gen_range(-radius..=radius));
    }

    fn roam(&mut self, ctx: &mut AnimateContext<'_>) {
        let step = self.params.roam_speed * ctx.dt;
        let distance = (self.target - ctx.graph.position(self.root)).norm();
        if distance <= step.max(ARRIVAL_DISTANCE) {
            self.pick_target(ctx.rng);
            return;
        }
        ctx.graph.look_towards(self.root, self.target, Vec3::y());
        ctx.graph.move_forward(self.root, step);
    }

    fn fall(&self, ctx: &mut AnimateContext<'_>) {
        ctx.graph.translate(self.root, Vec3::new(0.0, -self.params.fall_speed * ctx.dt, 0.0));
        ctx.graph.move_forward(self.root, self.params.roam_speed * 0.5 * ctx.dt);
    }
}

impl GameObject for Villain {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Villain
    }

    fn root(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn on_initialize(&mut self, ctx: &mut AnimateContext<'_>) {
        ctx.graph.set_position(self.root, self.spawn);

        let rotors = [
            (&self.params.main_rotor_frame, Vec3::y(), self.params.rotor_speed),
            (&self.params.tail_rotor_frame, Vec3::x(), self.params.rotor_speed * 1.5),
        ];
        for (name, axis, speed) in rotors {
            match ctx.graph.find_frame(self.model, name) {
                Some(frame) => {
                    if let Some(motion) = ctx.graph.motion_mut(frame) {
                        *motion = Motion::Rotating {
                            axis,
                            degrees_per_second: speed,
                        };
                    }
                }
                None => log::debug!("Villain model has no frame named {name}"),
            }
        }

        self.pick_target(ctx.rng);
        ctx.graph.look_towards(self.root, self.target, Vec3::y());
    }

    fn animate(&mut self, ctx: &mut AnimateContext<'_>) {
        match self.state {
            VillainState::Roaming => self.roam(ctx),
            VillainState::Falling => self.fall(ctx),
        }
        ctx.graph.animate(self.root, ctx.dt, None);
    }
}
