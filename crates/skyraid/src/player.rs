//! The player's aircraft

use skyraid_engine::prelude::*;

use crate::config::GameplayConfig;
use crate::objects::{AnimateContext, GameObject, ObjectKind};

/// Player flight tuning
#[derive(Debug, Clone, Copy)]
pub struct PlayerParams {
    /// Top speed
    pub max_speed: f32,
    /// Speed lost per second
    pub friction: f32,
    /// Minimum clearance above the terrain
    pub hover_height: f32,
    /// Start (x, z)
    pub start: [f32; 2],
}

impl PlayerParams {
    /// Take the player settings from the gameplay configuration
    pub fn from_config(config: &GameplayConfig) -> Self {
        Self {
            max_speed: config.player_max_speed,
            friction: config.player_friction,
            hover_height: config.hover_height,
            start: config.player_start,
        }
    }
}

/// Input-driven aircraft
#[derive(Debug)]
pub struct Player {
    root: NodeId,
    velocity: Vec3,
    params: PlayerParams,
}

impl Player {
    /// Wrap a fresh instance of `template`
    pub fn new(
        graph: &mut SceneGraph,
        resources: &mut ResourceManager,
        template: &ModelTemplate,
        params: PlayerParams,
    ) -> Result<Self, SceneError> {
        let root = graph.create_node("Player");
        let model = template.instantiate(graph, resources)?;
        graph.attach(root, model)?;
        Ok(Self {
            root,
            velocity: Vec3::zeros(),
            params,
        })
    }

    /// Root node
    pub const fn node(&self) -> NodeId {
        self.root
    }

    /// Current velocity
    pub const fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// World position
    pub fn position(&self, graph: &SceneGraph) -> Vec3 {
        graph.position(self.root)
    }

    /// World forward axis
    pub fn look(&self, graph: &SceneGraph) -> Vec3 {
        graph.look(self.root)
    }

    /// World basis as (right, up, look)
    pub fn basis(&self, graph: &SceneGraph) -> [Vec3; 3] {
        [graph.right(self.root), graph.up(self.root), graph.look(self.root)]
    }

    /// Accelerate along the held directions
    pub fn move_by(&mut self, graph: &SceneGraph, direction: Direction, distance: f32) {
        if direction.is_empty() {
            return;
        }
        let [right, up, look] = self.basis(graph);
        let axis = |positive: Direction, negative: Direction| {
            f32::from(u8::from(direction.contains(positive))) - f32::from(u8::from(direction.contains(negative)))
        };
        let shift = look * axis(Direction::FORWARD, Direction::BACKWARD)
            + right * axis(Direction::RIGHT, Direction::LEFT)
            + up * axis(Direction::UP, Direction::DOWN);

        self.velocity += shift * distance;
        let speed = self.velocity.norm();
        if speed > self.params.max_speed {
            self.velocity *= self.params.max_speed / speed;
        }
    }

    /// Turn in the aircraft's own frame (degrees)
    pub fn rotate(&self, graph: &mut SceneGraph, pitch: f32, yaw: f32, roll: f32) {
        graph.rotate_pitch_yaw_roll(self.root, pitch, yaw, roll);
    }

    /// Place at (x, z) resting `hover_height` above the ground
    pub fn place(&self, ctx: &mut AnimateContext<'_>, x: f32, z: f32) {
        let y = ctx.terrain.height(x, z) + self.params.hover_height;
        ctx.graph.set_position(self.root, Vec3::new(x, y, z));
    }
}

impl GameObject for Player {
    fn kind(&self) -> ObjectKind {
        ObjectKind::Player
    }

    fn root(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn on_initialize(&mut self, ctx: &mut AnimateContext<'_>) {
        let [x, z] = self.params.start;
        self.place(ctx, x, z);
    }

    fn animate(&mut self, ctx: &mut AnimateContext<'_>) {
        ctx.graph.translate(self.root, self.velocity * ctx.dt);

        let position = ctx.graph.position(self.root);
        let floor = ctx.terrain.height(position.x, position.z) + self.params.hover_height;
        if position.y < floor {
            ctx.graph.set_position(self.root, Vec3::new(position.x, floor, position.z));
        }

        let speed = self.velocity.norm();
        let slowdown = self.params.friction * ctx.dt;
        self.velocity = if speed > slowdown {
            self.velocity * ((speed - slowdown) / speed)
        } else {
            Vec3::zeros()
        };

        ctx.graph.animate(self.root, ctx.dt, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::airplane_model;
    use crate::terrain::{HeightMap, Terrain};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn setup() -> (SceneGraph, ResourceManager, Terrain, Player) {
        let mut graph = SceneGraph::new();
        let mut resources = ResourceManager::new();
        let terrain = Terrain::new(HeightMap::flat(9, 9, 20), 9, Vec3::new(100.0, 1.0, 100.0), Vec4::zeros(), &mut graph, &mut resources).unwrap();
        let template = ModelTemplate::register(&airplane_model(), &mut resources, None).unwrap();
        let params = PlayerParams::from_config(&GameplayConfig::default());
        let player = Player::new(&mut graph, &mut resources, &template, params).unwrap();
        (graph, resources, terrain, player)
    }

    #[test]
    fn test_starts_hovering_over_terrain() {
        let (mut graph, _resources, terrain, mut player) = setup();
        let mut rng = StdRng::seed_from_u64(0);
        player.on_initialize(&mut AnimateContext {
            graph: &mut graph,
            terrain: &terrain,
            rng: &mut rng,
            dt: 0.0,
        });
        assert_relative_eq!(player.position(&graph), Vec3::new(625.0, 23.0, 425.0), epsilon = 1e-4);
    }

    #[test]
    fn test_move_clamps_speed_and_friction_stops() {
        let (mut graph, _resources, terrain, mut player) = setup();
        let mut rng = StdRng::seed_from_u64(0);
        graph.set_position(player.node(), Vec3::new(100.0, 80.0, 100.0));

        player.move_by(&graph, Direction::FORWARD | Direction::RIGHT, 1000.0);
        assert_relative_eq!(player.velocity().norm(), 60.0, epsilon = 1e-3);

        player.move_by(&graph, Direction::FORWARD | Direction::BACKWARD, 10.0);
        assert_relative_eq!(player.velocity().norm(), 60.0, epsilon = 1e-3);

        let mut ctx = AnimateContext {
            graph: &mut graph,
            terrain: &terrain,
            rng: &mut rng,
            dt: 0.5,
        };
        player.animate(&mut ctx);
        assert_relative_eq!(player.velocity().norm(), 35.0, epsilon = 1e-3);
        player.animate(&mut ctx);
        player.animate(&mut ctx);
        assert_relative_eq!(player.velocity().norm(), 0.0);

        // 60 * 0.5 + 35 * 0.5 + 10 * 0.5 units travelled, diagonally in x/z.
        let travelled = (player.position(&graph) - Vec3::new(100.0, 80.0, 100.0)).norm();
        assert_relative_eq!(travelled, 52.5, epsilon = 1e-2);
    }

    #[test]
    fn test_never_sinks_below_hover_height() {
        let (mut graph, _resources, terrain, mut player) = setup();
        let mut rng = StdRng::seed_from_u64(0);
        graph.set_position(player.node(), Vec3::new(300.0, 24.0, 300.0));
        player.move_by(&graph, Direction::DOWN, 50.0);

        player.animate(&mut AnimateContext {
            graph: &mut graph,
            terrain: &terrain,
            rng: &mut rng,
            dt: 0.5,
        });
        assert_relative_eq!(player.position(&graph).y, 23.0, epsilon = 1e-4);
    }
}
