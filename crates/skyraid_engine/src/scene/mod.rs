//! Scene management: the transform hierarchy and shared model templates

pub mod model;
pub mod motion;
pub mod scene_graph;

pub use model::ModelTemplate;
pub use motion::Motion;
pub use scene_graph::{Node, NodeId, SceneError, SceneGraph};
