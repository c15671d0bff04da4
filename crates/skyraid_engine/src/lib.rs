//! # Skyraid Engine
//!
//! The engine half of the Skyraid flight game.
//!
//! ## Features
//!
//! - **Scene Graph**: arena-indexed transform hierarchy with depth-first world propagation
//! - **Shared Assets**: generation-checked, reference-counted mesh/texture/material tables
//! - **Model Loading**: binary hierarchical frame/mesh/material models
//! - **Collision**: oriented bounding boxes with a separating-axis test
//! - **Rendering**: backend-agnostic command recording, light constants and a shader registry
//!
//! ## Quick Start
//!
//! ```rust
//! use skyraid_engine::prelude::*;
//!
//! let mut graph = SceneGraph::new();
//! let root = graph.create_node("root");
//! let child = graph.create_node("child");
//! graph.attach(root, child).unwrap();
//! graph.set_position(root, Vec3::new(1.0, 2.0, 3.0));
//! assert_eq!(graph.position(child), Vec3::new(1.0, 2.0, 3.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod assets;
pub mod scene;
pub mod physics;
pub mod render;
pub mod input;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        foundation::{
            math::{Mat4, Mat4Ext, Vec3, Vec4},
            time::Timer,
        },
        config::{Config, ConfigError},
        assets::{
            Material, MaterialId, Mesh, MeshId, ResourceError, ResourceManager, Texture,
            TextureId,
        },
        scene::{ModelTemplate, Motion, NodeId, SceneGraph, SceneError},
        physics::OrientedBox,
        render::{
            Camera, CommandList, Light, Lights, RenderBackend, RenderCommand, ShaderKind,
            ShaderRegistry,
        },
        input::{Direction, InputEvent, Key, KeyboardState, MouseButton},
    };
}
