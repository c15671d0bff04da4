//! Per-node animation policies

use serde::{Deserialize, Serialize};

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// What a node does to its own local transform on every animate pass
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Motion {
    /// Transform only changes when moved explicitly
    #[default]
    Static,
    /// Spin around an axis of the node's own local frame
    Rotating {
        /// Local-space axis
        axis: Vec3,
        /// Angular speed
        degrees_per_second: f32,
    },
    /// Orbit the parent's origin by rotating the local translation around an axis
    Revolving {
        /// Parent-space axis
        axis: Vec3,
        /// Angular speed
        degrees_per_second: f32,
    },
}

impl Motion {
    /// Local transform after `dt` seconds of this motion
    ///
    /// Spinning post-multiplies (rotation in the node's frame, position
    /// kept); orbiting pre-multiplies (rotation in the parent's frame, which
    /// carries the position around the axis).
    pub fn apply(&self, local: &Mat4, dt: f32) -> Mat4 {
        match *self {
            Self::Static => *local,
            Self::Rotating { axis, degrees_per_second } => {
                local * Mat4::rotation_axis(&axis, degrees_per_second * dt)
            }
            Self::Revolving { axis, degrees_per_second } => {
                Mat4::rotation_axis(&axis, degrees_per_second * dt) * local
            }
        }
    }
}
