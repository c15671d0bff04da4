//! # 3D Camera
//!
//! A perspective camera with an orthonormal basis and a third-person follow
//! mode.
//!
//! ## Design Principles
//! - **Library-agnostic**: the camera only produces matrices; the backend
//!   receives them through [`CameraConstants`]
//! - **Cached matrices**: the view matrix is regenerated whenever position or
//!   basis change, the projection whenever the lens changes
//!
//! # Coordinate System
//! Left-handed, Y-up, +Z forward in both world and view space. Depth maps to
//! [0, 1].

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{utils, Mat4, Mat4Ext, Vec3};

/// Camera data as uploaded to the shaders
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CameraConstants {
    /// World -> view
    pub view: [[f32; 4]; 4],
    /// View -> clip
    pub projection: [[f32; 4]; 4],
    /// Eye position (w = 1)
    pub position: [f32; 4],
}

/// Pixel rectangle the camera renders into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width in pixels
    pub width: f32,
    /// Height in pixels
    pub height: f32,
}

/// Perspective camera
///
/// # Example
/// ```rust
/// use skyraid_engine::foundation::math::Vec3;
/// use skyraid_engine::render::Camera;
///
/// let mut camera = Camera::perspective(60.0, 800.0 / 600.0, 1.01, 5000.0);
/// camera.look_at(Vec3::new(0.0, 10.0, -20.0), Vec3::zeros(), Vec3::y());
/// assert!(camera.look().z > 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    right: Vec3,
    up: Vec3,
    look: Vec3,

    /// Follow offset in the target's local frame (right, up, look)
    pub offset: Vec3,

    /// Seconds the camera takes to catch up with its follow position; 0 snaps
    pub time_lag: f32,

    fov_degrees: f32,
    aspect: f32,
    near: f32,
    far: f32,
    viewport: Viewport,

    view: Mat4,
    projection: Mat4,
}

impl Camera {
    /// Create a camera at the origin looking down +Z
    ///
    /// # Arguments
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `aspect` - Width / height
    /// * `near` - Near plane distance (> 0)
    /// * `far` - Far plane distance (> near)
    pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Vec3::zeros(),
            right: Vec3::x(),
            up: Vec3::y(),
            look: Vec3::z(),
            offset: Vec3::new(0.0, 5.0, -10.0),
            time_lag: 0.0,
            fov_degrees,
            aspect,
            near,
            far,
            viewport: Viewport {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
            },
            view: Mat4::identity(),
            projection: Mat4::identity(),
        };
        camera.regenerate_projection();
        camera.regenerate_view();
        camera
    }

    /// Set the pixel rectangle and update the aspect ratio to match
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Viewport {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height.max(1) as f32,
        };
        self.aspect = self.viewport.width / self.viewport.height;
        self.regenerate_projection();
    }

    /// Place the camera at `eye` looking at `target`
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, world_up: Vec3) {
        self.position = eye;
        self.look = utils::normalize_or(target - eye, self.look);
        self.right = utils::normalize_or(world_up.cross(&self.look), self.right);
        self.up = self.look.cross(&self.right);
        self.regenerate_view();
    }

    /// Third-person follow step
    ///
    /// The desired eye is `target_position` plus [`offset`](Self::offset)
    /// expressed in the target's basis. With a non-zero
    /// [`time_lag`](Self::time_lag) the eye moves only `dt / time_lag` of the
    /// way there per call; the camera always ends up looking at the target.
    pub fn follow(&mut self, target_position: Vec3, target_basis: [Vec3; 3], dt: f32) {
        let [right, up, look] = target_basis;
        let desired = target_position + right * self.offset.x + up * self.offset.y + look * self.offset.z;

        let t = if self.time_lag > 0.0 {
            (dt / self.time_lag).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let eye = self.position + (desired - self.position) * t;
        self.look_at(eye, target_position, up);
    }

    fn regenerate_view(&mut self) {
        self.view = Mat4::look_at(self.position, self.position + self.look, self.up);
    }

    fn regenerate_projection(&mut self) {
        self.projection = Mat4::perspective(
            utils::deg_to_rad(self.fov_degrees),
            self.aspect,
            self.near,
            self.far,
        );
    }

    /// Eye position
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Forward axis
    pub const fn look(&self) -> Vec3 {
        self.look
    }

    /// Up axis
    pub const fn up(&self) -> Vec3 {
        self.up
    }

    /// Right axis
    pub const fn right(&self) -> Vec3 {
        self.right
    }

    /// Cached view matrix
    pub const fn view(&self) -> &Mat4 {
        &self.view
    }

    /// Cached projection matrix
    pub const fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Current viewport
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Combined view-projection (`projection * view`)
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Shader constants for this camera
    pub fn constants(&self) -> CameraConstants {
        CameraConstants {
            view: self.view.into(),
            projection: self.projection.into(),
            position: [self.position.x, self.position.y, self.position.z, 1.0],
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(60.0, 4.0 / 3.0, 1.01, 5000.0)
    }
}
