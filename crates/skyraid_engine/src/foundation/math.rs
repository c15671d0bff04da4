//! Math utilities and types
//!
//! Matrices follow nalgebra's column-vector convention: a node's world matrix
//! is `parent_world * local`, the basis vectors live in the first three
//! columns and the translation in the fourth. The scene itself is Y-up with
//! +Z as the forward ("look") axis.

pub use nalgebra::{Matrix3, Matrix4, Quaternion, Unit, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Tolerance used for degenerate-vector checks
    pub const EPSILON: f32 = 1.0e-6;
}

/// Math utility functions
pub mod utils {
    use super::{constants, Vec3};

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Normalize `v`, or return `fallback` when `v` is (nearly) zero
    pub fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
        v.try_normalize(constants::EPSILON).unwrap_or(fallback)
    }
}

/// Extension trait for Mat4 with the accessors the scene code relies on
pub trait Mat4Ext {
    /// Rotation of `degrees` around an arbitrary axis (need not be normalized)
    fn rotation_axis(axis: &Vec3, degrees: f32) -> Mat4;

    /// Rotation from pitch/yaw/roll in degrees, applied roll, then pitch, then yaw
    fn rotation_pitch_yaw_roll(pitch: f32, yaw: f32, roll: f32) -> Mat4;

    /// Left-handed perspective projection with depth mapped to [0, 1]
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Left-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Translation column
    fn position(&self) -> Vec3;

    /// Overwrite the translation column
    fn set_position(&mut self, position: Vec3);

    /// Normalized first basis column
    fn right(&self) -> Vec3;

    /// Normalized second basis column
    fn up(&self) -> Vec3;

    /// Normalized third basis column
    fn look(&self) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn rotation_axis(axis: &Vec3, degrees: f32) -> Mat4 {
        match Unit::try_new(*axis, constants::EPSILON) {
            Some(axis) => Mat4::from_axis_angle(&axis, utils::deg_to_rad(degrees)),
            None => Mat4::identity(),
        }
    }

    fn rotation_pitch_yaw_roll(pitch: f32, yaw: f32, roll: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), utils::deg_to_rad(yaw))
            * Mat4::from_axis_angle(&Vec3::x_axis(), utils::deg_to_rad(pitch))
            * Mat4::from_axis_angle(&Vec3::z_axis(), utils::deg_to_rad(roll))
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let tan_half_fovy = (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = 1.0 / (aspect * tan_half_fovy);
        result[(1, 1)] = 1.0 / tan_half_fovy;
        result[(2, 2)] = far / (far - near);
        result[(2, 3)] = -(near * far) / (far - near);
        result[(3, 2)] = 1.0;
        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = utils::normalize_or(target - eye, Vec3::z());
        let right = utils::normalize_or(up.cross(&forward), Vec3::x());
        let camera_up = forward.cross(&right);

        Mat4::new(
            right.x, right.y, right.z, -right.dot(&eye),
            camera_up.x, camera_up.y, camera_up.z, -camera_up.dot(&eye),
            forward.x, forward.y, forward.z, -forward.dot(&eye),
            0.0, 0.0, 0.0, 1.0,
        )
    }

    fn position(&self) -> Vec3 {
        Vec3::new(self[(0, 3)], self[(1, 3)], self[(2, 3)])
    }

    fn set_position(&mut self, position: Vec3) {
        self[(0, 3)] = position.x;
        self[(1, 3)] = position.y;
        self[(2, 3)] = position.z;
    }

    fn right(&self) -> Vec3 {
        utils::normalize_or(self.fixed_view::<3, 1>(0, 0).into_owned(), Vec3::x())
    }

    fn up(&self) -> Vec3 {
        utils::normalize_or(self.fixed_view::<3, 1>(0, 1).into_owned(), Vec3::y())
    }

    fn look(&self) -> Vec3 {
        utils::normalize_or(self.fixed_view::<3, 1>(0, 2).into_owned(), Vec3::z())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_position_roundtrip() {
        let mut m = Mat4::identity();
        m.set_position(Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(m.position(), Vec3::new(1.0, 2.0, 3.0), epsilon = EPSILON);
        assert_relative_eq!(m, Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0)), epsilon = EPSILON);
    }

    #[test]
    fn test_rotation_axis_yaw_turns_look_towards_x() {
        let m = Mat4::rotation_axis(&Vec3::y(), 90.0);
        assert_relative_eq!(m.look(), Vec3::x(), epsilon = EPSILON);
        assert_relative_eq!(m.up(), Vec3::y(), epsilon = EPSILON);
    }

    #[test]
    fn test_rotation_axis_zero_axis_is_identity() {
        assert_eq!(Mat4::rotation_axis(&Vec3::zeros(), 45.0), Mat4::identity());
    }

    #[test]
    fn test_look_at_maps_target_onto_forward_axis() {
        let eye = Vec3::new(0.0, 0.0, -10.0);
        let view = Mat4::look_at(eye, Vec3::zeros(), Vec3::y());
        let p = view.transform_point(&Point3::origin());
        assert_relative_eq!(p.coords, Vec3::new(0.0, 0.0, 10.0), epsilon = EPSILON);
    }
}
