//! Oriented bounding boxes
//!
//! Narrow-phase test between two boxes with arbitrary orientation, using the
//! separating axis theorem over the 15 candidate axes (3 face normals of each
//! box plus the 9 pairwise edge cross products).

use crate::foundation::math::{constants::EPSILON, Mat4, Mat4Ext, Point3, Vec3};

/// A box with its own orthonormal axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    /// Center in world space
    pub center: Vec3,
    /// Half size along each of `axes`
    pub extents: Vec3,
    /// Orthonormal box axes
    pub axes: [Vec3; 3],
}

impl OrientedBox {
    /// Box aligned with the world axes
    pub fn axis_aligned(center: Vec3, extents: Vec3) -> Self {
        Self {
            center,
            extents,
            axes: [Vec3::x(), Vec3::y(), Vec3::z()],
        }
    }

    /// Transform a model-space box (center + half extents) by a world matrix
    ///
    /// Scale in `world` is folded into the extents; the axes stay unit length.
    pub fn from_local(center: Vec3, extents: Vec3, world: &Mat4) -> Self {
        let scale = Vec3::new(
            world.fixed_view::<3, 1>(0, 0).norm(),
            world.fixed_view::<3, 1>(0, 1).norm(),
            world.fixed_view::<3, 1>(0, 2).norm(),
        );
        Self {
            center: world.transform_point(&Point3::from(center)).coords,
            extents: extents.component_mul(&scale),
            axes: [world.right(), world.up(), world.look()],
        }
    }

    /// The eight corners
    pub fn corners(&self) -> [Vec3; 8] {
        let [ax, ay, az] = self.axes;
        let e = self.extents;
        let mut corners = [Vec3::zeros(); 8];
        for (i, corner) in corners.iter_mut().enumerate() {
            let sx = if i & 1 == 0 { -1.0 } else { 1.0 };
            let sy = if i & 2 == 0 { -1.0 } else { 1.0 };
            let sz = if i & 4 == 0 { -1.0 } else { 1.0 };
            *corner = self.center + ax * (sx * e.x) + ay * (sy * e.y) + az * (sz * e.z);
        }
        corners
    }

    /// Whether `point` lies inside or on the box
    pub fn contains_point(&self, point: Vec3) -> bool {
        let d = point - self.center;
        self.axes
            .iter()
            .zip(self.extents.iter())
            .all(|(axis, &extent)| d.dot(axis).abs() <= extent + EPSILON)
    }

    /// Half length of the box's shadow on a unit axis
    fn projected_radius(&self, axis: &Vec3) -> f32 {
        self.axes
            .iter()
            .zip(self.extents.iter())
            .map(|(a, &e)| a.dot(axis).abs() * e)
            .sum()
    }

    /// Separating axis test; touching boxes count as intersecting
    pub fn intersects(&self, other: &Self) -> bool {
        let offset = other.center - self.center;

        let test_axis = |axis: Vec3| -> bool {
            let axis_len_sq = axis.magnitude_squared();
            if axis_len_sq < EPSILON {
                return true; // Parallel edges give no axis
            }
            let axis = axis / axis_len_sq.sqrt();
            let distance = offset.dot(&axis).abs();
            distance <= self.projected_radius(&axis) + other.projected_radius(&axis)
        };

        self.axes.iter().all(|&a| test_axis(a))
            && other.axes.iter().all(|&b| test_axis(b))
            && self
                .axes
                .iter()
                .all(|a| other.axes.iter().all(|b| test_axis(a.cross(b))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box(center: Vec3) -> OrientedBox {
        OrientedBox::axis_aligned(center, Vec3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_overlapping_and_separated_aligned_boxes() {
        let a = unit_box(Vec3::zeros());
        assert!(a.intersects(&unit_box(Vec3::new(1.5, 0.5, 0.0))));
        assert!(a.intersects(&unit_box(Vec3::new(2.0, 0.0, 0.0))));
        assert!(!a.intersects(&unit_box(Vec3::new(2.1, 0.0, 0.0))));
        assert!(!a.intersects(&unit_box(Vec3::new(0.0, 0.0, -3.0))));
    }

    #[test]
    fn test_rotated_box_reaches_further() {
        let a = unit_box(Vec3::zeros());
        let yaw = Mat4::rotation_axis(&Vec3::y(), 45.0);

        // A 45-degree box reaches sqrt(2) along x.
        let near = Mat4::new_translation(&Vec3::new(2.3, 0.0, 0.0)) * yaw;
        let b = OrientedBox::from_local(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0), &near);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));

        let far = Mat4::new_translation(&Vec3::new(2.5, 0.0, 0.0)) * yaw;
        let c = OrientedBox::from_local(Vec3::zeros(), Vec3::new(1.0, 1.0, 1.0), &far);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_edge_axis_separates_crossed_boxes() {
        // Two thin rods crossing at different heights, both rotated so no
        // face axis separates them; only an edge cross product does.
        let rod = Vec3::new(3.0, 0.1, 0.1);
        let a_world = Mat4::rotation_axis(&Vec3::y(), 45.0) * Mat4::rotation_axis(&Vec3::x(), 30.0);
        let b_world = Mat4::new_translation(&Vec3::new(0.0, 0.5, 0.0))
            * Mat4::rotation_axis(&Vec3::y(), -45.0)
            * Mat4::rotation_axis(&Vec3::x(), -30.0);
        let a = OrientedBox::from_local(Vec3::zeros(), rod, &a_world);
        let b = OrientedBox::from_local(Vec3::zeros(), rod, &b_world);
        let touching = OrientedBox::from_local(
            Vec3::zeros(),
            rod,
            &(Mat4::rotation_axis(&Vec3::y(), -45.0) * Mat4::rotation_axis(&Vec3::x(), -30.0)),
        );

        assert!(a.intersects(&touching));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_from_local_applies_scale_and_offset() {
        let world = Mat4::new_translation(&Vec3::new(10.0, 0.0, 0.0))
            * Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 1.0, 1.0));
        let b = OrientedBox::from_local(Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.5, 0.5, 0.5), &world);
        assert_relative_eq!(b.center, Vec3::new(12.0, 0.0, 0.0));
        assert_relative_eq!(b.extents, Vec3::new(1.0, 0.5, 0.5));
        assert!(b.contains_point(Vec3::new(12.9, 0.0, 0.0)));
        assert!(!b.contains_point(Vec3::new(13.1, 0.0, 0.0)));
    }

    #[test]
    fn test_corners_span_the_box() {
        let b = unit_box(Vec3::new(1.0, 2.0, 3.0));
        let corners = b.corners();
        assert!(corners.iter().all(|&c| b.contains_point(c)));
        assert_relative_eq!(corners[0], Vec3::new(0.0, 1.0, 2.0));
        assert_relative_eq!(corners[7], Vec3::new(2.0, 3.0, 4.0));
    }
}
