//! Sphere-relative placement targets.

use std::fmt;

use crate::math::Vec3;

/// A target point on a sphere of `radius` around `origin`, located along the
/// unit vector `direction`. Produced by the main ship's placement distributor
/// and held by a drone's navigation state while active; replaced wholesale on
/// each new assignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitPosition {
    pub origin: Vec3,
    pub direction: Vec3,
    pub radius: i32,
}

impl OrbitPosition {
    /// The absolute target point, `origin + direction * radius`.
    pub fn to_point(&self) -> Vec3 {
        self.to_point_with_direction(self.direction)
    }

    /// The point at `radius` along a caller-substituted direction. Used by
    /// the radial approach phase, which corrects distance along the drone's
    /// own bearing rather than the assigned one.
    pub fn to_point_with_direction(&self, direction: Vec3) -> Vec3 {
        self.origin + direction * f64::from(self.radius)
    }
}

impl fmt::Display for OrbitPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "origin=({:.1}, {:.1}, {:.1}) direction=({:.2}, {:.2}, {:.2}) radius={}",
            self.origin.x,
            self.origin.y,
            self.origin.z,
            self.direction.x,
            self.direction.y,
            self.direction.z,
            self.radius
        )
    }
}
