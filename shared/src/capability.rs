//! Capability traits for the host vessel's hardware.
//!
//! The coordination core never touches thrusters or gyros directly; it
//! commands target velocities and facings through [`Engine`] and reads state
//! through [`Sensors`]. Hosts (the sim, or a real vessel bridge) implement
//! both.

use crate::math::{Mat3, Vec3};

/// Thrust/gyro actuation seam. Fire-and-forget: the engine owes no feedback.
pub trait Engine {
    /// Command a target velocity vector in world space.
    fn set_velocity(&mut self, target: Vec3);

    /// Command a facing. `roll` is the rotation around the forward axis.
    fn set_rotation(&mut self, forward: Vec3, roll: f64);
}

/// Orientation and telemetry readout for the local vessel.
pub trait Sensors {
    /// Current position in world space.
    fn position(&self) -> Vec3;

    /// Current linear velocity.
    fn velocity(&self) -> Vec3;

    /// Physical mass, for hosts that do thrust math.
    fn mass(&self) -> f64;

    /// World-space orientation matrix.
    fn world_orientation(&self) -> Mat3;
}
