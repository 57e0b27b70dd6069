//! Placement distributor: maps live drones to orbital directions.

use bytes::Bytes;
use defensematrix_shared::{
    DroneKind, Envelope, MotionState, OrbitPosition, ShipCommand, Transport, Vec3,
};
use tracing::{debug, info};

use crate::pool::DronePool;

/// Pushes `DesiredOrbitPosition` assignments to the fleet.
///
/// Directions are precomputed once, one per registry slot, with an even
/// spherical distribution. The binding is positional: a drone keeps the
/// direction of whichever slot it occupies, so slot reuse after eviction
/// silently reassigns directions.
#[derive(Debug)]
pub struct PlacementDistributor {
    directions: Vec<Vec3>,
    inner_radius: i32,
    outer_radius: i32,
}

impl PlacementDistributor {
    pub fn new(capacity: usize, inner_radius: i32, outer_radius: i32) -> Self {
        let directions = sphere_distribution(capacity);
        info!(capacity, "placement distributor initialized");
        Self {
            directions,
            inner_radius,
            outer_radius,
        }
    }

    /// Direction bound to a registry slot.
    pub fn direction(&self, slot: usize) -> Vec3 {
        self.directions[slot]
    }

    /// One distribution pass: assign every live defense drone a target on
    /// the sphere around `origin`. Radius follows the drone's reported
    /// motion state; drones already en route (`Running`) are skipped to
    /// avoid redundant reassignment.
    pub fn distribute<T: Transport>(&self, pool: &DronePool, origin: Vec3, transport: &mut T) {
        for (slot, drone) in pool.iter_slots() {
            if !drone.alive || drone.kind != DroneKind::Defense {
                continue;
            }
            let radius = match drone.motion {
                MotionState::Idle => self.inner_radius,
                MotionState::Running => continue,
                MotionState::Completed => self.outer_radius,
            };

            let position = OrbitPosition {
                origin,
                direction: self.directions[slot],
                radius,
            };
            debug!(id = drone.id, slot, %position, "assigning orbit position");

            let bytes: Bytes = Envelope::sealed(ShipCommand::DesiredOrbitPosition(position))
                .encode()
                .into_bytes();
            transport.send_unicast(drone.id, bytes);
        }
    }
}

/// Even unit-direction distribution over the sphere (Fibonacci lattice).
fn sphere_distribution(count: usize) -> Vec<Vec3> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![Vec3::new(0.0, 1.0, 0.0)];
    }

    let golden_angle = std::f64::consts::PI * (3.0 - 5.0_f64.sqrt());
    (0..count)
        .map(|i| {
            let y = 1.0 - (i as f64 / (count as f64 - 1.0)) * 2.0;
            let ring = (1.0 - y * y).sqrt();
            let theta = golden_angle * i as f64;
            Vec3::new(theta.cos() * ring, y, theta.sin() * ring).normalized()
        })
        .collect()
}
