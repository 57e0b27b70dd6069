//! Defense-Matrix Shared Protocol
//!
//! This crate provides the wire codec, the command model and the transport
//! seam shared by the main ship and the defense drones. The radio channel is
//! unreliable unicast: messages may be lost, duplicated or reordered, and the
//! protocol tolerates loss through idempotent heartbeat and placement traffic
//! rather than through acknowledgements.

pub mod capability;
pub mod command;
pub mod math;
pub mod orbit;
pub mod packet;
pub mod transport;

use std::time::{SystemTime, UNIX_EPOCH};

/// Process-wide unique peer identity, assigned by the transport layer.
pub type PeerId = u64;

pub use capability::{Engine, Sensors};
pub use command::{DroneCommand, DroneKind, Envelope, MotionState, ShipCommand, WireCommand};
pub use math::{Mat3, Vec3};
pub use orbit::OrbitPosition;
pub use packet::{CodecError, Packet};
pub use transport::{Hub, HubEndpoint, InboundMessage, Transport};

/// Get current timestamp in milliseconds since Unix epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Protocol tuning parameters shared by both peers.
pub mod tuning {
    /// Registry capacity for defense drones; the pool never grows past this.
    pub const MAX_DEFENSE_DRONES: usize = 7;

    /// A drone whose heartbeat is older than this is marked not-alive.
    pub const HEARTBEAT_TIMEOUT_MS: u64 = 5_000;

    /// Orbit radius for drones awaiting an assignment.
    pub const INNER_RADIUS: i32 = 100;

    /// Orbit radius for drones that reported their slew complete.
    pub const OUTER_RADIUS: i32 = 120;

    /// Distance band around the target radius that counts as "on the sphere".
    pub const RADIUS_THRESHOLD: f64 = 7.0;

    /// Clamp applied to every commanded velocity, in m/s.
    pub const MAX_VELOCITY: f64 = 16.0;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_ms_monotonic_enough() {
        let a = now_ms();
        let b = now_ms();
        assert!(b >= a);
        assert!(a > 0);
    }
}
