//! Main-ship side of the defense swarm: fleet registry, orbital slot
//! distribution, and the tick-driven controller that binds them to a
//! transport.

pub mod controller;
pub mod placement;
pub mod pool;

pub use controller::{apply_drone_command, MainShipConfig, MainShipController};
pub use placement::PlacementDistributor;
pub use pool::{DronePool, DroneRecord};
