//! Defense-Matrix Drone
//!
//! Drone-side half of the swarm coordination protocol: dispatch of commands
//! from the trusted main ship, connection lifecycle, and the two-phase
//! orbital navigation controller that turns placement assignments into
//! velocity and facing commands.

pub mod controller;
pub mod link;
pub mod nav;

pub use controller::{DroneConfig, DroneController};
pub use link::Link;
pub use nav::{NavController, Phase};
