//! In-process swarm simulation: one main ship and a handful of defense
//! drones wired together over the hub transport, driven by a fixed-rate
//! tick with simple kinematic body integration.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use defensematrix_drone::{DroneConfig, DroneController};
use defensematrix_mainship::{MainShipConfig, MainShipController};
use defensematrix_shared::{Engine, Hub, HubEndpoint, Mat3, PeerId, Sensors, Vec3};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SHIP_ID: PeerId = 1;
const DRONE_COUNT: usize = 4;
const TICK_MS: u64 = 50;
const STATUS_EVERY: u64 = 100;

struct Body {
    position: Vec3,
    velocity: Vec3,
}

/// Shared simulated rigid body; the engine writes velocity, the sensors
/// read position, and the sim loop integrates in between.
#[derive(Clone)]
struct BodyHandle(Rc<RefCell<Body>>);

impl BodyHandle {
    fn new(position: Vec3) -> Self {
        Self(Rc::new(RefCell::new(Body {
            position,
            velocity: Vec3::ZERO,
        })))
    }

    fn step(&self, dt: f64) {
        let mut body = self.0.borrow_mut();
        let delta = body.velocity * dt;
        body.position = body.position + delta;
    }

    fn position(&self) -> Vec3 {
        self.0.borrow().position
    }
}

struct SimEngine(BodyHandle);

impl Engine for SimEngine {
    fn set_velocity(&mut self, target: Vec3) {
        self.0 .0.borrow_mut().velocity = target;
    }
    fn set_rotation(&mut self, _forward: Vec3, _roll: f64) {
        // bodies are point masses here, facing is not simulated
    }
}

struct SimSensors(BodyHandle);

impl Sensors for SimSensors {
    fn position(&self) -> Vec3 {
        self.0.position()
    }
    fn velocity(&self) -> Vec3 {
        self.0 .0.borrow().velocity
    }
    fn mass(&self) -> f64 {
        500.0
    }
    fn world_orientation(&self) -> Mat3 {
        Mat3::identity()
    }
}

/// The ship holds station at the world origin.
struct StationSensors;

impl Sensors for StationSensors {
    fn position(&self) -> Vec3 {
        Vec3::ZERO
    }
    fn velocity(&self) -> Vec3 {
        Vec3::ZERO
    }
    fn mass(&self) -> f64 {
        100_000.0
    }
    fn world_orientation(&self) -> Mat3 {
        Mat3::identity()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let hub = Hub::new();
    let mut ship = MainShipController::new(
        MainShipConfig::default(),
        hub.endpoint(SHIP_ID),
        StationSensors,
    );
    ship.start();
    info!(id = SHIP_ID, "main ship on station");

    let mut drones: Vec<(
        DroneController<HubEndpoint, SimEngine, SimSensors>,
        BodyHandle,
    )> = Vec::with_capacity(DRONE_COUNT);
    for i in 0..DRONE_COUNT {
        let id = 100 + i as PeerId;
        // scatter the launch points around the ship
        let angle = i as f64 * std::f64::consts::TAU / DRONE_COUNT as f64;
        let body = BodyHandle::new(Vec3::new(
            180.0 * angle.cos(),
            30.0 + 10.0 * i as f64,
            180.0 * angle.sin(),
        ));
        let mut controller = DroneController::new(
            DroneConfig {
                trusted_host: SHIP_ID,
                ..Default::default()
            },
            hub.endpoint(id),
            SimEngine(body.clone()),
            SimSensors(body.clone()),
        );
        controller.start();
        let launch = body.position();
        info!(id, x = launch.x, y = launch.y, z = launch.z, "drone launched");
        drones.push((controller, body));
    }

    let dt = TICK_MS as f64 / 1000.0;
    let mut ticker = tokio::time::interval(Duration::from_millis(TICK_MS));
    let mut tick: u64 = 0;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }
        tick += 1;

        ship.tick();
        for (controller, body) in &mut drones {
            controller.tick();
            body.step(dt);
        }

        if tick % STATUS_EVERY == 0 {
            for (controller, body) in &drones {
                info!(
                    connected = controller.is_connected(),
                    motion = ?controller.nav().motion_state(),
                    range = body.position().length(),
                    "drone status"
                );
            }
        }
    }

    info!("shutting down");
    for (controller, _) in &mut drones {
        controller.stop();
    }
    ship.stop();
    Ok(())
}
