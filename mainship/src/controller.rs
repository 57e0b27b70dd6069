//! Main-ship controller: inbound dispatch, command effects, tick scheduling.

use bytes::Bytes;
use defensematrix_shared::tuning;
use defensematrix_shared::{
    now_ms, DroneCommand, Envelope, Packet, Sensors, ShipCommand, Transport,
};
use tracing::{debug, info, warn};

use crate::placement::PlacementDistributor;
use crate::pool::{DronePool, DroneRecord};

/// Tick divisors for the ship's subsystems.
const NETWORK_TICKS: u64 = 1;
const POOL_TICKS: u64 = 5;
const DISTRIBUTOR_TICKS: u64 = 1;
const STATUS_TICKS: u64 = 15;

/// Ship-side configuration.
#[derive(Debug, Clone)]
pub struct MainShipConfig {
    pub capacity: usize,
    pub heartbeat_timeout_ms: u64,
    pub inner_radius: i32,
    pub outer_radius: i32,
}

impl Default for MainShipConfig {
    fn default() -> Self {
        Self {
            capacity: tuning::MAX_DEFENSE_DRONES,
            heartbeat_timeout_ms: tuning::HEARTBEAT_TIMEOUT_MS,
            inner_radius: tuning::INNER_RADIUS,
            outer_radius: tuning::OUTER_RADIUS,
        }
    }
}

/// Owns the fleet registry and the placement distributor, and advances them
/// from an external fixed-rate tick. The ship accepts inbound traffic from
/// any sender; identity consistency is checked per command instead.
pub struct MainShipController<T, S> {
    transport: T,
    sensors: S,
    pool: DronePool,
    distributor: PlacementDistributor,
    running: bool,
    tick: u64,
}

impl<T: Transport, S: Sensors> MainShipController<T, S> {
    pub fn new(config: MainShipConfig, transport: T, sensors: S) -> Self {
        let pool = DronePool::new(config.capacity, config.heartbeat_timeout_ms);
        let distributor =
            PlacementDistributor::new(config.capacity, config.inner_radius, config.outer_radius);
        info!(capacity = config.capacity, "main-ship controller initialized");
        Self {
            transport,
            sensors,
            pool,
            distributor,
            running: false,
            tick: 0,
        }
    }

    pub fn pool(&self) -> &DronePool {
        &self.pool
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance one step of all subsystems. No-op while stopped.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        self.tick += 1;
        let now = now_ms();

        if self.tick % NETWORK_TICKS == 0 {
            self.pump(now);
        }

        if self.tick % POOL_TICKS == 0 {
            self.pool.sweep(now);
        }

        if self.tick % DISTRIBUTOR_TICKS == 0 {
            self.distributor
                .distribute(&self.pool, self.sensors.position(), &mut self.transport);
        }

        if self.tick % STATUS_TICKS == 0 {
            debug!(fleet = %self.pool.status_line(), "system is up");
        }
    }

    /// Drain all pending inbound messages and apply their effects.
    fn pump(&mut self, now: u64) {
        while let Some(message) = self.transport.try_receive() {
            let mut packet = Packet::from_bytes(&message.bytes);
            let mut envelope = match Envelope::<DroneCommand>::decode(&mut packet) {
                Ok(envelope) => envelope,
                Err(err) => {
                    warn!(sender = message.sender, error = %err, "parse error, message dropped");
                    continue;
                }
            };
            envelope.set_sender(message.sender);
            apply_drone_command(&envelope, &mut self.pool, &mut self.transport, now);
        }
    }
}

/// Apply a drone command's effect against the injected collaborators.
///
/// The envelope must be initialized (decode guarantees this for inbound
/// traffic; locally constructed envelopes panic otherwise) and its sender
/// stamped from the transport's source field.
pub fn apply_drone_command<T: Transport>(
    envelope: &Envelope<DroneCommand>,
    pool: &mut DronePool,
    transport: &mut T,
    now: u64,
) {
    let sender = envelope.sender();
    match *envelope.payload() {
        DroneCommand::Connect { id, kind } => {
            // Payload-claimed identity must match the authenticated source.
            if sender != id {
                warn!(sender, claimed = id, "connect with mismatched identity dropped");
                return;
            }
            if pool.register(DroneRecord::new(id, kind, now)) {
                info!(id, ?kind, "drone connected");
                let reply: Bytes = Envelope::sealed(ShipCommand::CommitConnect { connected: true })
                    .encode()
                    .into_bytes();
                transport.send_unicast(id, reply);
            } else {
                // No reject message exists; the drone's retry times out.
                warn!(id, "cannot connect drone: pool is full");
            }
        }
        DroneCommand::Disconnect => {
            pool.deregister(sender);
        }
        DroneCommand::NotifyAlive => {
            pool.heartbeat(sender, now);
        }
        DroneCommand::SetPosition(motion) => {
            debug!(id = sender, ?motion, "drone motion state updated");
            pool.update_motion(sender, motion);
        }
    }
}
