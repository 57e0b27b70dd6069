//! Drone controller: tick scheduling and host lifecycle.

use defensematrix_shared::{
    DroneCommand, DroneKind, Engine, MotionState, PeerId, Sensors, Transport,
};
use tracing::debug;

use crate::link::Link;
use crate::nav::NavController;

/// Tick divisors for the drone's subsystems.
const NETWORK_TICKS: u64 = 1;
const MOVE_TICKS: u64 = 1;
const ALIVE_TICKS: u64 = 10;
const CONNECT_RETRY_TICKS: u64 = 30;
const STATUS_TICKS: u64 = 30;

/// Drone-side configuration.
#[derive(Debug, Clone)]
pub struct DroneConfig {
    /// The single peer id this drone accepts inbound commands from, and the
    /// target of its connect requests.
    pub trusted_host: PeerId,
    pub kind: DroneKind,
}

impl Default for DroneConfig {
    fn default() -> Self {
        Self {
            trusted_host: 0,
            kind: DroneKind::Defense,
        }
    }
}

/// Owns all drone-side subsystems and advances them from an external
/// fixed-rate tick. Everything runs sequentially inside one tick; there are
/// no suspension points and no blocking I/O.
pub struct DroneController<T, E, S> {
    config: DroneConfig,
    transport: T,
    engine: E,
    sensors: S,
    link: Link,
    nav: NavController,
    running: bool,
    tick: u64,
}

impl<T: Transport, E: Engine, S: Sensors> DroneController<T, E, S> {
    pub fn new(config: DroneConfig, transport: T, engine: E, sensors: S) -> Self {
        let link = Link::new(config.trusted_host);
        Self {
            config,
            transport,
            engine,
            sensors,
            link,
            nav: NavController::new(),
            running: false,
            tick: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_connected()
    }

    pub fn nav(&self) -> &NavController {
        &self.nav
    }

    /// Begin ticking and issue the initial connect request.
    pub fn start(&mut self) {
        self.running = true;
        self.link.try_connect(&mut self.transport, self.config.kind);
    }

    /// Halt ticking; tells the host goodbye when a connection exists.
    pub fn stop(&mut self) {
        self.link.disconnect(&mut self.transport);
        self.running = false;
    }

    /// Advance one step of all subsystems. No-op while stopped.
    pub fn tick(&mut self) {
        if !self.running {
            return;
        }
        self.tick += 1;

        if self.tick % NETWORK_TICKS == 0 {
            self.link.pump(&mut self.transport, &mut self.nav);
        }

        if self.tick % MOVE_TICKS == 0 {
            if let Some(state) = self.nav.tick(&self.sensors, &mut self.engine) {
                self.link
                    .send_to_host(&mut self.transport, DroneCommand::SetPosition(state));
            }
        }

        if self.tick % ALIVE_TICKS == 0 && self.link.is_connected() {
            self.link
                .send_to_host(&mut self.transport, DroneCommand::NotifyAlive);
            // The arrival report is a single message on a lossy channel; the
            // host skips reassigning drones it believes are still en route,
            // so a lost Completed would wedge distribution. Re-announce it
            // until the next assignment resets the state.
            if self.nav.motion_state() == MotionState::Completed {
                self.link.send_to_host(
                    &mut self.transport,
                    DroneCommand::SetPosition(MotionState::Completed),
                );
            }
        }

        // An unanswered connect is indistinguishable from a lost or rejected
        // one; just ask again.
        if self.tick % CONNECT_RETRY_TICKS == 0 && !self.link.is_connected() {
            self.link.try_connect(&mut self.transport, self.config.kind);
        }

        if self.tick % STATUS_TICKS == 0 {
            debug!(
                connected = self.link.is_connected(),
                motion = ?self.nav.motion_state(),
                phase = ?self.nav.phase(),
                "system is up"
            );
        }
    }
}
