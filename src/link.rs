//! Drone-side network link: trusted-host dispatch and connection state.

use bytes::Bytes;
use defensematrix_shared::{
    DroneCommand, DroneKind, Envelope, Packet, PeerId, ShipCommand, Transport, WireCommand,
};
use tracing::{info, warn};

use crate::nav::NavController;

/// Connection state toward the main ship plus the inbound dispatch loop.
///
/// Only messages from the single configured trusted host are accepted;
/// everything else is logged and dropped. A decode failure drops just the
/// offending message and draining continues, so one corrupt frame cannot
/// starve the rest of the tick's queue.
#[derive(Debug)]
pub struct Link {
    trusted_host: PeerId,
    connected: bool,
    host: PeerId,
}

impl Link {
    pub fn new(trusted_host: PeerId) -> Self {
        Self {
            trusted_host,
            connected: false,
            host: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The acknowledged host id; meaningful only while connected.
    pub fn host(&self) -> PeerId {
        self.host
    }

    /// Drain all pending inbound messages and apply their effects.
    pub fn pump<T: Transport>(&mut self, transport: &mut T, nav: &mut NavController) {
        while let Some(message) = transport.try_receive() {
            if message.sender != self.trusted_host {
                warn!(
                    sender = message.sender,
                    trusted = self.trusted_host,
                    "dropping message from untrusted sender"
                );
                continue;
            }

            let mut packet = Packet::from_bytes(&message.bytes);
            let mut envelope = match Envelope::<ShipCommand>::decode(&mut packet) {
                Ok(envelope) => envelope,
                Err(err) => {
                    warn!(sender = message.sender, error = %err, "parse error, message dropped");
                    continue;
                }
            };
            envelope.set_sender(message.sender);
            self.apply(&envelope, nav, transport);
        }
    }

    fn apply<T: Transport>(
        &mut self,
        envelope: &Envelope<ShipCommand>,
        nav: &mut NavController,
        transport: &mut T,
    ) {
        match *envelope.payload() {
            ShipCommand::CommitConnect { connected } => {
                if connected {
                    self.host = envelope.sender();
                    self.connected = true;
                    info!(host = self.host, "successfully connected to host");
                }
                // connected == false is reserved for explicit-reject semantics
            }
            ShipCommand::DesiredOrbitPosition(position) => {
                let note = nav.assign(position);
                self.send_to_host(transport, DroneCommand::SetPosition(note));
            }
        }
    }

    /// Send a command to the acknowledged host. No-op while unconnected.
    pub fn send_to_host<T: Transport>(&self, transport: &mut T, command: DroneCommand) -> bool {
        if !self.connected {
            return false;
        }
        send_to(transport, self.host, command)
    }

    /// Issue a connect request toward the trusted host.
    pub fn try_connect<T: Transport>(&self, transport: &mut T, kind: DroneKind) {
        let id = transport.local_id();
        info!(id, host = self.trusted_host, "trying to connect to host");
        send_to(
            transport,
            self.trusted_host,
            DroneCommand::Connect { id, kind },
        );
    }

    /// Leave the fleet. Tells the host first when a connection exists.
    pub fn disconnect<T: Transport>(&mut self, transport: &mut T) {
        if self.connected {
            send_to(transport, self.host, DroneCommand::Disconnect);
            self.connected = false;
            self.host = 0;
        }
    }
}

fn send_to<T: Transport>(transport: &mut T, target: PeerId, command: DroneCommand) -> bool {
    let name = command.name();
    let bytes: Bytes = Envelope::sealed(command).encode().into_bytes();
    let sent = transport.send_unicast(target, bytes);
    if !sent {
        warn!(target, command = name, "unicast send failed");
    }
    sent
}
