//! Command model: two closed tag spaces plus a shared envelope.
//!
//! Drone→ship traffic ([`DroneCommand`]) and ship→drone traffic
//! ([`ShipCommand`]) each form a closed enumeration serialized as a single
//! tag byte followed by the command's attributes and a trailing
//! `initialized` byte. The sender id is never carried in the payload: the
//! dispatcher stamps it from the transport layer's authenticated source
//! field after decoding.
//!
//! The `initialized` flag enforces a construction discipline: an envelope
//! must be initialized exactly once before it is serialized or applied.
//! Violating that locally is a programming error and panics; a wire message
//! whose flag is clear is rejected as a decode error instead, so a peer
//! cannot crash us.

use crate::orbit::OrbitPosition;
use crate::packet::{CodecError, Packet};
use crate::PeerId;

/// Drone hull classes managed by the fleet registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroneKind {
    Defense,
}

impl DroneKind {
    pub fn to_byte(self) -> u8 {
        match self {
            DroneKind::Defense => 0,
        }
    }

    pub fn try_from_byte(value: u8) -> Result<Self, CodecError> {
        match value {
            0 => Ok(DroneKind::Defense),
            other => Err(CodecError::UnknownDroneKind(other)),
        }
    }
}

/// A drone's progress against its current placement assignment, as reported
/// to the main ship. Drives the distributor's inner/outer radius choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionState {
    #[default]
    Idle,
    Running,
    Completed,
}

impl MotionState {
    pub fn to_byte(self) -> u8 {
        match self {
            MotionState::Idle => 0,
            MotionState::Running => 1,
            MotionState::Completed => 2,
        }
    }

    pub fn try_from_byte(value: u8) -> Result<Self, CodecError> {
        match value {
            0 => Ok(MotionState::Idle),
            1 => Ok(MotionState::Running),
            2 => Ok(MotionState::Completed),
            other => Err(CodecError::UnknownMotionState(other)),
        }
    }
}

/// Wire encoding shared by both command enums: tag byte, attributes.
pub trait WireCommand: Sized {
    fn tag(&self) -> u8;
    fn name(&self) -> &'static str;
    fn write_attributes(&self, packet: &mut Packet);
    fn read(packet: &mut Packet) -> Result<Self, CodecError>;
}

/// Commands sent by drones, applied against the main-ship controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DroneCommand {
    /// Request registration. `id` is the payload-claimed identity and must
    /// match the transport-level sender to be accepted.
    Connect { id: PeerId, kind: DroneKind },
    /// Leave the fleet immediately, regardless of liveness.
    Disconnect,
    /// Heartbeat; refreshes the sender's liveness timestamp.
    NotifyAlive,
    /// Report the sender's motion state against its current assignment.
    SetPosition(MotionState),
}

const DRONE_TAG_CONNECT: u8 = 0;
const DRONE_TAG_DISCONNECT: u8 = 1;
const DRONE_TAG_NOTIFY_ALIVE: u8 = 2;
const DRONE_TAG_SET_POSITION: u8 = 3;

impl WireCommand for DroneCommand {
    fn tag(&self) -> u8 {
        match self {
            DroneCommand::Connect { .. } => DRONE_TAG_CONNECT,
            DroneCommand::Disconnect => DRONE_TAG_DISCONNECT,
            DroneCommand::NotifyAlive => DRONE_TAG_NOTIFY_ALIVE,
            DroneCommand::SetPosition(_) => DRONE_TAG_SET_POSITION,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            DroneCommand::Connect { .. } => "Connect",
            DroneCommand::Disconnect => "Disconnect",
            DroneCommand::NotifyAlive => "NotifyAlive",
            DroneCommand::SetPosition(_) => "SetPosition",
        }
    }

    fn write_attributes(&self, packet: &mut Packet) {
        match self {
            DroneCommand::Connect { id, kind } => {
                packet.write_u64(*id).write_u8(kind.to_byte());
            }
            DroneCommand::Disconnect | DroneCommand::NotifyAlive => {}
            DroneCommand::SetPosition(state) => {
                packet.write_u8(state.to_byte());
            }
        }
    }

    fn read(packet: &mut Packet) -> Result<Self, CodecError> {
        match packet.read_u8()? {
            DRONE_TAG_CONNECT => {
                let id = packet.read_u64()?;
                let kind = DroneKind::try_from_byte(packet.read_u8()?)?;
                Ok(DroneCommand::Connect { id, kind })
            }
            DRONE_TAG_DISCONNECT => Ok(DroneCommand::Disconnect),
            DRONE_TAG_NOTIFY_ALIVE => Ok(DroneCommand::NotifyAlive),
            DRONE_TAG_SET_POSITION => {
                let state = MotionState::try_from_byte(packet.read_u8()?)?;
                Ok(DroneCommand::SetPosition(state))
            }
            other => Err(CodecError::UnknownCommandTag(other)),
        }
    }
}

/// Commands sent by the main ship, applied against a drone controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShipCommand {
    /// Acknowledge a connect request. `connected == false` is reserved for
    /// future explicit-reject semantics and currently has no effect.
    CommitConnect { connected: bool },
    /// Replace the drone's active orbit target.
    DesiredOrbitPosition(OrbitPosition),
}

const SHIP_TAG_COMMIT_CONNECT: u8 = 0;
const SHIP_TAG_DESIRED_ORBIT_POSITION: u8 = 1;

impl WireCommand for ShipCommand {
    fn tag(&self) -> u8 {
        match self {
            ShipCommand::CommitConnect { .. } => SHIP_TAG_COMMIT_CONNECT,
            ShipCommand::DesiredOrbitPosition(_) => SHIP_TAG_DESIRED_ORBIT_POSITION,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ShipCommand::CommitConnect { .. } => "CommitConnect",
            ShipCommand::DesiredOrbitPosition(_) => "DesiredOrbitPosition",
        }
    }

    fn write_attributes(&self, packet: &mut Packet) {
        match self {
            ShipCommand::CommitConnect { connected } => {
                packet.write_bool(*connected);
            }
            ShipCommand::DesiredOrbitPosition(position) => {
                packet.write_orbit(position);
            }
        }
    }

    fn read(packet: &mut Packet) -> Result<Self, CodecError> {
        match packet.read_u8()? {
            SHIP_TAG_COMMIT_CONNECT => {
                let connected = packet.read_bool()?;
                Ok(ShipCommand::CommitConnect { connected })
            }
            SHIP_TAG_DESIRED_ORBIT_POSITION => {
                let position = packet.read_orbit()?;
                Ok(ShipCommand::DesiredOrbitPosition(position))
            }
            other => Err(CodecError::UnknownCommandTag(other)),
        }
    }
}

/// Common envelope around a command payload.
///
/// Carries the `initialized` flag (trailing byte on the wire) and the sender
/// identity, which exists only locally and is stamped by the dispatcher from
/// the transport's source field.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<C> {
    payload: C,
    initialized: bool,
    sender: PeerId,
}

impl<C: WireCommand> Envelope<C> {
    /// Wrap a payload without initializing it.
    pub fn new(payload: C) -> Self {
        Self {
            payload,
            initialized: false,
            sender: 0,
        }
    }

    /// Wrap and initialize in one step; the normal path for outbound traffic.
    pub fn sealed(payload: C) -> Self {
        let mut envelope = Self::new(payload);
        envelope.initialize();
        envelope
    }

    /// Mark the envelope ready for send/apply.
    ///
    /// # Panics
    /// Panics if the envelope was already initialized.
    pub fn initialize(&mut self) {
        assert!(
            !self.initialized,
            "command {} already initialized",
            self.payload.name()
        );
        self.initialized = true;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn sender(&self) -> PeerId {
        self.sender
    }

    /// Stamp the transport-level source. Called by the dispatch loop only.
    pub fn set_sender(&mut self, sender: PeerId) {
        self.sender = sender;
    }

    /// Access the payload for applying its effect.
    ///
    /// # Panics
    /// Panics if the envelope was never initialized.
    pub fn payload(&self) -> &C {
        assert!(
            self.initialized,
            "command {} is not initialized",
            self.payload.name()
        );
        &self.payload
    }

    /// Serialize into a fresh packet: tag, attributes, initialized flag.
    ///
    /// # Panics
    /// Panics if the envelope was never initialized.
    pub fn encode(&self) -> Packet {
        assert!(
            self.initialized,
            "command {} is not initialized",
            self.payload.name()
        );
        let mut packet = Packet::new();
        packet.write_u8(self.payload.tag());
        self.payload.write_attributes(&mut packet);
        packet.write_bool(self.initialized);
        packet
    }

    /// Decode an inbound message. A cleared initialized flag is malformed
    /// input from the peer and surfaces as a decode error, never a panic.
    pub fn decode(packet: &mut Packet) -> Result<Self, CodecError> {
        let payload = C::read(packet)?;
        let initialized = packet.read_bool()?;
        if !initialized {
            return Err(CodecError::UninitializedCommand);
        }
        Ok(Self {
            payload,
            initialized,
            sender: 0,
        })
    }
}
