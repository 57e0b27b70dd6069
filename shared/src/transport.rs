//! Transport seam: non-blocking unicast message exchange.
//!
//! The radio channel delivers whole messages atomically but guarantees
//! nothing else: no ordering, no dedup, no delivery confirmation. The core
//! only ever polls, so the trait is fully synchronous.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use tracing::trace;

use crate::PeerId;

/// One received radio message. The sender identity comes from the transport
/// layer, not from the payload, and is the only trusted source field.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender: PeerId,
    pub bytes: Bytes,
}

/// Pluggable radio backend. All operations are non-blocking polls or
/// fire-and-forget sends.
pub trait Transport {
    /// This peer's process-wide unique identity.
    fn local_id(&self) -> PeerId;

    /// Whether a message is waiting to be received.
    fn has_pending(&mut self) -> bool;

    /// Take the next pending message, if any.
    fn try_receive(&mut self) -> Option<InboundMessage>;

    /// Best-effort unicast. Returns whether the target was reachable; no
    /// delivery confirmation is implied.
    fn send_unicast(&mut self, target: PeerId, bytes: Bytes) -> bool;

    /// Best-effort broadcast to every other peer. Present for completeness;
    /// the coordination protocol itself only uses unicast.
    fn broadcast(&mut self, bytes: Bytes);
}

type RouteTable = Arc<Mutex<HashMap<PeerId, Sender<InboundMessage>>>>;

/// In-process message hub standing in for the radio, used by the sim host
/// and the tests. Each [`HubEndpoint`] is one peer.
#[derive(Default, Clone)]
pub struct Hub {
    routes: RouteTable,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an endpoint with a caller-chosen identity. Re-using an id
    /// replaces the previous endpoint's route.
    pub fn endpoint(&self, id: PeerId) -> HubEndpoint {
        let (tx, rx) = mpsc::channel();
        self.routes.lock().unwrap().insert(id, tx);
        HubEndpoint {
            id,
            routes: Arc::clone(&self.routes),
            rx,
            peeked: None,
        }
    }
}

/// One peer's handle on the [`Hub`].
pub struct HubEndpoint {
    id: PeerId,
    routes: RouteTable,
    rx: Receiver<InboundMessage>,
    peeked: Option<InboundMessage>,
}

impl Transport for HubEndpoint {
    fn local_id(&self) -> PeerId {
        self.id
    }

    fn has_pending(&mut self) -> bool {
        if self.peeked.is_none() {
            self.peeked = self.rx.try_recv().ok();
        }
        self.peeked.is_some()
    }

    fn try_receive(&mut self) -> Option<InboundMessage> {
        self.peeked.take().or_else(|| self.rx.try_recv().ok())
    }

    fn send_unicast(&mut self, target: PeerId, bytes: Bytes) -> bool {
        let routes = self.routes.lock().unwrap();
        match routes.get(&target) {
            Some(tx) => tx
                .send(InboundMessage {
                    sender: self.id,
                    bytes,
                })
                .is_ok(),
            None => {
                trace!(target_peer = target, "unicast to unknown peer dropped");
                false
            }
        }
    }

    fn broadcast(&mut self, bytes: Bytes) {
        let routes = self.routes.lock().unwrap();
        for (peer, tx) in routes.iter() {
            if *peer == self.id {
                continue;
            }
            let _ = tx.send(InboundMessage {
                sender: self.id,
                bytes: bytes.clone(),
            });
        }
    }
}
