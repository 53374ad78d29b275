use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};

use skirmish_core::net::signal::{MAX_PEER_ID_LEN, SignalError, SignalEvent, SignalRequest};
use skirmish_core::player::PeerId;

/// Queue feeding one connection's socket writer.
pub type Outbox = mpsc::UnboundedSender<SignalEvent>;

/// A registered connection and the peers it has links with.
struct PeerEntry {
    tx: Outbox,
    links: HashSet<PeerId>,
}

/// Name table and link graph for every connected peer.
pub struct RelayState {
    peers: HashMap<PeerId, PeerEntry>,
    max_peers: usize,
}

impl RelayState {
    pub fn new(max_peers: usize) -> Self {
        Self {
            peers: HashMap::new(),
            max_peers,
        }
    }

    /// Apply one request from the connection currently registered as
    /// `name`. Failures are reported back through `tx`.
    pub fn handle(&mut self, name: &mut Option<PeerId>, request: SignalRequest, tx: &Outbox) {
        let result = match request {
            SignalRequest::Register { id } => self.register(name, id, tx),
            SignalRequest::Heartbeat => Ok(()),
            other => match name.as_ref() {
                None => Err((SignalError::NotRegistered, None)),
                Some(me) => self.route(me, other),
            },
        };
        if let Err((kind, peer)) = result {
            tracing::debug!(?name, %kind, "Signal request rejected");
            let _ = tx.send(SignalEvent::Error { kind, peer });
        }
    }

    fn register(
        &mut self,
        name: &mut Option<PeerId>,
        requested: Option<PeerId>,
        tx: &Outbox,
    ) -> Result<(), (SignalError, Option<PeerId>)> {
        let id = match requested {
            Some(id) => {
                if id.as_str().is_empty() || id.as_str().len() > MAX_PEER_ID_LEN {
                    return Err((SignalError::InvalidId, None));
                }
                if name.as_ref() != Some(&id) && self.peers.contains_key(&id) {
                    return Err((SignalError::UnavailableId, None));
                }
                id
            },
            None => self.anonymous_id(),
        };
        if name.is_none() && self.peers.len() >= self.max_peers {
            return Err((SignalError::ServerFull, None));
        }

        if let Some(previous) = name.take() {
            self.release(&previous);
        }
        tracing::info!(peer = %id, "Peer registered");
        self.peers.insert(
            id.clone(),
            PeerEntry {
                tx: tx.clone(),
                links: HashSet::new(),
            },
        );
        let _ = tx.send(SignalEvent::Registered { id: id.clone() });
        *name = Some(id);
        Ok(())
    }

    fn anonymous_id(&self) -> PeerId {
        loop {
            let id = PeerId::new(uuid::Uuid::new_v4().to_string());
            if !self.peers.contains_key(&id) {
                return id;
            }
        }
    }

    fn route(
        &mut self,
        me: &PeerId,
        request: SignalRequest,
    ) -> Result<(), (SignalError, Option<PeerId>)> {
        match request {
            SignalRequest::Connect { peer } => self.connect(me, peer),
            SignalRequest::Data { peer, payload } => {
                if !self.is_linked(me, &peer) {
                    return Err((SignalError::PeerUnavailable, Some(peer)));
                }
                self.deliver(&peer, SignalEvent::Data {
                    peer: me.clone(),
                    payload,
                });
                Ok(())
            },
            SignalRequest::Close { peer } => {
                if self.unlink(me, &peer) {
                    tracing::debug!(from = %me, to = %peer, "Link closed");
                    self.deliver(&peer, SignalEvent::Closed { peer: me.clone() });
                }
                Ok(())
            },
            SignalRequest::Register { .. } | SignalRequest::Heartbeat => Ok(()),
        }
    }

    /// Link `me` to `peer`. The target hears `connection`, the caller `open`.
    fn connect(&mut self, me: &PeerId, peer: PeerId) -> Result<(), (SignalError, Option<PeerId>)> {
        if &peer == me || !self.peers.contains_key(&peer) {
            return Err((SignalError::PeerUnavailable, Some(peer)));
        }
        if let Some(entry) = self.peers.get_mut(me) {
            entry.links.insert(peer.clone());
        }
        if let Some(entry) = self.peers.get_mut(&peer) {
            entry.links.insert(me.clone());
        }
        tracing::info!(from = %me, to = %peer, "Link opened");
        self.deliver(&peer, SignalEvent::Connection { peer: me.clone() });
        self.deliver(me, SignalEvent::Open { peer });
        Ok(())
    }

    fn unlink(&mut self, a: &PeerId, b: &PeerId) -> bool {
        let removed = self
            .peers
            .get_mut(a)
            .is_some_and(|entry| entry.links.remove(b));
        if let Some(entry) = self.peers.get_mut(b) {
            entry.links.remove(a);
        }
        removed
    }

    /// Drop `name` from the table and tell everyone linked to it.
    pub fn release(&mut self, name: &PeerId) {
        let Some(entry) = self.peers.remove(name) else {
            return;
        };
        for other in entry.links {
            if let Some(peer) = self.peers.get_mut(&other) {
                peer.links.remove(name);
                let _ = peer.tx.send(SignalEvent::Closed { peer: name.clone() });
            }
        }
        tracing::info!(peer = %name, "Peer released");
    }

    fn deliver(&self, to: &PeerId, event: SignalEvent) {
        if let Some(entry) = self.peers.get(to)
            && entry.tx.send(event).is_err()
        {
            tracing::warn!(peer = %to, "Outbox closed, event dropped");
        }
    }

    pub fn is_registered(&self, name: &PeerId) -> bool {
        self.peers.contains_key(name)
    }

    pub fn is_linked(&self, a: &PeerId, b: &PeerId) -> bool {
        self.peers
            .get(a)
            .is_some_and(|entry| entry.links.contains(b))
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }
}

/// Shared relay state behind an async RwLock.
pub type SharedRelayState = Arc<RwLock<RelayState>>;
