//! In-memory signaling hub for tests.
//!
//! Mirrors the relay service's rules (unique names, anonymous ids, links
//! only between registered peers, close notifications) without sockets.
//! Every frame is encoded and decoded on the way through so tests exercise
//! the real wire format.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use skirmish_core::net::messages::Frame;
use skirmish_core::net::protocol::{decode_frame, encode_frame};
use skirmish_core::net::signal::{MAX_PEER_ID_LEN, SignalError};
use skirmish_core::player::PeerId;

use super::{Transport, TransportError, TransportEvent};

type EndpointId = u64;

#[derive(Default)]
struct Endpoint {
    name: Option<PeerId>,
    inbox: VecDeque<TransportEvent>,
}

#[derive(Default)]
struct HubState {
    endpoints: HashMap<EndpointId, Endpoint>,
    names: HashMap<PeerId, EndpointId>,
    links: HashSet<(EndpointId, EndpointId)>,
    next_endpoint: EndpointId,
    next_anonymous: u64,
}

fn link_key(a: EndpointId, b: EndpointId) -> (EndpointId, EndpointId) {
    (a.min(b), a.max(b))
}

impl HubState {
    fn push(&mut self, endpoint: EndpointId, event: TransportEvent) {
        if let Some(ep) = self.endpoints.get_mut(&endpoint) {
            ep.inbox.push_back(event);
        }
    }

    fn name_of(&self, endpoint: EndpointId) -> Option<PeerId> {
        self.endpoints.get(&endpoint).and_then(|ep| ep.name.clone())
    }

    /// Close every link of `endpoint`, telling the other side.
    fn drop_links(&mut self, endpoint: EndpointId) {
        let Some(me) = self.name_of(endpoint) else {
            return;
        };
        let peers: Vec<EndpointId> = self
            .links
            .iter()
            .filter_map(|&(a, b)| match (a == endpoint, b == endpoint) {
                (true, _) => Some(b),
                (_, true) => Some(a),
                _ => None,
            })
            .collect();
        for other in peers {
            self.links.remove(&link_key(endpoint, other));
            self.push(other, TransportEvent::Closed { peer: me.clone() });
        }
    }

    fn release_name(&mut self, endpoint: EndpointId) {
        if let Some(name) = self.endpoints.get_mut(&endpoint).and_then(|ep| ep.name.take()) {
            self.names.remove(&name);
        }
    }
}

/// Shared hub; hand out one [`LoopbackTransport`] per simulated peer.
#[derive(Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A fresh, unregistered endpoint on this hub.
    pub fn endpoint(&self) -> LoopbackTransport {
        let mut state = self.lock();
        let id = state.next_endpoint;
        state.next_endpoint += 1;
        state.endpoints.insert(id, Endpoint::default());
        LoopbackTransport {
            hub: self.clone(),
            endpoint: id,
        }
    }

    pub fn is_registered(&self, name: &PeerId) -> bool {
        self.lock().names.contains_key(name)
    }

    /// Number of open links.
    pub fn link_count(&self) -> usize {
        self.lock().links.len()
    }

    /// Drop the signaling connection of the peer registered as `name`, as
    /// if the relay went away under it: links close, the name is released,
    /// and the peer sees `Disconnected`.
    pub fn sever(&self, name: &PeerId) -> bool {
        let mut state = self.lock();
        let Some(&endpoint) = state.names.get(name) else {
            return false;
        };
        state.drop_links(endpoint);
        state.release_name(endpoint);
        state.push(endpoint, TransportEvent::Disconnected);
        true
    }
}

/// One simulated peer's view of a [`LoopbackHub`].
pub struct LoopbackTransport {
    hub: LoopbackHub,
    endpoint: EndpointId,
}

impl Transport for LoopbackTransport {
    fn register(&mut self, id: Option<&PeerId>) -> Result<(), TransportError> {
        let mut state = self.hub.lock();
        state.release_name(self.endpoint);

        let name = match id {
            Some(id) if id.as_str().is_empty() || id.as_str().len() > MAX_PEER_ID_LEN => {
                let event = TransportEvent::SignalFailed {
                    kind: SignalError::InvalidId,
                    peer: None,
                };
                state.push(self.endpoint, event);
                return Ok(());
            },
            Some(id) if state.names.contains_key(id) => {
                let event = TransportEvent::SignalFailed {
                    kind: SignalError::UnavailableId,
                    peer: None,
                };
                state.push(self.endpoint, event);
                return Ok(());
            },
            Some(id) => id.clone(),
            None => loop {
                let candidate = PeerId::new(format!("peer-{}", state.next_anonymous));
                state.next_anonymous += 1;
                if !state.names.contains_key(&candidate) {
                    break candidate;
                }
            },
        };

        state.names.insert(name.clone(), self.endpoint);
        if let Some(ep) = state.endpoints.get_mut(&self.endpoint) {
            ep.name = Some(name.clone());
        }
        state.push(self.endpoint, TransportEvent::Registered { id: name });
        Ok(())
    }

    fn connect(&mut self, peer: &PeerId) -> Result<(), TransportError> {
        let mut state = self.hub.lock();
        let Some(me) = state.name_of(self.endpoint) else {
            let event = TransportEvent::SignalFailed {
                kind: SignalError::NotRegistered,
                peer: Some(peer.clone()),
            };
            state.push(self.endpoint, event);
            return Ok(());
        };
        let target = state
            .names
            .get(peer)
            .copied()
            .filter(|&t| t != self.endpoint);
        let Some(target) = target else {
            let event = TransportEvent::SignalFailed {
                kind: SignalError::PeerUnavailable,
                peer: Some(peer.clone()),
            };
            state.push(self.endpoint, event);
            return Ok(());
        };

        state.links.insert(link_key(self.endpoint, target));
        state.push(target, TransportEvent::Incoming { peer: me.clone() });
        state.push(target, TransportEvent::Open { peer: me });
        state.push(self.endpoint, TransportEvent::Open { peer: peer.clone() });
        Ok(())
    }

    fn send(&mut self, peer: &PeerId, frame: &Frame) -> Result<(), TransportError> {
        let text = encode_frame(frame)?;
        let mut state = self.hub.lock();
        let me = state.name_of(self.endpoint).ok_or(TransportError::NotConnected)?;
        let target = state
            .names
            .get(peer)
            .copied()
            .filter(|&t| state.links.contains(&link_key(self.endpoint, t)))
            .ok_or_else(|| TransportError::LinkClosed(peer.clone()))?;
        let frame = decode_frame(&text)?;
        state.push(target, TransportEvent::Data { peer: me, frame });
        Ok(())
    }

    fn close(&mut self, peer: &PeerId) {
        let mut state = self.hub.lock();
        let Some(me) = state.name_of(self.endpoint) else {
            return;
        };
        if let Some(&target) = state.names.get(peer)
            && state.links.remove(&link_key(self.endpoint, target))
        {
            state.push(target, TransportEvent::Closed { peer: me });
        }
    }

    fn shutdown(&mut self) {
        let mut state = self.hub.lock();
        state.drop_links(self.endpoint);
        state.release_name(self.endpoint);
        if let Some(ep) = state.endpoints.get_mut(&self.endpoint) {
            ep.inbox.clear();
        }
    }

    fn poll(&mut self) -> Vec<TransportEvent> {
        let mut state = self.hub.lock();
        state
            .endpoints
            .get_mut(&self.endpoint)
            .map(|ep| ep.inbox.drain(..).collect())
            .unwrap_or_default()
    }
}
