//! WebSocket transport to the relay service.
//!
//! A background task owns the socket. Requests from the session go in
//! through one channel, translated relay events come out through another,
//! and [`Transport::poll`] drains whatever has arrived since the last tick.
//! When the socket drops the task reports `Disconnected` and keeps
//! reconnecting with capped exponential backoff.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::{Sink, SinkExt, StreamExt};
use smallvec::SmallVec;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use skirmish_core::net::messages::Frame;
use skirmish_core::net::protocol::{
    decode_frame, decode_signal_event, encode_frame, encode_signal_request,
};
use skirmish_core::net::signal::{SignalEvent, SignalRequest};
use skirmish_core::player::PeerId;
use skirmish_game::{Transport, TransportError, TransportEvent};

use crate::backoff::Backoff;

/// Keepalive interval on an idle relay socket.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);

type RelaySocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

enum Command {
    Signal(SignalRequest),
    /// Drop the socket and anything queued, then reconnect without
    /// reporting a disconnect.
    Reset,
}

enum Ended {
    Dropped,
    Reset,
    Shutdown,
}

pub struct WsTransport {
    commands: mpsc::UnboundedSender<Command>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    connected: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl WsTransport {
    /// Start the link task. Must be called from inside a tokio runtime.
    pub fn spawn(url: impl Into<String>) -> Self {
        Self::with_backoff(url, Backoff::default())
    }

    pub fn with_backoff(url: impl Into<String>, backoff: Backoff) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (event_tx, events) = mpsc::unbounded_channel();
        let connected = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(run_link(
            url.into(),
            backoff,
            command_rx,
            event_tx,
            Arc::clone(&connected),
        ));
        Self {
            commands,
            events,
            connected,
            task,
        }
    }

    /// The relay socket is up.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    fn submit(&self, request: SignalRequest) -> Result<(), TransportError> {
        self.commands
            .send(Command::Signal(request))
            .map_err(|_| TransportError::NotConnected)
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Transport for WsTransport {
    fn register(&mut self, id: Option<&PeerId>) -> Result<(), TransportError> {
        self.submit(SignalRequest::Register { id: id.cloned() })
    }

    fn connect(&mut self, peer: &PeerId) -> Result<(), TransportError> {
        self.submit(SignalRequest::Connect { peer: peer.clone() })
    }

    fn send(&mut self, peer: &PeerId, frame: &Frame) -> Result<(), TransportError> {
        if !self.is_connected() {
            return Err(TransportError::NotConnected);
        }
        let payload = encode_frame(frame)?;
        self.submit(SignalRequest::Data {
            peer: peer.clone(),
            payload,
        })
    }

    fn close(&mut self, peer: &PeerId) {
        if self.is_connected() {
            let _ = self.submit(SignalRequest::Close { peer: peer.clone() });
        }
    }

    fn shutdown(&mut self) {
        let _ = self.commands.send(Command::Reset);
        while self.events.try_recv().is_ok() {}
    }

    fn poll(&mut self) -> Vec<TransportEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }
}

async fn run_link(
    url: String,
    mut backoff: Backoff,
    mut commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<TransportEvent>,
    connected: Arc<AtomicBool>,
) {
    let mut pending = VecDeque::new();
    loop {
        match tokio_tungstenite::connect_async(url.as_str()).await {
            Ok((stream, _)) => {
                tracing::info!(url = %url, "Connected to relay");
                backoff.reset();
                connected.store(true, Ordering::Release);
                let ended = pump(stream, &mut pending, &mut commands, &events).await;
                connected.store(false, Ordering::Release);
                match ended {
                    Ended::Shutdown => return,
                    Ended::Reset => {
                        pending.clear();
                        continue;
                    },
                    Ended::Dropped => {
                        tracing::warn!(url = %url, "Relay connection lost");
                        if events.send(TransportEvent::Disconnected).is_err() {
                            return;
                        }
                    },
                }
            },
            Err(e) => tracing::warn!(url = %url, error = %e, "Relay connect failed"),
        }

        let delay = backoff.next_delay();
        tracing::debug!(?delay, "Retrying relay");
        if !wait_buffering(delay, &mut pending, &mut commands).await {
            return;
        }
    }
}

/// Shuttle requests and events until the socket ends.
async fn pump(
    stream: RelaySocket,
    pending: &mut VecDeque<SignalRequest>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
    events: &mpsc::UnboundedSender<TransportEvent>,
) -> Ended {
    let (mut sink, mut source) = stream.split();

    while let Some(request) = pending.pop_front() {
        if !send_request(&mut sink, &request).await {
            pending.push_front(request);
            return Ended::Dropped;
        }
    }

    let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                None => {
                    let _ = sink.close().await;
                    return Ended::Shutdown;
                },
                Some(Command::Reset) => {
                    let _ = sink.close().await;
                    return Ended::Reset;
                },
                Some(Command::Signal(request)) => {
                    if !send_request(&mut sink, &request).await {
                        buffer(pending, request);
                        return Ended::Dropped;
                    }
                },
            },
            message = source.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    for event in translate_text(text.as_str()) {
                        if events.send(event).is_err() {
                            return Ended::Shutdown;
                        }
                    }
                },
                Some(Ok(Message::Close(_)) | Err(_)) | None => return Ended::Dropped,
                Some(Ok(_)) => {},
            },
            _ = heartbeat.tick() => {
                if !send_request(&mut sink, &SignalRequest::Heartbeat).await {
                    return Ended::Dropped;
                }
            },
        }
    }
}

/// Sleep for `delay` while holding on to requests worth replaying.
/// Returns false once the transport has been dropped.
async fn wait_buffering(
    delay: Duration,
    pending: &mut VecDeque<SignalRequest>,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            () = &mut sleep => return true,
            command = commands.recv() => match command {
                None => return false,
                Some(Command::Reset) => pending.clear(),
                Some(Command::Signal(request)) => buffer(pending, request),
            },
        }
    }
}

/// Links do not survive a reconnect; only requests that start fresh are
/// replayed.
fn buffer(pending: &mut VecDeque<SignalRequest>, request: SignalRequest) {
    if matches!(
        request,
        SignalRequest::Register { .. } | SignalRequest::Connect { .. }
    ) {
        pending.push_back(request);
    }
}

/// Returns false if the socket is gone.
async fn send_request<S>(sink: &mut S, request: &SignalRequest) -> bool
where
    S: Sink<Message> + Unpin,
{
    let text = match encode_signal_request(request) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to encode signal request");
            return true;
        },
    };
    sink.send(Message::Text(text.into())).await.is_ok()
}

fn translate_text(text: &str) -> SmallVec<[TransportEvent; 2]> {
    match decode_signal_event(text) {
        Ok(event) => translate(event),
        Err(e) => {
            tracing::debug!(error = %e, "Dropped malformed relay event");
            SmallVec::new()
        },
    }
}

/// Map a relay event onto the transport events a session consumes.
pub fn translate(event: SignalEvent) -> SmallVec<[TransportEvent; 2]> {
    let mut out = SmallVec::new();
    match event {
        SignalEvent::Registered { id } => out.push(TransportEvent::Registered { id }),
        SignalEvent::Error { kind, peer } => out.push(TransportEvent::SignalFailed { kind, peer }),
        // Brokered links carry data at once
        SignalEvent::Connection { peer } => {
            out.push(TransportEvent::Incoming { peer: peer.clone() });
            out.push(TransportEvent::Open { peer });
        },
        SignalEvent::Open { peer } => out.push(TransportEvent::Open { peer }),
        SignalEvent::Data { peer, payload } => match decode_frame(&payload) {
            Ok(frame) => out.push(TransportEvent::Data { peer, frame }),
            Err(e) => tracing::debug!(peer = %peer, error = %e, "Dropped malformed frame"),
        },
        SignalEvent::Closed { peer } => out.push(TransportEvent::Closed { peer }),
    }
    out
}
