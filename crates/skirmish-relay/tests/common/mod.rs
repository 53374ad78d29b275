use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use skirmish_core::net::protocol::{decode_signal_event, encode_signal_request};
use skirmish_core::net::signal::{SignalEvent, SignalRequest};
use skirmish_core::player::PeerId;

use skirmish_relay::build_app;
use skirmish_relay::config::RelayConfig;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub async fn new() -> Self {
        Self::from_config(RelayConfig::default()).await
    }

    pub async fn with_max_peers(max_peers: usize) -> Self {
        Self::from_config(RelayConfig {
            max_peers,
            ..RelayConfig::default()
        })
        .await
    }

    async fn from_config(config: RelayConfig) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (app, _state) = build_app(config);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Give the server a moment to start accepting
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self {
            addr,
            _shutdown: handle,
        }
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/relay", self.addr)
    }
}

pub async fn ws_connect(url: &str) -> WsStream {
    let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
    stream
}

pub async fn ws_send(stream: &mut WsStream, request: &SignalRequest) {
    let text = encode_signal_request(request).unwrap();
    stream.send(Message::Text(text.into())).await.unwrap();
}

/// Read the next signal event (5s timeout).
pub async fn ws_read_event(stream: &mut WsStream) -> SignalEvent {
    ws_try_read_event(stream, 5000)
        .await
        .expect("Timed out waiting for signal event")
}

/// Try to read a signal event, returning None on timeout.
pub async fn ws_try_read_event(stream: &mut WsStream, timeout_ms: u64) -> Option<SignalEvent> {
    let deadline = Duration::from_millis(timeout_ms);
    tokio::time::timeout(deadline, async {
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return decode_signal_event(text.as_str()).unwrap(),
                Some(Ok(Message::Close(_))) => panic!("WebSocket closed unexpectedly"),
                Some(Err(e)) => panic!("WebSocket error: {e}"),
                None => panic!("WebSocket stream ended"),
                _ => continue,
            }
        }
    })
    .await
    .ok()
}

/// Connect and register, returning the stream and the granted id.
pub async fn ws_register(url: &str, id: Option<&str>) -> (WsStream, PeerId) {
    let mut stream = ws_connect(url).await;
    ws_send(&mut stream, &SignalRequest::Register {
        id: id.map(PeerId::from),
    })
    .await;
    match ws_read_event(&mut stream).await {
        SignalEvent::Registered { id } => (stream, id),
        other => panic!("Expected Registered, got: {other:?}"),
    }
}

/// Link `client` to `host`, consuming the notifications on both ends.
pub async fn ws_link(client: &mut WsStream, host: &mut WsStream, host_id: &PeerId) {
    ws_send(client, &SignalRequest::Connect {
        peer: host_id.clone(),
    })
    .await;
    match ws_read_event(host).await {
        SignalEvent::Connection { .. } => {},
        other => panic!("Expected Connection, got: {other:?}"),
    }
    match ws_read_event(client).await {
        SignalEvent::Open { peer } => assert_eq!(&peer, host_id),
        other => panic!("Expected Open, got: {other:?}"),
    }
}
