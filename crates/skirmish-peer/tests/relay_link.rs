use std::net::SocketAddr;
use std::time::Duration;

use skirmish_core::net::messages::Frame;
use skirmish_core::net::signal::SignalError;
use skirmish_core::player::{PeerId, Role};
use skirmish_core::room::MatchMode;
use skirmish_core::test_helpers::move_to;
use skirmish_game::arena::Arena;
use skirmish_game::{GameConfig, InputFrame, Session, Transport, TransportEvent};
use skirmish_peer::link::WsTransport;
use skirmish_relay::build_app;
use skirmish_relay::config::RelayConfig;

async fn start_relay() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (app, _state) = build_app(RelayConfig::default());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    addr
}

fn relay_url(addr: SocketAddr) -> String {
    format!("ws://{addr}/relay")
}

/// Poll until at least `count` events have arrived (5s timeout).
async fn collect(transport: &mut WsTransport, count: usize) -> Vec<TransportEvent> {
    let mut events = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), async {
        while events.len() < count {
            events.extend(transport.poll());
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Timed out waiting for transport events");
    events
}

#[tokio::test]
async fn second_claim_is_refused() {
    let addr = start_relay().await;
    let room = PeerId::new(MatchMode::Duel.room_name().unwrap());

    let mut host = WsTransport::spawn(relay_url(addr));
    host.register(Some(&room)).unwrap();
    assert_eq!(collect(&mut host, 1).await, vec![TransportEvent::Registered {
        id: room.clone()
    }]);

    let mut late = WsTransport::spawn(relay_url(addr));
    late.register(Some(&room)).unwrap();
    assert_eq!(collect(&mut late, 1).await, vec![TransportEvent::SignalFailed {
        kind: SignalError::UnavailableId,
        peer: None,
    }]);
}

#[tokio::test]
async fn frames_cross_a_brokered_link() {
    let addr = start_relay().await;
    let room = PeerId::from("FPS_MATCH_ROOM_DUEL");

    let mut host = WsTransport::spawn(relay_url(addr));
    host.register(Some(&room)).unwrap();
    collect(&mut host, 1).await;

    let mut client = WsTransport::spawn(relay_url(addr));
    client.register(None).unwrap();
    let TransportEvent::Registered { id: client_id } = collect(&mut client, 1).await.remove(0)
    else {
        panic!("Expected registration");
    };

    client.connect(&room).unwrap();
    assert_eq!(collect(&mut client, 1).await, vec![TransportEvent::Open {
        peer: room.clone()
    }]);
    assert_eq!(collect(&mut host, 2).await, vec![
        TransportEvent::Incoming {
            peer: client_id.clone()
        },
        TransportEvent::Open {
            peer: client_id.clone()
        },
    ]);

    let frame = Frame::new(move_to(4.0, 9.7, -30.0));
    client.send(&room, &frame).unwrap();
    assert_eq!(collect(&mut host, 1).await, vec![TransportEvent::Data {
        peer: client_id.clone(),
        frame,
    }]);

    host.close(&client_id);
    assert_eq!(collect(&mut client, 1).await, vec![TransportEvent::Closed {
        peer: room
    }]);
}

#[tokio::test]
async fn duel_sessions_elect_a_host_over_the_relay() {
    let addr = start_relay().await;
    let config = GameConfig {
        seed: Some(3),
        ..GameConfig::default()
    };
    let mut first = Session::new(config.clone(), Arena::empty("open"));
    let mut second = Session::new(config, Arena::empty("open"));
    let mut first_link = WsTransport::spawn(relay_url(addr));
    let mut second_link = WsTransport::spawn(relay_url(addr));

    first.start(MatchMode::Duel, &mut first_link);
    let idle = InputFrame::idle();
    tokio::time::timeout(Duration::from_secs(5), async {
        while first.role().is_none() {
            first.tick(1.0 / 60.0, &idle, &mut first_link);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("First session never claimed the room");

    second.start(MatchMode::Duel, &mut second_link);
    tokio::time::timeout(Duration::from_secs(5), async {
        while !(first.is_network_ready() && second.is_network_ready()) {
            first.tick(1.0 / 60.0, &idle, &mut first_link);
            second.tick(1.0 / 60.0, &idle, &mut second_link);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Sessions never linked");

    assert_eq!(first.role(), Some(Role::Host));
    assert_eq!(second.role(), Some(Role::Client));

    first.leave(&mut first_link);
    second.leave(&mut second_link);
}
