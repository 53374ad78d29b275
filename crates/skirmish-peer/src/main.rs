use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::time::{Instant, MissedTickBehavior};
use tracing_subscriber::EnvFilter;

use skirmish_core::room::MatchMode;
use skirmish_game::arena::load_arena;
use skirmish_game::{GameConfig, Session, SessionEvent};
use skirmish_peer::PeerError;
use skirmish_peer::link::WsTransport;
use skirmish_peer::script::Script;

/// Headless Skirmish peer
#[derive(Parser, Debug)]
#[command(name = "skirmish-peer")]
#[command(about = "Join a Skirmish match through a relay and play it headless", long_about = None)]
struct Args {
    /// Relay WebSocket URL
    #[arg(long, default_value = "ws://127.0.0.1:8081/relay")]
    relay: String,

    /// Match mode: solo, duel, duos or trios
    #[arg(short, long, default_value = "duel")]
    mode: MatchMode,

    /// Simulation ticks per second
    #[arg(long, default_value_t = 60)]
    frame_rate: u32,

    /// JSON array of input frames, replayed in a loop
    #[arg(long)]
    script: Option<PathBuf>,

    /// Leave after this many ticks
    #[arg(long)]
    max_frames: Option<u64>,

    /// Default log filter when RUST_LOG is unset
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = run(args).await {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), PeerError> {
    let mut script = match &args.script {
        Some(path) => Script::from_file(path)?,
        None => Script::idle(),
    };

    let mut session = Session::new(GameConfig::load(), load_arena());
    let mut transport = WsTransport::spawn(args.relay.clone());
    tracing::info!(mode = %args.mode, relay = %args.relay, "Starting peer");
    report(&session.start(args.mode, &mut transport));

    let period = Duration::from_secs_f64(1.0 / f64::from(args.frame_rate.max(1)));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut last = Instant::now();
    let mut frames = 0u64;
    loop {
        tokio::select! {
            _ = ticker.tick() => {},
            _ = &mut shutdown => {
                tracing::info!("Interrupted");
                break;
            },
        }

        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32();
        last = now;

        let events = session.tick(dt, script.next_frame(), &mut transport);
        report(&events);

        frames += 1;
        if session.is_game_over() || args.max_frames.is_some_and(|max| frames >= max) {
            break;
        }
    }

    session.leave(&mut transport);
    Ok(())
}

/// Lifecycle events at info, per-frame combat chatter at debug.
fn report(events: &[SessionEvent]) {
    for event in events {
        match event {
            SessionEvent::Status(text) => tracing::info!("{text}"),
            SessionEvent::RoleDecided { .. }
            | SessionEvent::PlayerCount { .. }
            | SessionEvent::MatchFound
            | SessionEvent::RoomFull
            | SessionEvent::PeerJoined(_)
            | SessionEvent::PeerLeft(_)
            | SessionEvent::TeamAssigned(_)
            | SessionEvent::LocalDied
            | SessionEvent::RoundStarted { .. }
            | SessionEvent::RoundEnded { .. }
            | SessionEvent::GameOver { .. } => tracing::info!(?event, "Session"),
            _ => tracing::debug!(?event, "Session"),
        }
    }
}
