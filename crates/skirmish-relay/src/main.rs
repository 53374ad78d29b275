use clap::Parser;
use tracing_subscriber::EnvFilter;

use skirmish_relay::build_app;
use skirmish_relay::config::RelayConfig;

/// Skirmish rendezvous relay
#[derive(Parser, Debug)]
#[command(name = "skirmish-relay")]
#[command(about = "Name registry and message relay for Skirmish peers", long_about = None)]
struct Args {
    /// TCP port to listen on
    #[arg(short, long, default_value_t = 8081)]
    port: u16,

    /// Most peers registered at once
    #[arg(long, default_value_t = 1000)]
    max_peers: usize,

    /// Messages per second allowed from one connection
    #[arg(long, default_value_t = 240.0)]
    rate: f64,

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

    let config = RelayConfig {
        max_peers: args.max_peers,
        burst: args.rate,
        messages_per_sec: args.rate,
    };
    let (app, _state) = build_app(config);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));

    tracing::info!(max_peers = args.max_peers, "Skirmish relay listening on {addr}");

    axum::serve(listener, app).await.expect("Relay server error");
}
