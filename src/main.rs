// src/main.rs

use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chat_relay::state::RoomRegistry;
use chat_relay::websocket;

/// Command-line surface; this is the relay's whole configuration story.
#[derive(Parser, Debug)]
#[command(name = "chat-relay", about = "Room-based WebSocket message relay")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    init_tracing();
    let args = Args::parse();
    if let Err(e) = run(args).await {
        tracing::error!("relay exited with an error: {e}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let registry = Arc::new(RoomRegistry::default());
    let app = websocket::router(registry);

    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    tracing::info!("relay listening on ws://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("chat_relay=debug,info")),
        )
        .with(fmt::layer())
        .init();
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown signal received"),
        Err(e) => tracing::error!("failed to listen for the shutdown signal: {e}"),
    }
}
