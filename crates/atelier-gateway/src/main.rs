use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Loopback only; the gateway is a local companion, not a public server.
const GATEWAY_PORT: u16 = 8787;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let app = atelier_gateway::router();
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], GATEWAY_PORT));
    tracing::info!("[Gateway] listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
