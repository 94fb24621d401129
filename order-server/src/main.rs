use order_server::{Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (.env, work dir, logging) and configuration
    let config = setup_environment()?;

    print_banner();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        "🦀 Order server starting..."
    );

    // 2. Engine, reconciler and shared state
    let state = ServerState::initialize(&config).await?;

    // 3. HTTP server (starts background tasks, blocks until shutdown)
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
