use dine_server::{Server, ServerState, print_banner, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // dotenv, config, work dir, logging
    let config = setup_environment()?;

    print_banner();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        work_dir = %config.work_dir,
        "Dine server starting..."
    );

    let state = ServerState::initialize(&config).await?;
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!(error = %e, "Server error");
        return Err(e.into());
    }

    Ok(())
}
