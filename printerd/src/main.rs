use printerd::{Config, LaunchOptions, Server, ServerState, build_factory, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenv::dotenv().ok();

    let options = LaunchOptions::from_env();
    let config = Config::load_or_init(&options.config_path)?;

    init_logger(config.debug, config.log_dir.as_deref());
    tracing::info!(
        config = %options.config_path.display(),
        printers = config.printers.len(),
        read_only = config.read_only,
        "printerd starting"
    );

    let factory = build_factory(&config)?;
    let state = ServerState::new(config, factory);

    if let Err(e) = Server::new(state, options.force_listen).run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    tracing::info!("printerd stopped");
    Ok(())
}
