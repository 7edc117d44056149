use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use hogard::agent::system_prompt;
use hogard::agent::OpenAiAgent;
use hogard::agent::Toolbox;
use hogard::api;
use hogard::api::AppState;
use hogard::whatsapp::SenderAllowlist;
use hogard::whatsapp::WhatsAppClient;
use hogard::AreaRegistry;
use hogard::Config;
use hogard::HaClient;
use hogard::LightActions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Chat-to-lights bridge between WhatsApp and Home Assistant
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to the TOML configuration file [default: hogard.toml if present]
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(config.logging.targets())
        .init();

    tracing::info!("hogard starting");
    if let Some(path) = &args.config {
        tracing::info!("Loaded config from: {}", path.display());
    }

    let backend = HaClient::new(&config.home_assistant)
        .context("Failed to create Home Assistant client")?;
    tracing::info!("Home Assistant at {}", backend.base_url());

    let registry = Arc::new(AreaRegistry::new(&config.areas.areas));
    let area_count = registry.names().count();
    tracing::info!(
        "{} area(s) mapped, default area '{}'",
        area_count,
        config.areas.default
    );

    let prompt = system_prompt(&registry, &config.areas.default);
    let actions = Arc::new(LightActions::new(registry, backend));
    let toolbox = Toolbox::new(actions, config.areas.default.clone());
    let agent = OpenAiAgent::new(&config.agent, prompt, toolbox)
        .context("Failed to create agent")?;
    let messenger =
        WhatsAppClient::new(&config.whatsapp).context("Failed to create WhatsApp client")?;

    if config.whatsapp.allowed_numbers.is_empty() {
        tracing::warn!("No allowed numbers configured, accepting messages from everyone");
    }

    let state = Arc::new(AppState::new(
        config.whatsapp.verify_token.clone(),
        SenderAllowlist::new(&config.whatsapp.allowed_numbers),
        Arc::new(agent),
        Arc::new(messenger),
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let listen = config.server.listen.clone();
    let port = config.server.port;
    let server = tokio::spawn(async move { api::serve(&listen, port, state, shutdown_rx).await });

    tracing::info!("Press Ctrl+C to exit");
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received shutdown signal");
        }
        Err(e) => {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    shutdown_tx.send(()).ok();
    server
        .await
        .context("HTTP server task panicked")?
        .map_err(|e| anyhow::anyhow!(e))
        .context("HTTP server failed")?;

    tracing::info!("hogard shutdown complete");
    Ok(())
}
