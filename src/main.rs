use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pricewatch::config::ConfigState;
use pricewatch::notify::{HttpBackend, RedisPublisher};
use pricewatch::orchestrator::Orchestrator;
use pricewatch::{config, shutdown};

#[derive(Parser)]
#[command(
    name = "pricewatch",
    version,
    about = "Watch product pages and notify subscribers of price changes",
    long_about = None
)]
struct Cli {
    /// Path to the page list file ([[pages]] entries with id, url, product)
    pages_file: PathBuf,

    /// Telegram bot token
    #[arg(long)]
    telegram_token: Option<String>,

    /// Chat-list backend address
    #[arg(long)]
    backend_address: Option<String>,

    /// Chat-list backend port
    #[arg(long, default_value = "0")]
    backend_port: u16,

    /// Chat id for administrator alerts
    #[arg(long, default_value = "0")]
    admin_chat_id: i64,

    /// Redis URL for the pub/sub topic
    #[arg(long)]
    redis_url: Option<String>,

    /// Name of the pub/sub channel for price events
    #[arg(long)]
    pubsub_channel: Option<String>,

    /// Price threshold: at or above publishes an event, below broadcasts
    #[arg(long, default_value = "300.0")]
    threshold: f64,

    /// Site name used in broadcast messages
    #[arg(long, default_value = "My Website")]
    site_name: String,

    /// Enable debug log lines
    #[arg(long)]
    debug: bool,

    /// Log format (text, json)
    #[arg(long, default_value = "text")]
    log_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_tracing(&cli.log_format, cli.debug)?;
    tracing::info!("pricewatch starting");

    let state = ConfigState::new();
    if let Err(err) = configure(&state, &cli).await {
        // Fatal startup error: release whatever was already opened.
        let ctx = state.freeze(cli.threshold, cli.site_name.clone());
        shutdown::release_connections(&ctx).await;
        return Err(err);
    }

    let ctx = Arc::new(state.freeze(cli.threshold, cli.site_name.clone()));

    let handle = Orchestrator::new(ctx.clone()).start();
    if handle.failed > 0 {
        tracing::error!(failed = handle.failed, "some pollers could not be created");
    }
    if handle.started() == 0 {
        shutdown::release_connections(&ctx).await;
        anyhow::bail!("no poller could be started");
    }

    shutdown::run(handle, ctx).await?;
    tracing::info!("pricewatch stopped");

    Ok(())
}

/// Populate the assign-once configuration; every failure here is fatal
async fn configure(state: &ConfigState, cli: &Cli) -> Result<()> {
    let pages = config::load_pages(&cli.pages_file)
        .with_context(|| format!("failed to load page list from {}", cli.pages_file.display()))?;
    state.set_pages(pages)?;

    if let Some(token) = &cli.telegram_token {
        state
            .set_notifier(token)
            .await
            .context("telegram authentication failed")?;
    }

    if cli.admin_chat_id > 0 {
        state.set_admin_chat_id(cli.admin_chat_id)?;
    }

    if let Some(address) = &cli.backend_address {
        state.set_backend_endpoint(address, cli.backend_port)?;
        let backend = HttpBackend::new(&format!("{address}:{}", cli.backend_port))
            .context("failed to build backend client")?;
        state.set_backend_handle(Arc::new(backend))?;
    }

    if let (Some(url), Some(channel)) = (&cli.redis_url, &cli.pubsub_channel) {
        let publisher = RedisPublisher::connect(url, channel)
            .await
            .context("redis connection failed")?;
        state.set_publisher_handle(Arc::new(publisher))?;
    }

    Ok(())
}

fn setup_tracing(format: &str, debug: bool) -> Result<()> {
    let env_filter = if debug {
        tracing_subscriber::EnvFilter::new("pricewatch=debug,info")
    } else {
        tracing_subscriber::EnvFilter::new("pricewatch=info,warn")
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
