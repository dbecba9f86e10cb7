use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;

use docportal::config::PortalConfig;
use docportal::server::{AppState, router};
use docportal::toc::{CollisionPolicy, HeadingStrategy, TocOptions};

#[derive(Debug, Parser)]
#[command(author, version, about = "Content API server for the documentation portal")]
struct ServerArgs {
    #[arg(long, default_value = "127.0.0.1:8000")]
    addr: SocketAddr,

    /// Directory holding page and structure JSON files.
    #[arg(long, default_value = "portal-data")]
    data_dir: PathBuf,

    /// Heading scan used when a saved page arrives without a TOC.
    #[arg(long, value_enum, default_value_t)]
    strategy: HeadingStrategy,

    #[arg(long, value_enum, default_value_t)]
    collisions: CollisionPolicy,
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return std::process::ExitCode::FAILURE;
    }
    std::process::ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    docportal::logging::init_with_default(docportal::logging::SERVER_FILTER)?;

    let args = ServerArgs::parse();
    let config = PortalConfig::from_env().context("read config")?;
    let catalog = config.load_catalog().context("load default catalog")?;
    tracing::info!(
        ?args,
        sections = catalog.sections.len(),
        voice_chat = config.voice_chat_enabled(),
        "starting docportal-server"
    );

    let state = AppState::new(&args.data_dir, catalog)
        .with_admin_emails(config.admin_emails)
        .with_toc_options(TocOptions {
            strategy: args.strategy,
            collisions: args.collisions,
        });
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(args.addr)
        .await
        .map_err(|err| anyhow::anyhow!("bind {}: {err}", args.addr))?;
    tracing::info!(addr = %args.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(%err, "listen for ctrl-c");
    }
    tracing::info!("shutting down");
}
