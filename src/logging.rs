use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

/// Used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Server default: also shows the per-request spans of the trace layer.
pub const SERVER_FILTER: &str = "info,tower_http=debug";

pub fn init() -> anyhow::Result<()> {
    init_with_default(DEFAULT_FILTER)
}

/// Logs go to stderr so command output on stdout stays machine readable.
pub fn init_with_default(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .with_context(|| format!("build log filter from {default_filter:?}"))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
