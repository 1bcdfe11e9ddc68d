mod logging;

use anyhow::Context;
use mirror_engine::{default_config_path, Poller, TokenResolver, UserConfig, TOKEN_ENV_VAR};
use mirror_logging::mirror_info;

fn main() -> anyhow::Result<()> {
    logging::initialize(logging::LogDestination::from_env());

    let config_path = default_config_path()?;
    let config = UserConfig::load_or_default(&config_path)?;
    let settings = config.sync_settings(&config_path)?;
    let tokens = TokenResolver::new(TOKEN_ENV_VAR, Some(config_path.clone()));
    let poller = Poller::notion(settings, tokens).context("failed to set up the HTTP client")?;

    mirror_info!("Using configuration {}", config_path.display());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start the async runtime")?;
    // block_on keeps the loop on this thread; the cycle number in log lines
    // is thread-local.
    runtime.block_on(poller.run_forever());
    Ok(())
}
