mod cli;
mod panic_hook;

use std::{future::Future, sync::Arc};

use clap::Parser;
use tally_utils::{
    alchemy::Alchemy, assets::AssetAggregator, coingecko::CoinGecko, price_cache::PriceCache,
    price_manager::PriceManager,
};
use tokio_util::sync::CancellationToken;

use crate::cli::Cli;

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error(transparent)]
    Utils(#[from] tally_utils::Error),

    #[error(transparent)]
    Server(#[from] tally_server::Error),
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tally_utils::log::init(&cli.log_filter)?;
    panic_hook::set();

    let price_cache = Arc::new(PriceCache::load(&cli.price_cache));
    let price_manager = Arc::new(PriceManager::new(
        Arc::new(CoinGecko::new(cli.coingecko_config())),
        cli.refresh_config(),
    ));

    let shutdown_signal = CancellationToken::new();

    let refresh_thread = price_manager.spawn_refresh_prices_thread(
        Arc::clone(&price_cache),
        cli.refresh_interval(),
        shutdown_signal.clone(),
    );

    let alchemy = Arc::new(Alchemy::new(cli.alchemy_config()));
    let aggregator = Arc::new(AssetAggregator::new(
        alchemy.clone(),
        alchemy.clone(),
        alchemy,
        price_cache,
        price_manager,
    ));

    tokio::spawn(cancel_on_signal(
        tokio::signal::ctrl_c(),
        shutdown_signal.clone(),
    ));

    let result = tally_server::serve(&cli.server_config(), aggregator, shutdown_signal.clone()).await;

    shutdown_signal.cancel();
    if let Err(err) = refresh_thread.await {
        tracing::error!(%err, "price refresh task failed");
    }

    Ok(result?)
}

/// Cancels `shutdown_signal` once `signal` fires. A signal listener that
/// could not be installed leaves the server running.
async fn cancel_on_signal(
    signal: impl Future<Output = std::io::Result<()>>,
    shutdown_signal: CancellationToken,
) {
    match signal.await {
        Ok(()) => {
            tracing::info!("shutting down");
            shutdown_signal.cancel();
        }
        Err(err) => tracing::error!(%err, "failed to listen for ctrl-c"),
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[tokio::test]
    async fn test_signal_cancels() {
        let token = CancellationToken::new();
        cancel_on_signal(async { Ok(()) }, token.clone()).await;
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_listener_failure_keeps_running() {
        let token = CancellationToken::new();
        cancel_on_signal(
            async { Err(io::Error::other("no signal handler")) },
            token.clone(),
        )
        .await;
        assert!(!token.is_cancelled());
    }
}
