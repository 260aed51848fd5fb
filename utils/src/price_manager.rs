use std::{collections::HashMap, sync::Arc, time::Duration};

use arc_swap::ArcSwap;
use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;

use crate::{price_cache::PriceCache, traits::MarketDataProvider};

/// Market-data platform key for Ethereum mainnet contracts.
pub const ETHEREUM_PLATFORM: &str = "ethereum";

#[derive(Clone, Debug)]
pub struct RefreshConfig {
    /// How many of the highest ranked tokens to price.
    pub top_n: usize,
    pub per_page: u32,
    pub platform: String,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            top_n: 500,
            per_page: 250,
            platform: ETHEREUM_PLATFORM.to_string(),
        }
    }
}

impl RefreshConfig {
    fn page_count(&self) -> u32 {
        let per_page = self.per_page.max(1) as usize;
        self.top_n.div_ceil(per_page) as u32
    }
}

/// Keeps the top-token price table and feeds the [`PriceCache`] from it.
pub struct PriceManager {
    market: Arc<dyn MarketDataProvider>,
    config: RefreshConfig,
    top_tokens: ArcSwap<HashMap<String, f64>>,
}

impl PriceManager {
    pub fn new(market: Arc<dyn MarketDataProvider>, config: RefreshConfig) -> Self {
        Self {
            market,
            config,
            top_tokens: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Price from the last successful refresh, if the contract was ranked.
    pub fn top_token_price(&self, contract_address: &str) -> Option<f64> {
        self.top_tokens
            .load()
            .get(&contract_address.to_lowercase())
            .copied()
    }

    pub fn top_token_count(&self) -> usize {
        self.top_tokens.load().len()
    }

    async fn fetch_top_tokens(&self) -> crate::Result<HashMap<String, f64>> {
        let contracts = self.market.platform_contracts(&self.config.platform).await?;

        let pages = try_join_all(
            (1..=self.config.page_count())
                .map(|page| self.market.markets_page(page, self.config.per_page)),
        )
        .await?;

        let mut table = HashMap::new();
        for token in pages.into_iter().flatten().take(self.config.top_n) {
            let Some(contract) = contracts.get(&token.id) else {
                continue;
            };
            let price = token
                .current_price
                .filter(|price| price.is_finite() && *price >= 0.0)
                .unwrap_or_default();
            table.insert(contract.to_lowercase(), price);
        }

        Ok(table)
    }

    /// Runs one bulk refresh: rebuild the table, install it, copy every price
    /// into `cache`, prune it, then persist it.
    ///
    /// Nothing is installed unless every page was fetched. Once installed the
    /// refresh counts as done: a failed persist is logged and the prices stay
    /// in memory until the next successful write.
    pub async fn refresh(&self, cache: &PriceCache) -> crate::Result<usize> {
        let table = self
            .fetch_top_tokens()
            .await
            .map_err(|err| crate::Error::RefreshFailed(Box::new(err)))?;
        let count = table.len();

        cache.put_many(table.iter().map(|(contract, price)| (contract.clone(), *price)));
        self.top_tokens.store(Arc::new(table));

        let pruned = cache.prune_expired();
        if pruned > 0 {
            tracing::debug!(pruned, "dropped expired prices after refresh");
        }
        if let Err(err) = cache.persist() {
            tracing::warn!(
                %err,
                path = %cache.path().display(),
                "failed to persist price cache"
            );
        }

        Ok(count)
    }

    /// Like [`Self::refresh`] but only logs failures.
    pub async fn refresh_and_log(&self, cache: &PriceCache) {
        match self.refresh(cache).await {
            Ok(count) => tracing::info!(count, "fetched prices for top tokens"),
            Err(err) => tracing::error!(%err, "failed to refresh top token prices"),
        }
    }

    /// Refreshes once, then again every `interval` if one is given, until
    /// `shutdown_signal` fires.
    pub fn spawn_refresh_prices_thread(
        self: &Arc<Self>,
        cache: Arc<PriceCache>,
        interval: Option<Duration>,
        shutdown_signal: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let self_clone = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = self_clone.refresh_and_log(&cache) => {},
                    _ = shutdown_signal.cancelled() => break,
                }

                let Some(interval) = interval else {
                    break;
                };

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {},
                    _ = shutdown_signal.cancelled() => break,
                }
            }
        })
    }
}
