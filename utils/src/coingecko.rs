use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    reqwest::DEFAULT_TIMEOUT,
    traits::{MarketDataProvider, MarketToken},
    Reqwest,
};

pub const COINGECKO_API: &str = "https://api.coingecko.com/api/v3";

#[derive(Clone, Debug)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    /// Sent as `x-cg-demo-api-key` when present.
    pub api_key: Option<String>,
    pub vs_currency: String,
    pub timeout: Duration,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: COINGECKO_API.to_string(),
            api_key: None,
            vs_currency: "usd".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CoinListEntry {
    id: String,
    #[serde(default)]
    platforms: HashMap<String, Option<String>>,
}

pub struct CoinGecko {
    config: CoinGeckoConfig,
}

impl CoinGecko {
    pub fn new(config: CoinGeckoConfig) -> Self {
        Self { config }
    }

    fn get(&self, path: &str) -> crate::Result<Reqwest> {
        let request = Reqwest::get(format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path
        ))?
        .timeout(self.config.timeout);

        Ok(match &self.config.api_key {
            Some(api_key) => request.header("x-cg-demo-api-key", api_key),
            None => request,
        })
    }
}

#[async_trait]
impl MarketDataProvider for CoinGecko {
    // docs: https://docs.coingecko.com/reference/coins-markets
    async fn markets_page(&self, page: u32, per_page: u32) -> crate::Result<Vec<MarketToken>> {
        let page = page.to_string();
        let per_page = per_page.to_string();

        self.get("coins/markets")?
            .query(&[
                ("vs_currency", self.config.vs_currency.as_str()),
                ("order", "market_cap_desc"),
                ("per_page", per_page.as_str()),
                ("page", page.as_str()),
                ("sparkline", "false"),
            ])
            .receive_json::<Vec<MarketToken>>()
            .await
    }

    // docs: https://docs.coingecko.com/reference/coins-list
    async fn platform_contracts(&self, platform: &str) -> crate::Result<HashMap<String, String>> {
        let coins = self
            .get("coins/list")?
            .query(&[("include_platform", "true")])
            .receive_json::<Vec<CoinListEntry>>()
            .await?;

        Ok(contracts_on(coins, platform))
    }
}

fn contracts_on(coins: Vec<CoinListEntry>, platform: &str) -> HashMap<String, String> {
    coins
        .into_iter()
        .filter_map(|mut coin| {
            let contract = coin.platforms.remove(platform).flatten()?;
            let contract = contract.trim().to_lowercase();
            (!contract.is_empty()).then_some((coin.id, contract))
        })
        .collect()
}
