use std::{path::PathBuf, time::Duration};

use clap::Parser;
use tally_server::ServerConfig;
use tally_utils::{
    alchemy::AlchemyConfig,
    coingecko::{CoinGeckoConfig, COINGECKO_API},
    price_manager::{RefreshConfig, ETHEREUM_PLATFORM},
};

#[derive(Parser, Debug)]
#[command(name = "tally", bin_name = "tally", version, about)]
pub struct Cli {
    /// Alchemy API key used for balances, metadata and ENS lookups
    #[arg(long, env = "ALCHEMY_API_KEY", hide_env_values = true)]
    pub alchemy_api_key: String,

    /// Alchemy network slug
    #[arg(long, env = "TALLY_ALCHEMY_NETWORK", default_value = "eth-mainnet")]
    pub alchemy_network: String,

    #[arg(long, env = "TALLY_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "TALLY_PORT", default_value_t = 5000)]
    pub port: u16,

    /// File the price cache is loaded from and persisted to
    #[arg(long, env = "TALLY_PRICE_CACHE", default_value = "prices.json")]
    pub price_cache: PathBuf,

    /// Number of market-cap ranked tokens priced by the bulk refresh
    #[arg(long, env = "TALLY_TOP_TOKENS", default_value_t = 500)]
    pub top_tokens: usize,

    #[arg(long, env = "TALLY_PAGE_SIZE", default_value_t = 250)]
    pub page_size: u32,

    #[arg(long, env = "TALLY_COINGECKO_URL", default_value = COINGECKO_API)]
    pub coingecko_base_url: String,

    #[arg(long, env = "COINGECKO_API_KEY", hide_env_values = true)]
    pub coingecko_api_key: Option<String>,

    /// Upper bound for every outbound request
    #[arg(long, env = "TALLY_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Re-run the bulk price refresh this often. Without it prices are
    /// refreshed once at startup.
    #[arg(long, env = "TALLY_REFRESH_INTERVAL_SECS")]
    pub refresh_interval_secs: Option<u64>,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_filter: String,
}

impl Cli {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_secs.map(Duration::from_secs)
    }

    pub fn alchemy_config(&self) -> AlchemyConfig {
        AlchemyConfig {
            api_key: self.alchemy_api_key.clone(),
            network: self.alchemy_network.clone(),
            timeout: self.request_timeout(),
        }
    }

    pub fn coingecko_config(&self) -> CoinGeckoConfig {
        CoinGeckoConfig {
            base_url: self.coingecko_base_url.clone(),
            api_key: self.coingecko_api_key.clone(),
            timeout: self.request_timeout(),
            ..CoinGeckoConfig::default()
        }
    }

    pub fn refresh_config(&self) -> RefreshConfig {
        RefreshConfig {
            top_n: self.top_tokens,
            per_page: self.page_size,
            platform: ETHEREUM_PLATFORM.to_string(),
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host.clone(),
            port: self.port,
        }
    }
}
