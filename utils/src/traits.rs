//! Upstream capabilities the aggregation core depends on.

use std::collections::HashMap;

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;
use tally_common::{CanonicalAddress, RawBalanceEntry};

/// Resolves human-readable names (ENS) to addresses.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// `Ok(None)` when the name has no address record.
    async fn resolve_name(&self, name: &str) -> crate::Result<Option<Address>>;
}

#[async_trait]
pub trait BalanceProvider: Send + Sync {
    async fn token_balances(&self, owner: &CanonicalAddress)
        -> crate::Result<Vec<RawBalanceEntry>>;
}

/// Metadata as reported upstream; any field may be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderMetadata {
    #[serde(default)]
    pub decimals: Option<u64>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
}

#[async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn token_metadata(&self, contract_address: &str) -> crate::Result<ProviderMetadata>;
}

/// One row of a market-cap ranked listing.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MarketToken {
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub current_price: Option<f64>,
}

#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Tokens ranked by market capitalisation, `page` starting at 1.
    async fn markets_page(&self, page: u32, per_page: u32) -> crate::Result<Vec<MarketToken>>;

    /// Maps coin ids to their contract address on `platform`.
    async fn platform_contracts(&self, platform: &str) -> crate::Result<HashMap<String, String>>;
}
