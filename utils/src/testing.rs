//! In-memory capability implementations for tests.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use alloy::primitives::Address;
use async_trait::async_trait;
use tally_common::{CanonicalAddress, RawBalanceEntry};

use crate::traits::{
    BalanceProvider, MarketDataProvider, MarketToken, MetadataProvider, NameResolver,
    ProviderMetadata,
};

fn upstream_error(what: &str) -> crate::Error {
    crate::Error::RpcEmptyResponse(what.to_string())
}

#[derive(Default)]
pub struct StaticNames {
    names: HashMap<String, Address>,
    failing: bool,
}

impl StaticNames {
    pub fn with_name(mut self, name: &str, address: Address) -> Self {
        self.names.insert(name.to_lowercase(), address);
        self
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl NameResolver for StaticNames {
    async fn resolve_name(&self, name: &str) -> crate::Result<Option<Address>> {
        if self.failing {
            return Err(upstream_error("ens"));
        }
        Ok(self.names.get(&name.to_lowercase()).copied())
    }
}

#[derive(Default)]
pub struct StaticBalances {
    balances: HashMap<String, Vec<RawBalanceEntry>>,
    failing: bool,
}

impl StaticBalances {
    pub fn with_balances(mut self, owner: &str, entries: Vec<RawBalanceEntry>) -> Self {
        self.balances.insert(owner.to_lowercase(), entries);
        self
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl BalanceProvider for StaticBalances {
    async fn token_balances(
        &self,
        owner: &CanonicalAddress,
    ) -> crate::Result<Vec<RawBalanceEntry>> {
        if self.failing {
            return Err(upstream_error("alchemy_getTokenBalances"));
        }
        Ok(self.balances.get(owner.as_str()).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct StaticMetadata {
    metadata: HashMap<String, ProviderMetadata>,
    failing: HashSet<String>,
    calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl StaticMetadata {
    pub fn with_token(mut self, contract: &str, decimals: u64, symbol: &str) -> Self {
        self.metadata.insert(
            contract.to_lowercase(),
            ProviderMetadata {
                decimals: Some(decimals),
                symbol: Some(symbol.to_string()),
                name: None,
                logo: None,
            },
        );
        self
    }

    pub fn with_metadata(mut self, contract: &str, metadata: ProviderMetadata) -> Self {
        self.metadata.insert(contract.to_lowercase(), metadata);
        self
    }

    pub fn failing_for(mut self, contract: &str) -> Self {
        self.failing.insert(contract.to_lowercase());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl MetadataProvider for StaticMetadata {
    async fn token_metadata(&self, contract_address: &str) -> crate::Result<ProviderMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(contract_address.to_string());
        }

        let contract = contract_address.to_lowercase();
        if self.failing.contains(&contract) {
            return Err(upstream_error("alchemy_getTokenMetadata"));
        }
        Ok(self.metadata.get(&contract).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct StaticMarket {
    pages: Vec<Vec<MarketToken>>,
    contracts: HashMap<String, String>,
    failing_page: Option<u32>,
}

impl StaticMarket {
    pub fn token(id: &str, current_price: Option<f64>) -> MarketToken {
        MarketToken {
            id: id.to_string(),
            symbol: id.to_string(),
            current_price,
        }
    }

    pub fn with_page(mut self, page: Vec<MarketToken>) -> Self {
        self.pages.push(page);
        self
    }

    pub fn with_contract(mut self, id: &str, contract: &str) -> Self {
        self.contracts.insert(id.to_string(), contract.to_string());
        self
    }

    pub fn failing_page(mut self, page: u32) -> Self {
        self.failing_page = Some(page);
        self
    }
}

#[async_trait]
impl MarketDataProvider for StaticMarket {
    async fn markets_page(&self, page: u32, _per_page: u32) -> crate::Result<Vec<MarketToken>> {
        if self.failing_page == Some(page) {
            return Err(upstream_error("coins/markets"));
        }
        Ok(self
            .pages
            .get(page.saturating_sub(1) as usize)
            .cloned()
            .unwrap_or_default())
    }

    async fn platform_contracts(&self, _platform: &str) -> crate::Result<HashMap<String, String>> {
        Ok(self.contracts.clone())
    }
}
