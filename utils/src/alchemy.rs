use std::{future::Future, time::Duration};

use alloy::primitives::Address;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tally_common::{CanonicalAddress, RawBalanceEntry};

use crate::{
    alloy::StringExt,
    ens,
    reqwest::{redact, DEFAULT_TIMEOUT},
    traits::{BalanceProvider, MetadataProvider, NameResolver, ProviderMetadata},
    Reqwest,
};

#[derive(Clone, Debug)]
pub struct AlchemyConfig {
    pub api_key: String,
    /// Alchemy network slug, e.g. `eth-mainnet`.
    pub network: String,
    pub timeout: Duration,
}

impl AlchemyConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            network: "eth-mainnet".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBalancesResult {
    token_balances: Vec<TokenBalanceEntry>,
    #[serde(default)]
    page_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBalanceEntry {
    contract_address: String,
    #[serde(default)]
    token_balance: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub struct Alchemy {
    config: AlchemyConfig,
}

impl Alchemy {
    pub fn new(config: AlchemyConfig) -> Self {
        Self { config }
    }

    fn rpc_url(&self) -> String {
        format!(
            "https://{}.g.alchemy.com/v2/{}",
            self.config.network, self.config.api_key
        )
    }

    async fn rpc_call<P, R>(&self, method: &str, params: P) -> crate::Result<R>
    where
        P: serde::Serialize + std::fmt::Debug,
        R: serde::de::DeserializeOwned + std::fmt::Debug,
    {
        Reqwest::post(self.rpc_url())?
            .redact_url(&self.config.api_key)
            .timeout(self.config.timeout)
            .rpc_call(method, params)
            .await
    }
}

#[async_trait]
impl BalanceProvider for Alchemy {
    // docs: https://docs.alchemy.com/reference/alchemy-gettokenbalances
    async fn token_balances(
        &self,
        owner: &CanonicalAddress,
    ) -> crate::Result<Vec<RawBalanceEntry>> {
        let mut entries = Vec::new();
        let mut page_key: Option<String> = None;

        loop {
            let params = match &page_key {
                Some(page_key) => json!([owner, "erc20", { "pageKey": page_key }]),
                None => json!([owner, "erc20"]),
            };

            let page: TokenBalancesResult =
                self.rpc_call("alchemy_getTokenBalances", params).await?;

            for entry in page.token_balances {
                match (entry.token_balance, entry.error) {
                    (Some(balance), None) => {
                        entries.push(RawBalanceEntry::new(entry.contract_address, balance))
                    }
                    (_, error) => tracing::debug!(
                        contract = %entry.contract_address,
                        ?error,
                        "skipping balance entry without a value"
                    ),
                }
            }

            match page.page_key {
                Some(next) if !next.is_empty() => page_key = Some(next),
                _ => break,
            }
        }

        Ok(entries)
    }
}

#[async_trait]
impl MetadataProvider for Alchemy {
    // docs: https://docs.alchemy.com/reference/alchemy-gettokenmetadata
    async fn token_metadata(&self, contract_address: &str) -> crate::Result<ProviderMetadata> {
        self.rpc_call("alchemy_getTokenMetadata", [contract_address])
            .await
    }
}

#[async_trait]
impl NameResolver for Alchemy {
    async fn resolve_name(&self, name: &str) -> crate::Result<Option<Address>> {
        let rpc_url = self.rpc_url();
        let resolved = match rpc_url.to_alloy_provider() {
            Ok(provider) => with_timeout(self.config.timeout, ens::resolve(&provider, name)).await,
            Err(err) => Err(err),
        };

        resolved.map_err(|err| redact_error(err, &self.config.api_key))
    }
}

/// Bounds a call that has no timeout of its own.
async fn with_timeout<T>(
    timeout: Duration,
    call: impl Future<Output = crate::Result<T>>,
) -> crate::Result<T> {
    tokio::time::timeout(timeout, call)
        .await
        .map_err(|_| crate::Error::CallTimeout(timeout))?
}

/// The alloy transport reports failures with the full RPC URL, key included.
fn redact_error(err: crate::Error, api_key: &str) -> crate::Error {
    match err {
        crate::Error::EnsCall(message) => crate::Error::EnsCall(redact(&message, api_key)),
        crate::Error::UrlParsingFailed(url, e) => {
            crate::Error::UrlParsingFailed(redact(&url, api_key), e)
        }
        other => other,
    }
}
