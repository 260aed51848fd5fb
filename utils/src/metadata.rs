use std::{collections::HashMap, sync::Arc};

use futures::future::join_all;
use tally_common::TokenMetadata;

use crate::traits::{MetadataProvider, ProviderMetadata};

/// Outcome of one metadata lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MetadataLookup {
    Found(TokenMetadata),
    /// The lookup failed and placeholder metadata was substituted.
    Defaulted(TokenMetadata),
}

impl MetadataLookup {
    pub fn metadata(&self) -> &TokenMetadata {
        match self {
            Self::Found(metadata) | Self::Defaulted(metadata) => metadata,
        }
    }

    pub fn into_metadata(self) -> TokenMetadata {
        match self {
            Self::Found(metadata) | Self::Defaulted(metadata) => metadata,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted(_))
    }
}

impl ProviderMetadata {
    pub fn into_token_metadata(self, contract_address: &str) -> TokenMetadata {
        TokenMetadata::from_parts(
            contract_address,
            self.decimals.and_then(|d| u8::try_from(d).ok()),
            self.symbol,
            self.logo,
        )
    }
}

pub struct MetadataEnricher {
    provider: Arc<dyn MetadataProvider>,
}

impl MetadataEnricher {
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self { provider }
    }

    async fn lookup(&self, contract_address: &str) -> MetadataLookup {
        match self.provider.token_metadata(contract_address).await {
            Ok(metadata) => MetadataLookup::Found(metadata.into_token_metadata(contract_address)),
            Err(err) => {
                let err = crate::Error::MetadataLookup {
                    contract: contract_address.to_string(),
                    source: Box::new(err),
                };
                tracing::warn!(%err, "using placeholder metadata");
                MetadataLookup::Defaulted(TokenMetadata::fallback(contract_address))
            }
        }
    }

    /// Looks up every contract concurrently and waits for all of them.
    pub async fn enrich_tagged<'a, I>(&self, contract_addresses: I) -> HashMap<String, MetadataLookup>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let lookups = contract_addresses.into_iter().map(|contract| async move {
            (contract.to_string(), self.lookup(contract).await)
        });

        join_all(lookups).await.into_iter().collect()
    }

    pub async fn enrich<'a, I>(&self, contract_addresses: I) -> HashMap<String, TokenMetadata>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.enrich_tagged(contract_addresses)
            .await
            .into_iter()
            .map(|(contract, lookup)| (contract, lookup.into_metadata()))
            .collect()
    }
}
