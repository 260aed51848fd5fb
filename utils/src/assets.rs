//! The token aggregation pipeline:
//! resolve → fetch balances → dedupe → enrich → price → sort.

use std::{sync::Arc, time::Instant};

use indexmap::IndexMap;
use tally_common::{token::sort_by_fiat_value, AggregatedToken, RawBalanceEntry};

use crate::{
    balances::BalanceFetcher,
    identity::IdentityResolver,
    metadata::MetadataEnricher,
    price_cache::PriceCache,
    price_manager::PriceManager,
    traits::{BalanceProvider, MetadataProvider, NameResolver},
};

/// Groups entries by lowercase contract address.
///
/// When a contract appears twice the later entry wins, keeping the position of
/// the first occurrence.
pub fn dedupe_balances(entries: Vec<RawBalanceEntry>) -> IndexMap<String, RawBalanceEntry> {
    let mut deduped = IndexMap::with_capacity(entries.len());
    for entry in entries {
        deduped.insert(entry.contract_address.to_lowercase(), entry);
    }
    deduped
}

pub struct AssetAggregator {
    identities: IdentityResolver,
    balances: BalanceFetcher,
    metadata: MetadataEnricher,
    price_cache: Arc<PriceCache>,
    price_manager: Arc<PriceManager>,
}

impl AssetAggregator {
    pub fn new(
        names: Arc<dyn NameResolver>,
        balances: Arc<dyn BalanceProvider>,
        metadata: Arc<dyn MetadataProvider>,
        price_cache: Arc<PriceCache>,
        price_manager: Arc<PriceManager>,
    ) -> Self {
        Self {
            identities: IdentityResolver::new(names),
            balances: BalanceFetcher::new(balances),
            metadata: MetadataEnricher::new(metadata),
            price_cache,
            price_manager,
        }
    }

    /// Cache first, then the top-token table, else 0.
    pub fn price_of(&self, contract_address: &str) -> f64 {
        self.price_cache
            .get(contract_address)
            .or_else(|| self.price_manager.top_token_price(contract_address))
            .unwrap_or_default()
    }

    /// Priced, deduplicated holdings of `identity`, most valuable first.
    pub async fn get_tokens(&self, identity: &str) -> crate::Result<Vec<AggregatedToken>> {
        let started = Instant::now();

        let owner = self.identities.resolve(identity).await?;

        let raw = self.balances.fetch_balances(&owner).await?;
        tracing::info!(
            %owner,
            count = raw.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fetched token balances"
        );

        let deduped = dedupe_balances(raw);
        if deduped.is_empty() {
            return Ok(Vec::new());
        }

        let mut metadata = self
            .metadata
            .enrich(deduped.keys().map(String::as_str))
            .await;

        let mut tokens: Vec<AggregatedToken> = deduped
            .into_iter()
            .filter_map(|(contract, entry)| {
                let balance = entry.decoded_balance()?;
                let metadata = metadata
                    .remove(&contract)
                    .unwrap_or_else(|| tally_common::TokenMetadata::fallback(&contract));
                let price = self.price_of(&contract);
                Some(AggregatedToken::new(contract, balance, metadata, price))
            })
            .collect();

        sort_by_fiat_value(&mut tokens);

        tracing::info!(
            %owner,
            count = tokens.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "returning unique tokens"
        );

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, U256};
    use tally_common::token::fallback_logo_url;

    use super::*;
    use crate::{
        price_manager::RefreshConfig,
        testing::{StaticBalances, StaticMarket, StaticMetadata, StaticNames},
    };

    const OWNER: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const USDX: &str = "0x1111111111111111111111111111111111111111";
    const WETX: &str = "0x2222222222222222222222222222222222222222";
    const JUNK: &str = "0x3333333333333333333333333333333333333333";

    struct Fixture {
        balances: StaticBalances,
        metadata: StaticMetadata,
        market: StaticMarket,
        cache: Vec<(&'static str, f64)>,
    }

    impl Fixture {
        fn new(entries: Vec<RawBalanceEntry>) -> Self {
            Self {
                balances: StaticBalances::default().with_balances(OWNER, entries),
                metadata: StaticMetadata::default(),
                market: StaticMarket::default(),
                cache: Vec::new(),
            }
        }

        async fn build(self) -> (AssetAggregator, Arc<StaticMetadata>) {
            crate::log::init_for_tests("debug");

            let dir = tempfile::tempdir().unwrap();
            let price_cache = Arc::new(PriceCache::new(dir.path().join("prices.json")));
            for (contract, price) in self.cache {
                price_cache.put(contract, price);
            }

            let price_manager = Arc::new(PriceManager::new(
                Arc::new(self.market),
                RefreshConfig {
                    top_n: 10,
                    per_page: 10,
                    ..RefreshConfig::default()
                },
            ));
            let table_only = PriceCache::new(dir.path().join("table.json"));
            price_manager.refresh(&table_only).await.unwrap();

            let metadata = Arc::new(self.metadata);
            let names = StaticNames::default()
                .with_name("owner.eth", address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"));

            (
                AssetAggregator::new(
                    Arc::new(names),
                    Arc::new(self.balances),
                    metadata.clone(),
                    price_cache,
                    price_manager,
                ),
                metadata,
            )
        }
    }

    #[test]
    fn test_dedupe_later_entry_wins() {
        let deduped = dedupe_balances(vec![
            RawBalanceEntry::new("0xAbC", "0x1"),
            RawBalanceEntry::new("0xdef", "0x2"),
            RawBalanceEntry::new("0xabc", "0x3"),
        ]);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped.get_index(0).unwrap().0, "0xabc");
        assert_eq!(deduped["0xabc"].raw_balance, "0x3");
        assert_eq!(deduped["0xdef"].raw_balance, "0x2");
    }

    #[tokio::test]
    async fn test_end_to_end_usdx() {
        let mut fixture = Fixture::new(vec![RawBalanceEntry::new(USDX, "0x2540be400")]);
        fixture.metadata = StaticMetadata::default().with_token(USDX, 6, "USDX");
        fixture.cache = vec![(USDX, 1.0)];
        let (aggregator, _) = fixture.build().await;

        let tokens = aggregator
            .get_tokens("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA")
            .await
            .unwrap();

        assert_eq!(
            tokens,
            vec![AggregatedToken {
                contract_address: USDX.to_string(),
                balance: U256::from(10_000_000_000u64),
                decimals: 6,
                symbol: "USDX".to_string(),
                logo_url: fallback_logo_url(USDX),
                price: 1.0,
            }]
        );
        assert_eq!(tokens[0].fiat_value(), 10_000.0);
    }

    #[tokio::test]
    async fn test_no_holdings_is_empty_not_error() {
        let (aggregator, metadata) = Fixture::new(vec![RawBalanceEntry::new(USDX, "0x0")])
            .build()
            .await;
        assert!(aggregator.get_tokens(OWNER).await.unwrap().is_empty());
        assert_eq!(metadata.calls(), 0);

        let (aggregator, _) = Fixture::new(Vec::new()).build().await;
        assert!(aggregator.get_tokens(OWNER).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_fetch_metadata_once() {
        let (aggregator, metadata) = Fixture::new(vec![
            RawBalanceEntry::new("0xabcdef0000000000000000000000000000000000", "0x1"),
            RawBalanceEntry::new(USDX, "0x2"),
            RawBalanceEntry::new("0xABCDEF0000000000000000000000000000000000", "0x5"),
        ])
        .build()
        .await;

        let tokens = aggregator.get_tokens(OWNER).await.unwrap();
        assert_eq!(tokens.len(), 2);
        let abcdef = tokens
            .iter()
            .find(|t| t.contract_address == "0xabcdef0000000000000000000000000000000000")
            .unwrap();
        assert_eq!(abcdef.balance, U256::from(5));

        let mut requested = metadata.requested();
        requested.sort();
        assert_eq!(
            requested,
            vec![
                USDX.to_string(),
                "0xabcdef0000000000000000000000000000000000".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_price_precedence_and_ordering() {
        let mut fixture = Fixture::new(vec![
            RawBalanceEntry::new(JUNK, "0xde0b6b3a7640000"),
            RawBalanceEntry::new(USDX, "0x3b9aca00"),
            RawBalanceEntry::new(WETX, "0xde0b6b3a7640000"),
        ]);
        fixture.metadata = StaticMetadata::default()
            .with_token(USDX, 6, "USDX")
            .with_token(WETX, 18, "WETX")
            .failing_for(JUNK);
        fixture.market = StaticMarket::default()
            .with_contract("usdx", USDX)
            .with_contract("wetx", WETX)
            .with_page(vec![
                StaticMarket::token("wetx", Some(3_000.0)),
                StaticMarket::token("usdx", Some(0.5)),
            ]);
        fixture.cache = vec![(USDX, 1.0)];
        let (aggregator, _) = fixture.build().await;

        let tokens = aggregator.get_tokens(OWNER).await.unwrap();
        let summary: Vec<_> = tokens
            .iter()
            .map(|t| (t.symbol.as_str(), t.price, t.fiat_value()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("WETX", 3_000.0, 3_000.0),
                ("USDX", 1.0, 1_000.0),
                ("UNKNOWN", 0.0, 0.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_ens_identity() {
        let (aggregator, _) = Fixture::new(vec![RawBalanceEntry::new(USDX, "0x1")])
            .build()
            .await;
        assert_eq!(aggregator.get_tokens("owner.eth").await.unwrap().len(), 1);

        let err = aggregator.get_tokens("nobody.eth").await.unwrap_err();
        assert!(matches!(err, crate::Error::NameNotResolved(_)));
    }

    #[tokio::test]
    async fn test_invalid_identity_and_provider_failure() {
        let (aggregator, _) = Fixture::new(Vec::new()).build().await;
        let err = aggregator.get_tokens("not-an-address").await.unwrap_err();
        assert!(matches!(err, crate::Error::InvalidIdentity(_)));

        let mut fixture = Fixture::new(Vec::new());
        fixture.balances = StaticBalances::failing();
        let (aggregator, _) = fixture.build().await;
        let err = aggregator.get_tokens(OWNER).await.unwrap_err();
        assert!(matches!(err, crate::Error::Provider(_)));
    }
}
