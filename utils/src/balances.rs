use std::sync::Arc;

use tally_common::{CanonicalAddress, RawBalanceEntry};

use crate::traits::BalanceProvider;

pub struct BalanceFetcher {
    provider: Arc<dyn BalanceProvider>,
}

impl BalanceFetcher {
    pub fn new(provider: Arc<dyn BalanceProvider>) -> Self {
        Self { provider }
    }

    /// Non-zero holdings of `owner`. Any provider failure fails the whole call.
    pub async fn fetch_balances(
        &self,
        owner: &CanonicalAddress,
    ) -> crate::Result<Vec<RawBalanceEntry>> {
        let entries = self
            .provider
            .token_balances(owner)
            .await
            .map_err(crate::Error::provider)?;

        Ok(entries
            .into_iter()
            .filter(|entry| match entry.decoded_balance() {
                Some(balance) => !balance.is_zero(),
                None => {
                    tracing::warn!(
                        contract = %entry.contract_address,
                        raw = %entry.raw_balance,
                        "dropping undecodable balance"
                    );
                    false
                }
            })
            .collect())
    }
}
