use std::cmp::Ordering;

use alloy::primitives::{utils::format_units, U256};
use serde::{Serialize, Serializer};

pub const DEFAULT_DECIMALS: u8 = 18;
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

/// A balance as reported by the balance provider, before any decoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawBalanceEntry {
    pub contract_address: String,
    /// Smallest-unit balance as a `0x` hex string.
    pub raw_balance: String,
}

impl RawBalanceEntry {
    pub fn new(contract_address: impl Into<String>, raw_balance: impl Into<String>) -> Self {
        Self {
            contract_address: contract_address.into(),
            raw_balance: raw_balance.into(),
        }
    }

    /// Decodes the hex balance. `None` when the string is not hex.
    pub fn decoded_balance(&self) -> Option<U256> {
        let digits = self
            .raw_balance
            .trim()
            .trim_start_matches("0x")
            .trim_start_matches("0X");
        if digits.is_empty() {
            return Some(U256::ZERO);
        }
        U256::from_str_radix(digits, 16).ok()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenMetadata {
    pub decimals: u8,
    pub symbol: String,
    pub logo_url: String,
}

impl TokenMetadata {
    /// Builds metadata from whatever the provider returned, filling the gaps.
    ///
    /// Zero decimals and empty strings count as missing.
    pub fn from_parts(
        contract_address: &str,
        decimals: Option<u8>,
        symbol: Option<String>,
        logo_url: Option<String>,
    ) -> Self {
        Self {
            decimals: decimals
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_DECIMALS),
            symbol: symbol
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string()),
            logo_url: logo_url
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| fallback_logo_url(contract_address)),
        }
    }

    /// Placeholder used when a metadata lookup fails.
    pub fn fallback(contract_address: &str) -> Self {
        Self::from_parts(contract_address, None, None, None)
    }
}

pub fn fallback_logo_url(contract_address: &str) -> String {
    format!(
        "https://raw.githubusercontent.com/trustwallet/assets/master/blockchains/ethereum/assets/{}/logo.png",
        contract_address.to_lowercase()
    )
}

/// One row of the response: a held token with its metadata and unit price.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedToken {
    pub contract_address: String,
    #[serde(serialize_with = "serialize_balance")]
    pub balance: U256,
    pub decimals: u8,
    pub symbol: String,
    pub logo_url: String,
    pub price: f64,
}

impl AggregatedToken {
    pub fn new(contract_address: String, balance: U256, metadata: TokenMetadata, price: f64) -> Self {
        Self {
            contract_address,
            balance,
            decimals: metadata.decimals,
            symbol: metadata.symbol,
            logo_url: metadata.logo_url,
            price,
        }
    }

    /// Balance scaled down by `10^decimals`.
    pub fn formatted_balance(&self) -> f64 {
        format_units(self.balance, self.decimals)
            .ok()
            .and_then(|formatted| formatted.parse::<f64>().ok())
            .unwrap_or_default()
    }

    pub fn fiat_value(&self) -> f64 {
        self.formatted_balance() * self.price
    }
}

/// Sorts by descending fiat value. Equal values keep their input order.
pub fn sort_by_fiat_value(tokens: &mut [AggregatedToken]) {
    tokens.sort_by(|a, b| {
        b.fiat_value()
            .partial_cmp(&a.fiat_value())
            .unwrap_or(Ordering::Equal)
    });
}

// JSON numbers: exact when the balance fits in a u128, lossy float beyond that.
fn serialize_balance<S: Serializer>(balance: &U256, serializer: S) -> Result<S::Ok, S::Error> {
    match u128::try_from(*balance) {
        Ok(value) => serializer.serialize_u128(value),
        Err(_) => serializer.serialize_f64(balance.to_string().parse::<f64>().unwrap_or(f64::MAX)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDX: &str = "0x1111111111111111111111111111111111111111";

    fn token(symbol: &str, balance: u64, decimals: u8, price: f64) -> AggregatedToken {
        AggregatedToken {
            contract_address: USDX.to_string(),
            balance: U256::from(balance),
            decimals,
            symbol: symbol.to_string(),
            logo_url: fallback_logo_url(USDX),
            price,
        }
    }

    #[test]
    fn test_decoded_balance() {
        assert_eq!(
            RawBalanceEntry::new(USDX, "0x2540be400").decoded_balance(),
            Some(U256::from(10_000_000_000u64))
        );
        assert_eq!(
            RawBalanceEntry::new(USDX, "0x0000000000000000000000000000000000000000000000000000000000000000")
                .decoded_balance(),
            Some(U256::ZERO)
        );
        assert_eq!(RawBalanceEntry::new(USDX, "0x").decoded_balance(), Some(U256::ZERO));
        assert_eq!(RawBalanceEntry::new(USDX, "0xzz").decoded_balance(), None);
    }

    #[test]
    fn test_metadata_defaults() {
        let metadata = TokenMetadata::fallback("0xABCDEF0000000000000000000000000000000000");
        assert_eq!(metadata.decimals, 18);
        assert_eq!(metadata.symbol, "UNKNOWN");
        assert_eq!(
            metadata.logo_url,
            "https://raw.githubusercontent.com/trustwallet/assets/master/blockchains/ethereum/assets/0xabcdef0000000000000000000000000000000000/logo.png"
        );

        let metadata = TokenMetadata::from_parts(USDX, Some(0), Some(String::new()), None);
        assert_eq!(metadata.decimals, 18);
        assert_eq!(metadata.symbol, "UNKNOWN");

        let metadata = TokenMetadata::from_parts(
            USDX,
            Some(6),
            Some("USDX".to_string()),
            Some("https://logo.example/usdx.png".to_string()),
        );
        assert_eq!(metadata.decimals, 6);
        assert_eq!(metadata.symbol, "USDX");
        assert_eq!(metadata.logo_url, "https://logo.example/usdx.png");
    }

    #[test]
    fn test_fiat_value() {
        let usdx = token("USDX", 10_000_000_000, 6, 1.0);
        assert_eq!(usdx.formatted_balance(), 10_000.0);
        assert_eq!(usdx.fiat_value(), 10_000.0);
    }

    #[test]
    fn test_sort_is_descending_and_stable() {
        let mut tokens = vec![
            token("ZERO_A", 5, 0, 0.0),
            token("SMALL", 1, 0, 2.0),
            token("ZERO_B", 7, 0, 0.0),
            token("BIG", 3, 0, 10.0),
            token("SMALL_TIE", 2, 0, 1.0),
        ];
        sort_by_fiat_value(&mut tokens);
        let symbols: Vec<_> = tokens.iter().map(|t| t.symbol.as_str()).collect();
        assert_eq!(symbols, ["BIG", "SMALL", "SMALL_TIE", "ZERO_A", "ZERO_B"]);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(token("USDX", 10_000_000_000, 6, 1.0)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "contractAddress": USDX,
                "balance": 10_000_000_000u64,
                "decimals": 6,
                "symbol": "USDX",
                "logoUrl": fallback_logo_url(USDX),
                "price": 1.0,
            })
        );
    }

    #[test]
    fn test_large_balance_serializes_as_number() {
        let mut big = token("BIG", 0, 18, 0.0);
        big.balance = U256::from(u128::MAX) + U256::from(1u8);
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&big).unwrap()).unwrap();
        assert!(json["balance"].is_f64());
        assert!(json["balance"].as_f64().unwrap() > 3.4e38);
    }
}
