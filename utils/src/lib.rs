pub mod alchemy;
pub mod alloy;
pub mod assets;
pub mod balances;
pub mod coingecko;
pub mod disk_storage;
pub mod ens;
pub mod error;
pub mod identity;
pub mod log;
pub mod metadata;
pub mod price_cache;
pub mod price_manager;
pub mod reqwest;
pub mod rpc;
pub mod serde;
pub mod traits;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use error::{Result, UtilsError as Error};

pub use reqwest::Reqwest;
