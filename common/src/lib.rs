pub mod address;
pub mod error;
pub mod token;

pub use address::CanonicalAddress;
pub use error::Error;
pub use token::{AggregatedToken, RawBalanceEntry, TokenMetadata};

pub type Result<T> = std::result::Result<T, Error>;
