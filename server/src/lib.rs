//! HTTP surface of the token aggregator.
//!
//! `GET /api/tokens/{wallet}` returns the priced holdings of an address or ENS
//! name as a JSON array, or `{"error": "..."}` with a non-2xx status.
pub mod error;
mod serve;

pub use error::{Result, ServerError as Error};
pub use serve::*;
