//! Caching primitives for server state
//!
//! - [`CacheEntry`] - a fetched value with its staleness deadline
//! - [`QueryKey`] / [`Scope`] - identity of a cached read
//! - [`QueryCache`] - the process-wide keyed store the coordinator owns

pub mod entry;
pub mod key;
pub mod store;

pub use entry::CacheEntry;
pub use key::{QueryKey, Scope, UOM_DIMENSION_PARAM};
pub use store::{FetchResult, QueryCache};
