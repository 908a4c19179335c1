//! Indexes TokenStream organizations, their payment streams and the withdraw/deposit activity
//! flowing through them, from Ethereum logs into a small entity store.
//!
//! [`Indexer`] runs natively over any [`EntityStore`]. The same projection is exposed as
//! substreams modules (see `substreams.yaml`) ending in a `graph_out` of entity changes.

mod abi;
mod modules;
mod pb;
pub mod entity_changes;
pub mod error;
pub mod events;
pub mod handlers;
pub mod identity;
pub mod indexer;
pub mod params;
pub mod query;
pub mod registry;
pub mod schema;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::{IndexerError, StoreError};
pub use indexer::{BlockSummary, Indexer};
pub use params::Params;
pub use store::{EntityScan, EntityStore, MemoryStore};
