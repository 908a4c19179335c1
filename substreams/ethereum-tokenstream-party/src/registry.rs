//! Watched contract addresses, static factories plus sources discovered while indexing.

use std::{collections::HashMap, fmt};

use tracing::{debug, info};

use crate::{
    error::StoreResult,
    identity::SchemaPolicy,
    schema::{Entity, EntityKind},
    store::EntityScan,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    /// Factory emitting `OrganizationDeployed` / `OrganizationsDeployed`.
    StreamDeployer,
    /// Organization contract holding one stream per user, or announcing deployed streams.
    MultiStream,
    /// A stream deployed as its own contract.
    SimpleStream,
    /// Organization contract holding named streams.
    NamedStreams,
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContractKind::StreamDeployer => "StreamDeployer",
            ContractKind::MultiStream => "MultiStream",
            ContractKind::SimpleStream => "SimpleStream",
            ContractKind::NamedStreams => "NamedStreams",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DynamicSourceRegistry {
    sources: HashMap<Vec<u8>, ContractKind>,
}

impl DynamicSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factories<I>(factories: I) -> Self
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        let mut registry = Self::new();
        for factory in factories {
            registry.register(ContractKind::StreamDeployer, &factory);
        }
        registry
    }

    /// Starts delivering events emitted by `address` to the handlers of `kind`.
    ///
    /// Returns `false` if the address was already watched; the first registration wins.
    pub fn register(&mut self, kind: ContractKind, address: &[u8]) -> bool {
        if self.sources.contains_key(address) {
            debug!(%kind, address = %hex::encode(address), "source already registered");
            return false;
        }
        info!(%kind, address = %hex::encode(address), "registered dynamic source");
        self.sources
            .insert(address.to_vec(), kind);
        true
    }

    pub fn kind_of(&self, address: &[u8]) -> Option<ContractKind> {
        self.sources.get(address).copied()
    }

    pub fn watched(&self, kind: ContractKind) -> Vec<Vec<u8>> {
        let mut addresses: Vec<_> = self
            .sources
            .iter()
            .filter(|(_, k)| **k == kind)
            .map(|(address, _)| address.clone())
            .collect();
        addresses.sort();
        addresses
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Re-registers every contract discovered in a previous run from the materialized entities,
    /// so a restarted indexer keeps watching the organizations (and streams) it already knows.
    pub fn recover<S: EntityScan>(&mut self, store: &S, policy: &SchemaPolicy) -> StoreResult<usize> {
        let mut recovered = 0;

        for entity in store.scan(EntityKind::Organization)? {
            if let Entity::Organization(org) = entity {
                if let Some(address) = decode_key(&org.id) {
                    if self.register(policy.organization_source(), &address) {
                        recovered += 1;
                    }
                }
            }
        }

        if let Some(stream_kind) = policy.stream_source() {
            for entity in store.scan(EntityKind::Stream)? {
                if let Entity::Stream(stream) = entity {
                    if let Some(contract) = stream.contract {
                        if self.register(stream_kind, &contract) {
                            recovered += 1;
                        }
                    }
                }
            }
        }

        Ok(recovered)
    }
}

fn decode_key(key: &str) -> Option<Vec<u8>> {
    hex::decode(key.strip_prefix("0x").unwrap_or(key)).ok()
}
