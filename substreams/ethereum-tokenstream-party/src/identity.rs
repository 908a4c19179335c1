//! Entity key derivation and the schema policy.
//!
//! Addresses repeat across organizations (a contributor can be paid by several of them) and
//! stream names are free text, so stream keys are composites. All functions here are pure: the
//! same event fields always produce the same key.

use serde::Deserialize;
use tiny_keccak::{Hasher, Keccak};

use crate::{events::StreamAdded, registry::ContractKind};

/// Lowercase `0x`-prefixed hex, the canonical form of every address or hash used as a key.
pub fn to_key(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}

pub fn organization_key(address: &[u8]) -> String {
    to_key(address)
}

/// Streams deployed as their own contracts are keyed by that contract address.
pub fn contract_stream_key(stream: &[u8]) -> String {
    to_key(stream)
}

/// User-first concatenation: `0x<user>0x<organization>`.
pub fn user_stream_key(user: &[u8], organization: &[u8]) -> String {
    format!("{}{}", to_key(user), organization_key(organization))
}

/// `0x<organization>0x<keccak256(name)>`, which keeps keys fixed width whatever the name length.
pub fn named_stream_key(organization: &[u8], name: &str) -> String {
    format!("{}{}", organization_key(organization), to_key(&keccak256(name.as_bytes())))
}

/// How stream identities and event shapes are laid out on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SchemaGeneration {
    /// Every stream is its own contract, announced by its organization's `StreamAdded`.
    DeployedStreams,
    /// Streams are per-user mappings inside the organization contract.
    #[default]
    UserStreams,
    /// Several named streams per organization, referenced by name on activity events.
    NamedStreams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKeyScheme {
    /// One activity per transaction. A later deposit or withdraw of the same transaction
    /// overwrites the earlier one, so the last event of the transaction is kept.
    #[serde(rename = "tx")]
    TransactionHash,
    /// Transaction hash plus log index, one activity per event.
    #[default]
    #[serde(rename = "tx_log")]
    TransactionLog,
}

impl ActivityKeyScheme {
    /// Whether an activity at `log_index` overwrites the stored one at `stored_log_index` that
    /// has the same key.
    ///
    /// Only a strictly later log replaces, which keeps a replayed block from reverting to an
    /// earlier event of the transaction.
    pub fn replaces(&self, stored_log_index: u32, log_index: u32) -> bool {
        match self {
            ActivityKeyScheme::TransactionHash => log_index > stored_log_index,
            ActivityKeyScheme::TransactionLog => false,
        }
    }
}

/// How an activity event points at its stream, before key derivation.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamRef {
    Contract(Vec<u8>),
    User(Vec<u8>),
    Name(String),
}

/// Versioned projection rules. Handlers ask the policy for every key and for the contract kinds
/// to subscribe to, so a new event generation only touches this type and the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SchemaPolicy {
    pub generation: SchemaGeneration,
    pub activity_keys: ActivityKeyScheme,
}

impl SchemaPolicy {
    pub fn new(generation: SchemaGeneration, activity_keys: ActivityKeyScheme) -> Self {
        Self { generation, activity_keys }
    }

    /// Contract kind of the organization contract deployed by the factory.
    pub fn organization_source(&self) -> ContractKind {
        match self.generation {
            SchemaGeneration::DeployedStreams | SchemaGeneration::UserStreams => {
                ContractKind::MultiStream
            }
            SchemaGeneration::NamedStreams => ContractKind::NamedStreams,
        }
    }

    /// Contract kind to register for each newly added stream, if streams emit their own events.
    pub fn stream_source(&self) -> Option<ContractKind> {
        match self.generation {
            SchemaGeneration::DeployedStreams => Some(ContractKind::SimpleStream),
            _ => None,
        }
    }

    /// The field of a `StreamAdded` event that identifies the stream in this generation.
    pub fn stream_ref(&self, added: &StreamAdded) -> Option<StreamRef> {
        match self.generation {
            SchemaGeneration::DeployedStreams => added
                .stream
                .clone()
                .map(StreamRef::Contract),
            SchemaGeneration::UserStreams => added.user.clone().map(StreamRef::User),
            SchemaGeneration::NamedStreams => added.name.clone().map(StreamRef::Name),
        }
    }

    pub fn stream_key(&self, organization: &[u8], stream: &StreamRef) -> Option<String> {
        match (self.generation, stream) {
            (SchemaGeneration::DeployedStreams, StreamRef::Contract(address)) => {
                Some(contract_stream_key(address))
            }
            (SchemaGeneration::UserStreams, StreamRef::User(user)) => {
                Some(user_stream_key(user, organization))
            }
            (SchemaGeneration::NamedStreams, StreamRef::Name(name)) => {
                Some(named_stream_key(organization, name))
            }
            _ => None,
        }
    }

    pub fn activity_key(&self, tx_hash: &[u8], log_index: u32) -> String {
        match self.activity_keys {
            ActivityKeyScheme::TransactionHash => to_key(tx_hash),
            ActivityKeyScheme::TransactionLog => format!("{}-{}", to_key(tx_hash), log_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use super::*;

    const ORG: [u8; 20] = hex!("ABCF000000000000000000000000000000000001");
    const USER: [u8; 20] = hex!("00000000000000000000000000000000000000aa");

    #[test]
    fn test_organization_key_is_lowercase() {
        assert_eq!(organization_key(&ORG), "0xabcf000000000000000000000000000000000001");
    }

    #[test]
    fn test_keccak_of_name() {
        assert_eq!(
            hex::encode(keccak256(b"payroll")),
            "5bcd5b7fba7251d646ed9eb72ccf3fcd7378e05364be626802394601d6d05a89"
        );
    }

    #[test]
    fn test_named_stream_key_is_deterministic() {
        let first = named_stream_key(&ORG, "payroll");
        let second = named_stream_key(&ORG, "payroll");

        assert_eq!(first, second);
        assert_eq!(
            first,
            "0xabcf0000000000000000000000000000000000010x5bcd5b7fba7251d646ed9eb72ccf3fcd7378e05364be626802394601d6d05a89"
        );
        assert_ne!(first, named_stream_key(&ORG, "Payroll"));
    }

    #[test]
    fn test_user_stream_key_puts_user_first() {
        assert_eq!(
            user_stream_key(&USER, &ORG),
            "0x00000000000000000000000000000000000000aa0xabcf000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_stream_key_requires_matching_reference() {
        let policy = SchemaPolicy::new(SchemaGeneration::NamedStreams, Default::default());

        assert!(policy
            .stream_key(&ORG, &StreamRef::User(USER.to_vec()))
            .is_none());
        assert_eq!(
            policy.stream_key(&ORG, &StreamRef::Name("payroll".to_string())),
            Some(named_stream_key(&ORG, "payroll"))
        );
    }

    #[test]
    fn test_activity_keys() {
        let tx = [0x11u8; 32];
        let by_log = SchemaPolicy::default();
        let by_tx = SchemaPolicy::new(SchemaGeneration::UserStreams, ActivityKeyScheme::TransactionHash);

        assert_eq!(by_log.activity_key(&tx, 3), format!("0x{}-3", "11".repeat(32)));
        assert_eq!(by_tx.activity_key(&tx, 3), format!("0x{}", "11".repeat(32)));
        assert_eq!(by_tx.activity_key(&tx, 3), by_tx.activity_key(&tx, 4));
    }

    #[test]
    fn test_only_later_logs_replace_under_tx_keys() {
        assert!(ActivityKeyScheme::TransactionHash.replaces(0, 1));
        assert!(!ActivityKeyScheme::TransactionHash.replaces(1, 1));
        assert!(!ActivityKeyScheme::TransactionHash.replaces(2, 1));
        assert!(!ActivityKeyScheme::TransactionLog.replaces(0, 1));
    }
}
