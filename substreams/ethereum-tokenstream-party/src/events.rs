use substreams::scalar::BigInt;
use substreams_ethereum::{pb::eth::v2::Log, Event};

use crate::{
    abi::{multi_stream, named_streams, simple_stream, stream_deployer},
    identity::StreamRef,
    registry::ContractKind,
};

/// Position of a log on chain. Events must reach the handlers in ascending position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventPosition {
    pub block_number: u64,
    pub tx_index: u32,
    pub log_index: u32,
}

/// Delivery context attached to every decoded event.
#[derive(Debug, Clone, PartialEq)]
pub struct EventMeta {
    /// Address of the emitting contract.
    pub contract: Vec<u8>,
    pub tx_hash: Vec<u8>,
    pub tx_index: u32,
    /// Index of the log within the block.
    pub log_index: u32,
    pub block_number: u64,
    pub block_timestamp: u64,
}

impl EventMeta {
    pub fn position(&self) -> EventPosition {
        EventPosition {
            block_number: self.block_number,
            tx_index: self.tx_index,
            log_index: self.log_index,
        }
    }
}

/// Contract events flattened into one shape shared by every schema generation.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    OrganizationDeployed { organization: Vec<u8>, owner: Vec<u8>, name: String },
    StreamAdded(StreamAdded),
    Withdraw(Transfer),
    Deposit(Transfer),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamAdded {
    pub user: Option<Vec<u8>>,
    pub creator: Option<Vec<u8>>,
    pub stream: Option<Vec<u8>>,
    pub name: Option<String>,
}

/// A withdraw or deposit. `counterparty` is the recipient of a withdraw or the sender of a
/// deposit. Every generation's activity events identify their stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub counterparty: Vec<u8>,
    pub amount: BigInt,
    pub reason: String,
    pub stream: StreamRef,
}

impl StreamEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::OrganizationDeployed { .. } => "OrganizationDeployed",
            StreamEvent::StreamAdded(_) => "StreamAdded",
            StreamEvent::Withdraw(_) => "Withdraw",
            StreamEvent::Deposit(_) => "Deposit",
        }
    }
}

/// Decodes `log` with the ABI of the contract kind it was emitted by.
///
/// Returns `None` for events this indexer does not handle.
pub fn decode_log(kind: ContractKind, log: &Log) -> Option<StreamEvent> {
    match kind {
        ContractKind::StreamDeployer => decode_deployer(log),
        ContractKind::MultiStream => decode_multi_stream(log),
        ContractKind::SimpleStream => decode_simple_stream(log),
        ContractKind::NamedStreams => decode_named_streams(log),
    }
}

fn decode_deployer(log: &Log) -> Option<StreamEvent> {
    if let Some(event) = stream_deployer::events::OrganizationDeployed::match_and_decode(log) {
        return Some(StreamEvent::OrganizationDeployed {
            organization: event.org_address,
            owner: event.owner_address,
            name: event.organization_name,
        });
    }
    stream_deployer::events::OrganizationsDeployed::match_and_decode(log).map(|event| {
        StreamEvent::OrganizationDeployed {
            organization: event.token_address,
            owner: event.owner_address,
            name: event.organization_name,
        }
    })
}

fn decode_multi_stream(log: &Log) -> Option<StreamEvent> {
    if let Some(event) = multi_stream::events::StreamAdded::match_and_decode(log) {
        return Some(StreamEvent::StreamAdded(StreamAdded {
            user: Some(event.user),
            creator: Some(event.creator),
            stream: Some(event.stream),
            name: None,
        }));
    }
    if let Some(event) = multi_stream::events::Withdraw::match_and_decode(log) {
        return Some(StreamEvent::Withdraw(Transfer {
            stream: StreamRef::User(event.to.clone()),
            counterparty: event.to,
            amount: event.amount,
            reason: event.reason,
        }));
    }
    multi_stream::events::Deposit::match_and_decode(log).map(|event| {
        StreamEvent::Deposit(Transfer {
            counterparty: event.from,
            amount: event.amount,
            reason: event.reason,
            stream: StreamRef::User(event.stream),
        })
    })
}

fn decode_simple_stream(log: &Log) -> Option<StreamEvent> {
    let stream = StreamRef::Contract(log.address.clone());
    if let Some(event) = simple_stream::events::Withdraw::match_and_decode(log) {
        return Some(StreamEvent::Withdraw(Transfer {
            counterparty: event.to,
            amount: event.amount,
            reason: event.reason,
            stream,
        }));
    }
    simple_stream::events::Deposit::match_and_decode(log).map(|event| {
        StreamEvent::Deposit(Transfer {
            counterparty: event.from,
            amount: event.amount,
            reason: event.reason,
            stream,
        })
    })
}

fn decode_named_streams(log: &Log) -> Option<StreamEvent> {
    if let Some(event) = named_streams::events::StreamAdded::match_and_decode(log) {
        return Some(StreamEvent::StreamAdded(StreamAdded {
            name: Some(event.name),
            ..Default::default()
        }));
    }
    if let Some(event) = named_streams::events::Withdraw::match_and_decode(log) {
        return Some(StreamEvent::Withdraw(Transfer {
            counterparty: event.to,
            amount: event.amount,
            reason: event.reason,
            stream: StreamRef::Name(event.name),
        }));
    }
    named_streams::events::Deposit::match_and_decode(log).map(|event| {
        StreamEvent::Deposit(Transfer {
            counterparty: event.from,
            amount: event.amount,
            reason: event.reason,
            stream: StreamRef::Name(event.name),
        })
    })
}
