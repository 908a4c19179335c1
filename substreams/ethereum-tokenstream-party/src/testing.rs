//! Builders for logs and blocks used across unit tests.

use ethabi::{Address, Token};
use substreams_ethereum::pb::eth::v2::{
    Block, BlockHeader, Log, TransactionReceipt, TransactionTrace, TransactionTraceStatus,
};

use crate::identity::keccak256;

pub fn address_token(address: &[u8]) -> Token {
    Token::Address(Address::from_slice(address))
}

/// A log with `signature`'s topic and `params` ABI-encoded as non-indexed data.
pub fn log(address: &[u8], signature: &str, params: &[Token]) -> Log {
    Log {
        address: address.to_vec(),
        topics: vec![keccak256(signature.as_bytes()).to_vec()],
        data: ethabi::encode(params),
        ..Default::default()
    }
}

/// Builds a block of successful transactions, one per entry, each holding the given logs.
pub struct BlockBuilder {
    number: u64,
    timestamp: i64,
    transactions: Vec<TransactionTrace>,
    next_log_index: u32,
}

impl BlockBuilder {
    pub fn new(number: u64, timestamp: i64) -> Self {
        Self { number, timestamp, transactions: vec![], next_log_index: 0 }
    }

    pub fn transaction(mut self, hash: &[u8], logs: Vec<Log>) -> Self {
        self.push(hash, logs, TransactionTraceStatus::Succeeded);
        self
    }

    pub fn reverted_transaction(mut self, hash: &[u8], logs: Vec<Log>) -> Self {
        self.push(hash, logs, TransactionTraceStatus::Reverted);
        self
    }

    fn push(&mut self, hash: &[u8], logs: Vec<Log>, status: TransactionTraceStatus) {
        let mut logs = logs;
        for (idx, log) in logs.iter_mut().enumerate() {
            log.index = idx as u32;
            log.block_index = self.next_log_index;
            log.ordinal = u64::from(self.next_log_index);
            self.next_log_index += 1;
        }
        let index = self.transactions.len() as u32;
        self.transactions.push(TransactionTrace {
            hash: hash.to_vec(),
            index,
            status: status as i32,
            receipt: Some(TransactionReceipt { logs, ..Default::default() }),
            ..Default::default()
        });
    }

    pub fn build(self) -> Block {
        Block {
            number: self.number,
            header: Some(BlockHeader {
                number: self.number,
                timestamp: Some(prost_types::Timestamp { seconds: self.timestamp, nanos: 0 }),
                ..Default::default()
            }),
            transaction_traces: self.transactions,
            ..Default::default()
        }
    }
}
