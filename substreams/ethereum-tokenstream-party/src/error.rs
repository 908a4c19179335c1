use thiserror::Error;

use crate::schema::EntityKind;

/// Failures of the backing entity store. These are fatal for the block being indexed.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{kind} `{id}` has an unexpected shape")]
    KindMismatch { kind: EntityKind, id: String },
}

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("block {0} has no header")]
    MissingHeader(u64),

    #[error("transaction {0} has no receipt")]
    MissingReceipt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
