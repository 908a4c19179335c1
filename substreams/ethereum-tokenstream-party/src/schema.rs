//! Entity definitions materialized by the indexer.
//!
//! Entities are never deleted, and only a [`StreamActivity`] keyed by transaction hash is ever
//! overwritten (by a later log of the same transaction). Relationships are plain string keys:
//! `Stream::organization` and `StreamActivity::organization` point at an [`Organization`] id,
//! `StreamActivity::stream` at a [`Stream`] id and `StreamActivity::user` at a [`User`] id.

use std::fmt;

use substreams::scalar::BigInt;

use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Organization,
    User,
    Stream,
    StreamActivity,
}

impl EntityKind {
    /// Entity name as it appears in the GraphQL schema and in entity changes.
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Organization => "Organization",
            EntityKind::User => "User",
            EntityKind::Stream => "Stream",
            EntityKind::StreamActivity => "StreamActivity",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Organization {
    pub id: String,
    pub created_at: u64,
    pub owner: Vec<u8>,
    pub name: String,
}

/// An address that was given a stream, whichever organization it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub user: Vec<u8>,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub id: String,
    pub organization: String,
    pub user: Option<Vec<u8>>,
    pub creator: Option<Vec<u8>>,
    /// Address of the stream's own contract, only when streams are deployed separately.
    pub contract: Option<Vec<u8>>,
    pub name: Option<String>,
    pub created_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    Withdraw,
    Deposit,
}

impl ActivityKind {
    /// Value of the `eventType` field read by the activity feed.
    pub fn event_type(&self) -> &'static str {
        match self {
            ActivityKind::Withdraw => "StreamWithdrawEvent",
            ActivityKind::Deposit => "StreamDepositEvent",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StreamActivity {
    pub id: String,
    pub kind: ActivityKind,
    pub amount: BigInt,
    pub organization: String,
    pub stream: Option<String>,
    /// Recipient of a withdraw, or the user of the stream a deposit went to.
    pub user: Option<String>,
    pub actor: Vec<u8>,
    pub info: String,
    pub tx_hash: Vec<u8>,
    pub log_index: u32,
    pub block_number: u64,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Organization(Organization),
    User(User),
    Stream(Stream),
    StreamActivity(StreamActivity),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Organization(_) => EntityKind::Organization,
            Entity::User(_) => EntityKind::User,
            Entity::Stream(_) => EntityKind::Stream,
            Entity::StreamActivity(_) => EntityKind::StreamActivity,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Entity::Organization(org) => &org.id,
            Entity::User(user) => &user.id,
            Entity::Stream(stream) => &stream.id,
            Entity::StreamActivity(activity) => &activity.id,
        }
    }
}

/// Typed view over [`Entity`] used by the `load_typed` / `save_typed` store helpers.
pub trait StoredEntity: Sized {
    const KIND: EntityKind;

    fn into_entity(self) -> Entity;

    fn from_entity(entity: Entity) -> StoreResult<Self>;
}

macro_rules! stored_entity {
    ($ty:ident) => {
        impl StoredEntity for $ty {
            const KIND: EntityKind = EntityKind::$ty;

            fn into_entity(self) -> Entity {
                Entity::$ty(self)
            }

            fn from_entity(entity: Entity) -> StoreResult<Self> {
                match entity {
                    Entity::$ty(inner) => Ok(inner),
                    other => Err(StoreError::KindMismatch {
                        kind: Self::KIND,
                        id: other.id().to_string(),
                    }),
                }
            }
        }
    };
}

stored_entity!(Organization);
stored_entity!(User);
stored_entity!(Stream);
stored_entity!(StreamActivity);
