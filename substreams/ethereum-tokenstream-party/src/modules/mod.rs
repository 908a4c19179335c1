//! Substreams modules. The same projection as [`crate::Indexer`], with substreams stores in
//! place of the entity store and the registry:
//!
//! 1. `map_organizations` decodes factory deployments.
//! 2. `store_organizations` keeps the first deployment of each organization.
//! 3. `map_streams` decodes `StreamAdded` from known organizations.
//! 4. `store_streams` / `store_users` keep the first stream per key and the first stream per user.
//! 5. `map_activities` resolves withdraws and deposits against known streams.
//! 6. `graph_out` emits the entities created in the block.

use substreams::{scalar::BigInt, store::StoreGet};

use crate::{
    identity::{organization_key, to_key},
    pb::tokenstream::v1 as pb,
    schema::{ActivityKind, Organization, Stream, StreamActivity, User},
};

pub use graph_out::graph_out;
pub use map_activities::map_activities;
pub use map_organizations::map_organizations;
pub use map_streams::map_streams;
pub use store_organizations::store_organizations;
pub use store_streams::store_streams;
pub use store_users::store_users;

#[path = "1_map_organizations.rs"]
mod map_organizations;

#[path = "2_store_organizations.rs"]
mod store_organizations;

#[path = "3_map_streams.rs"]
mod map_streams;

#[path = "4_store_streams.rs"]
mod store_streams;

#[path = "4_store_users.rs"]
mod store_users;

#[path = "5_map_activities.rs"]
mod map_activities;

#[path = "6_graph_out.rs"]
mod graph_out;

pub(crate) fn organization_store_key(address: &[u8]) -> String {
    format!("org:{}", organization_key(address))
}

pub(crate) fn stream_store_key(id: &str) -> String {
    format!("stream:{id}")
}

pub(crate) fn user_store_key(address: &[u8]) -> String {
    format!("user:{}", to_key(address))
}

/// What the activity module needs to know about earlier logs, as of a log ordinal.
pub(crate) trait KnownSources {
    fn is_organization(&self, ordinal: u64, address: &[u8]) -> bool;

    fn stream(&self, ordinal: u64, id: &str) -> Option<pb::Stream>;
}

pub(crate) struct StoreSources<'a, O, S> {
    pub organizations: &'a O,
    pub streams: &'a S,
}

impl<O, S> KnownSources for StoreSources<'_, O, S>
where
    O: StoreGet<pb::Organization>,
    S: StoreGet<pb::Stream>,
{
    fn is_organization(&self, ordinal: u64, address: &[u8]) -> bool {
        self.organizations
            .has_at(ordinal, organization_store_key(address))
    }

    fn stream(&self, ordinal: u64, id: &str) -> Option<pb::Stream> {
        self.streams
            .get_at(ordinal, stream_store_key(id))
    }
}

impl From<&pb::Organization> for Organization {
    fn from(value: &pb::Organization) -> Self {
        Self {
            id: organization_key(&value.address),
            created_at: value.created_at,
            owner: value.owner.clone(),
            name: value.name.clone(),
        }
    }
}

impl From<&pb::Stream> for Stream {
    fn from(value: &pb::Stream) -> Self {
        Self {
            id: value.id.clone(),
            organization: value.organization.clone(),
            user: value.user.clone(),
            creator: value.creator.clone(),
            contract: value.contract.clone(),
            name: value.name.clone(),
            created_at: value.created_at,
        }
    }
}

impl From<&pb::User> for User {
    fn from(value: &pb::User) -> Self {
        Self { id: to_key(&value.address), user: value.address.clone(), created_at: value.created_at }
    }
}

impl From<&pb::Activity> for StreamActivity {
    fn from(value: &pb::Activity) -> Self {
        let kind = match value.kind() {
            pb::ActivityKind::Withdraw => ActivityKind::Withdraw,
            pb::ActivityKind::Deposit => ActivityKind::Deposit,
        };
        Self {
            id: value.id.clone(),
            kind,
            amount: BigInt::from_signed_bytes_be(&value.amount),
            organization: value.organization.clone(),
            stream: Some(value.stream.clone()),
            user: value.user.clone(),
            actor: value.actor.clone(),
            info: value.info.clone(),
            tx_hash: value.tx_hash.clone(),
            log_index: value.log_index,
            block_number: value.block_number,
            created_at: value.created_at,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use ethabi::Token;

    use super::*;
    use crate::{
        identity::{ActivityKeyScheme, SchemaGeneration, SchemaPolicy},
        registry::DynamicSourceRegistry,
        schema::Entity,
        store::MemoryStore,
        testing::{address_token, log, BlockBuilder},
        Indexer,
    };

    /// In-memory stand-in for the module stores, honouring the ordinal each value was set at.
    #[derive(Default)]
    pub(crate) struct MemorySources {
        pub organizations: Vec<pb::Organization>,
        pub streams: Vec<pb::Stream>,
    }

    impl KnownSources for MemorySources {
        fn is_organization(&self, ordinal: u64, address: &[u8]) -> bool {
            self.organizations
                .iter()
                .any(|org| org.address == address && org.ordinal <= ordinal)
        }

        fn stream(&self, ordinal: u64, id: &str) -> Option<pb::Stream> {
            self.streams
                .iter()
                .find(|stream| stream.id == id && stream.ordinal <= ordinal)
                .cloned()
        }
    }

    #[test]
    fn test_modules_write_what_the_indexer_writes() {
        let factory = [0xfa; 20];
        let org = [0x01; 20];
        let user = [0x0c; 20];
        let policy = SchemaPolicy::new(SchemaGeneration::UserStreams, ActivityKeyScheme::TransactionLog);
        let block = BlockBuilder::new(100, 1_700_000_000)
            .transaction(
                &[0xa1; 32],
                vec![
                    log(
                        &factory,
                        "OrganizationDeployed(address,address,string)",
                        &[address_token(&org), address_token(&[0x0b; 20]), Token::String("Acme".into())],
                    ),
                    log(
                        &org,
                        "StreamAdded(address,address,address)",
                        &[address_token(&user), address_token(&[0x0b; 20]), address_token(&[0u8; 20])],
                    ),
                ],
            )
            .transaction(
                &[0xa2; 32],
                vec![log(
                    &org,
                    "Withdraw(address,uint256,string)",
                    &[address_token(&user), Token::Uint(40u64.into()), Token::String("rent".into())],
                )],
            )
            .build();

        let organizations = map_organizations::organizations_deployed(&block, &[factory.to_vec()]);
        let streams = map_streams::streams_added(&block, &policy, |ordinal, address| {
            organizations
                .iter()
                .any(|org| org.address == address && org.ordinal <= ordinal)
        });
        let users = streams
            .iter()
            .filter_map(|stream| {
                Some(pb::User {
                    address: stream.user.clone()?,
                    created_at: stream.created_at,
                    ordinal: stream.ordinal,
                })
            })
            .collect::<Vec<_>>();
        let sources = MemorySources { organizations: organizations.clone(), streams: streams.clone() };
        let activities = map_activities::block_activities(&block, &policy, &sources);

        let mut from_modules = Vec::new();
        from_modules.extend(organizations.iter().map(|org| Entity::Organization(org.into())));
        from_modules.extend(users.iter().map(|user| Entity::User(user.into())));
        from_modules.extend(streams.iter().map(|stream| Entity::Stream(stream.into())));
        from_modules.extend(activities.iter().map(|activity| Entity::StreamActivity(activity.into())));

        let mut indexer = Indexer::new(
            MemoryStore::new(),
            DynamicSourceRegistry::with_factories([factory.to_vec()]),
            policy,
        );
        let summary = indexer.process_block(&block).unwrap();

        assert_eq!(from_modules, summary.writes);
    }

    #[test]
    fn test_store_keys() {
        assert_eq!(organization_store_key(&[0xab; 20]), format!("org:0x{}", "ab".repeat(20)));
        assert_eq!(stream_store_key("0x01"), "stream:0x01");
        assert_eq!(user_store_key(&[0x0c; 20]), format!("user:0x{}", "0c".repeat(20)));
    }

    #[test]
    fn test_activity_from_pb() {
        let activity = pb::Activity {
            id: "0xtx-1".to_string(),
            kind: pb::ActivityKind::Deposit as i32,
            amount: BigInt::from(-5).to_signed_bytes_be(),
            organization: "0xorg".to_string(),
            stream: "0xstream".to_string(),
            user: Some("0xuser".to_string()),
            actor: vec![1; 20],
            info: "refund".to_string(),
            tx_hash: vec![2; 32],
            log_index: 1,
            block_number: 10,
            created_at: 120,
        };

        let converted = StreamActivity::from(&activity);
        assert_eq!(converted.kind, ActivityKind::Deposit);
        assert_eq!(converted.amount, BigInt::from(-5));
        assert_eq!(converted.stream.as_deref(), Some("0xstream"));
        assert_eq!(converted.user.as_deref(), Some("0xuser"));
    }
}
