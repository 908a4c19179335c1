//! Graph output: entities written by a block as subgraph entity changes.

use substreams::scalar::BigInt;
use substreams_entity_change::{pb::entity::EntityChanges, tables::Tables as EntityChangesTables};

use crate::{
    identity::to_key,
    indexer::BlockSummary,
    schema::{Entity, Organization, Stream, StreamActivity, User},
};

pub fn entity_changes(writes: &[Entity]) -> EntityChanges {
    let mut tables = EntityChangesTables::new();
    for entity in writes {
        match entity {
            Entity::Organization(org) => organization_row(org, &mut tables),
            Entity::User(user) => user_row(user, &mut tables),
            Entity::Stream(stream) => stream_row(stream, &mut tables),
            Entity::StreamActivity(activity) => activity_row(activity, &mut tables),
        }
    }
    tables.to_entity_changes()
}

impl BlockSummary {
    pub fn entity_changes(&self) -> EntityChanges {
        entity_changes(&self.writes)
    }
}

fn organization_row(org: &Organization, tables: &mut EntityChangesTables) {
    tables
        .create_row("Organization", &org.id)
        .set("createdAt", BigInt::from(org.created_at))
        .set("owner", &org.owner)
        .set("orgName", &org.name);
}

fn user_row(user: &User, tables: &mut EntityChangesTables) {
    tables
        .create_row("User", &user.id)
        .set("user", &user.user)
        .set("createdAt", BigInt::from(user.created_at));
}

fn stream_row(stream: &Stream, tables: &mut EntityChangesTables) {
    let row = tables
        .create_row("Stream", &stream.id)
        .set("createdAt", BigInt::from(stream.created_at))
        .set("organization", &stream.organization);
    if let Some(user) = &stream.user {
        row.set("user", user);
    }
    if let Some(creator) = &stream.creator {
        row.set("creator", creator);
    }
    if let Some(contract) = &stream.contract {
        row.set("contract", contract);
    }
    if let Some(name) = &stream.name {
        row.set("name", name);
    }
}

fn activity_row(activity: &StreamActivity, tables: &mut EntityChangesTables) {
    let row = tables
        .create_row("StreamActivity", &activity.id)
        .set("eventType", activity.kind.event_type())
        .set("amount", &activity.amount)
        .set("organization", &activity.organization)
        .set("actor", &activity.actor)
        .set("info", &activity.info)
        .set("txHash", to_key(&activity.tx_hash))
        .set("blockNumber", BigInt::from(activity.block_number))
        .set("createdAt", BigInt::from(activity.created_at));
    if let Some(stream) = &activity.stream {
        row.set("stream", stream);
    }
    if let Some(user) = &activity.user {
        row.set("user", user);
    }
}

#[cfg(test)]
mod tests {
    use substreams_entity_change::pb::entity::entity_change::Operation;

    use super::*;
    use crate::schema::ActivityKind;

    fn writes() -> Vec<Entity> {
        vec![
            Entity::Organization(Organization {
                id: "0xorg".to_string(),
                created_at: 100,
                owner: vec![1; 20],
                name: "Acme".to_string(),
            }),
            Entity::User(User { id: "0xuser".to_string(), user: vec![4; 20], created_at: 112 }),
            Entity::Stream(Stream {
                id: "0xorg0xname".to_string(),
                organization: "0xorg".to_string(),
                user: None,
                creator: None,
                contract: None,
                name: Some("payroll".to_string()),
                created_at: 112,
            }),
            Entity::StreamActivity(StreamActivity {
                id: "0xtx-0".to_string(),
                kind: ActivityKind::Deposit,
                amount: BigInt::from(1000),
                organization: "0xorg".to_string(),
                stream: Some("0xorg0xname".to_string()),
                user: Some("0xuser".to_string()),
                actor: vec![2; 20],
                info: "Q1 funding".to_string(),
                tx_hash: vec![3; 32],
                log_index: 0,
                block_number: 10,
                created_at: 124,
            }),
        ]
    }

    #[test]
    fn test_one_create_per_entity() {
        let changes = entity_changes(&writes());

        assert_eq!(changes.entity_changes.len(), 4);
        assert!(changes
            .entity_changes
            .iter()
            .all(|change| change.operation == Operation::Create as i32));

        let mut ids: Vec<_> = changes
            .entity_changes
            .iter()
            .map(|change| (change.entity.as_str(), change.id.as_str()))
            .collect();
        ids.sort();
        assert_eq!(
            ids,
            vec![
                ("Organization", "0xorg"),
                ("Stream", "0xorg0xname"),
                ("StreamActivity", "0xtx-0"),
                ("User", "0xuser"),
            ]
        );
    }

    #[test]
    fn test_activity_fields() {
        let changes = entity_changes(&writes());
        let activity = changes
            .entity_changes
            .iter()
            .find(|change| change.entity == "StreamActivity")
            .unwrap();

        let mut names: Vec<_> = activity
            .fields
            .iter()
            .map(|field| field.name.as_str())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "actor",
                "amount",
                "blockNumber",
                "createdAt",
                "eventType",
                "info",
                "organization",
                "stream",
                "txHash",
                "user",
            ]
        );
    }

    #[test]
    fn test_unset_stream_fields_are_omitted() {
        let changes = entity_changes(&writes());
        let stream = changes
            .entity_changes
            .iter()
            .find(|change| change.entity == "Stream")
            .unwrap();

        assert!(stream.fields.iter().all(|field| field.name != "user"));
        assert!(stream.fields.iter().any(|field| field.name == "name"));
    }
}
