use substreams::pb::substreams::{store_delta::Operation, StoreDeltas};
use substreams_entity_change::pb::entity::EntityChanges;

use crate::{
    entity_changes::entity_changes,
    pb::tokenstream::v1::{self as pb, Activities},
    schema::Entity,
};

/// Entity changes of the block: entities first stored in this block, then its activities.
#[substreams::handlers::map]
pub fn graph_out(
    organizations: StoreDeltas,
    users: StoreDeltas,
    streams: StoreDeltas,
    activities: Activities,
) -> Result<EntityChanges, substreams::errors::Error> {
    Ok(entity_changes(&block_entities(&organizations, &users, &streams, &activities)?))
}

pub(crate) fn block_entities(
    organizations: &StoreDeltas,
    users: &StoreDeltas,
    streams: &StoreDeltas,
    activities: &Activities,
) -> Result<Vec<Entity>, substreams::errors::Error> {
    let mut writes = Vec::new();
    writes.extend(
        created::<pb::Organization>(organizations)?
            .iter()
            .map(|org| Entity::Organization(org.into())),
    );
    writes.extend(
        created::<pb::User>(users)?
            .iter()
            .map(|user| Entity::User(user.into())),
    );
    writes.extend(
        created::<pb::Stream>(streams)?
            .iter()
            .map(|stream| Entity::Stream(stream.into())),
    );
    writes.extend(
        activities
            .activities
            .iter()
            .map(|activity| Entity::StreamActivity(activity.into())),
    );
    Ok(writes)
}

/// Values of the keys created in this block, in ordinal order.
fn created<T: Default + prost::Message>(deltas: &StoreDeltas) -> Result<Vec<T>, substreams::errors::Error> {
    let mut created = deltas
        .deltas
        .iter()
        .filter(|delta| delta.operation == Operation::Create as i32)
        .collect::<Vec<_>>();
    created.sort_by_key(|delta| delta.ordinal);

    created
        .into_iter()
        .map(|delta| Ok(substreams::proto::decode::<T>(&delta.new_value)?))
        .collect()
}

#[cfg(test)]
mod tests {
    use substreams::pb::substreams::StoreDelta;

    use super::*;
    use crate::schema::EntityKind;

    fn delta<T: prost::Message>(operation: Operation, ordinal: u64, key: &str, value: &T) -> StoreDelta {
        StoreDelta {
            operation: operation as i32,
            ordinal,
            key: key.to_string(),
            old_value: vec![],
            new_value: value.encode_to_vec(),
        }
    }

    #[test]
    fn test_only_created_keys_become_entities() {
        let acme = pb::Organization { address: vec![0x01; 20], name: "Acme".to_string(), ordinal: 3, ..Default::default() };
        let globex = pb::Organization { address: vec![0x02; 20], name: "Globex".to_string(), ordinal: 1, ..Default::default() };
        let organizations = StoreDeltas {
            deltas: vec![
                delta(Operation::Create, 3, "org:acme", &acme),
                delta(Operation::Update, 4, "org:acme", &acme),
                delta(Operation::Create, 1, "org:globex", &globex),
            ],
        };
        let users = StoreDeltas {
            deltas: vec![delta(
                Operation::Create,
                5,
                "user:0x0c",
                &pb::User { address: vec![0x0c; 20], created_at: 9, ordinal: 5 },
            )],
        };

        let writes = block_entities(&organizations, &users, &StoreDeltas::default(), &Activities::default()).unwrap();

        let kinds = writes.iter().map(Entity::kind).collect::<Vec<_>>();
        assert_eq!(kinds, vec![EntityKind::Organization, EntityKind::Organization, EntityKind::User]);
        assert_eq!(writes[0].id(), format!("0x{}", "02".repeat(20)));
        assert_eq!(writes[2].id(), format!("0x{}", "0c".repeat(20)));

        let changes = entity_changes(&writes);
        assert_eq!(changes.entity_changes.len(), 3);
    }

    #[test]
    fn test_undecodable_value_is_an_error() {
        let streams = StoreDeltas {
            deltas: vec![StoreDelta {
                operation: Operation::Create as i32,
                ordinal: 1,
                key: "stream:0x01".to_string(),
                old_value: vec![],
                new_value: vec![0xff, 0xff, 0xff],
            }],
        };

        assert!(block_entities(&StoreDeltas::default(), &StoreDeltas::default(), &streams, &Activities::default()).is_err());
    }
}
