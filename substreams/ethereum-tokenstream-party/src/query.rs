//! Read side of the entity store, shaped after the feed the front end renders.

use std::cmp::Ordering;

use itertools::Itertools;
use substreams::scalar::BigInt;

use crate::{
    error::StoreResult,
    schema::{ActivityKind, Entity, EntityKind, Organization, Stream, StreamActivity},
    store::{EntityScan, EntityStore},
};

/// An organization with aggregates derived from its streams and activities.
#[derive(Debug, Clone, PartialEq)]
pub struct OrganizationView {
    pub organization: Organization,
    pub stream_count: usize,
    pub total_withdrawn: BigInt,
    pub total_deposited: BigInt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityFilter {
    pub organization: Option<String>,
    pub stream: Option<String>,
    /// Maximum number of results, applied after ordering.
    pub first: Option<usize>,
}

impl ActivityFilter {
    pub fn for_organization(organization: &str) -> Self {
        Self { organization: Some(organization.to_string()), ..Default::default() }
    }

    pub fn for_stream(stream: &str) -> Self {
        Self { stream: Some(stream.to_string()), ..Default::default() }
    }

    pub fn first(mut self, first: usize) -> Self {
        self.first = Some(first);
        self
    }

    fn matches(&self, activity: &StreamActivity) -> bool {
        let organization = self
            .organization
            .as_ref()
            .map_or(true, |id| &activity.organization == id);
        let stream = self
            .stream
            .as_ref()
            .map_or(true, |id| activity.stream.as_ref() == Some(id));
        organization && stream
    }
}

pub fn organization<S>(store: &S, id: &str) -> StoreResult<Option<OrganizationView>>
where
    S: EntityStore + EntityScan,
{
    let Some(organization) = store.load_typed::<Organization>(id)? else {
        return Ok(None);
    };

    let stream_count = streams(store, id)?.len();
    let mut total_withdrawn = BigInt::zero();
    let mut total_deposited = BigInt::zero();
    for activity in activities(store, &ActivityFilter::for_organization(id), OrderDirection::Asc)? {
        match activity.kind {
            ActivityKind::Withdraw => total_withdrawn = total_withdrawn + activity.amount,
            ActivityKind::Deposit => total_deposited = total_deposited + activity.amount,
        }
    }

    Ok(Some(OrganizationView { organization, stream_count, total_withdrawn, total_deposited }))
}

/// All organizations, oldest first.
pub fn organizations<S: EntityScan>(store: &S) -> StoreResult<Vec<Organization>> {
    Ok(store
        .scan(EntityKind::Organization)?
        .into_iter()
        .filter_map(|entity| match entity {
            Entity::Organization(org) => Some(org),
            _ => None,
        })
        .sorted_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
        .collect())
}

/// Streams of an organization, oldest first.
pub fn streams<S: EntityScan>(store: &S, organization: &str) -> StoreResult<Vec<Stream>> {
    Ok(store
        .scan(EntityKind::Stream)?
        .into_iter()
        .filter_map(|entity| match entity {
            Entity::Stream(stream) if stream.organization == organization => Some(stream),
            _ => None,
        })
        .sorted_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
        .collect())
}

pub fn activities<S: EntityScan>(
    store: &S,
    filter: &ActivityFilter,
    direction: OrderDirection,
) -> StoreResult<Vec<StreamActivity>> {
    let sorted = store
        .scan(EntityKind::StreamActivity)?
        .into_iter()
        .filter_map(|entity| match entity {
            Entity::StreamActivity(activity) if filter.matches(&activity) => Some(activity),
            _ => None,
        })
        .sorted_by(|a, b| match direction {
            OrderDirection::Asc => chain_order(a, b),
            OrderDirection::Desc => chain_order(b, a),
        });

    Ok(match filter.first {
        Some(first) => sorted.take(first).collect(),
        None => sorted.collect(),
    })
}

/// Timestamps tie within a block, so the log position breaks ties.
fn chain_order(a: &StreamActivity, b: &StreamActivity) -> Ordering {
    (a.created_at, a.block_number, a.log_index, &a.id).cmp(&(
        b.created_at,
        b.block_number,
        b.log_index,
        &b.id,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn org(id: &str, created_at: u64) -> Organization {
        Organization { id: id.to_string(), created_at, owner: vec![1; 20], name: id.to_string() }
    }

    fn stream(id: &str, organization: &str, created_at: u64) -> Stream {
        Stream {
            id: id.to_string(),
            organization: organization.to_string(),
            user: None,
            creator: None,
            contract: None,
            name: Some(id.to_string()),
            created_at,
        }
    }

    fn activity(
        id: &str,
        organization: &str,
        stream: &str,
        kind: ActivityKind,
        amount: i64,
        block_number: u64,
        log_index: u32,
    ) -> StreamActivity {
        StreamActivity {
            id: id.to_string(),
            kind,
            amount: BigInt::from(amount),
            organization: organization.to_string(),
            stream: Some(stream.to_string()),
            user: None,
            actor: vec![2; 20],
            info: String::new(),
            tx_hash: vec![3; 32],
            log_index,
            block_number,
            created_at: block_number * 12,
        }
    }

    fn populated() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.save_typed(org("0xorg", 10)).unwrap();
        store.save_typed(org("0xother", 11)).unwrap();
        store.save_typed(stream("b", "0xorg", 20)).unwrap();
        store.save_typed(stream("a", "0xorg", 20)).unwrap();
        store.save_typed(stream("c", "0xorg", 5)).unwrap();
        store.save_typed(stream("z", "0xother", 5)).unwrap();
        store
            .save_typed(activity("t1", "0xorg", "a", ActivityKind::Deposit, 1000, 3, 0))
            .unwrap();
        store
            .save_typed(activity("t2", "0xorg", "a", ActivityKind::Withdraw, 40, 4, 1))
            .unwrap();
        store
            .save_typed(activity("t3", "0xorg", "b", ActivityKind::Withdraw, 2, 4, 0))
            .unwrap();
        store
            .save_typed(activity("t4", "0xother", "z", ActivityKind::Deposit, 7, 5, 0))
            .unwrap();
        store
    }

    #[test]
    fn test_organization_aggregates() {
        let store = populated();

        let view = organization(&store, "0xorg").unwrap().unwrap();
        assert_eq!(view.stream_count, 3);
        assert_eq!(view.total_deposited, BigInt::from(1000));
        assert_eq!(view.total_withdrawn, BigInt::from(42));
        assert!(organization(&store, "0xmissing").unwrap().is_none());
    }

    #[test]
    fn test_streams_oldest_first() {
        let store = populated();

        let ids: Vec<_> = streams(&store, "0xorg")
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_activities_strictly_descending() {
        let store = populated();

        let feed =
            activities(&store, &ActivityFilter::for_organization("0xorg"), OrderDirection::Desc)
                .unwrap();
        let ids: Vec<_> = feed.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t3", "t1"]);
        assert!(feed
            .windows(2)
            .all(|pair| chain_order(&pair[0], &pair[1]) == Ordering::Greater));
    }

    #[test]
    fn test_activities_by_stream_with_first() {
        let store = populated();

        let feed = activities(&store, &ActivityFilter::for_stream("a").first(1), Default::default())
            .unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, "t2");

        let all = activities(&store, &ActivityFilter::default(), OrderDirection::Asc).unwrap();
        assert_eq!(all.first().map(|a| a.id.as_str()), Some("t1"));
        assert_eq!(all.len(), 4);
    }

    #[test]
    fn test_organizations_oldest_first() {
        let store = populated();

        let ids: Vec<_> = organizations(&store)
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec!["0xorg", "0xother"]);
    }
}
