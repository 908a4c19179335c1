use std::collections::HashMap;

use substreams::store::{StoreGet, StoreGetProto};
use substreams_ethereum::pb::eth::v2::Block;

use crate::{
    events::{decode_log, StreamEvent},
    identity::{contract_stream_key, to_key, SchemaPolicy},
    indexer::block_timestamp,
    modules::{KnownSources, StoreSources},
    params::Params,
    pb::tokenstream::v1::{Activities, Activity, ActivityKind, Organization, Stream},
    registry::ContractKind,
};

/// Withdraws and deposits of streams known at the time of the log.
#[substreams::handlers::map]
pub fn map_activities(
    params: String,
    block: Block,
    organizations: StoreGetProto<Organization>,
    streams: StoreGetProto<Stream>,
) -> Result<Activities, substreams::errors::Error> {
    let policy = Params::parse(&params)?.policy();
    let sources = StoreSources { organizations: &organizations, streams: &streams };
    Ok(Activities { activities: block_activities(&block, &policy, &sources) })
}

pub(crate) fn block_activities<K: KnownSources>(
    block: &Block,
    policy: &SchemaPolicy,
    sources: &K,
) -> Vec<Activity> {
    let created_at = block_timestamp(block);
    let mut activities: Vec<Activity> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for view in block.logs() {
        let log = view.log;
        let source = if sources.is_organization(log.ordinal, &log.address) {
            policy.organization_source()
        } else if policy.stream_source().is_some() &&
            sources
                .stream(log.ordinal, &contract_stream_key(&log.address))
                .is_some()
        {
            ContractKind::SimpleStream
        } else {
            continue;
        };

        let (kind, transfer) = match decode_log(source, log) {
            Some(StreamEvent::Withdraw(transfer)) => (ActivityKind::Withdraw, transfer),
            Some(StreamEvent::Deposit(transfer)) => (ActivityKind::Deposit, transfer),
            _ => continue,
        };
        let Some(key) = policy.stream_key(&log.address, &transfer.stream) else {
            continue;
        };
        let Some(stream) = sources.stream(log.ordinal, &key) else {
            continue;
        };

        let user = match kind {
            ActivityKind::Withdraw => Some(to_key(&transfer.counterparty)),
            ActivityKind::Deposit => stream.user.as_deref().map(to_key),
        };
        let activity = Activity {
            id: policy.activity_key(&view.receipt.transaction.hash, log.block_index),
            kind: kind as i32,
            amount: transfer.amount.to_signed_bytes_be(),
            organization: stream.organization,
            stream: stream.id,
            user,
            actor: transfer.counterparty,
            info: transfer.reason,
            tx_hash: view.receipt.transaction.hash.clone(),
            log_index: log.block_index,
            block_number: block.number,
            created_at,
        };

        match by_id.get(&activity.id) {
            Some(&idx) => {
                if policy
                    .activity_keys
                    .replaces(activities[idx].log_index, activity.log_index)
                {
                    activities[idx] = activity;
                }
            }
            None => {
                by_id.insert(activity.id.clone(), activities.len());
                activities.push(activity);
            }
        }
    }

    activities
}
