use substreams::store::{StoreGet, StoreGetProto};
use substreams_ethereum::pb::eth::v2::Block;

use crate::{
    events::{decode_log, StreamEvent},
    identity::{organization_key, SchemaPolicy, StreamRef},
    indexer::block_timestamp,
    modules::organization_store_key,
    params::Params,
    pb::tokenstream::v1::{Organization, Stream, Streams},
};

/// Streams added to organizations known at the time of the `StreamAdded` log.
#[substreams::handlers::map]
pub fn map_streams(
    params: String,
    block: Block,
    organizations: StoreGetProto<Organization>,
) -> Result<Streams, substreams::errors::Error> {
    let policy = Params::parse(&params)?.policy();
    let streams = streams_added(&block, &policy, |ordinal, address| {
        organizations.has_at(ordinal, organization_store_key(address))
    });
    Ok(Streams { streams })
}

pub(crate) fn streams_added<F>(block: &Block, policy: &SchemaPolicy, is_organization: F) -> Vec<Stream>
where
    F: Fn(u64, &[u8]) -> bool,
{
    let created_at = block_timestamp(block);
    let mut streams = Vec::new();

    for view in block.logs() {
        let log = view.log;
        if !is_organization(log.ordinal, &log.address) {
            continue;
        }
        let Some(StreamEvent::StreamAdded(added)) = decode_log(policy.organization_source(), log)
        else {
            continue;
        };
        let Some(stream_ref) = policy.stream_ref(&added) else {
            continue;
        };
        let Some(id) = policy.stream_key(&log.address, &stream_ref) else {
            continue;
        };

        let contract = match stream_ref {
            StreamRef::Contract(address) => Some(address),
            _ => None,
        };
        streams.push(Stream {
            id,
            organization: organization_key(&log.address),
            user: added.user,
            creator: added.creator,
            contract,
            name: added.name,
            created_at,
            ordinal: log.ordinal,
        });
    }

    streams
}

#[cfg(test)]
mod tests {
    use ethabi::Token;

    use super::*;
    use crate::{
        identity::{named_stream_key, ActivityKeyScheme, SchemaGeneration},
        testing::{address_token, log, BlockBuilder},
    };

    const ORG: [u8; 20] = [0x01; 20];

    fn named_added(org: &[u8], name: &str) -> substreams_ethereum::pb::eth::v2::Log {
        log(org, "StreamAdded(string)", &[Token::String(name.to_string())])
    }

    #[test]
    fn test_streams_of_known_organizations() {
        let policy = SchemaPolicy::new(SchemaGeneration::NamedStreams, ActivityKeyScheme::TransactionLog);
        let block = BlockBuilder::new(100, 1_700_000_000)
            .transaction(&[0xa1; 32], vec![named_added(&ORG, "payroll")])
            .transaction(&[0xa2; 32], vec![named_added(&[0x02; 20], "payroll")])
            .build();

        let streams = streams_added(&block, &policy, |_, address| address == ORG);

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].id, named_stream_key(&ORG, "payroll"));
        assert_eq!(streams[0].organization, organization_key(&ORG));
        assert_eq!(streams[0].name.as_deref(), Some("payroll"));
        assert_eq!(streams[0].created_at, 1_700_000_000);
    }

    #[test]
    fn test_organization_must_precede_the_stream() {
        let policy = SchemaPolicy::new(SchemaGeneration::NamedStreams, ActivityKeyScheme::TransactionLog);
        let block = BlockBuilder::new(100, 1_700_000_000)
            .transaction(&[0xa1; 32], vec![named_added(&ORG, "early")])
            .transaction(&[0xa2; 32], vec![named_added(&ORG, "late")])
            .build();
        let deployed_at = block.transaction_traces[1].receipt.as_ref().unwrap().logs[0].ordinal;

        let streams = streams_added(&block, &policy, |ordinal, _| ordinal >= deployed_at);

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].name.as_deref(), Some("late"));
    }

    #[test]
    fn test_deployed_stream_keeps_its_contract() {
        let stream = [0x5a; 20];
        let policy = SchemaPolicy::new(SchemaGeneration::DeployedStreams, ActivityKeyScheme::TransactionLog);
        let block = BlockBuilder::new(1, 100)
            .transaction(
                &[0xa1; 32],
                vec![log(
                    &ORG,
                    "StreamAdded(address,address,address)",
                    &[address_token(&[0x0c; 20]), address_token(&[0x0b; 20]), address_token(&stream)],
                )],
            )
            .build();

        let streams = streams_added(&block, &policy, |_, _| true);

        assert_eq!(streams.len(), 1);
        assert_eq!(streams[0].contract, Some(stream.to_vec()));
        assert_eq!(streams[0].user, Some(vec![0x0c; 20]));
    }
}
