use substreams_ethereum::pb::eth::v2::Block;

use crate::{
    events::{decode_log, StreamEvent},
    indexer::block_timestamp,
    params::Params,
    pb::tokenstream::v1::{Organization, Organizations},
    registry::ContractKind,
};

/// Organizations deployed by the configured factories in this block.
#[substreams::handlers::map]
pub fn map_organizations(
    params: String,
    block: Block,
) -> Result<Organizations, substreams::errors::Error> {
    let params = Params::parse(&params)?;
    Ok(Organizations { organizations: organizations_deployed(&block, &params.factories) })
}

pub(crate) fn organizations_deployed(block: &Block, factories: &[Vec<u8>]) -> Vec<Organization> {
    let created_at = block_timestamp(block);
    block
        .logs()
        .filter(|view| factories.contains(&view.log.address))
        .filter_map(|view| match decode_log(ContractKind::StreamDeployer, view.log)? {
            StreamEvent::OrganizationDeployed { organization, owner, name } => Some(Organization {
                address: organization,
                owner,
                name,
                created_at,
                ordinal: view.log.ordinal,
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use ethabi::Token;

    use super::*;
    use crate::testing::{address_token, log, BlockBuilder};

    const FACTORY: [u8; 20] = [0xfa; 20];

    fn deployed(factory: &[u8], org: &[u8], name: &str) -> substreams_ethereum::pb::eth::v2::Log {
        log(
            factory,
            "OrganizationDeployed(address,address,string)",
            &[address_token(org), address_token(&[0x0b; 20]), Token::String(name.to_string())],
        )
    }

    #[test]
    fn test_only_factory_deployments_are_kept() {
        let block = BlockBuilder::new(100, 1_700_000_000)
            .transaction(&[0xa1; 32], vec![deployed(&FACTORY, &[0x01; 20], "Acme")])
            .transaction(&[0xa2; 32], vec![deployed(&[0x66; 20], &[0x02; 20], "Impostor")])
            .reverted_transaction(&[0xa3; 32], vec![deployed(&FACTORY, &[0x03; 20], "Reverted")])
            .build();

        let organizations = organizations_deployed(&block, &[FACTORY.to_vec()]);

        assert_eq!(organizations.len(), 1);
        assert_eq!(organizations[0].address, vec![0x01; 20]);
        assert_eq!(organizations[0].name, "Acme");
        assert_eq!(organizations[0].owner, vec![0x0b; 20]);
        assert_eq!(organizations[0].created_at, 1_700_000_000);
    }
}
