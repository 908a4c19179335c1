use substreams::store::{StoreNew, StoreSetIfNotExists, StoreSetIfNotExistsProto};

use crate::{
    modules::organization_store_key,
    pb::tokenstream::v1::{Organization, Organizations},
};

/// Keeps the first deployment of each organization, keyed by its address.
#[substreams::handlers::store]
pub fn store_organizations(map: Organizations, store: StoreSetIfNotExistsProto<Organization>) {
    map.organizations
        .into_iter()
        .for_each(|org| {
            store.set_if_not_exists(org.ordinal, organization_store_key(&org.address), &org)
        });
}
