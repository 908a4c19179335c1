use substreams::store::{StoreNew, StoreSetIfNotExists, StoreSetIfNotExistsProto};

use crate::{
    modules::user_store_key,
    pb::tokenstream::v1::{Streams, User},
};

/// A user is created by the first stream naming it, in any organization.
#[substreams::handlers::store]
pub fn store_users(map: Streams, store: StoreSetIfNotExistsProto<User>) {
    for stream in map.streams {
        let Some(address) = stream.user else {
            continue;
        };
        let user = User { address, created_at: stream.created_at, ordinal: stream.ordinal };
        store.set_if_not_exists(user.ordinal, user_store_key(&user.address), &user);
    }
}
