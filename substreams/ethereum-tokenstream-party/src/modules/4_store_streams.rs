use substreams::store::{StoreNew, StoreSetIfNotExists, StoreSetIfNotExistsProto};

use crate::{
    modules::stream_store_key,
    pb::tokenstream::v1::{Stream, Streams},
};

/// Keeps the first `StreamAdded` of each stream key.
#[substreams::handlers::store]
pub fn store_streams(map: Streams, store: StoreSetIfNotExistsProto<Stream>) {
    map.streams
        .into_iter()
        .for_each(|stream| store.set_if_not_exists(stream.ordinal, stream_store_key(&stream.id), &stream));
}
