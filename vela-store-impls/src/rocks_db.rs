use std::path::PathBuf;

use itertools::Itertools;
use rocksdb::{DBWithThreadMode, Direction, IteratorMode, Options, SingleThreaded, WriteBatch, DB};
use vela_store_interface::interface::*;

pub struct RocksdbSubstateStore {
    db: DBWithThreadMode<SingleThreaded>,
}

impl RocksdbSubstateStore {
    pub fn standard(root: PathBuf) -> Self {
        let mut options = Options::default();
        options.create_if_missing(true);
        let db = DB::open(&options, root.as_path()).expect("IO Error");
        Self { db }
    }
}

impl SubstateDatabase for RocksdbSubstateStore {
    fn get_substate(
        &self,
        partition_key: &DbPartitionKey,
        sort_key: &DbSortKey,
    ) -> Option<DbSubstateValue> {
        let key_bytes = encode_to_rocksdb_bytes(partition_key, sort_key);
        self.db.get(key_bytes).expect("IO Error")
    }

    fn list_entries_from(
        &self,
        partition_key: &DbPartitionKey,
        from_sort_key: Option<&DbSortKey>,
    ) -> Box<dyn Iterator<Item = PartitionEntry> + '_> {
        let partition_key = partition_key.clone();
        let empty_sort_key = DbSortKey(vec![]);
        let from_sort_key = from_sort_key.unwrap_or(&empty_sort_key);
        let start_key_bytes = encode_to_rocksdb_bytes(&partition_key, from_sort_key);
        let iter = self
            .db
            .iterator(IteratorMode::From(&start_key_bytes, Direction::Forward))
            .map(|kv| {
                let (iter_key_bytes, iter_value) = kv.expect("IO Error");
                let iter_key = decode_from_rocksdb_bytes(&iter_key_bytes);
                (iter_key, iter_value.to_vec())
            })
            .take_while(move |((iter_partition_key, _), _)| *iter_partition_key == partition_key)
            .map(|((_, iter_sort_key), iter_value)| (iter_sort_key, iter_value));

        Box::new(iter)
    }
}

impl CommittableSubstateDatabase for RocksdbSubstateStore {
    fn commit(&mut self, database_updates: &DatabaseUpdates) {
        let mut batch = WriteBatch::default();
        for (partition_key, sort_key, update) in database_updates.iter() {
            let key_bytes = encode_to_rocksdb_bytes(&partition_key, sort_key);
            match update {
                DatabaseUpdate::Set(value) => batch.put(key_bytes, value),
                DatabaseUpdate::Delete => batch.delete(key_bytes),
            }
        }
        self.db.write(batch).expect("IO error");
    }
}

impl ListableSubstateDatabase for RocksdbSubstateStore {
    fn list_partition_keys(&self) -> Box<dyn Iterator<Item = DbPartitionKey> + '_> {
        Box::new(
            self.db
                .iterator(IteratorMode::Start)
                .map(|kv| {
                    let (iter_key_bytes, _) = kv.expect("IO Error");
                    decode_from_rocksdb_bytes(&iter_key_bytes).0
                })
                // Rocksdb iterates in key order, so entries of a partition are adjacent.
                .dedup(),
        )
    }
}

/// Key layout: node key length, node key, partition number, sort key.
pub fn encode_to_rocksdb_bytes(partition_key: &DbPartitionKey, sort_key: &DbSortKey) -> Vec<u8> {
    let mut buffer = Vec::with_capacity(2 + partition_key.node_key.len() + sort_key.0.len());
    buffer.push(
        u8::try_from(partition_key.node_key.len()).expect("Node key longer than 255 bytes"),
    );
    buffer.extend_from_slice(&partition_key.node_key);
    buffer.push(partition_key.partition_num);
    buffer.extend_from_slice(&sort_key.0);
    buffer
}

pub fn decode_from_rocksdb_bytes(buffer: &[u8]) -> DbSubstateKey {
    let node_key_length = usize::from(buffer[0]);
    let node_key = buffer[1..1 + node_key_length].to_vec();
    let partition_num = buffer[1 + node_key_length];
    let sort_key = buffer[2 + node_key_length..].to_vec();
    (
        DbPartitionKey {
            node_key,
            partition_num,
        },
        DbSortKey(sort_key),
    )
}
