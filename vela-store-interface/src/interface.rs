use core::fmt;

use indexmap::IndexMap;

pub type DbNodeKey = Vec<u8>;

pub type DbPartitionNum = u8;

/// A database-level key of an entire partition.
/// Seen from the higher-level API: it represents a pair (module store, partition within it).
/// Seen from the lower-level implementation: it is a prefix of every key stored in the partition.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub struct DbPartitionKey {
    pub node_key: DbNodeKey,
    pub partition_num: DbPartitionNum,
}

impl DbPartitionKey {
    pub fn new(node_key: &[u8], partition_num: DbPartitionNum) -> Self {
        Self {
            node_key: node_key.to_vec(),
            partition_num,
        }
    }
}

/// A database-level key of a substate within a known partition.
/// Entries of a partition are iterated in the byte-lexicographic order of their sort keys.
#[derive(Clone, Hash, PartialEq, Eq, Ord, PartialOrd)]
pub struct DbSortKey(pub Vec<u8>);

impl fmt::Debug for DbSortKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DbSortKey({})", hex::encode(&self.0))
    }
}

impl From<&[u8]> for DbSortKey {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<Vec<u8>> for DbSortKey {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

/// A fully-specified key of a substate (i.e. specifying its partition and sort key).
pub type DbSubstateKey = (DbPartitionKey, DbSortKey);

/// A raw substate value stored by the database.
pub type DbSubstateValue = Vec<u8>;

/// A key-value entry of a substate within a known partition.
pub type PartitionEntry = (DbSortKey, DbSubstateValue);

/// A canonical description of all database updates to be applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatabaseUpdates {
    /// Node-level updates.
    pub node_updates: IndexMap<DbNodeKey, NodeDatabaseUpdates>,
}

/// A canonical description of specific node's updates to be applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NodeDatabaseUpdates {
    /// Partition-level updates.
    pub partition_updates: IndexMap<DbPartitionNum, PartitionDatabaseUpdates>,
}

/// A canonical description of specific partition's updates to be applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartitionDatabaseUpdates {
    pub substate_updates: IndexMap<DbSortKey, DatabaseUpdate>,
}

/// An update of a single substate's value.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum DatabaseUpdate {
    Set(DbSubstateValue),
    Delete,
}

impl DatabaseUpdate {
    pub fn as_change(&self) -> Option<&DbSubstateValue> {
        match self {
            DatabaseUpdate::Set(value) => Some(value),
            DatabaseUpdate::Delete => None,
        }
    }
}

impl DatabaseUpdates {
    /// Constructs an instance from a map of per-partition maps.
    pub fn from_delta_maps(
        maps: IndexMap<DbPartitionKey, IndexMap<DbSortKey, DatabaseUpdate>>,
    ) -> DatabaseUpdates {
        let mut database_updates = DatabaseUpdates::default();
        for (
            DbPartitionKey {
                node_key,
                partition_num,
            },
            substate_updates,
        ) in maps
        {
            database_updates
                .node_updates
                .entry(node_key)
                .or_default()
                .partition_updates
                .insert(partition_num, PartitionDatabaseUpdates { substate_updates });
        }
        database_updates
    }

    pub fn is_empty(&self) -> bool {
        self.node_updates.values().all(|node| {
            node.partition_updates
                .values()
                .all(|partition| partition.substate_updates.is_empty())
        })
    }

    /// Iterates over all updates in a flattened form.
    pub fn iter(&self) -> impl Iterator<Item = (DbPartitionKey, &DbSortKey, &DatabaseUpdate)> {
        self.node_updates.iter().flat_map(|(node_key, node)| {
            node.partition_updates
                .iter()
                .flat_map(move |(partition_num, partition)| {
                    partition
                        .substate_updates
                        .iter()
                        .map(move |(sort_key, update)| {
                            (
                                DbPartitionKey {
                                    node_key: node_key.clone(),
                                    partition_num: *partition_num,
                                },
                                sort_key,
                                update,
                            )
                        })
                })
        })
    }
}

/// A read interface between Track and a database vendor.
pub trait SubstateDatabase {
    /// Reads a substate value by its partition and sort key, or [`Option::None`] if missing.
    fn get_substate(
        &self,
        partition_key: &DbPartitionKey,
        sort_key: &DbSortKey,
    ) -> Option<DbSubstateValue>;

    /// Iterates over entries of the given partition, starting at `from_sort_key` (inclusive) if
    /// given, in a lexicographical order (ascending) of the [`DbSortKey`]s.
    fn list_entries_from(
        &self,
        partition_key: &DbPartitionKey,
        from_sort_key: Option<&DbSortKey>,
    ) -> Box<dyn Iterator<Item = PartitionEntry> + '_>;

    /// Iterates over all entries of the given partition, in a lexicographical order (ascending)
    /// of the [`DbSortKey`]s.
    fn list_entries(
        &self,
        partition_key: &DbPartitionKey,
    ) -> Box<dyn Iterator<Item = PartitionEntry> + '_> {
        self.list_entries_from(partition_key, None)
    }
}

/// A write interface between Track and a database vendor.
pub trait CommittableSubstateDatabase {
    /// Commits state changes to the database.
    fn commit(&mut self, database_updates: &DatabaseUpdates);
}

/// A partition listing interface between Track and a database vendor.
pub trait ListableSubstateDatabase {
    /// Iterates over all partition keys, in an arbitrary order.
    fn list_partition_keys(&self) -> Box<dyn Iterator<Item = DbPartitionKey> + '_>;
}
