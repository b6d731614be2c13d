use std::collections::BTreeMap;
use std::ops::Bound::{Included, Unbounded};

use vela_store_interface::interface::*;

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct InMemorySubstateDatabase {
    partitions: BTreeMap<DbPartitionKey, BTreeMap<DbSortKey, DbSubstateValue>>,
}

impl InMemorySubstateDatabase {
    pub fn standard() -> Self {
        Self {
            partitions: BTreeMap::new(),
        }
    }
}

impl SubstateDatabase for InMemorySubstateDatabase {
    fn get_substate(
        &self,
        partition_key: &DbPartitionKey,
        sort_key: &DbSortKey,
    ) -> Option<DbSubstateValue> {
        self.partitions
            .get(partition_key)
            .and_then(|partition| partition.get(sort_key))
            .cloned()
    }

    fn list_entries_from(
        &self,
        partition_key: &DbPartitionKey,
        from_sort_key: Option<&DbSortKey>,
    ) -> Box<dyn Iterator<Item = PartitionEntry> + '_> {
        let Some(partition) = self.partitions.get(partition_key) else {
            return Box::new(std::iter::empty());
        };
        let lower_bound = match from_sort_key {
            Some(from_sort_key) => Included(from_sort_key.clone()),
            None => Unbounded,
        };
        Box::new(
            partition
                .range((lower_bound, Unbounded))
                .map(|(key, value)| (key.clone(), value.clone())),
        )
    }
}

impl CommittableSubstateDatabase for InMemorySubstateDatabase {
    fn commit(&mut self, database_updates: &DatabaseUpdates) {
        for (partition_key, sort_key, update) in database_updates.iter() {
            match update {
                DatabaseUpdate::Set(value) => {
                    self.partitions
                        .entry(partition_key)
                        .or_default()
                        .insert(sort_key.clone(), value.clone());
                }
                DatabaseUpdate::Delete => {
                    if let Some(partition) = self.partitions.get_mut(&partition_key) {
                        partition.remove(sort_key);
                        if partition.is_empty() {
                            self.partitions.remove(&partition_key);
                        }
                    }
                }
            }
        }
    }
}

impl ListableSubstateDatabase for InMemorySubstateDatabase {
    fn list_partition_keys(&self) -> Box<dyn Iterator<Item = DbPartitionKey> + '_> {
        Box::new(self.partitions.keys().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    fn partition(num: u8) -> DbPartitionKey {
        DbPartitionKey::new(b"test", num)
    }

    #[test]
    fn commit_then_list_in_key_order() {
        let mut db = InMemorySubstateDatabase::standard();
        db.commit(&DatabaseUpdates::from_delta_maps(indexmap!(
            partition(0) => indexmap!(
                DbSortKey(vec![2]) => DatabaseUpdate::Set(vec![20]),
                DbSortKey(vec![1]) => DatabaseUpdate::Set(vec![10]),
            ),
            partition(1) => indexmap!(
                DbSortKey(vec![0]) => DatabaseUpdate::Set(vec![0]),
            ),
        )));

        let entries = db.list_entries(&partition(0)).collect::<Vec<_>>();
        assert_eq!(
            entries,
            vec![(DbSortKey(vec![1]), vec![10]), (DbSortKey(vec![2]), vec![20])]
        );
        let from = db
            .list_entries_from(&partition(0), Some(&DbSortKey(vec![2])))
            .collect::<Vec<_>>();
        assert_eq!(from, vec![(DbSortKey(vec![2]), vec![20])]);
        assert_eq!(db.list_partition_keys().count(), 2);
    }

    #[test]
    fn delete_removes_empty_partition() {
        let mut db = InMemorySubstateDatabase::standard();
        db.commit(&DatabaseUpdates::from_delta_maps(indexmap!(
            partition(0) => indexmap!(DbSortKey(vec![1]) => DatabaseUpdate::Set(vec![1])),
        )));
        db.commit(&DatabaseUpdates::from_delta_maps(indexmap!(
            partition(0) => indexmap!(DbSortKey(vec![1]) => DatabaseUpdate::Delete),
        )));
        assert_eq!(db.get_substate(&partition(0), &DbSortKey(vec![1])), None);
        assert_eq!(db.list_partition_keys().count(), 0);
    }
}
