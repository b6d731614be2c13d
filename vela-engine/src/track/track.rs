use indexmap::IndexMap;
use std::collections::BTreeMap;

use super::utils::OverlayingIterator;
use crate::types::*;

type TrackedPartition = BTreeMap<DbSortKey, DatabaseUpdate>;

/// A snapshot of the tracked changes, taken before a transaction runs.
#[derive(Debug, Clone)]
pub struct TrackCheckpoint {
    tracked: BTreeMap<DbPartitionKey, TrackedPartition>,
}

/// Transaction-scoped data structure for keeping track of substate changes on top of a
/// [`SubstateDatabase`].
///
/// Reads see every earlier write of the block. Nothing reaches the database until the
/// [`DatabaseUpdates`] returned by [`Track::finalize`] are committed by the host.
pub struct Track<'s, S: SubstateDatabase> {
    substate_db: &'s S,
    tracked: BTreeMap<DbPartitionKey, TrackedPartition>,
}

impl<'s, S: SubstateDatabase> Track<'s, S> {
    pub fn new(substate_db: &'s S) -> Self {
        Self {
            substate_db,
            tracked: BTreeMap::new(),
        }
    }

    pub fn get_substate(
        &self,
        partition_key: &DbPartitionKey,
        sort_key: &DbSortKey,
    ) -> Option<DbSubstateValue> {
        match self
            .tracked
            .get(partition_key)
            .and_then(|partition| partition.get(sort_key))
        {
            Some(update) => update.as_change().cloned(),
            None => self.substate_db.get_substate(partition_key, sort_key),
        }
    }

    pub fn set_substate(
        &mut self,
        partition_key: &DbPartitionKey,
        sort_key: DbSortKey,
        value: DbSubstateValue,
    ) {
        self.tracked
            .entry(partition_key.clone())
            .or_default()
            .insert(sort_key, DatabaseUpdate::Set(value));
    }

    pub fn remove_substate(&mut self, partition_key: &DbPartitionKey, sort_key: &DbSortKey) {
        self.tracked
            .entry(partition_key.clone())
            .or_default()
            .insert(sort_key.clone(), DatabaseUpdate::Delete);
    }

    /// Lists the entries of a partition in ascending sort key order, starting at
    /// `from_sort_key` (inclusive), with the tracked changes applied.
    pub fn list_entries_from(
        &self,
        partition_key: &DbPartitionKey,
        from_sort_key: Option<&DbSortKey>,
    ) -> Box<dyn Iterator<Item = PartitionEntry> + '_> {
        let underlying = self
            .substate_db
            .list_entries_from(partition_key, from_sort_key);

        let Some(tracked) = self.tracked.get(partition_key) else {
            return underlying;
        };
        let overlaid: Box<dyn Iterator<Item = (DbSortKey, Option<DbSubstateValue>)> + '_> =
            match from_sort_key {
                Some(from) => Box::new(
                    tracked
                        .range(from.clone()..)
                        .map(|(key, update)| (key.clone(), update.as_change().cloned())),
                ),
                None => Box::new(
                    tracked
                        .iter()
                        .map(|(key, update)| (key.clone(), update.as_change().cloned())),
                ),
            };
        Box::new(OverlayingIterator::new(underlying, overlaid))
    }

    pub fn checkpoint(&self) -> TrackCheckpoint {
        TrackCheckpoint {
            tracked: self.tracked.clone(),
        }
    }

    pub fn revert_to(&mut self, checkpoint: TrackCheckpoint) {
        self.tracked = checkpoint.tracked;
    }

    /// Finalizes changes captured by this substate store.
    pub fn finalize(self) -> DatabaseUpdates {
        let maps = self
            .tracked
            .into_iter()
            .filter(|(_, partition)| !partition.is_empty())
            .map(|(partition_key, partition)| {
                (partition_key, partition.into_iter().collect::<IndexMap<_, _>>())
            })
            .collect::<IndexMap<_, _>>();
        DatabaseUpdates::from_delta_maps(maps)
    }
}
