use tracing::debug;

use crate::config::ChainParams;
use crate::errors::*;
use crate::system::events::ApplicationEvent;
use crate::system::system_api::*;
use crate::track::Track;
use crate::types::*;

/// Height and timestamp of the block in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHeader {
    pub height: i64,
    pub time: Instant,
}

/// The block context: a [`Track`] over the committed state, the block header, the chain
/// parameters and the event buffer of the block.
pub struct Kernel<'g, S: SubstateDatabase> {
    track: Track<'g, S>,
    header: BlockHeader,
    params: &'g ChainParams,
    events: Vec<ApplicationEvent>,
}

impl<'g, S: SubstateDatabase> Kernel<'g, S> {
    pub fn new(substate_db: &'g S, header: BlockHeader, params: &'g ChainParams) -> Self {
        Self {
            track: Track::new(substate_db),
            header,
            params,
            events: Vec::new(),
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn events(&self) -> &[ApplicationEvent] {
        &self.events
    }

    pub fn finalize(self) -> (DatabaseUpdates, Vec<ApplicationEvent>) {
        (self.track.finalize(), self.events)
    }
}

impl<'g, S: SubstateDatabase> SubstateApi for Kernel<'g, S> {
    fn get_substate(
        &self,
        partition_key: &DbPartitionKey,
        sort_key: &DbSortKey,
    ) -> Option<DbSubstateValue> {
        self.track.get_substate(partition_key, sort_key)
    }

    fn set_substate(
        &mut self,
        partition_key: &DbPartitionKey,
        sort_key: DbSortKey,
        value: DbSubstateValue,
    ) {
        self.track.set_substate(partition_key, sort_key, value)
    }

    fn remove_substate(&mut self, partition_key: &DbPartitionKey, sort_key: &DbSortKey) {
        self.track.remove_substate(partition_key, sort_key)
    }

    fn scan_substates(
        &self,
        partition_key: &DbPartitionKey,
        from_sort_key: Option<&DbSortKey>,
        limit: Option<usize>,
    ) -> Vec<PartitionEntry> {
        let entries = self.track.list_entries_from(partition_key, from_sort_key);
        match limit {
            Some(limit) => entries.take(limit).collect(),
            None => entries.collect(),
        }
    }

    fn scan_range(
        &self,
        partition_key: &DbPartitionKey,
        from_sort_key: Option<&DbSortKey>,
        to_sort_key: &DbSortKey,
    ) -> Vec<PartitionEntry> {
        self.track
            .list_entries_from(partition_key, from_sort_key)
            .take_while(|(sort_key, _)| sort_key < to_sort_key)
            .collect()
    }
}

impl<'g, S: SubstateDatabase> BlockApi for Kernel<'g, S> {
    fn block_height(&self) -> i64 {
        self.header.height
    }

    fn block_time(&self) -> Instant {
        self.header.time
    }
}

impl<'g, S: SubstateDatabase> EventApi for Kernel<'g, S> {
    fn emit_event(&mut self, event: ApplicationEvent) {
        self.events.push(event);
    }
}

impl<'g, S: SubstateDatabase> TransactionApi for Kernel<'g, S> {
    fn execute_transaction<T, F>(&mut self, f: F) -> Result<T, RuntimeError>
    where
        F: FnOnce(&mut Self) -> Result<T, RuntimeError>,
    {
        let checkpoint = self.track.checkpoint();
        let event_count = self.events.len();
        let result = f(self);
        if let Err(error) = &result {
            debug!(target: "vela::kernel", kind = error.kind(), "transaction reverted");
            self.track.revert_to(checkpoint);
            self.events.truncate(event_count);
        }
        result
    }
}

impl<'g, S: SubstateDatabase> ParamsApi for Kernel<'g, S> {
    fn params(&self) -> &ChainParams {
        self.params
    }
}
