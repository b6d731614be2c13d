use crate::config::ChainParams;
use crate::errors::*;
use crate::system::events::ApplicationEvent;
use crate::types::*;

/// Access to the substates of the block in progress.
///
/// Reads observe every write made earlier in the block.
pub trait SubstateApi {
    fn get_substate(
        &self,
        partition_key: &DbPartitionKey,
        sort_key: &DbSortKey,
    ) -> Option<DbSubstateValue>;

    fn set_substate(
        &mut self,
        partition_key: &DbPartitionKey,
        sort_key: DbSortKey,
        value: DbSubstateValue,
    );

    fn remove_substate(&mut self, partition_key: &DbPartitionKey, sort_key: &DbSortKey);

    /// Collects up to `limit` entries of a partition in ascending key order, starting at
    /// `from_sort_key` (inclusive). The result is detached from the store, so the caller may
    /// mutate the partition while walking it.
    fn scan_substates(
        &self,
        partition_key: &DbPartitionKey,
        from_sort_key: Option<&DbSortKey>,
        limit: Option<usize>,
    ) -> Vec<PartitionEntry>;

    /// Collects the entries of a partition with `from_sort_key <= key < to_sort_key`.
    fn scan_range(
        &self,
        partition_key: &DbPartitionKey,
        from_sort_key: Option<&DbSortKey>,
        to_sort_key: &DbSortKey,
    ) -> Vec<PartitionEntry>;

    fn list_all(&self, partition_key: &DbPartitionKey) -> Vec<PartitionEntry> {
        self.scan_substates(partition_key, None, None)
    }

    fn get_typed<T: Decode<()>>(
        &self,
        partition_key: &DbPartitionKey,
        sort_key: &DbSortKey,
    ) -> Result<Option<T>, RuntimeError> {
        match self.get_substate(partition_key, sort_key) {
            Some(bytes) => Ok(Some(vela_decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_typed<T: Encode>(
        &mut self,
        partition_key: &DbPartitionKey,
        sort_key: DbSortKey,
        value: &T,
    ) -> Result<(), RuntimeError> {
        let bytes = vela_encode(value)?;
        self.set_substate(partition_key, sort_key, bytes);
        Ok(())
    }
}

pub trait BlockApi {
    fn block_height(&self) -> i64;

    fn block_time(&self) -> Instant;
}

pub trait EventApi {
    fn emit_event(&mut self, event: ApplicationEvent);
}

pub trait ParamsApi {
    fn params(&self) -> &ChainParams;
}

pub trait TransactionApi: Sized {
    /// Runs `f` as a transaction. If it fails, every substate write and event it made is
    /// discarded before the error is returned.
    fn execute_transaction<T, F>(&mut self, f: F) -> Result<T, RuntimeError>
    where
        F: FnOnce(&mut Self) -> Result<T, RuntimeError>;
}

/// Interface of the system layer, as seen by module blueprints.
pub trait SystemApi: SubstateApi + BlockApi + EventApi + ParamsApi + TransactionApi {}

impl<T: SubstateApi + BlockApi + EventApi + ParamsApi + TransactionApi> SystemApi for T {}
