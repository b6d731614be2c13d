use tracing::{debug, error, warn};

use super::registry::HandlerRegistry;
use super::types::*;
use crate::errors::*;
use crate::system::events::ApplicationEvent;
use crate::system::system_api::*;
use crate::types::*;

pub const SCHEDULER_NODE: &[u8] = b"schedule";
pub const TASKS_PARTITION: DbPartitionNum = 0;

fn tasks_partition() -> DbPartitionKey {
    DbPartitionKey::new(SCHEDULER_NODE, TASKS_PARTITION)
}

fn group_key(fire_time: Instant) -> Result<DbSortKey, RuntimeError> {
    fire_time
        .to_key_bytes()
        .map(|bytes| DbSortKey(bytes.to_vec()))
        .ok_or(RuntimeError::SystemError(SystemError::TimeOutOfRange(
            fire_time,
        )))
}

fn group_time(key: &DbSortKey) -> Result<Instant, RuntimeError> {
    Instant::from_key_bytes(&key.0)
        .ok_or_else(|| invariant_violation(format!("malformed task group key {:?}", key)))
}

/// A persistent, time-indexed task queue.
///
/// Tasks are grouped by fire time; a group keeps the insertion order of its tasks and may hold
/// duplicates.
pub struct SchedulerBlueprint;

impl SchedulerBlueprint {
    fn read_group<Y: SystemApi>(
        api: &Y,
        key: &DbSortKey,
    ) -> Result<Vec<ScheduledTask>, RuntimeError> {
        Ok(api
            .get_typed::<Vec<ScheduledTask>>(&tasks_partition(), key)?
            .unwrap_or_default())
    }

    fn write_group<Y: SystemApi>(
        api: &mut Y,
        key: DbSortKey,
        group: Vec<ScheduledTask>,
    ) -> Result<(), RuntimeError> {
        if group.is_empty() {
            api.remove_substate(&tasks_partition(), &key);
            Ok(())
        } else {
            api.set_typed(&tasks_partition(), key, &group)
        }
    }

    /// Appends a task to the group of `fire_time`.
    pub fn schedule_task<Y: SystemApi>(
        api: &mut Y,
        fire_time: Instant,
        handler: &str,
        payload: &[u8],
    ) -> Result<(), RuntimeError> {
        if handler.is_empty() {
            return Err(RuntimeError::SystemError(SystemError::EmptyHandlerName));
        }
        let key = group_key(fire_time)?;
        let mut group = Self::read_group(api, &key)?;
        group.push(ScheduledTask {
            handler: handler.to_string(),
            payload: payload.to_vec(),
        });
        Self::write_group(api, key, group)
    }

    /// Removes the first task of the group of `fire_time` equal to `(handler, payload)`, if any.
    pub fn delete_task<Y: SystemApi>(
        api: &mut Y,
        fire_time: Instant,
        handler: &str,
        payload: &[u8],
    ) -> Result<(), RuntimeError> {
        let key = group_key(fire_time)?;
        let mut group = Self::read_group(api, &key)?;
        let position = group
            .iter()
            .position(|task| task.handler == handler && task.payload == payload);
        if let Some(position) = position {
            group.remove(position);
            Self::write_group(api, key, group)?;
        }
        Ok(())
    }

    /// Removes every task of `handler` at `fire_time`, whatever its payload.
    pub fn delete_all<Y: SystemApi>(
        api: &mut Y,
        fire_time: Instant,
        handler: &str,
    ) -> Result<(), RuntimeError> {
        let key = group_key(fire_time)?;
        let mut group = Self::read_group(api, &key)?;
        let before = group.len();
        group.retain(|task| task.handler != handler);
        if group.len() != before {
            Self::write_group(api, key, group)?;
        }
        Ok(())
    }

    /// Removes every pending task of `handler`.
    pub fn delete_all_by_handler<Y: SystemApi>(
        api: &mut Y,
        handler: &str,
    ) -> Result<(), RuntimeError> {
        for (key, value) in api.list_all(&tasks_partition()) {
            let mut group: Vec<ScheduledTask> = vela_decode(&value)?;
            let before = group.len();
            group.retain(|task| task.handler != handler);
            if group.len() != before {
                Self::write_group(api, key, group)?;
            }
        }
        Ok(())
    }

    /// Returns the tasks with `since <= fire_time < to`, in ascending fire time, then insertion
    /// order.
    pub fn get_tasks<Y: SystemApi>(
        api: &Y,
        since: Instant,
        to: Instant,
    ) -> Result<Vec<Task>, RuntimeError> {
        if to.nanos_since_unix_epoch <= 0 || since >= to {
            return Ok(Vec::new());
        }
        let from = group_key(since.max(Instant::new(0)))?;
        let to = group_key(to)?;
        Self::collect_tasks(api, &from, &to)
    }

    fn collect_tasks<Y: SystemApi>(
        api: &Y,
        from: &DbSortKey,
        to: &DbSortKey,
    ) -> Result<Vec<Task>, RuntimeError> {
        let mut tasks = Vec::new();
        for (key, value) in api.scan_range(&tasks_partition(), Some(from), to) {
            let fire_time = group_time(&key)?;
            let group: Vec<ScheduledTask> = vela_decode(&value)?;
            tasks.extend(group.into_iter().map(|task| Task {
                fire_time,
                handler: task.handler,
                payload: task.payload,
            }));
        }
        Ok(tasks)
    }

    /// Executes every task due at the current block time.
    ///
    /// The due groups are taken out of the store before the first handler runs, so a task a
    /// handler schedules at or before the block time fires in the next block. Each task runs as
    /// its own transaction: an application error discards the task's effects and is published
    /// as a `scheduled_task_failed` event, while a system error aborts the block.
    pub fn on_begin_block<Y: SystemApi>(
        registry: &HandlerRegistry<Y>,
        api: &mut Y,
    ) -> Result<(), RuntimeError> {
        let block_time = api.block_time();
        let Some(to) = block_time.add_nanos(1) else {
            return Err(RuntimeError::SystemError(SystemError::TimeOutOfRange(
                block_time,
            )));
        };
        if to.nanos_since_unix_epoch <= 0 {
            return Ok(());
        }
        let to = group_key(to)?;
        let due = api.scan_range(&tasks_partition(), None, &to);
        for (key, _) in &due {
            api.remove_substate(&tasks_partition(), key);
        }

        for (key, value) in due {
            let fire_time = group_time(&key)?;
            let group: Vec<ScheduledTask> = vela_decode(&value)?;
            for task in group {
                if task.handler.is_empty() {
                    return Err(invariant_violation(format!(
                        "task group {} holds a task without handler",
                        fire_time
                    )));
                }
                let Some(handler) = registry.get(&task.handler) else {
                    error!(
                        target: "vela::scheduler",
                        handler = %task.handler,
                        %fire_time,
                        "no handler registered for scheduled task"
                    );
                    continue;
                };
                debug!(
                    target: "vela::scheduler",
                    handler = %task.handler,
                    %fire_time,
                    "firing scheduled task"
                );
                let result = api.execute_transaction(|api| handler(api, &task.payload, fire_time));
                match result {
                    Ok(()) => {}
                    Err(RuntimeError::ApplicationError(failure)) => {
                        warn!(
                            target: "vela::scheduler",
                            handler = %task.handler,
                            %fire_time,
                            kind = failure.kind(),
                            "scheduled task failed"
                        );
                        api.emit_event(ApplicationEvent::ScheduledTaskFailed {
                            handler: task.handler,
                            fire_time,
                            error: format!("{:?}", failure),
                        });
                    }
                    Err(error) => return Err(error),
                }
            }
        }
        Ok(())
    }
}
