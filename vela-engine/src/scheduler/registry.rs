use std::collections::BTreeMap;

use crate::errors::RuntimeError;
use crate::types::*;

/// A scheduled task handler: receives the block context, the task payload and the fire time
/// the task was scheduled for.
pub type TaskHandler<Y> = fn(&mut Y, &[u8], Instant) -> Result<(), RuntimeError>;

/// Binds handler names, as persisted in task groups, to functions.
pub struct HandlerRegistry<Y> {
    handlers: BTreeMap<String, TaskHandler<Y>>,
}

impl<Y> Default for HandlerRegistry<Y> {
    fn default() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }
}

impl<Y> HandlerRegistry<Y> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to `name`, replacing any earlier binding.
    pub fn register_handler(&mut self, name: &str, handler: TaskHandler<Y>) {
        self.handlers.insert(name.to_string(), handler);
    }

    pub fn get(&self, name: &str) -> Option<TaskHandler<Y>> {
        self.handlers.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
}
