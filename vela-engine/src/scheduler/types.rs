use serde::{Deserialize, Serialize};

use crate::types::*;

/// An element of a persisted task group. The fire time is the key of the group.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ScheduledTask {
    pub handler: String,
    pub payload: Vec<u8>,
}

/// A task together with its fire time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub fire_time: Instant,
    pub handler: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerParams {
    /// Wall-clock nanoseconds per scheduler day. Shorter days compress time in test networks.
    pub day_nanos: i64,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            day_nanos: NANOS_IN_A_DAY,
        }
    }
}

impl SchedulerParams {
    pub fn one_day(&self) -> i64 {
        self.day_nanos
    }

    pub fn one_week(&self) -> i64 {
        self.day_nanos * 7
    }

    pub fn one_month(&self) -> i64 {
        self.day_nanos * 30
    }
}
