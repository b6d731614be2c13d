use core::fmt;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Represents a block timestamp, capturing the nanoseconds since the unix epoch.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Encode, Decode, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Instant {
    pub nanos_since_unix_epoch: i64,
}

impl Instant {
    pub const LENGTH: usize = 8;

    pub fn new(nanos_since_unix_epoch: i64) -> Instant {
        Instant {
            nanos_since_unix_epoch,
        }
    }

    pub fn from_seconds(seconds_since_unix_epoch: i64) -> Option<Instant> {
        seconds_since_unix_epoch
            .checked_mul(NANOS_IN_A_SECOND)
            .map(Instant::new)
    }

    pub fn add_nanos(&self, nanos_to_add: i64) -> Option<Instant> {
        self.nanos_since_unix_epoch
            .checked_add(nanos_to_add)
            .map(Instant::new)
    }

    pub fn add_seconds(&self, seconds_to_add: i64) -> Option<Instant> {
        seconds_to_add
            .checked_mul(NANOS_IN_A_SECOND)
            .and_then(|to_add| self.add_nanos(to_add))
    }

    /// Nanoseconds elapsed from `earlier` to `self`, negative if `earlier` is later.
    pub fn nanos_since(&self, earlier: Instant) -> Option<i64> {
        self.nanos_since_unix_epoch
            .checked_sub(earlier.nanos_since_unix_epoch)
    }

    /// Big-endian nanoseconds, so that byte order of keys matches time order.
    /// Instants before the epoch have no key.
    pub fn to_key_bytes(&self) -> Option<[u8; Self::LENGTH]> {
        u64::try_from(self.nanos_since_unix_epoch)
            .ok()
            .map(u64::to_be_bytes)
    }

    pub fn from_key_bytes(bytes: &[u8]) -> Option<Instant> {
        let bytes: [u8; Self::LENGTH] = bytes.try_into().ok()?;
        i64::try_from(u64::from_be_bytes(bytes))
            .ok()
            .map(Instant::new)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let secs = self.nanos_since_unix_epoch.div_euclid(NANOS_IN_A_SECOND);
        let nanos = self.nanos_since_unix_epoch.rem_euclid(NANOS_IN_A_SECOND);
        write!(f, "{}.{:09}", secs, nanos)
    }
}
